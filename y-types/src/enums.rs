use serde::{Deserialize, Serialize};

/// Outcome of asking whether an account may add content to a timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentPermission {
    Allowed,
    /// Timeline belongs to a private account that is not the caller
    TargetPrivate,
    /// Caller has no confirmed friendship with the timeline owner
    NotFriends,
}

impl ContentPermission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, ContentPermission::Allowed)
    }
}

/// Relationship between the viewer and another account, from the viewer's side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelationshipStatus {
    #[serde(rename = "self")]
    Self_,
    None,
    /// Viewer sent a request that is not answered yet
    PendingOutgoing,
    /// The other account sent the viewer a request
    PendingIncoming,
    Confirmed,
    /// Viewer blocked the other account
    Blocked,
    /// The other account blocked the viewer
    BlockedBy,
}

impl RelationshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipStatus::Self_ => "self",
            RelationshipStatus::None => "none",
            RelationshipStatus::PendingOutgoing => "pending_outgoing",
            RelationshipStatus::PendingIncoming => "pending_incoming",
            RelationshipStatus::Confirmed => "confirmed",
            RelationshipStatus::Blocked => "blocked",
            RelationshipStatus::BlockedBy => "blocked_by",
        }
    }
}

/// Which of an account's two image slots an upload targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSlot {
    Profile,
    Cover,
}

impl ImageSlot {
    /// Multipart field name the slot is uploaded under
    pub fn field_name(&self) -> &'static str {
        match self {
            ImageSlot::Profile => "profile-image",
            ImageSlot::Cover => "cover-image",
        }
    }

    pub fn from_field_name(name: &str) -> Option<Self> {
        match name {
            "profile-image" => Some(ImageSlot::Profile),
            "cover-image" => Some(ImageSlot::Cover),
            _ => None,
        }
    }
}
