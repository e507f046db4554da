use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// Custom serde module for DateTime to ensure RFC3339 string format
mod datetime_format {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<DateTime<Utc>>().map_err(serde::de::Error::custom)
    }
}

mod optional_datetime_format {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.serialize_some(&date.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|s| s.parse::<DateTime<Utc>>().map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Maximum characters in post, reply, and bio text
pub const MAX_TEXT_LEN: usize = 400;

/// Maximum characters in usernames and name fields
pub const MAX_NAME_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    #[serde(rename = "fName")]
    pub first_name: String,
    #[serde(rename = "lName")]
    pub last_name: String,
    pub bio: Option<String>,
    #[serde(rename = "isPublic")]
    pub is_public: bool,
    #[serde(rename = "friendCode")]
    pub friend_code: String,
    #[serde(rename = "profileImageID")]
    pub profile_image_id: Option<i64>,
    #[serde(rename = "coverImageID")]
    pub cover_image_id: Option<i64>,
    #[serde(rename = "createdAt", with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(
        rename = "deletedAt",
        default,
        with = "optional_datetime_format",
        skip_serializing_if = "Option::is_none"
    )]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Name and avatar used when the account appears on a rendered timeline
    pub fn postable_entry(&self) -> PostableEntry {
        PostableEntry {
            name: self.display_name(),
            profile_image_id: self.profile_image_id,
        }
    }
}

/// Directed edge between two accounts.
///
/// A friend edge (`is_friend_relation`) starts unconfirmed; a friendship is two
/// confirmed friend edges pointing at each other. A block edge has
/// `is_friend_relation == false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: i64,
    #[serde(rename = "firstAccID")]
    pub first_acc_id: i64,
    #[serde(rename = "secondAccID")]
    pub second_acc_id: i64,
    pub confirmed_relation: bool,
    pub is_friend_relation: bool,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "optional_datetime_format")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Relationship {
    pub fn is_block(&self) -> bool {
        !self.is_friend_relation
    }

    pub fn is_pending(&self) -> bool {
        self.is_friend_relation && !self.confirmed_relation
    }

    pub fn is_confirmed_friend(&self) -> bool {
        self.is_friend_relation && self.confirmed_relation
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    #[serde(rename = "posterID")]
    pub poster_id: i64,
    #[serde(rename = "postedOnID")]
    pub posted_on_id: i64,
    pub text_content: Option<String>,
    #[serde(rename = "sharedPostID")]
    pub shared_post_id: Option<i64>,
    #[serde(rename = "associatedImageID")]
    pub associated_image_id: Option<i64>,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "optional_datetime_format")]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "optional_datetime_format",
        skip_serializing_if = "Option::is_none"
    )]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: i64,
    pub responding_to: i64,
    #[serde(rename = "posterID")]
    pub poster_id: i64,
    pub text_content: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "optional_datetime_format")]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "optional_datetime_format",
        skip_serializing_if = "Option::is_none"
    )]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub id: i64,
    pub responding_to: i64,
    #[serde(rename = "posterID")]
    pub poster_id: i64,
    pub reaction_type: i64,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        with = "optional_datetime_format",
        skip_serializing_if = "Option::is_none"
    )]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Preview of a shared post, shown only when the viewer may see the original
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedPostPreview {
    pub id: i64,
    #[serde(rename = "sharedPostTxt")]
    pub text_content: Option<String>,
    #[serde(rename = "sharedPostImgId")]
    pub image_id: Option<i64>,
    #[serde(rename = "sharedPostAccId")]
    pub posted_on_id: i64,
    #[serde(rename = "sharedPostCreatedAt", with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

/// A post prepared for display on a timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    #[serde(flatten)]
    pub post: Post,
    pub replies: Vec<Reply>,
    pub reactions: Vec<Reaction>,
    pub num_likes: usize,
    pub user_reacted: bool,
    pub user_reaction_id: Option<i64>,
    pub shared_post: Option<SharedPostPreview>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostableEntry {
    pub name: String,
    pub profile_image_id: Option<i64>,
}

/// Display names keyed by account id for everyone who may appear on a timeline
pub type PostableMap = BTreeMap<i64, PostableEntry>;

// Request/Response types for API
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub msg: String,
    #[serde(rename = "accountID")]
    pub account_id: i64,
}

impl SessionResponse {
    pub fn for_account(account_id: i64) -> Self {
        Self {
            msg: format!("login is valid for accountID {}", account_id),
            account_id,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FriendCodeRequest {
    #[serde(rename = "friendCode", default)]
    pub friend_code: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateBioRequest {
    #[serde(rename = "new-bio", default)]
    pub new_bio: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdatePasswordRequest {
    #[serde(rename = "current-password", default)]
    pub current_password: Option<String>,
    #[serde(rename = "new-password", default)]
    pub new_password: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateVisibilityRequest {
    #[serde(default)]
    pub public: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DeleteAccountRequest {
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EditContentRequest {
    #[serde(rename = "textContent", default)]
    pub text_content: Option<String>,
}

/// Form fields are kept as strings so that a malformed id is reported as a 400
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateReplyRequest {
    #[serde(rename = "textContent", default)]
    pub text_content: Option<String>,
    #[serde(rename = "respTo", default)]
    pub resp_to: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateReactionRequest {
    #[serde(rename = "reactionType", default)]
    pub reaction_type: Option<String>,
    #[serde(rename = "respTo", default)]
    pub resp_to: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: i64,
    pub message: String,
}

impl CreatedResponse {
    pub fn ok(id: i64) -> Self {
        Self {
            id,
            message: "OK".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RelationshipResponse {
    #[serde(rename = "friendCode")]
    pub friend_code: String,
    pub status: crate::RelationshipStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub retry: bool,
}
