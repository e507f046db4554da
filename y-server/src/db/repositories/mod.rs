mod account_repository;
mod image_repository;
mod post_repository;
mod reaction_repository;
mod relationship_repository;
mod reply_repository;

pub use account_repository::{AccountRepository, NewAccount};
pub use image_repository::{ImageRepository, NewImage, StoredImage};
pub use post_repository::{CascadeCounts, NewPost, PostRepository};
pub use reaction_repository::ReactionRepository;
pub use relationship_repository::RelationshipRepository;
pub use reply_repository::ReplyRepository;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;

/// Current time at the precision timestamps are stored with
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339 so stored timestamps also sort correctly as text
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn parse_optional_timestamp(
    idx: usize,
    raw: Option<String>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    raw.map(|s| parse_timestamp(idx, s)).transpose()
}
