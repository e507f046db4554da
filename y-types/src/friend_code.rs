use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Number of characters in every friend code
pub const FRIEND_CODE_LEN: usize = 8;

/// Characters a friend code is drawn from
pub const FRIEND_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FriendCodeError {
    #[error("Friend Code must be 8 characters")]
    WrongLength,
    #[error("Friend Code may only contain letters and digits")]
    InvalidCharacter,
}

/// Public identifier used to address another account in friend requests.
///
/// Codes are stored upper-case; parsing trims whitespace and upper-cases the
/// input so that a code typed in lower case still resolves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FriendCode(String);

impl FriendCode {
    pub fn parse(raw: &str) -> Result<Self, FriendCodeError> {
        let code = raw.trim().to_ascii_uppercase();
        if code.chars().count() != FRIEND_CODE_LEN {
            return Err(FriendCodeError::WrongLength);
        }
        if !code.bytes().all(|b| FRIEND_CODE_ALPHABET.contains(&b)) {
            return Err(FriendCodeError::InvalidCharacter);
        }
        Ok(Self(code))
    }

    /// Generate a random code from a v4 UUID's entropy
    pub fn generate() -> Self {
        let entropy = Uuid::new_v4();
        let code = entropy
            .as_bytes()
            .iter()
            .take(FRIEND_CODE_LEN)
            .map(|b| FRIEND_CODE_ALPHABET[*b as usize % FRIEND_CODE_ALPHABET.len()] as char)
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FriendCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for FriendCode {
    type Error = FriendCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FriendCode> for String {
    fn from(code: FriendCode) -> Self {
        code.0
    }
}
