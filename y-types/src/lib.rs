pub mod enums;
pub mod friend_code;
pub mod models;

pub use enums::*;
pub use friend_code::*;
pub use models::*;
