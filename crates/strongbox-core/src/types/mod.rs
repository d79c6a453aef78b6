//! Shared data model.

mod card;
mod kind;
mod secret;

pub use card::Card;
pub use kind::SecretKind;
pub use secret::{Secret, SecretItem};
