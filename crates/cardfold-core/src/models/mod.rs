//! Data models for wallet entities.
//!
//! This module contains the data structures exchanged with the wallet
//! service:
//!
//! - `UserProfile`, `NewUser`, `RegisteredUser`, `ProfileUpdate`
//! - `GiftCard`, `NewGiftCard`, `CardImage`, `CardSide`
//! - `Vendor`
//! - `Paginated`: generic listing page wrapper

pub mod gift_card;
pub mod user;
pub mod vendor;

pub use gift_card::{CardImage, CardSide, GiftCard, NewGiftCard, Paginated};
pub use user::{NewUser, ProfileUpdate, RegisteredUser, UserProfile};
pub use vendor::Vendor;
