//! Gift card models.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A stored gift card, joined with its vendor name by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftCard {
    pub card_id: String,
    pub user_id: String,
    pub vendor_id: String,
    pub card_number: String,
    pub pin: Option<String>,
    pub balance: f64,
    pub expiration_date: Option<NaiveDate>,
    pub has_front_image: bool,
    pub has_back_image: bool,
    pub created_at: NaiveDateTime,
    pub vendor_name: String,
}

impl GiftCard {
    /// True when the card expired strictly before `today`.
    /// Cards without an expiration date never expire.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiration_date.map(|d| d < today).unwrap_or(false)
    }

    /// Card number reduced to its last four digits for display
    /// (list rows show "•••• 1234", never the full number).
    pub fn masked_number(&self) -> String {
        let digits: String = self.card_number.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() <= 4 {
            return digits;
        }
        format!("•••• {}", &digits[digits.len() - 4..])
    }
}

/// Which face of the card an image shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardSide {
    Front,
    Back,
}

impl CardSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardSide::Front => "front",
            CardSide::Back => "back",
        }
    }
}

/// An image captured or picked on the device, held in memory until the
/// upload completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardImage {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl CardImage {
    pub fn png(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: "image/png".to_string(),
            bytes,
        }
    }

    pub fn jpeg(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: "image/jpeg".to_string(),
            bytes,
        }
    }
}

/// A gift card being added to the wallet.
#[derive(Debug, Clone)]
pub struct NewGiftCard {
    pub user_id: String,
    pub vendor_id: String,
    pub card_number: String,
    pub pin: Option<String>,
    pub balance: f64,
    pub expiration_date: Option<NaiveDate>,
    pub front_image: Option<CardImage>,
    pub back_image: Option<CardImage>,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub pages: u32,
}

impl<T> Paginated<T> {
    pub fn has_more(&self) -> bool {
        self.page < self.pages
    }
}
