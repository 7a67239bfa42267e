//! Vendor models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A gift card vendor (the issuing company).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub vendor_id: String,
    pub company_name: String,
    pub created_at: NaiveDateTime,
    pub has_logo: bool,
}
