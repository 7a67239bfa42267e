//! User account models.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::api::ApiError;

/// Profile of the signed-in user, as returned by the profile endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Account data submitted at registration.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
}

impl NewUser {
    /// Reject requests the service is guaranteed to refuse. Field-level
    /// rules (password complexity, email shape) stay with the service
    /// and the form layer.
    pub(crate) fn validate(&self) -> Result<(), ApiError> {
        if self.username.trim().is_empty()
            || self.password.is_empty()
            || self.email.trim().is_empty()
        {
            return Err(ApiError::Validation(
                "username, password and email are required".to_string(),
            ));
        }
        Ok(())
    }
}

/// The account echo returned by a successful registration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredUser {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub created_at: NaiveDateTime,
}

/// Partial profile update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profile_response() {
        let json = r#"{
            "user_id": "u1",
            "username": "alice",
            "email": "alice@example.com",
            "first_name": "Alice",
            "last_name": "Nguyen",
            "date_of_birth": "1990-04-01",
            "created_at": "2024-01-05T09:30:00",
            "updated_at": null
        }"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.user_id, "u1");
        assert_eq!(profile.full_name(), "Alice Nguyen");
        assert!(profile.updated_at.is_none());
    }

    #[test]
    fn test_profile_update_skips_absent_fields() {
        let update = ProfileUpdate {
            email: Some("new@example.com".to_string()),
            ..ProfileUpdate::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["email"], "new@example.com");
        assert!(json.get("first_name").is_none());
    }

    #[test]
    fn test_new_user_validation() {
        let user = NewUser {
            username: "  ".to_string(),
            password: "Secret123".to_string(),
            email: "a@b.c".to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 4, 1).unwrap(),
        };
        assert!(user.validate().is_err());
    }
}
