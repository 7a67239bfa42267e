//! Typed facades over the request pipeline.
//!
//! Each method shapes one wallet-service endpoint: it builds the
//! request, routes it through the pipeline, checks the status, and
//! decodes the documented response shape. None of them hold state.
//!
//! Authentication endpoints (login, register, health) go through the
//! gateway directly - a 401 from login means bad credentials, not an
//! expired session, so the renewal stage must not intercept it. All
//! other calls ride the renewal pipeline.

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::auth::TokenPair;
use crate::models::{
    CardImage, CardSide, GiftCard, NewGiftCard, NewUser, Paginated, ProfileUpdate,
    RegisteredUser, UserProfile, Vendor,
};

use super::gateway::RequestGateway;
use super::refresh::RefreshCoordinator;
use super::request::{ApiRequest, ApiResponse, FormField};
use super::ApiError;

/// Page size used for gift card and vendor listings.
/// 20 rows fills a phone screen twice over without heavy payloads.
const PAGE_SIZE: u32 = 20;

/// Wire shape of the login and renewal endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[allow(dead_code)]
    pub token_type: Option<String>,
}

/// API client for the gift-card wallet service.
#[derive(Clone)]
pub struct ApiClient {
    gateway: RequestGateway,
    pipeline: RefreshCoordinator,
    base_url: String,
}

impl ApiClient {
    pub(crate) fn new(
        gateway: RequestGateway,
        pipeline: RefreshCoordinator,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            pipeline,
            base_url: base_url.into(),
        }
    }

    /// Reject non-success responses, keeping the body for the caller.
    fn ok(response: ApiResponse) -> Result<ApiResponse, ApiError> {
        if response.status.is_success() {
            Ok(response)
        } else {
            Err(ApiError::Http {
                status: response.status,
                body: response.text(),
            })
        }
    }

    // ===== Authentication =====

    /// Exchange credentials for a token pair.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, ApiError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ApiError::Validation(
                "username and password are required".to_string(),
            ));
        }
        let request = ApiRequest::post("/auth/token").form(vec![
            ("username".to_string(), username.to_string()),
            ("password".to_string(), password.to_string()),
        ]);
        let response = Self::ok(self.gateway.send(request).await?)?;
        let tokens: TokenResponse = response.json()?;
        Ok(TokenPair::new(tokens.access_token, tokens.refresh_token))
    }

    /// Create a new account. Does not sign in.
    pub async fn register(&self, new_user: &NewUser) -> Result<RegisteredUser, ApiError> {
        new_user.validate()?;
        let body = serde_json::to_value(new_user)
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        let request = ApiRequest::post("/auth/register").json(body);
        let response = Self::ok(self.gateway.send(request).await?)?;
        response.json()
    }

    /// Invalidate the current session on the service side.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let request = ApiRequest::post("/auth/logout");
        Self::ok(self.gateway.send(request).await?)?;
        Ok(())
    }

    /// Service liveness probe.
    pub async fn health(&self) -> Result<(), ApiError> {
        let request = ApiRequest::get("/health");
        Self::ok(self.gateway.send(request).await?)?;
        Ok(())
    }

    // ===== User profile =====

    /// Fetch the profile of the signed-in user.
    pub async fn get_profile(&self) -> Result<UserProfile, ApiError> {
        let request = ApiRequest::get("/users/me");
        let response = Self::ok(self.pipeline.execute(request).await?)?;
        response.json()
    }

    /// Update profile fields; absent fields are left unchanged.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ApiError> {
        let body = serde_json::to_value(update)
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        let request = ApiRequest::put("/users/me").json(body);
        let response = Self::ok(self.pipeline.execute(request).await?)?;
        response.json()
    }

    /// Change the account password.
    pub async fn update_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        if new_password.is_empty() {
            return Err(ApiError::Validation("new password is required".to_string()));
        }
        let request = ApiRequest::put("/users/me/password").json(json!({
            "current_password": current_password,
            "new_password": new_password,
        }));
        Self::ok(self.pipeline.execute(request).await?)?;
        Ok(())
    }

    /// Delete the account. The service requires password confirmation.
    pub async fn delete_account(&self, current_password: &str) -> Result<(), ApiError> {
        let request = ApiRequest::delete("/users/me").json(json!({
            "current_password": current_password,
        }));
        Self::ok(self.pipeline.execute(request).await?)?;
        Ok(())
    }

    // ===== Gift cards =====

    /// One page of the user's gift cards, optionally filtered by card
    /// number or vendor name.
    pub async fn list_gift_cards(
        &self,
        user_id: &str,
        page: u32,
        search: Option<&str>,
    ) -> Result<Paginated<GiftCard>, ApiError> {
        if page == 0 {
            return Err(ApiError::Validation("page numbers start at 1".to_string()));
        }
        let mut request = ApiRequest::get(format!("/users/{user_id}/gift-cards"))
            .query("page", page)
            .query("page_size", PAGE_SIZE);
        if let Some(search) = search.filter(|s| !s.is_empty()) {
            request = request.query("search", search);
        }
        let response = Self::ok(self.pipeline.execute(request).await?)?;
        response.json()
    }

    /// Fetch a single gift card.
    pub async fn get_gift_card(&self, card_id: &str) -> Result<GiftCard, ApiError> {
        let request = ApiRequest::get(format!("/gift-cards/{card_id}"));
        let response = Self::ok(self.pipeline.execute(request).await?)?;
        response.json()
    }

    /// Add a gift card, with optional front/back images, as one
    /// multipart upload.
    pub async fn create_gift_card(&self, card: &NewGiftCard) -> Result<GiftCard, ApiError> {
        if card.user_id.is_empty() || card.vendor_id.is_empty() || card.card_number.is_empty() {
            return Err(ApiError::Validation(
                "user, vendor and card number are required".to_string(),
            ));
        }
        if card.balance <= 0.0 {
            return Err(ApiError::Validation(
                "balance must be greater than 0".to_string(),
            ));
        }

        let mut fields = vec![
            Self::text_field("user_id", card.user_id.as_str()),
            Self::text_field("vendor_id", card.vendor_id.as_str()),
            Self::text_field("card_number", card.card_number.as_str()),
            Self::text_field("balance", card.balance.to_string()),
        ];
        if let Some(ref pin) = card.pin {
            fields.push(Self::text_field("pin", pin.as_str()));
        }
        if let Some(date) = card.expiration_date {
            fields.push(Self::text_field(
                "expiration_date",
                date.format("%Y-%m-%d").to_string(),
            ));
        }
        if let Some(ref image) = card.front_image {
            fields.push(Self::file_field("front_image", image));
        }
        if let Some(ref image) = card.back_image {
            fields.push(Self::file_field("back_image", image));
        }

        debug!(vendor_id = %card.vendor_id, "creating gift card");
        let request = ApiRequest::post("/gift-cards").multipart(fields);
        let response = Self::ok(self.pipeline.execute(request).await?)?;
        response.json()
    }

    /// Set a card's remaining balance after spending from it.
    pub async fn update_balance(&self, card_id: &str, balance: f64) -> Result<GiftCard, ApiError> {
        if balance < 0.0 {
            return Err(ApiError::Validation(
                "balance cannot be negative".to_string(),
            ));
        }
        let request = ApiRequest::put(format!("/gift-cards/{card_id}/balance"))
            .json(json!({ "balance": balance }));
        let response = Self::ok(self.pipeline.execute(request).await?)?;
        response.json()
    }

    /// URL of a card image, for handing to an image view.
    pub fn gift_card_image_url(&self, card_id: &str, side: CardSide) -> String {
        format!(
            "{}/gift-cards/{}/images/{}",
            self.base_url,
            card_id,
            side.as_str()
        )
    }

    /// Download a card image through the authenticated pipeline.
    pub async fn fetch_gift_card_image(
        &self,
        card_id: &str,
        side: CardSide,
    ) -> Result<Vec<u8>, ApiError> {
        let request =
            ApiRequest::get(format!("/gift-cards/{card_id}/images/{}", side.as_str()));
        let response = Self::ok(self.pipeline.execute(request).await?)?;
        Ok(response.body)
    }

    // ===== Vendors =====

    /// One page of vendors, optionally filtered by company name.
    pub async fn list_vendors(
        &self,
        page: u32,
        search: Option<&str>,
    ) -> Result<Vec<Vendor>, ApiError> {
        if page == 0 {
            return Err(ApiError::Validation("page numbers start at 1".to_string()));
        }
        let mut request = ApiRequest::get("/vendors")
            .query("page", page)
            .query("page_size", PAGE_SIZE);
        if let Some(search) = search.filter(|s| !s.is_empty()) {
            request = request.query("search", search);
        }
        let response = Self::ok(self.pipeline.execute(request).await?)?;
        response.json()
    }

    /// Fetch a single vendor.
    pub async fn get_vendor(&self, vendor_id: &str) -> Result<Vendor, ApiError> {
        let request = ApiRequest::get(format!("/vendors/{vendor_id}"));
        let response = Self::ok(self.pipeline.execute(request).await?)?;
        response.json()
    }

    /// Add a vendor, with an optional logo.
    pub async fn create_vendor(
        &self,
        company_name: &str,
        logo: Option<&CardImage>,
    ) -> Result<Vendor, ApiError> {
        if company_name.trim().is_empty() {
            return Err(ApiError::Validation(
                "company name is required".to_string(),
            ));
        }
        let mut fields = vec![Self::text_field("company_name", company_name)];
        if let Some(logo) = logo {
            fields.push(Self::file_field("logo", logo));
        }
        let request = ApiRequest::post("/vendors").multipart(fields);
        let response = Self::ok(self.pipeline.execute(request).await?)?;
        response.json()
    }

    /// Replace a vendor's logo.
    pub async fn update_vendor_logo(
        &self,
        vendor_id: &str,
        logo: &CardImage,
    ) -> Result<(), ApiError> {
        let request = ApiRequest::put(format!("/vendors/{vendor_id}/logo"))
            .multipart(vec![Self::file_field("logo", logo)]);
        Self::ok(self.pipeline.execute(request).await?)?;
        Ok(())
    }

    /// URL of a vendor logo, for handing to an image view.
    pub fn vendor_logo_url(&self, vendor_id: &str) -> String {
        format!("{}/vendors/{}/logo", self.base_url, vendor_id)
    }

    /// Download a vendor logo through the authenticated pipeline.
    pub async fn fetch_vendor_logo(&self, vendor_id: &str) -> Result<Vec<u8>, ApiError> {
        let request = ApiRequest::get(format!("/vendors/{vendor_id}/logo"));
        let response = Self::ok(self.pipeline.execute(request).await?)?;
        Ok(response.body)
    }

    fn text_field(name: &str, value: impl Into<String>) -> FormField {
        FormField::Text {
            name: name.to_string(),
            value: value.into(),
        }
    }

    fn file_field(name: &str, image: &CardImage) -> FormField {
        FormField::File {
            name: name.to_string(),
            filename: image.filename.clone(),
            content_type: image.content_type.clone(),
            bytes: image.bytes.clone(),
        }
    }
}
