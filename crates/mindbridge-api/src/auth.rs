use serde::{Deserialize, Serialize};
use tracing::info;

use mindbridge_core::models::user::{Credentials, LoginRequest, SignupRequest, User};

use crate::client::ApiClient;
use crate::error::ApiError;

/// The `{"message": ...}` acknowledgement most mutating endpoints return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: String,
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: User,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl LoginResponse {
    pub fn into_credentials(self, now: jiff::Timestamp) -> Credentials {
        Credentials::issued(
            self.access_token,
            self.token_type,
            self.user,
            self.expires_in,
            now,
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenRefresh {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl TokenRefresh {
    /// New credentials for the same user, expiring `expires_in` after `now`.
    pub fn into_credentials(self, user: User, now: jiff::Timestamp) -> Credentials {
        Credentials::issued(
            self.access_token,
            self.token_type,
            user,
            self.expires_in,
            now,
        )
    }
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Serialize)]
struct MobileBody<'a> {
    mobile: &'a str,
}

#[derive(Serialize)]
struct OtpBody<'a> {
    mobile: &'a str,
    otp: &'a str,
}

/// Exchange mobile + password for a bearer token.
pub async fn login(client: &ApiClient, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
    info!(mobile = %request.mobile, "logging in");
    client.post_json(&["api", "auth", "login"], request).await
}

pub async fn signup(client: &ApiClient, request: &SignupRequest) -> Result<MessageResponse, ApiError> {
    info!(mobile = %request.mobile, role = %request.role, "signing up");
    client.post_json(&["api", "auth", "signup"], request).await
}

pub async fn send_otp(client: &ApiClient, mobile: &str) -> Result<MessageResponse, ApiError> {
    client
        .post_json(&["api", "auth", "send-otp"], &MobileBody { mobile })
        .await
}

pub async fn verify_otp(
    client: &ApiClient,
    mobile: &str,
    otp: &str,
) -> Result<MessageResponse, ApiError> {
    client
        .post_json(&["api", "auth", "verify-otp"], &OtpBody { mobile, otp })
        .await
}

/// Reset a password. The backend expects the OTP to have been verified
/// beforehand with [`verify_otp`].
pub async fn change_password(
    client: &ApiClient,
    request: &LoginRequest,
) -> Result<MessageResponse, ApiError> {
    client
        .post_json(&["api", "auth", "change-password"], request)
        .await
}

/// Token invalidation is client-side; this only informs the server.
pub async fn logout(client: &ApiClient) -> Result<MessageResponse, ApiError> {
    client
        .post_json(&["api", "auth", "logout"], &serde_json::json!({}))
        .await
}

/// Trade a still-valid token for a fresh one.
pub async fn refresh_token(client: &ApiClient) -> Result<TokenRefresh, ApiError> {
    client.require_token()?;
    client
        .post_json(&["api", "auth", "refresh-token"], &serde_json::json!({}))
        .await
}

#[derive(Deserialize)]
struct ProfileEnvelope {
    user: User,
}

pub async fn profile(client: &ApiClient) -> Result<User, ApiError> {
    client.require_token()?;
    let envelope: ProfileEnvelope = client.get_json(&["api", "auth", "profile"]).await?;
    Ok(envelope.user)
}
