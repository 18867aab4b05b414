use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /register`.
///
/// Missing fields deserialize as empty strings so the server can answer with a
/// validation error instead of a generic JSON rejection.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub account_id: i64,
    pub username: String,
    pub message: String,
}

/// Body of `POST /login`. Same shape as [`RegisterRequest`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_tolerates_missing_fields() {
        let parsed: RegisterRequest =
            serde_json::from_str(r#"{"username":"alice"}"#).expect("parse sample");
        assert_eq!(parsed.username, "alice");
        assert!(parsed.password.is_empty());
    }

    #[test]
    fn login_response_uses_camel_case() {
        let body = LoginResponse {
            token: "t".to_string(),
            expires_at: DateTime::parse_from_rfc3339("2030-01-01T00:00:00Z")
                .expect("valid timestamp")
                .with_timezone(&Utc),
            message: "Login successful".to_string(),
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert!(json.get("expiresAt").is_some());
        assert!(json.get("expires_at").is_none());
    }
}
