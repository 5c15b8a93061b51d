//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub success: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SessionResponse {
    pub user_id: String,
    pub username: String,
    pub currency: String,
    pub timezone: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn login_request_tolerates_missing_fields() -> Result<()> {
        let request: LoginRequest = serde_json::from_str(r#"{"username":"alice"}"#)?;
        assert_eq!(request.username, "alice");
        assert!(request.password.is_empty());
        Ok(())
    }

    #[test]
    fn login_request_debug_hides_password() {
        let request = LoginRequest {
            username: "alice".to_string(),
            password: "hunter22".to_string(),
        };
        assert!(!format!("{request:?}").contains("hunter22"));
    }
}
