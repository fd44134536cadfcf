//! Types for authentication and account identity

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::auth::Session;

/// The signed-in identity handed to the modules that need one.
///
/// Passed explicitly wherever eligibility depends on who is acting; nothing
/// in this crate reads it from ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// The account id assigned by the authentication service
    pub id: String,
    /// The account email, when known
    pub email: Option<String>,
}

/// Authentication response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The user data
    pub user: Option<User>,

    /// The session data
    pub session: Option<Session>,

    /// The access token
    pub access_token: Option<String>,

    /// The refresh token
    pub refresh_token: Option<String>,

    /// The token type
    pub token_type: Option<String>,

    /// The expiry time in seconds
    pub expires_in: Option<i64>,

    /// Any error that occurred
    pub error: Option<String>,

    /// The error description
    pub error_description: Option<String>,
}

/// User data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// The user ID
    pub id: String,

    /// The user's email address
    pub email: Option<String>,

    /// Whether the email has been confirmed
    pub email_confirmed_at: Option<String>,

    /// The last sign-in time
    pub last_sign_in_at: Option<String>,

    /// The creation time
    pub created_at: String,

    /// The update time
    pub updated_at: Option<String>,

    /// The user's role
    pub role: Option<String>,

    /// The user metadata
    #[serde(default)]
    pub user_metadata: HashMap<String, serde_json::Value>,
}

impl User {
    /// The principal this user acts as
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id.clone(),
            email: self.email.clone(),
        }
    }
}

/// User attributes that can be updated
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UserAttributes {
    /// Email address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// User metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}
