//! Authentication and account identity for the Lotwise marketplace
//!
//! Wraps the hosted authentication service. Everything downstream of this
//! module consumes a [`Principal`]; the session and token mechanics stay in
//! here.

mod session;
mod types;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::config::ClientOptions;
use crate::error::Error;
use crate::fetch::Fetch;

pub use session::*;
pub use types::*;

/// Client for the authentication service
pub struct Auth {
    /// The base URL for the project
    url: String,

    /// The anonymous API key for the project
    key: String,

    /// HTTP client used for requests
    client: Client,

    /// The current session
    session: Arc<Mutex<Option<Session>>>,

    /// Client options
    options: ClientOptions,
}

/// Claims carried by a marketplace access token
#[derive(Debug, Deserialize)]
struct AccessClaims {
    sub: String,
    email: Option<String>,
}

/// Re-tag generic request failures from the auth endpoints
fn auth_err(e: Error) -> Error {
    match e {
        Error::Data(msg) => Error::Auth(msg),
        other => other,
    }
}

impl Auth {
    /// Create a new Auth client
    pub(crate) fn new(url: &str, key: &str, client: Client, options: ClientOptions) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            client,
            session: Arc::new(Mutex::new(None)),
            options,
        }
    }

    fn get_auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.url, path)
    }

    fn store_session(&self, response: &AuthResponse) {
        if !self.options.persist_session {
            return;
        }
        if let Some(ref session) = response.session {
            let mut current_session = self.session.lock().unwrap();
            *current_session = Some(session.clone());
        } else if let (Some(access), Some(refresh)) =
            (&response.access_token, &response.refresh_token)
        {
            let session = Session::new(
                access.clone(),
                refresh.clone(),
                response.expires_in.unwrap_or(3600),
                response.user.clone(),
            );
            let mut current_session = self.session.lock().unwrap();
            *current_session = Some(session);
        }
    }

    /// Sign up a new user with email and password
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthResponse, Error> {
        let url = self.get_auth_url("/signup");

        let mut body = HashMap::new();
        body.insert("email".to_string(), email.to_string());
        body.insert("password".to_string(), password.to_string());

        let result = Fetch::post(&self.client, &url)
            .apikey(&self.key)
            .json(&body)?
            .execute::<AuthResponse>()
            .await
            .map_err(auth_err)?;

        info!(email, "signed up");
        self.store_session(&result);

        Ok(result)
    }

    /// Sign in a user with email and password
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, Error> {
        let url = self.get_auth_url("/token?grant_type=password");

        let mut body = HashMap::new();
        body.insert("email".to_string(), email.to_string());
        body.insert("password".to_string(), password.to_string());

        let result = Fetch::post(&self.client, &url)
            .apikey(&self.key)
            .json(&body)?
            .execute::<AuthResponse>()
            .await
            .map_err(auth_err)?;

        info!(email, "signed in");
        self.store_session(&result);

        Ok(result)
    }

    /// Sign out the current user
    pub async fn sign_out(&self) -> Result<(), Error> {
        let url = self.get_auth_url("/logout");

        let token = {
            let current_session = self.session.lock().unwrap();
            match *current_session {
                Some(ref session) => session.access_token.clone(),
                None => return Err(Error::AuthRequired),
            }
        };

        Fetch::post(&self.client, &url)
            .apikey(&self.key)
            .bearer_auth(&token)
            .execute_raw()
            .await?;

        let mut current_session = self.session.lock().unwrap();
        *current_session = None;
        info!("signed out");

        Ok(())
    }

    /// Request a password reset email
    pub async fn reset_password_for_email(&self, email: &str) -> Result<(), Error> {
        let url = self.get_auth_url("/recover");

        let mut body = HashMap::new();
        body.insert("email".to_string(), email.to_string());

        Fetch::post(&self.client, &url)
            .apikey(&self.key)
            .json(&body)?
            .execute_raw()
            .await?;

        Ok(())
    }

    /// Exchange the stored refresh token for a fresh session
    pub async fn refresh_session(&self) -> Result<AuthResponse, Error> {
        let url = self.get_auth_url("/token?grant_type=refresh_token");

        let refresh_token = {
            let current_session = self.session.lock().unwrap();
            match *current_session {
                Some(ref session) => session.refresh_token.clone(),
                None => return Err(Error::AuthRequired),
            }
        };

        let mut body = HashMap::new();
        body.insert("refresh_token".to_string(), refresh_token);

        let result = Fetch::post(&self.client, &url)
            .apikey(&self.key)
            .json(&body)?
            .execute::<AuthResponse>()
            .await
            .map_err(auth_err)?;

        debug!("session refreshed");
        self.store_session(&result);

        Ok(result)
    }

    /// Get the user data for the currently authenticated user
    pub async fn get_user(&self) -> Result<User, Error> {
        let url = self.get_auth_url("/user");

        let token = self.access_token()?;

        let user = Fetch::get(&self.client, &url)
            .apikey(&self.key)
            .bearer_auth(&token)
            .execute::<User>()
            .await?;

        Ok(user)
    }

    /// Update the user data
    pub async fn update_user(&self, attributes: UserAttributes) -> Result<User, Error> {
        let url = self.get_auth_url("/user");

        let token = self.access_token()?;

        let user = Fetch::put(&self.client, &url)
            .apikey(&self.key)
            .bearer_auth(&token)
            .json(&attributes)?
            .execute::<User>()
            .await?;

        Ok(user)
    }

    /// Get the current session
    pub fn get_session(&self) -> Option<Session> {
        let current_session = self.session.lock().unwrap();
        current_session.clone()
    }

    /// Set the session
    pub fn set_session(&self, session: Session) {
        let mut current_session = self.session.lock().unwrap();
        *current_session = Some(session);
    }

    /// The access token of the current session
    pub fn access_token(&self) -> Result<String, Error> {
        let current_session = self.session.lock().unwrap();
        match *current_session {
            Some(ref session) => Ok(session.access_token.clone()),
            None => Err(Error::AuthRequired),
        }
    }

    /// The principal the current session acts as, or None when signed out.
    ///
    /// Resolved from the stored user when the sign-in response carried one,
    /// falling back to the access-token claims. No network round-trip.
    pub fn principal(&self) -> Option<Principal> {
        let current_session = self.session.lock().unwrap();
        let session = current_session.as_ref()?;

        if let Some(ref user) = session.user {
            return Some(user.principal());
        }

        principal_from_access_token(&session.access_token).ok()
    }
}

/// Decode a principal from access-token claims without verifying the
/// signature. Display identity only; the services verify the token
/// themselves on every call.
pub fn principal_from_access_token(token: &str) -> Result<Principal, Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_aud = false;

    let data = jsonwebtoken::decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(&[]),
        &validation,
    )?;

    Ok(Principal {
        id: data.claims.sub,
        email: data.claims.email,
    })
}
