//! Authentication data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::services::google::{GoogleProfile, OAuthTokens};

/// User database model
#[derive(FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub family_name: Option<String>,
    pub given_name: Option<String>,
    pub picture: Option<String>,
    pub locale: Option<String>,
    pub google_id: Option<String>,
    pub verified_email: bool,
    pub created_at: Option<String>,
}

/// Fields copied from the Google profile into a new user record
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    pub family_name: Option<String>,
    pub given_name: Option<String>,
    pub picture: Option<String>,
    pub locale: Option<String>,
    pub google_id: String,
    pub verified_email: bool,
}

impl From<&GoogleProfile> for NewUser {
    fn from(profile: &GoogleProfile) -> Self {
        Self {
            email: profile.email.clone(),
            name: profile.name.clone(),
            family_name: profile.family_name.clone(),
            given_name: profile.given_name.clone(),
            picture: profile.picture.clone(),
            locale: profile.locale.clone(),
            google_id: profile.id.clone(),
            verified_email: profile.verified_email,
        }
    }
}

/// The auth slots of a browser session
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SessionData {
    /// Anti-forgery value issued by `/google/login`, consumed by the callback
    #[serde(default)]
    pub state: Option<String>,
    /// Present once the callback has completed
    #[serde(default)]
    pub oauth_tokens: Option<OAuthTokens>,
}

impl SessionData {
    pub fn is_empty(&self) -> bool {
        self.state.is_none() && self.oauth_tokens.is_none()
    }
}
