//! # Authentication Module
//!
//! Credential acquisition and authenticated handles for Google APIs.
//!
//! ## Overview
//!
//! [`Authenticator::get_handle`] returns a [`ServiceHandle`] for `"drive"` or
//! `"mail"`. Client secrets, tokens and the user profile are read from a
//! [`SecureStore`](bridge_traits::storage::SecureStore); on desktop this is
//! the auth directory holding `credentials.json`, `token.json` and
//! `user.json`.
//!
//! ## Features
//!
//! - OAuth 2.0 authorization code flow with PKCE
//! - Refresh of expired access tokens, persisted after each refresh
//! - Token storage compatible with Google's authorized-user JSON
//! - Redacting `Debug` implementations for every secret-bearing type

pub mod authenticator;
pub mod error;
pub mod handle;
pub mod oauth;
pub mod token_store;
pub mod types;

pub use authenticator::Authenticator;
pub use error::{AuthError, Result};
pub use handle::ServiceHandle;
pub use oauth::{OAuthConfig, OAuthFlowManager, PkceVerifier};
pub use token_store::TokenStore;
pub use types::{AuthInfo, ClientSecrets, OAuthTokens, ServiceKind, UserProfile, SCOPES};
