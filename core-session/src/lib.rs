//! # Session Core
//!
//! Credential lifecycle for a single-operator cloud storage gateway.
//!
//! ## Overview
//!
//! This crate owns everything below the provider API surface:
//!
//! - loading and persisting the authorized-user credential file
//! - the interactive OAuth 2.0 consent flow (loopback redirect, PKCE)
//! - the authorized client handle that mints access tokens on demand
//! - the HTTP transport abstraction the rest of the system talks through
//!
//! Higher layers construct a [`SessionConfig`] once at startup and drive the
//! pieces through [`CredentialStore`], [`AuthorizationFlow`] and
//! [`AuthorizedClient`].

pub mod client;
pub mod config;
pub mod consent;
pub mod error;
pub mod handle;
pub mod http;
pub mod oauth;
pub mod store;
pub mod types;

pub use client::ReqwestHttpClient;
pub use config::SessionConfig;
pub use consent::{AuthorizationFlow, ConsentOutcome, LoopbackConsentFlow};
pub use error::{Result, SessionError};
pub use handle::AuthorizedClient;
pub use http::{ByteReader, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse};
pub use store::CredentialStore;
pub use types::{AccessToken, ClientSecretKey, StoredCredential, CREDENTIAL_KIND};
