//! OAuth2 authorization-code flow against the HubSpot CRM API.
//!
//! The handshake is deliberately small: build an authorize URL with an
//! opaque state blob, validate the callback against the server-side nonce,
//! exchange the code once, and hand the resulting credentials out exactly
//! once. Everything expires out of the cache on its own.

pub mod client;
pub mod flows;
pub mod state;

pub use client::{Oauth2Client, build_oauth_client};
pub use flows::{AuthorizeResponse, CallbackQuery, OAuthFlows, StoredCredentials};
pub use state::{OAUTH_STATE_TTL_SECONDS, StateData};
