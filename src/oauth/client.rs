use crate::{config::HubSpotConfig, error::AppError};
use oauth2::{
    AuthUrl, ClientId, ClientSecret, EndpointNotSet, EndpointSet, RedirectUrl, TokenUrl,
    basic::BasicClient,
};

// Avoid oauth2 type madness
pub type Oauth2Client =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Build the oauth2 client for the configured HubSpot app.
///
/// Only the authorize-URL side of the client is exercised: the code
/// exchange goes through reqwest directly so the provider's raw token
/// response can be kept verbatim.
pub fn build_oauth_client(hubspot: &HubSpotConfig) -> Result<Oauth2Client, AppError> {
    let auth_url = AuthUrl::new(hubspot.authorization_url.clone())
        .map_err(|e| AppError::Internal(format!("Invalid authorization URL: {}", e)))?;

    let token_url = TokenUrl::new(hubspot.token_url.clone())
        .map_err(|e| AppError::Internal(format!("Invalid token URL: {}", e)))?;

    let redirect_url = RedirectUrl::new(hubspot.redirect_uri.clone())
        .map_err(|e| AppError::Internal(format!("Invalid redirect URI: {}", e)))?;

    Ok(BasicClient::new(ClientId::new(hubspot.client_id.clone()))
        .set_client_secret(ClientSecret::new(hubspot.client_secret.clone()))
        .set_auth_uri(auth_url)
        .set_token_uri(token_url)
        .set_redirect_uri(redirect_url))
}
