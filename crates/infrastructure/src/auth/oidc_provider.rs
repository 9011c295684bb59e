//! OpenID Connect identity provider.
//!
//! Interactive login uses the authorization-code flow with PKCE (S256);
//! silent renewal posts a `refresh_token` grant to the token endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tether_application::ports::{IdentityError, IdentityProvider};
use tether_domain::{AuthorizeOptions, TokenSet};
use url::Url;

use super::agent::AuthorizationAgent;
use super::pkce::{pkce_challenge, random_url_safe};
use crate::error::{InfrastructureError, InfrastructureResult};

/// Content-Type for form-urlencoded data.
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Error the provider returns when the user declines the consent screen.
const ACCESS_DENIED: &str = "access_denied";

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Token endpoint error response.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Tenant and client registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OidcSettings {
    /// Tenant base URL, e.g. `https://tenant.example.com`.
    pub domain: String,
    /// Public client id.
    pub client_id: String,
    /// API audience requested at login.
    pub audience: Option<String>,
    /// Limit for each token endpoint call.
    pub timeout: Duration,
}

/// [`IdentityProvider`] backed by an OIDC tenant.
pub struct OidcIdentityProvider {
    http_client: reqwest::Client,
    authorize_endpoint: Url,
    token_endpoint: Url,
    settings: OidcSettings,
    agent: Arc<dyn AuthorizationAgent>,
}

impl OidcIdentityProvider {
    /// Creates a provider for the tenant in `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the domain is not a valid URL or the HTTP
    /// client cannot be built.
    pub fn new(
        settings: OidcSettings,
        agent: Arc<dyn AuthorizationAgent>,
    ) -> InfrastructureResult<Self> {
        let base = settings.domain.trim_end_matches('/');
        let endpoint = |path: &str| {
            let raw = format!("{base}{path}");
            Url::parse(&raw).map_err(|e| InfrastructureError::InvalidUrl {
                url: raw,
                message: e.to_string(),
            })
        };
        let authorize_endpoint = endpoint("/authorize")?;
        let token_endpoint = endpoint("/oauth/token")?;

        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            http_client,
            authorize_endpoint,
            token_endpoint,
            settings,
            agent,
        })
    }

    fn authorize_url(
        &self,
        options: &AuthorizeOptions,
        redirect_uri: &str,
        state: &str,
        code_challenge: &str,
    ) -> Url {
        let mut url = self.authorize_endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("client_id", &self.settings.client_id);
            pairs.append_pair("response_type", "code");
            pairs.append_pair("redirect_uri", redirect_uri);
            pairs.append_pair("scope", &options.scope);
            pairs.append_pair("state", state);
            pairs.append_pair("code_challenge", code_challenge);
            pairs.append_pair("code_challenge_method", "S256");
            if !options.connection.is_empty() {
                pairs.append_pair("connection", &options.connection);
            }
            if let Some(audience) = self.settings.audience.as_deref() {
                pairs.append_pair("audience", audience);
            }
            if options.ephemeral_session {
                pairs.append_pair("prompt", "login");
            }
        }
        url
    }

    /// Posts a form to the token endpoint.
    async fn token_request(&self, params: &[(&str, &str)]) -> Result<TokenResponse, IdentityError> {
        let body = serde_urlencoded::to_string(params).map_err(|e| IdentityError::Network {
            message: format!("Failed to encode form: {e}"),
        })?;

        let response = self
            .http_client
            .post(self.token_endpoint.clone())
            .header("Content-Type", FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<TokenErrorResponse>(&error_text).map_or_else(
                |_| format!("token request failed with {status}: {error_text}"),
                |error| error.error_description.unwrap_or(error.error),
            );
            return Err(IdentityError::Rejected { message });
        }

        response.json().await.map_err(|e| {
            if e.is_timeout() {
                return self.transport_error(&e);
            }
            IdentityError::Network {
                message: format!("Failed to parse token response: {e}"),
            }
        })
    }

    fn transport_error(&self, error: &reqwest::Error) -> IdentityError {
        let message = if error.is_timeout() {
            format!(
                "token request timed out after {} ms",
                self.settings.timeout.as_millis()
            )
        } else {
            error.to_string()
        };
        IdentityError::Network { message }
    }
}

/// Reads `code` from the redirect after checking `state` and provider errors.
fn authorization_code(callback: &Url, expected_state: &str) -> Result<String, IdentityError> {
    let mut code = None;
    let mut state = None;
    let mut error = None;
    let mut error_description = None;
    for (key, value) in callback.query_pairs() {
        match &*key {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => error_description = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        if error == ACCESS_DENIED {
            return Err(IdentityError::UserCancelled);
        }
        return Err(IdentityError::Rejected {
            message: error_description.unwrap_or(error),
        });
    }
    if state.as_deref() != Some(expected_state) {
        return Err(IdentityError::InvalidCallback {
            message: "state mismatch".to_string(),
        });
    }
    code.ok_or_else(|| IdentityError::InvalidCallback {
        message: "missing authorization code".to_string(),
    })
}

fn into_token_set(response: TokenResponse) -> Result<TokenSet, IdentityError> {
    let id_token = response.id_token.ok_or_else(|| IdentityError::Rejected {
        message: "token response has no id_token".to_string(),
    })?;
    Ok(TokenSet {
        access_token: response.access_token,
        id_token,
        refresh_token: response.refresh_token,
    })
}

#[async_trait]
impl IdentityProvider for OidcIdentityProvider {
    async fn authorize(&self, options: &AuthorizeOptions) -> Result<TokenSet, IdentityError> {
        let state = random_url_safe();
        let code_verifier = random_url_safe();
        let redirect_uri = self.agent.redirect_uri();
        let url = self.authorize_url(
            options,
            &redirect_uri,
            &state,
            &pkce_challenge(&code_verifier),
        );

        let callback = self.agent.authorize(&url).await?;
        let code = authorization_code(&callback, &state)?;

        let response = self
            .token_request(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.settings.client_id.as_str()),
                ("code", code.as_str()),
                ("code_verifier", code_verifier.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
            ])
            .await?;
        into_token_set(response)
    }

    async fn refresh_token(
        &self,
        refresh_token: &str,
        scope: &str,
    ) -> Result<TokenSet, IdentityError> {
        let response = self
            .token_request(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.settings.client_id.as_str()),
                ("refresh_token", refresh_token),
                ("scope", scope),
            ])
            .await?;
        let mut tokens = into_token_set(response)?;
        if tokens.refresh_token().is_none() {
            tokens.refresh_token = Some(refresh_token.to_string());
        }
        Ok(tokens)
    }
}
