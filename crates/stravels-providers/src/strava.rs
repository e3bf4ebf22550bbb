// ABOUTME: Strava OAuth and REST client implementing the external service facade
// ABOUTME: Builds authorization URLs, exchanges codes, deauthorizes, and fetches paginated resources
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info, warn};
use url::Url;

use crate::constants::strava;
use crate::errors::{ErrorCode, ServiceError, ServiceResult};
use crate::facade::ExternalServiceFacade;
use crate::http_client::shared_client;
use crate::models::{
    AccessToken, AthleteProfile, AuthorizationCode, ResourceKind, ResourcePage, TokenGrant,
};
use crate::rate_limit::RateLimitUsage;
use stravels_core::redirect::{classify_redirect, RedirectOutcome};

/// Settings the Strava client needs; usually built from the environment by the caller
#[derive(Debug, Clone)]
pub struct StravaClientConfig {
    /// OAuth client id
    pub client_id: Option<String>,
    /// OAuth client secret
    pub client_secret: Option<String>,
    /// Redirect URI registered with Strava
    pub redirect_uri: String,
    /// Requested OAuth scopes
    pub scopes: Vec<String>,
    /// Strava origin, without trailing slash
    pub base_url: String,
    /// Items per page for paginated fetches
    pub per_page: u32,
}

impl Default for StravaClientConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: strava::DEFAULT_REDIRECT_URI.to_owned(),
            scopes: vec![strava::DEFAULT_SCOPES.to_owned()],
            base_url: strava::BASE_URL.to_owned(),
            per_page: strava::DEFAULT_PER_PAGE,
        }
    }
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    athlete: AthleteProfile,
}

/// Strava client holding the session token once the exchange succeeded
pub struct StravaClient {
    config: StravaClientConfig,
    http: Client,
    token: RwLock<Option<AccessToken>>,
    athlete: RwLock<Option<AthleteProfile>>,
    usage: RwLock<RateLimitUsage>,
}

impl StravaClient {
    /// Create a client on the shared connection pool
    #[must_use]
    pub fn new(config: StravaClientConfig) -> Self {
        Self::with_http_client(config, shared_client().clone())
    }

    /// Create a client on a caller-provided HTTP client
    #[must_use]
    pub fn with_http_client(mut config: StravaClientConfig, http: Client) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_owned();
        config.per_page = config.per_page.clamp(1, strava::MAX_PER_PAGE);
        Self {
            config,
            http,
            token: RwLock::new(None),
            athlete: RwLock::new(None),
            usage: RwLock::new(RateLimitUsage::default()),
        }
    }

    /// Seed the client with a previously issued token
    #[must_use]
    pub fn with_access_token(self, token: AccessToken) -> Self {
        self.set_access_token(Some(token));
        self
    }

    /// Replace the bearer token used for API calls
    pub fn set_access_token(&self, token: Option<AccessToken>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// Whether a bearer token is held
    #[must_use]
    pub fn has_access_token(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Profile of the athlete the current token belongs to, if known
    #[must_use]
    pub fn athlete(&self) -> Option<AthleteProfile> {
        self.athlete
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rate limit usage observed on the last API response
    #[must_use]
    pub fn usage(&self) -> RateLimitUsage {
        *self.usage.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Client configuration
    #[must_use]
    pub const fn config(&self) -> &StravaClientConfig {
        &self.config
    }

    fn client_credentials(&self) -> ServiceResult<(&str, &str)> {
        let client_id = self
            .config
            .client_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ServiceError::config_missing("STRAVA_CLIENT_ID"))?;
        let client_secret = self
            .config
            .client_secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| ServiceError::config_missing("STRAVA_CLIENT_SECRET"))?;
        Ok((client_id, client_secret))
    }

    fn bearer(&self, request: RequestBuilder) -> ServiceResult<RequestBuilder> {
        let token = self
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| ServiceError::unauthorized("no Strava access token"))?;
        Ok(request.bearer_auth(token.as_str()))
    }

    fn record_usage(&self, response: &Response) {
        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
        };
        let (Some(limit), Some(usage)) = (
            header(strava::RATE_LIMIT_HEADER),
            header(strava::RATE_USAGE_HEADER),
        ) else {
            return;
        };
        if let Some(parsed) = RateLimitUsage::from_headers(limit, usage) {
            debug!(short = ?parsed.short, long = ?parsed.long, "Strava rate limit usage");
            *self.usage.write().unwrap_or_else(PoisonError::into_inner) = parsed;
        }
    }

    async fn check_status(response: Response) -> ServiceResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        if status.as_u16() == 429 {
            return Err(ServiceError::rate_limited(body));
        }
        Err(ServiceError::service(status.as_u16(), body))
    }

    async fn get_page(&self, kind: ResourceKind, path: &str, page: u32) -> ServiceResult<ResourcePage> {
        // Strava pages are 1-based
        let strava_page = page
            .checked_add(1)
            .ok_or_else(|| ServiceError::validation("page out of range"))?;
        let url = format!("{}{}{path}", self.config.base_url, strava::API_PREFIX);
        let query = [
            ("page", strava_page.to_string()),
            ("per_page", self.config.per_page.to_string()),
        ];
        let request = self.bearer(self.http.get(&url).query(&query))?;

        debug!(kind = %kind, page, "Fetching Strava page");
        let response = request.send().await?;
        self.record_usage(&response);
        let response = Self::check_status(response).await?;
        let data: serde_json::Value = response.json().await?;
        Ok(ResourcePage::new(page, data))
    }
}

#[async_trait]
impl ExternalServiceFacade for StravaClient {
    async fn generate_authorization_url(&self) -> ServiceResult<String> {
        let client_id = self
            .config
            .client_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ServiceError::config_missing("STRAVA_CLIENT_ID"))?;

        let mut url = Url::parse(&format!("{}{}", self.config.base_url, strava::AUTHORIZE_PATH))
            .map_err(|e| ServiceError::new(ErrorCode::ConfigInvalid, e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scopes.join(","))
            .append_pair("approval_prompt", "force")
            .append_pair("redirect_uri", &self.config.redirect_uri);

        Ok(url.into())
    }

    async fn exchange_authorization_response(
        &self,
        redirect_url: &str,
    ) -> ServiceResult<AuthorizationCode> {
        match classify_redirect(redirect_url, &self.config.redirect_uri) {
            RedirectOutcome::Code(code) => Ok(code),
            RedirectOutcome::AccessDenied => Err(ServiceError::new(
                ErrorCode::AccessDenied,
                "athlete declined the authorization",
            )),
            RedirectOutcome::Ignored => Err(ServiceError::validation(
                "redirect does not match the configured redirect URI",
            )),
            RedirectOutcome::Malformed => Err(ServiceError::validation(
                "redirect carries no authorization code",
            )),
        }
    }

    async fn exchange_code(&self, code: &AuthorizationCode) -> ServiceResult<TokenGrant> {
        let (client_id, client_secret) = self.client_credentials()?;
        let url = format!("{}{}", self.config.base_url, strava::TOKEN_PATH);
        let params = [
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self.http.post(&url).form(&params).send().await?;
        let response = Self::check_status(response).await?;
        let body: TokenResponse = response.json().await?;

        let token = AccessToken::new(body.access_token);
        self.set_access_token(Some(token.clone()));
        *self.athlete.write().unwrap_or_else(PoisonError::into_inner) = Some(body.athlete.clone());

        info!(athlete_id = body.athlete.id, "Strava token exchange completed");
        Ok(TokenGrant {
            token,
            user: body.athlete,
        })
    }

    async fn invalidate_session(&self) -> ServiceResult<()> {
        let url = format!("{}{}", self.config.base_url, strava::DEAUTHORIZE_PATH);
        let request = self.bearer(self.http.post(&url))?;

        let response = request.send().await?;
        if let Err(e) = Self::check_status(response).await {
            warn!(error = %e, "Strava deauthorization failed");
            return Err(e);
        }

        self.set_access_token(None);
        *self.athlete.write().unwrap_or_else(PoisonError::into_inner) = None;
        info!("Strava session invalidated");
        Ok(())
    }

    async fn fetch_athlete(&self) -> ServiceResult<AthleteProfile> {
        let url = format!(
            "{}{}{}",
            self.config.base_url,
            strava::API_PREFIX,
            strava::ATHLETE_PATH
        );
        let request = self.bearer(self.http.get(&url))?;

        let response = request.send().await?;
        self.record_usage(&response);
        let response = Self::check_status(response).await?;
        let athlete: AthleteProfile = response.json().await?;

        debug!(athlete_id = athlete.id, "Strava athlete loaded");
        *self.athlete.write().unwrap_or_else(PoisonError::into_inner) = Some(athlete.clone());
        Ok(athlete)
    }

    async fn fetch_activities(&self, page: u32) -> ServiceResult<ResourcePage> {
        self.get_page(ResourceKind::Activities, "/athlete/activities", page)
            .await
    }

    async fn fetch_connections(&self, page: u32) -> ServiceResult<ResourcePage> {
        let path = self.athlete().map_or_else(
            || "/athlete/friends".to_owned(),
            |athlete| format!("/athletes/{}/friends", athlete.id),
        );
        self.get_page(ResourceKind::Connections, &path, page).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn configured() -> StravaClientConfig {
        StravaClientConfig {
            client_id: Some("1234".to_owned()),
            client_secret: Some("secret".to_owned()),
            base_url: "https://example.test/".to_owned(),
            ..StravaClientConfig::default()
        }
    }

    #[tokio::test]
    async fn test_authorization_url_contains_oauth_parameters() {
        let client = StravaClient::with_http_client(configured(), Client::new());
        let url = Url::parse(&client.generate_authorization_url().await.unwrap()).unwrap();

        assert_eq!(url.path(), "/oauth/authorize");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("client_id".to_owned(), "1234".to_owned())));
        assert!(pairs.contains(&("response_type".to_owned(), "code".to_owned())));
        assert!(pairs.contains(&("approval_prompt".to_owned(), "force".to_owned())));
        assert!(pairs.contains(&(
            "redirect_uri".to_owned(),
            "stravels://localhost/auth/strava".to_owned()
        )));
    }

    #[tokio::test]
    async fn test_authorization_url_requires_client_id() {
        let client = StravaClient::with_http_client(StravaClientConfig::default(), Client::new());
        let err = client.generate_authorization_url().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigMissing);
    }

    #[tokio::test]
    async fn test_redirect_exchange_extracts_code() {
        let client = StravaClient::with_http_client(configured(), Client::new());
        let code = client
            .exchange_authorization_response("stravels://localhost/auth/strava&code=XYZ")
            .await
            .unwrap();
        assert_eq!(code.as_str(), "XYZ");

        let denied = client
            .exchange_authorization_response(
                "stravels://localhost/auth/strava?error=access_denied",
            )
            .await
            .unwrap_err();
        assert_eq!(denied.code, ErrorCode::AccessDenied);

        let malformed = client
            .exchange_authorization_response("stravels://localhost/auth/strava")
            .await
            .unwrap_err();
        assert_eq!(malformed.code, ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_calls_without_token_fail_before_network() {
        let client = StravaClient::with_http_client(configured(), Client::new());
        assert!(!client.has_access_token());
        let err = client.invalidate_session().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthRequired);
        let err = client.fetch_activities(0).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthRequired);
        let err = client.fetch_athlete().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthRequired);
        assert!(client.athlete().is_none());
    }

    #[tokio::test]
    async fn test_last_page_number_is_rejected() {
        let client = StravaClient::with_http_client(configured(), Client::new());
        let err = client.fetch_activities(u32::MAX).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);

        let client = client.with_access_token(AccessToken::new("t"));
        let err = client.fetch_connections(u32::MAX).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_config_normalization() {
        let config = StravaClientConfig {
            per_page: 5000,
            ..configured()
        };
        let client = StravaClient::with_http_client(config, Client::new())
            .with_access_token(AccessToken::new("t"));
        assert_eq!(client.config().base_url, "https://example.test");
        assert_eq!(client.config().per_page, strava::MAX_PER_PAGE);
        assert!(client.has_access_token());
    }
}
