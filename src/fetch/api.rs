use crate::{Error, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Thin JSON client for REST APIs (debrid services, artwork providers).
///
/// No cookie jar and no response cache; API responses are either cached at
/// a higher level or must stay fresh.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    bearer: Option<String>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent(concat!("bifrost/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            bearer: None,
        }
    }

    /// Attach a bearer token sent with every request
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Build full URL from endpoint
    #[must_use]
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Execute GET request and parse JSON response
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let request = self.client.get(self.url(endpoint));
        let response = self.authorized(request).send().await?;
        Self::handle_response(response).await
    }

    /// Execute GET request with query parameters
    pub async fn get_with_params<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let request = self.client.get(self.url(endpoint)).query(params);
        let response = self.authorized(request).send().await?;
        Self::handle_response(response).await
    }

    /// Execute form POST and parse JSON response
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        form: &[(&str, &str)],
    ) -> Result<T> {
        let request = self.client.post(self.url(endpoint)).form(form);
        let response = self.authorized(request).send().await?;
        Self::handle_response(response).await
    }

    /// Execute DELETE request, ignoring the response body
    pub async fn delete(&self, endpoint: &str) -> Result<()> {
        let request = self.client.delete(self.url(endpoint));
        let response = self.authorized(request).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            })
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Handle response and parse JSON
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if status.as_u16() == 401 {
            return Err(Error::Auth("unauthorized".to_string()));
        }
        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(1);
            return Err(Error::RateLimit(Duration::from_secs(retry_after)));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::Parse(format!("JSON parse error: {e}")))
    }
}
