//! Thin JSON client for the AniTinder REST API.
//!
//! Every request passes through the registered [`Interceptor`]s: they decorate
//! the outgoing request and observe the response status. The session context
//! is always registered, so bearer tokens and the unauthorized-means-logout
//! rule apply to every call site without the call site knowing about them.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::ApiConfig;
use crate::error::{ClientError, Result, extract_error_message};
use crate::session::SessionContext;

pub trait Interceptor: Send + Sync {
    fn on_request(&self, request: RequestBuilder) -> RequestBuilder {
        request
    }

    fn on_response(&self, _status: StatusCode) {}
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    session: Arc<SessionContext>,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("interceptors", &self.interceptors.len())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(config: &ApiConfig, session: Arc<SessionContext>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Self::with_client(client, &config.base_url, session)
    }

    pub fn with_client(client: Client, base_url: &str, session: Arc<SessionContext>) -> Result<Self> {
        let base_url = normalize_base(base_url)?;
        let interceptors = vec![session.clone() as Arc<dyn Interceptor>];

        Ok(Self {
            client,
            base_url,
            session,
            interceptors,
        })
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.url(path)?;
        Ok(self.request_url(method, url))
    }

    /// A request that bypasses the interceptors, so no stored token rides
    /// along. The credential endpoints must not see a stale one.
    pub fn anonymous_request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        Ok(self.client.request(method, self.url(path)?))
    }

    fn request_url(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.client.request(method, url);
        self.interceptors
            .iter()
            .fold(request, |req, interceptor| interceptor.on_request(req))
    }

    /// Executes a request and lets every interceptor observe the status.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        debug!(url = %response.url(), %status, "API response");

        for interceptor in &self.interceptors {
            interceptor.on_response(status);
        }

        check_status(response, true).await
    }

    /// Executes a request without the response hooks.
    ///
    /// Used for the credential endpoints, where a 401 means "wrong password"
    /// rather than "session expired"; it surfaces as
    /// [`ClientError::Validation`] carrying the server's message.
    pub async fn send_unguarded(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        debug!(url = %response.url(), status = %response.status(), "API response (unguarded)");
        check_status(response, false).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.request(Method::GET, path)?;
        decode(self.send(request).await?).await
    }

    pub async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let mut url = self.url(path)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        let request = self.request_url(Method::GET, url);
        decode(self.send(request).await?).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.request(Method::POST, path)?.json(body);
        decode(self.send(request).await?).await
    }

    /// POST without a body, ignoring whatever the server answers.
    pub async fn post_empty(&self, path: &str) -> Result<()> {
        let request = self.request(Method::POST, path)?;
        self.send(request).await?;
        Ok(())
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.request(Method::PUT, path)?.json(body);
        decode(self.send(request).await?).await
    }

    pub async fn put_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T> {
        let request = self.request(Method::PUT, path)?.multipart(form);
        decode(self.send(request).await?).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let request = self.request(Method::DELETE, path)?;
        self.send(request).await?;
        Ok(())
    }
}

fn normalize_base(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

async fn check_status(response: Response, guarded: bool) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = extract_error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    });
    if status == StatusCode::UNAUTHORIZED && !guarded {
        return Err(ClientError::Validation(message));
    }
    Err(ClientError::from_status(status, message))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        let truncated = if text.len() > 500 {
            let mut end = 500;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &text[..end])
        } else {
            text.clone()
        };
        debug!(error = %e, response = %truncated, "Failed to parse API response");
        ClientError::Decode(e.to_string())
    })
}
