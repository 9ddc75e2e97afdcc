//! HTTP client for the registry API.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use sweep_core::api::{ApiResult, Method, RegistryApi};
use sweep_core::package::{PackageRef, open_pull_requests_path};
use sweep_core::version::{PackageInfo, PullRequest, VersionRecord};

use crate::Config;

/// Media type requested from the registry API.
pub const ACCEPT_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Header pinning the REST API version.
pub const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";

/// REST API version sent with every request.
pub const API_VERSION: &str = "2022-11-28";

/// API client for the registry and pull request endpoints.
///
/// Every call issues exactly one request; nothing is retried.
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Creates a new API client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_MEDIA_TYPE));
        headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("sweep/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
        })
    }

    /// Issues a request and decodes the JSON body.
    ///
    /// The body is decoded whatever the status code; callers decide whether
    /// the status is acceptable.
    pub async fn request<T: DeserializeOwned>(&self, path: &str, method: Method) -> ApiResult<T> {
        let response = match self.send(path, method).await {
            Ok(response) => response,
            Err(message) => return ApiResult::TransportError { message },
        };

        let status = response.status().as_u16();
        match response.json::<T>().await {
            Ok(payload) => ApiResult::Ok { status, payload },
            Err(e) => ApiResult::ParseError {
                status,
                message: e.to_string(),
            },
        }
    }

    /// Issues a request and ignores the body.
    pub async fn request_status(&self, path: &str, method: Method) -> ApiResult<()> {
        match self.send(path, method).await {
            Ok(response) => ApiResult::Ok {
                status: response.status().as_u16(),
                payload: (),
            },
            Err(message) => ApiResult::TransportError { message },
        }
    }

    async fn send(&self, path: &str, method: Method) -> std::result::Result<Response, String> {
        let url = format!("{}{path}", self.base_url);

        let mut req = self.client.request(http_method(method), &url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        tracing::trace!(method = %method, url = %url, "sending request");
        req.send().await.map_err(|e| e.to_string())
    }
}

fn http_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl RegistryApi for ApiClient {
    async fn get_package(&self, package: &PackageRef) -> ApiResult<PackageInfo> {
        self.request(&package.package_path(), Method::Get).await
    }

    async fn list_versions(
        &self,
        package: &PackageRef,
        page: u32,
        per_page: u32,
    ) -> ApiResult<Vec<VersionRecord>> {
        self.request(&package.versions_path(page, per_page), Method::Get)
            .await
    }

    async fn list_open_pull_requests(
        &self,
        repo_full_name: &str,
        per_page: u32,
    ) -> ApiResult<Vec<PullRequest>> {
        self.request(
            &open_pull_requests_path(repo_full_name, per_page),
            Method::Get,
        )
        .await
    }

    async fn delete_version(&self, package: &PackageRef, version_id: u64) -> ApiResult<()> {
        self.request_status(&package.version_path(version_id), Method::Delete)
            .await
    }
}
