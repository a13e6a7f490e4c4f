use super::types::{
    ApiVersion, ByteRange, FileMetadataResponse, FileRef, Metadata, MetadataQuery,
    RequestNewPermissionsResponse, SearchFilesResponse,
};
use crate::core::config::Config;
use crate::core::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::RANGE;
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;

/// Header carrying the client API access key
pub const ACCESS_KEY_HEADER: &str = "Hydrus-Client-API-Access-Key";

/// Name this client registers under when asking for permissions
pub const CLIENT_NAME: &str = "hydrus-browser";

/// "search files" basic permission
pub const PERMISSION_SEARCH_FILES: u32 = 3;

/// The calls the browser depends on. `HydrusClient` talks to a live server;
/// tests provide their own implementation.
#[async_trait]
pub trait MediaApi: Send + Sync {
    async fn api_version(&self) -> Result<ApiVersion>;

    /// File ids matching every tag, in server order
    async fn search_files(&self, tags: &[String]) -> Result<Vec<u64>>;

    async fn file_metadata(&self, query: &MetadataQuery) -> Result<Vec<Metadata>>;

    async fn get_thumbnail(&self, file: &FileRef) -> Result<Bytes>;

    async fn get_file(&self, file: &FileRef, range: Option<ByteRange>) -> Result<Bytes>;

    /// URL an external player can stream the file from, if there is one
    fn stream_url(&self, _file_id: u64) -> Option<String> {
        None
    }
}

/// HTTP client for the hydrus client API.
///
/// Every call is a single GET with no retry. 200 and 206 are the only
/// statuses treated as success.
#[derive(Debug, Clone)]
pub struct HydrusClient {
    http: reqwest::Client,
    base_url: String,
    access_key: String,
}

impl HydrusClient {
    /// `base_url` must end with `/`; it is appended to otherwise.
    pub fn new(base_url: impl Into<String>, access_key: impl Into<String>) -> Result<Self> {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Url::parse(&base_url)
            .map_err(|e| Error::Config(format!("Invalid API url {:?}: {}", base_url, e)))?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("hydrus-browser/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            access_key: access_key.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.api_url(), config.settings.access_key.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        range: Option<ByteRange>,
    ) -> RequestBuilder {
        let mut builder = self
            .http
            .get(format!("{}{}", self.base_url, endpoint))
            .query(params);

        if !self.access_key.is_empty() {
            builder = builder.header(ACCESS_KEY_HEADER, &self.access_key);
        }
        if let Some(range) = range {
            builder = builder.header(RANGE, range.header_value());
        }
        builder
    }

    async fn send(&self, endpoint: &str, builder: RequestBuilder) -> Result<reqwest::Response> {
        let response = builder.send().await.map_err(|e| Error::Network {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::PARTIAL_CONTENT {
            return Ok(response);
        }

        let status_text = status.canonical_reason().unwrap_or("").to_string();
        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            status_text.clone()
        } else {
            body.trim().to_string()
        };
        tracing::debug!(endpoint, status = status.as_u16(), "request rejected");

        Err(Error::Http {
            status: status.as_u16(),
            status_text,
            message,
        })
    }

    async fn get_bytes(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        range: Option<ByteRange>,
    ) -> Result<Bytes> {
        let response = self.send(endpoint, self.request(endpoint, params, range)).await?;
        response.bytes().await.map_err(|e| Error::Network {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let body = self.get_bytes(endpoint, params, None).await?;
        serde_json::from_slice(&body)
            .map_err(|e| Error::Parsing(format!("{}: invalid response body: {}", endpoint, e)))
    }

    /// Ask the client for a new access key. The user must confirm the request
    /// in the hydrus permissions dialog.
    pub async fn request_new_permissions(&self, name: &str, permissions: &[u32]) -> Result<String> {
        let params = [
            ("name", name.to_string()),
            ("basic_permissions", serde_json::to_string(permissions)?),
        ];
        let response: RequestNewPermissionsResponse =
            self.get_json("request_new_permissions", &params).await?;
        Ok(response.access_key)
    }

    /// Direct URL to a file, with the access key as a query parameter.
    /// Media players use it to stream with their own range requests.
    pub fn file_url(&self, file_id: u64) -> Result<String> {
        let mut params = vec![("file_id", file_id.to_string())];
        if !self.access_key.is_empty() {
            params.push((ACCESS_KEY_HEADER, self.access_key.clone()));
        }
        let url = Url::parse_with_params(&format!("{}get_files/file", self.base_url), &params)
            .map_err(|e| Error::Config(format!("Invalid file url: {}", e)))?;
        Ok(url.to_string())
    }
}

#[async_trait]
impl MediaApi for HydrusClient {
    async fn api_version(&self) -> Result<ApiVersion> {
        self.get_json("api_version", &[]).await
    }

    async fn search_files(&self, tags: &[String]) -> Result<Vec<u64>> {
        let params = [("tags", serde_json::to_string(tags)?)];
        let response: SearchFilesResponse =
            self.get_json("get_files/search_files", &params).await?;
        Ok(response.file_ids)
    }

    async fn file_metadata(&self, query: &MetadataQuery) -> Result<Vec<Metadata>> {
        let (name, value) = query.query_pair()?;
        let response: FileMetadataResponse = self
            .get_json("get_files/file_metadata", &[(name, value)])
            .await?;
        Ok(response.metadata)
    }

    async fn get_thumbnail(&self, file: &FileRef) -> Result<Bytes> {
        self.get_bytes("get_files/thumbnail", &[file.query_pair()], None)
            .await
    }

    async fn get_file(&self, file: &FileRef, range: Option<ByteRange>) -> Result<Bytes> {
        self.get_bytes("get_files/file", &[file.query_pair()], range)
            .await
    }

    fn stream_url(&self, file_id: u64) -> Option<String> {
        self.file_url(file_id).ok()
    }
}
