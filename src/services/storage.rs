use crate::error::{Result, UploadError};
use async_trait::async_trait;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::header::{CONTENT_LENGTH, HeaderValue};
use reqwest::{Body, Client, Method, StatusCode};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

/// Characters escaped inside a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

pub type ByteReader = Box<dyn AsyncRead + Unpin + Send + Sync>;

/// Remote file store operations needed by the upload pipeline.
///
/// Paths are server-relative and `/` separated, e.g. `/artifacts/<id>/report.zip`.
#[async_trait]
pub trait StorageService: Send + Sync {
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Creates `path` and any missing parents. Existing directories are not an error.
    async fn create_directory(&self, path: &str) -> Result<()>;

    async fn put_stream(
        &self,
        path: &str,
        reader: ByteReader,
        content_length: Option<u64>,
    ) -> Result<()>;
}

pub struct WebDavStorageService {
    client: Client,
    base_url: String,
}

impl WebDavStorageService {
    /// `client` must already carry the authorization header.
    pub fn new(client: Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        let mut url = self.base_url.clone();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            url.push('/');
            url.extend(utf8_percent_encode(segment, PATH_SEGMENT));
        }
        url
    }

    fn method(name: &str) -> Result<Method> {
        Method::from_bytes(name.as_bytes())
            .map_err(|e| UploadError::TransferFailed(format!("invalid method {}: {}", name, e)))
    }

    async fn mkcol(&self, path: &str) -> Result<()> {
        let response = self
            .client
            .request(Self::method("MKCOL")?, self.url_for(path))
            .send()
            .await?;

        match response.status() {
            // 405: collection already exists
            s if s.is_success() || s == StatusCode::METHOD_NOT_ALLOWED => {
                tracing::debug!("MKCOL {} -> {}", path, s);
                Ok(())
            }
            s => Err(UploadError::TransferFailed(format!(
                "MKCOL {} returned {}",
                path, s
            ))),
        }
    }
}

#[async_trait]
impl StorageService for WebDavStorageService {
    async fn exists(&self, path: &str) -> Result<bool> {
        let response = self
            .client
            .request(Self::method("PROPFIND")?, self.url_for(path))
            .header("Depth", "0")
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() => Ok(true),
            s => Err(UploadError::TransferFailed(format!(
                "PROPFIND {} returned {}",
                path, s
            ))),
        }
    }

    async fn create_directory(&self, path: &str) -> Result<()> {
        let mut current = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current.push('/');
            current.push_str(segment);
            self.mkcol(&current).await?;
        }
        Ok(())
    }

    async fn put_stream(
        &self,
        path: &str,
        reader: ByteReader,
        content_length: Option<u64>,
    ) -> Result<()> {
        let mut request = self
            .client
            .put(self.url_for(path))
            .body(Body::wrap_stream(ReaderStream::new(reader)));

        if let Some(len) = content_length {
            request = request.header(CONTENT_LENGTH, HeaderValue::from(len));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::TransferFailed(format!(
                "PUT {} returned {}: {}",
                path, status, body
            )));
        }

        tracing::debug!("PUT {} -> {}", path, status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_encodes_segments() {
        let storage = WebDavStorageService::new(
            Client::new(),
            "https://cloud.example.com/remote.php/webdav/".to_string(),
        );
        assert_eq!(
            storage.url_for("/artifacts/abc/my report#1.zip"),
            "https://cloud.example.com/remote.php/webdav/artifacts/abc/my%20report%231.zip"
        );
        assert_eq!(
            storage.url_for("//artifacts//abc/"),
            "https://cloud.example.com/remote.php/webdav/artifacts/abc"
        );
    }
}
