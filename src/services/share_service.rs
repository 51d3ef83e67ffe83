use crate::error::{Result, UploadError};
use crate::models::ShareRequest;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use std::sync::LazyLock;
use tracing::{debug, info};

static URL_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<url>(.*?)</url>").expect("url tag pattern is valid"));

#[async_trait]
pub trait ShareService: Send + Sync {
    /// Creates a public read-only link for `remote_path` and returns its URL.
    async fn create_share(&self, remote_path: &str) -> Result<String>;
}

/// Share creation through the OCS files_sharing API.
pub struct OcsShareService {
    client: Client,
    share_url: String,
}

impl OcsShareService {
    /// `client` must already carry the authorization header.
    pub fn new(client: Client, share_url: String) -> Self {
        Self { client, share_url }
    }
}

#[async_trait]
impl ShareService for OcsShareService {
    async fn create_share(&self, remote_path: &str) -> Result<String> {
        info!("🔗 Creating public share for {}", remote_path);

        let response = self
            .client
            .post(&self.share_url)
            .header("OCS-APIRequest", "true")
            .json(&ShareRequest::public_read_only(remote_path))
            .send()
            .await?;

        // Success or failure is reported inside the body, so read it whatever the status.
        let status = response.status();
        let body = response.text().await?;
        debug!("Share response ({}): {}", status, body);

        parse_share_url(&body)
    }
}

/// Extracts the first `<url>...</url>` value from a share response body.
pub fn parse_share_url(body: &str) -> Result<String> {
    URL_TAG
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .ok_or_else(|| UploadError::ShareParseFailed {
            body: body.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_share_url() {
        let body = "<ocs><data><url>https://cloud.example/s/abc123</url></data></ocs>";
        assert_eq!(parse_share_url(body).unwrap(), "https://cloud.example/s/abc123");
    }

    #[test]
    fn test_parse_share_url_takes_first_match() {
        let body = r#"<?xml version="1.0"?>
<ocs>
 <meta><status>ok</status><statuscode>200</statuscode></meta>
 <data>
  <id>42</id>
  <url>https://cloud.example/s/first</url>
  <mail_send>0</mail_send>
  <url>https://cloud.example/s/second</url>
 </data>
</ocs>"#;
        assert_eq!(parse_share_url(body).unwrap(), "https://cloud.example/s/first");
    }

    #[test]
    fn test_parse_share_url_missing_tag() {
        let body = "<ocs><meta><status>failure</status><statuscode>404</statuscode></meta></ocs>";
        match parse_share_url(body) {
            Err(UploadError::ShareParseFailed { body: raw }) => assert_eq!(raw, body),
            other => panic!("expected ShareParseFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_share_url_empty_tag() {
        assert!(matches!(
            parse_share_url("<ocs><data><url></url></data></ocs>"),
            Err(UploadError::ShareParseFailed { .. })
        ));
        assert!(matches!(
            parse_share_url("<url>   </url>"),
            Err(UploadError::ShareParseFailed { .. })
        ));
    }
}
