use crate::config::UploadConfig;
use crate::services::share_service::OcsShareService;
use crate::services::storage::WebDavStorageService;
use reqwest::Client;
use std::sync::Arc;
use tracing::info;

pub fn setup_storage(config: &UploadConfig, client: Client) -> Arc<WebDavStorageService> {
    let base_url = config.endpoint_url(&config.dav_path);
    info!("☁️  WebDAV Storage: {}", base_url);
    Arc::new(WebDavStorageService::new(client, base_url))
}

pub fn setup_share_service(config: &UploadConfig, client: Client) -> Arc<OcsShareService> {
    Arc::new(OcsShareService::new(client, config.share_url()))
}
