pub mod archive;
pub mod share_service;
pub mod storage;
pub mod transport;
pub mod uploader;
