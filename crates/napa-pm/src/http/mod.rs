//! HTTP plumbing shared by the registry client and the downloader.

mod client;

pub use client::{HttpClient, HttpClientConfig, HttpError};
