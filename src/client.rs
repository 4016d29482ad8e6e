// src/client.rs
// HTTP client for the pdfchat API, used by the terminal front end.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::api::{ChatResponse, ProcessResponse, UploadResponse};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("No file selected")]
    NoFile,
    #[error("File size exceeds {limit_mb}MB limit")]
    TooLarge { limit_mb: u64 },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Server(String),
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    details: Option<String>,
}

pub struct ApiClient {
    base_url: String,
    max_upload_bytes: u64,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, max_upload_bytes: u64) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_upload_bytes,
            http: reqwest::Client::new(),
        }
    }

    /// Client-side check mirroring the server limit.
    pub fn validate_size(&self, size: u64) -> Result<(), ClientError> {
        if size > self.max_upload_bytes {
            return Err(ClientError::TooLarge {
                limit_mb: self.max_upload_bytes / (1024 * 1024),
            });
        }
        Ok(())
    }

    pub async fn upload(&self, path: &Path) -> Result<UploadResponse, ClientError> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or(ClientError::NoFile)?
            .to_string();
        let bytes = tokio::fs::read(path).await.map_err(|source| ClientError::Read {
            path: path.display().to_string(),
            source,
        })?;
        self.validate_size(bytes.len() as u64)?;

        let part = Part::bytes(bytes)
            .file_name(filename)
            .mime_str("application/pdf")?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/api/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn process(&self, filename: &str) -> Result<ProcessResponse, ClientError> {
        let response = self
            .http
            .post(format!("{}/api/process-document", self.base_url))
            .json(&json!({ "filename": filename }))
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn chat(&self, filename: &str, message: &str) -> Result<ChatResponse, ClientError> {
        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&json!({ "message": message, "filename": filename }))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        if response.status().is_success() {
            return Ok(response.json().await?);
        }
        let status = response.status();
        let body: Option<ErrorBody> = response.json().await.ok();
        let message = match body {
            Some(ErrorBody {
                error: Some(error),
                details: Some(details),
            }) => format!("{}: {}", error, details),
            Some(ErrorBody {
                error: Some(error), ..
            }) => error,
            _ => format!("Request failed with status {}", status),
        };
        Err(ClientError::Server(message))
    }
}
