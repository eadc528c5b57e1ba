use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::FileRecord,
    protocol::{ErrorBody, FilesResponse, LoginResponse, RegisterResponse},
};
use tracing::{debug, warn};
use url::Url;

pub mod error;

pub use error::GatewayError;

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// A local file handed to the service for encryption or decryption.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let mime_type = mime_guess::from_path(&filename)
            .first()
            .map(|mime| mime.essence_str().to_string());
        Self {
            filename,
            mime_type,
            bytes,
        }
    }
}

/// Calls exposed by the remote vault service.
#[async_trait]
pub trait VaultGateway: Send + Sync {
    /// Returns the username the service confirmed.
    async fn login(&self, username: &str, password: &str) -> Result<String, GatewayError>;
    /// Returns the service's confirmation message, if any.
    async fn register(&self, username: &str, password: &str)
        -> Result<Option<String>, GatewayError>;
    async fn list_files(&self, username: &str) -> Result<Vec<FileRecord>, GatewayError>;
    async fn encrypt(&self, username: &str, upload: FileUpload) -> Result<Vec<u8>, GatewayError>;
    async fn decrypt(&self, username: &str, upload: FileUpload) -> Result<Vec<u8>, GatewayError>;
}

pub struct HttpVaultClient {
    http: Client,
    base_url: Url,
}

impl HttpVaultClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    pub fn from_base(raw: &str) -> Result<Self, GatewayError> {
        parse_base_url(raw).map(Self::new)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GatewayError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "address cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn post_credentials(
        &self,
        operation: &'static str,
        username: &str,
        password: &str,
    ) -> Result<Response, GatewayError> {
        let url = self.endpoint(&[operation])?;
        debug!(operation, %url, "sending credentials request");
        let form = Form::new()
            .text("username", username.to_string())
            .text("password", password.to_string());
        self.http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|source| GatewayError::Transport { operation, source })
    }

    async fn try_login(&self, username: &str, password: &str) -> Result<String, GatewayError> {
        let response = self.post_credentials("login", username, password).await?;
        let (status, body) = decode_json::<LoginResponse>("login", response).await?;
        if status.is_success() && body.success {
            return Ok(body
                .username
                .filter(|confirmed| !confirmed.is_empty())
                .unwrap_or_else(|| username.to_string()));
        }
        Err(GatewayError::Rejected {
            operation: "login",
            status: Some(status.as_u16()),
            message: body.rejection_message(),
        })
    }

    async fn try_register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<String>, GatewayError> {
        let response = self.post_credentials("register", username, password).await?;
        let (status, body) = decode_json::<RegisterResponse>("register", response).await?;
        if status.is_success() && body.success {
            return Ok(body.message);
        }
        Err(GatewayError::Rejected {
            operation: "register",
            status: Some(status.as_u16()),
            message: body.rejection_message(),
        })
    }

    async fn try_list_files(&self, username: &str) -> Result<Vec<FileRecord>, GatewayError> {
        let url = self.endpoint(&["files", username])?;
        debug!(%url, "fetching file listing");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                operation: "list_files",
                source,
            })?;
        if response.status().is_success() {
            let (_, body) = decode_json::<FilesResponse>("list_files", response).await?;
            return Ok(body.files);
        }
        let (status, body) = decode_json::<ErrorBody>("list_files", response).await?;
        Err(GatewayError::Rejected {
            operation: "list_files",
            status: Some(status.as_u16()),
            message: body.describe(),
        })
    }

    async fn post_file(
        &self,
        operation: &'static str,
        username: &str,
        upload: FileUpload,
    ) -> Result<Vec<u8>, GatewayError> {
        let url = self.endpoint(&[operation])?;
        debug!(
            operation,
            %url,
            filename = %upload.filename,
            size_bytes = upload.bytes.len(),
            "uploading file"
        );
        let mime_type = upload
            .mime_type
            .clone()
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());
        let part = Part::bytes(upload.bytes)
            .file_name(upload.filename)
            .mime_str(&mime_type)
            .map_err(|err| GatewayError::InvalidUpload(format!("mime type {mime_type}: {err}")))?;
        let form = Form::new()
            .text("username", username.to_string())
            .part("file", part);

        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|source| GatewayError::Transport { operation, source })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|source| GatewayError::Transport { operation, source })?;
        if status.is_success() {
            return Ok(bytes.to_vec());
        }

        let message = serde_json::from_slice::<ErrorBody>(&bytes)
            .ok()
            .and_then(|body| body.describe());
        match message {
            Some(message) => Err(GatewayError::Rejected {
                operation,
                status: Some(status.as_u16()),
                message: Some(message),
            }),
            None => Err(GatewayError::UnexpectedResponse {
                operation,
                status: status.as_u16(),
            }),
        }
    }
}

pub fn parse_base_url(raw: &str) -> Result<Url, GatewayError> {
    let invalid = |reason: String| GatewayError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|err| invalid(err.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{other}'"))),
    }
    if url.cannot_be_a_base() {
        return Err(invalid("address cannot carry a path".to_string()));
    }
    Ok(url)
}

async fn decode_json<T: DeserializeOwned>(
    operation: &'static str,
    response: Response,
) -> Result<(StatusCode, T), GatewayError> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|source| GatewayError::Transport { operation, source })?;
    let body = serde_json::from_slice(&bytes).map_err(|_| GatewayError::UnexpectedResponse {
        operation,
        status: status.as_u16(),
    })?;
    Ok((status, body))
}

fn log_failure<T>(
    operation: &'static str,
    result: Result<T, GatewayError>,
) -> Result<T, GatewayError> {
    if let Err(err) = &result {
        warn!(operation, kind = err.kind().as_str(), "vault request failed: {err}");
    }
    result
}

#[async_trait]
impl VaultGateway for HttpVaultClient {
    async fn login(&self, username: &str, password: &str) -> Result<String, GatewayError> {
        log_failure("login", self.try_login(username, password).await)
    }

    async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<String>, GatewayError> {
        log_failure("register", self.try_register(username, password).await)
    }

    async fn list_files(&self, username: &str) -> Result<Vec<FileRecord>, GatewayError> {
        log_failure("list_files", self.try_list_files(username).await)
    }

    async fn encrypt(&self, username: &str, upload: FileUpload) -> Result<Vec<u8>, GatewayError> {
        log_failure("encrypt", self.post_file("encrypt", username, upload).await)
    }

    async fn decrypt(&self, username: &str, upload: FileUpload) -> Result<Vec<u8>, GatewayError> {
        log_failure("decrypt", self.post_file("decrypt", username, upload).await)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
