use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_SESSION_SECRET: &str = "your-secret-key-change-in-production";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CoreConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub vision: VisionConfig,
    pub session: SessionConfig,
}

impl CoreConfig {
    /// Apply the plain environment variables a hosting platform sets.
    ///
    /// `GEMINI_API_KEY` fills an unset `vision.api_key`; `PORT` overrides the
    /// bind port when it parses.
    pub fn apply_env_fallbacks<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.vision.api_key.is_none() {
            self.vision.api_key = lookup("GEMINI_API_KEY").filter(|key| !key.is_empty());
        }

        if let Some(port) = lookup("PORT").and_then(|port| port.parse().ok()) {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.server.port == 0 {
            return Err(CoreError::configuration("server.port must be non-zero"));
        }
        if self.server.request_timeout == 0 {
            return Err(CoreError::configuration(
                "server.request_timeout must be non-zero",
            ));
        }
        if self.server.request_timeout <= self.vision.timeout {
            return Err(CoreError::configuration(
                "server.request_timeout must be longer than vision.timeout",
            ));
        }
        if self.server.max_upload_size == 0 {
            return Err(CoreError::configuration(
                "server.max_upload_size must be non-zero",
            ));
        }
        if self.session.secret.is_empty() {
            return Err(CoreError::configuration("session.secret must not be empty"));
        }
        if self.storage.backend == StorageBackend::S3 && self.storage.s3.bucket.is_empty() {
            return Err(CoreError::configuration("storage.s3.bucket must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub request_timeout: u64,
    pub max_upload_size: usize,
    pub image_disposition: ImageDisposition,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            debug: false,
            request_timeout: 120,
            max_upload_size: 16 * 1024 * 1024, // 16MB
            image_disposition: ImageDisposition::default(),
        }
    }
}

/// How `/image/:name` asks the browser to treat the bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageDisposition {
    Inline,
    #[default]
    Attachment,
}

impl ImageDisposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageDisposition::Inline => "inline",
            ImageDisposition::Attachment => "attachment",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub local: LocalStorageConfig,
    pub s3: S3StorageConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Local,
    Memory,
    S3,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocalStorageConfig {
    pub base_path: PathBuf,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("data/photos"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct S3StorageConfig {
    pub bucket: String,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub endpoint: Option<String>,
}

impl Default for S3StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "photos-app".to_string(),
            region: "us-east-1".to_string(),
            access_key_id: None,
            secret_access_key: None,
            endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VisionConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    /// Seconds before a model call is abandoned
    pub timeout: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.4,
            top_p: 1.0,
            top_k: 32,
            max_output_tokens: 4096,
            timeout: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    pub secret: String,
    pub flash_cookie: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SESSION_SECRET.to_string(),
            flash_cookie: "galleria_flash".to_string(),
        }
    }
}

impl SessionConfig {
    pub fn uses_default_secret(&self) -> bool {
        self.secret == DEFAULT_SESSION_SECRET
    }
}
