use serde::{Deserialize, Serialize};

use crate::domain::constants::POST_FILES_BUCKET;
use crate::shared::error::AppError;

const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    pub bucket: String,
    pub root_dir: String,
    pub public_base_url: String,
    pub max_upload_bytes: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite:data/inkpost.db".to_string(),
                max_connections: 5,
            },
            storage: StorageConfig {
                bucket: POST_FILES_BUCKET.to_string(),
                root_dir: "./data/blobs".to_string(),
                public_base_url: "http://localhost:54321/storage/v1/object/public".to_string(),
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES, // 5MB
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー検索関数から設定を構築（環境変数を直接触らずにテストするため）
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // 既定値
        let mut cfg = Self::default();

        if let Some(v) = lookup("INKPOST_DATABASE_URL") {
            let v = v.trim();
            if !v.is_empty() {
                cfg.database.url = v.to_string();
            }
        }
        if let Some(value) = lookup("INKPOST_DATABASE_MAX_CONNECTIONS").and_then(|v| parse_u32(&v))
        {
            cfg.database.max_connections = value;
        }

        if let Some(v) = lookup("INKPOST_STORAGE_BUCKET") {
            cfg.storage.bucket = v.trim().to_string();
        }
        if let Some(v) = lookup("INKPOST_STORAGE_ROOT") {
            let v = v.trim();
            if !v.is_empty() {
                cfg.storage.root_dir = v.to_string();
            }
        }
        if let Some(v) = lookup("INKPOST_STORAGE_PUBLIC_URL") {
            let v = v.trim().trim_end_matches('/');
            if !v.is_empty() {
                cfg.storage.public_base_url = v.to_string();
            }
        }
        if let Some(value) = lookup("INKPOST_MAX_UPLOAD_BYTES").and_then(|v| parse_u64(&v)) {
            cfg.storage.max_upload_bytes = value;
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.database.max_connections == 0 {
            return Err(AppError::Configuration(
                "Database max_connections must be greater than 0".to_string(),
            ));
        }
        if self.storage.bucket.is_empty() {
            return Err(AppError::Configuration(
                "Storage bucket must not be empty".to_string(),
            ));
        }
        if self.storage.max_upload_bytes == 0 {
            return Err(AppError::Configuration(
                "Storage max_upload_bytes must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_u32(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok()
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}
