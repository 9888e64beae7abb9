use crate::{describe::DEFAULT_TEXT_LENGTH, error::DocuploadError};
use clap::Parser;
use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Debug, Clone, Parser)]
pub struct StartArgs {
    #[arg(short, long, default_value = "config.json")]
    pub config_path: String,

    #[arg(short, long, default_value = "127.0.0.1")]
    pub address: String,

    #[arg(short, long, default_value = "3030")]
    pub port: u16,

    #[arg(short, long, default_value = "INFO")]
    pub log_level: tracing::Level,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Postgres connection string. Falls back to `DATABASE_URL`.
    pub database_url: Option<String>,

    pub upload: UploadConfig,

    /// Characters taken from the first line of text files when generating
    /// descriptions.
    #[serde(default = "default_text_length")]
    pub text_description_length: usize,
}

impl Config {
    pub fn read(path: impl AsRef<Path>) -> Result<Self, DocuploadError> {
        let config = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&config)?)
    }

    pub fn database_url(&self) -> Option<String> {
        self.database_url
            .clone()
            .or_else(|| std::env::var("DATABASE_URL").ok())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Upper bound on uploaded file size in bytes
    pub max_size: usize,

    /// Accepted file extensions, case insensitive, with or without the dot
    pub extensions: Vec<String>,
}

fn default_text_length() -> usize {
    DEFAULT_TEXT_LENGTH
}
