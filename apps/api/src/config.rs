use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Upper bound for `SESSION_TTL_HOURS` (one year).
const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

/// Which Document Store backend to construct at startup.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    Filesystem { root: PathBuf },
    S3(S3Settings),
    Memory,
}

#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageBackend,
    pub anthropic_api_key: String,
    pub llm_model: String,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub resume_template_path: PathBuf,
    pub pdf_renderer: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            storage: storage_from_env()?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            llm_model: env_or("LLM_MODEL", crate::llm_client::DEFAULT_MODEL),
            session_secret: require_env("SESSION_SECRET")?,
            session_ttl_hours: parse_session_ttl(&env_or("SESSION_TTL_HOURS", "24"))?,
            resume_template_path: PathBuf::from(env_or(
                "RESUME_TEMPLATE_PATH",
                "templates/resume_template.html",
            )),
            pdf_renderer: env_or("PDF_RENDERER", "wkhtmltopdf"),
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn storage_from_env() -> Result<StorageBackend> {
    let backend = env_or("STORAGE_BACKEND", "fs").to_ascii_lowercase();
    match backend.as_str() {
        "fs" | "filesystem" => Ok(StorageBackend::Filesystem {
            root: PathBuf::from(env_or("DATA_DIR", "./data")),
        }),
        "s3" => Ok(StorageBackend::S3(S3Settings {
            bucket: require_env("S3_BUCKET")?,
            endpoint: optional_env("S3_ENDPOINT"),
            region: env_or("AWS_REGION", "us-east-1"),
            access_key_id: optional_env("AWS_ACCESS_KEY_ID"),
            secret_access_key: optional_env("AWS_SECRET_ACCESS_KEY"),
        })),
        "memory" => Ok(StorageBackend::Memory),
        other => bail!("STORAGE_BACKEND must be one of fs, s3, memory (got '{other}')"),
    }
}

fn parse_session_ttl(raw: &str) -> Result<i64> {
    let hours = raw
        .trim()
        .parse::<i64>()
        .context("SESSION_TTL_HOURS must be a whole number of hours")?;
    if !(1..=MAX_SESSION_TTL_HOURS).contains(&hours) {
        bail!("SESSION_TTL_HOURS must be between 1 and {MAX_SESSION_TTL_HOURS} (got {hours})");
    }
    Ok(hours)
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ttl_accepts_range() {
        assert_eq!(parse_session_ttl("24").unwrap(), 24);
        assert_eq!(parse_session_ttl(" 1 ").unwrap(), 1);
        assert_eq!(parse_session_ttl("8760").unwrap(), MAX_SESSION_TTL_HOURS);
    }

    #[test]
    fn test_session_ttl_rejects_out_of_range() {
        for raw in ["0", "-5", "8761", "9223372036854775807", "a day", ""] {
            assert!(parse_session_ttl(raw).is_err(), "{raw:?} should be rejected");
        }
    }
}
