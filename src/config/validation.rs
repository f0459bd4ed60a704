use super::models::Config;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const MAX_POLL_INTERVAL: Duration = Duration::from_secs(3600);

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("service.base_url '{url}' is not a valid URL: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("service.base_url '{0}' must use http or https")]
    UnsupportedScheme(String),

    #[error("poll.interval must be between 1ms and 1h (got {0:?})")]
    InvalidPollInterval(Duration),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("download.default_path must not be empty")]
    EmptyDownloadPath,
}

/// Validate a loaded configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_base_url(&config.service.base_url)?;
    validate_poll_interval(config.poll.interval.as_duration())?;

    if config.service.connect_timeout.is_zero() {
        return Err(ValidationError::ZeroTimeout("service.connect_timeout"));
    }

    if let Some(timeout) = config.service.request_timeout {
        if timeout.is_zero() {
            return Err(ValidationError::ZeroTimeout("service.request_timeout"));
        }
    }

    if config.download.default_path.as_os_str().is_empty() {
        return Err(ValidationError::EmptyDownloadPath);
    }

    Ok(())
}

fn validate_base_url(raw: &str) -> Result<(), ValidationError> {
    let parsed = Url::parse(raw).map_err(|e| ValidationError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(ValidationError::UnsupportedScheme(raw.to_string())),
    }
}

/// Poll interval must be non-zero and at most one hour
pub fn validate_poll_interval(interval: Duration) -> Result<(), ValidationError> {
    if interval.is_zero() || interval > MAX_POLL_INTERVAL {
        return Err(ValidationError::InvalidPollInterval(interval));
    }
    Ok(())
}
