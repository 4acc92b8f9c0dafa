/// Errors that can occur when querying a weather provider.
///
/// # Examples
///
/// ```rust
/// use wxmon_weather::error::WeatherProviderError;
///
/// let err = WeatherProviderError::UnknownLocation("Atlantis".to_string());
/// assert!(err.to_string().contains("Atlantis"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum WeatherProviderError {
    /// HTTP-level error: non-2xx status with an unrecognized body.
    #[error("weather API HTTP error: status={status}, body={body}")]
    Http { status: u16, body: String },

    /// The provider returned a structured error payload.
    #[error("weather API error: code={code}, message={message}")]
    Api { code: i64, message: String },

    /// The provider could not resolve the queried location name.
    #[error("unknown location: {0}")]
    UnknownLocation(String),

    /// Request was throttled by the provider. Callers may retry on the
    /// next sweep; no backoff is attempted within a sweep.
    #[error("weather API rate limited")]
    RateLimited,

    /// An underlying HTTP transport error from `reqwest`.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON deserialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Client configuration is missing or invalid (e.g. empty API key).
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience alias so callers can write `error::Result<T>`.
pub type Result<T> = std::result::Result<T, WeatherProviderError>;
