//! Weather provider boundary.
//!
//! The alert scanner talks to the outside world only through the
//! [`WeatherProvider`] trait; the built-in implementation
//! ([`weatherapi::WeatherApiClient`]) queries WeatherAPI.com. Providers
//! must be treated as unreliable and rate-limited: every call can fail,
//! and a failure is scoped to one location group within a sweep.

pub mod error;
pub mod weatherapi;

use async_trait::async_trait;
use wxmon_common::types::{UnitSystem, WeatherSnapshot};

/// A source of point-in-time weather readings.
///
/// `location_name` is the human-readable name from the location
/// directory, used verbatim as the provider query key.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Fetches current conditions for one location.
    ///
    /// # Errors
    ///
    /// Returns a [`error::WeatherProviderError`] on network failure,
    /// unknown location, rate limiting, or a provider-side error.
    async fn fetch_current(
        &self,
        location_name: &str,
        units: UnitSystem,
    ) -> error::Result<WeatherSnapshot>;

    /// Provider name for logging (e.g. `"weatherapi"`).
    fn provider_name(&self) -> &str;
}
