//! Lightweight i18n translation registry.
//!
//! A static map keyed by `(locale, message_key)`. Supported locales:
//! `vi` (default), `en`. No external i18n framework dependency; the
//! notification formatter fills `{city}` / `{value}` / `{threshold}`
//! placeholders itself.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Default locale when none is configured.
pub const DEFAULT_LOCALE: &str = "vi";

/// Supported locales.
pub const SUPPORTED_LOCALES: &[&str] = &["vi", "en"];

/// Central translation registry.
pub struct Translations {
    map: HashMap<(&'static str, &'static str), &'static str>,
}

impl Translations {
    /// Get a translated string for the given locale and key.
    /// Falls back to `en` if the locale has no entry, then to `default`.
    pub fn get<'a>(&self, locale: &str, key: &str, default: &'a str) -> &'a str {
        if let Some(&val) = self.map.get(&(locale, key)) {
            return val;
        }
        if locale != "en" {
            if let Some(&val) = self.map.get(&("en", key)) {
                return val;
            }
        }
        default
    }

    /// Get a translated template string for placeholder substitution.
    /// Returns `None` if no translation exists for any locale.
    pub fn get_template(&self, locale: &str, key: &str) -> Option<&'static str> {
        self.map
            .get(&(locale, key))
            .or_else(|| {
                if locale != "en" {
                    self.map.get(&("en", key))
                } else {
                    None
                }
            })
            .copied()
    }
}

/// Global translation singleton.
pub static TRANSLATIONS: LazyLock<Translations> = LazyLock::new(|| {
    let mut map = HashMap::new();

    macro_rules! t {
        ($locale:expr, $key:expr, $val:expr) => {
            map.insert(($locale, $key), $val);
        };
    }

    // Metric display names
    t!("vi", "metric.temperature_high", "Nhiệt độ cao");
    t!("en", "metric.temperature_high", "High temperature");
    t!("vi", "metric.temperature_low", "Nhiệt độ thấp");
    t!("en", "metric.temperature_low", "Low temperature");
    t!("vi", "metric.rain", "Lượng mưa");
    t!("en", "metric.rain", "Precipitation");
    t!("vi", "metric.wind", "Gió mạnh");
    t!("en", "metric.wind", "Wind");
    t!("vi", "metric.humidity", "Độ ẩm");
    t!("en", "metric.humidity", "Humidity");
    t!("vi", "metric.aqi", "Chất lượng không khí");
    t!("en", "metric.aqi", "Air quality");

    // Alert message templates
    t!(
        "vi",
        "alert.temperature_high",
        "Cảnh báo nắng nóng tại {city}: nhiệt độ hiện tại {value}°C, vượt ngưỡng {threshold}°C"
    );
    t!(
        "en",
        "alert.temperature_high",
        "Heat alert for {city}: temperature is {value}°C, at or above the {threshold}°C threshold"
    );
    t!(
        "vi",
        "alert.temperature_low",
        "Cảnh báo rét tại {city}: nhiệt độ hiện tại {value}°C, xuống dưới ngưỡng {threshold}°C"
    );
    t!(
        "en",
        "alert.temperature_low",
        "Cold alert for {city}: temperature is {value}°C, at or below the {threshold}°C threshold"
    );
    t!(
        "vi",
        "alert.rain",
        "Cảnh báo mưa lớn tại {city}: lượng mưa {value} mm, vượt ngưỡng {threshold} mm"
    );
    t!(
        "en",
        "alert.rain",
        "Heavy rain alert for {city}: precipitation is {value} mm, above the {threshold} mm threshold"
    );
    t!(
        "vi",
        "alert.wind",
        "Cảnh báo gió mạnh tại {city}: tốc độ gió {value} km/h, vượt ngưỡng {threshold} km/h"
    );
    t!(
        "en",
        "alert.wind",
        "Strong wind alert for {city}: wind speed is {value} km/h, above the {threshold} km/h threshold"
    );
    t!(
        "vi",
        "alert.humidity",
        "Độ ẩm tại {city} đang ở mức {value}%, vượt ngưỡng {threshold}%"
    );
    t!(
        "en",
        "alert.humidity",
        "Humidity at {city} is {value}%, above the {threshold}% threshold"
    );
    t!(
        "vi",
        "alert.aqi",
        "Cảnh báo chất lượng không khí tại {city}: chỉ số AQI {value}, vượt ngưỡng {threshold}"
    );
    t!(
        "en",
        "alert.aqi",
        "Air quality alert for {city}: AQI is {value}, above the {threshold} threshold"
    );

    Translations { map }
});
