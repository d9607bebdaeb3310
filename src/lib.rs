//! facex: FACEIT stats overlay
//!
//! Fetches FACEIT statistics for a Steam profile page and renders them into
//! a single container on that page. It also provides the standalone results
//! page and the "recent searches" live feed.
//!
//! # Features
//!
//! - **Fetch lifecycle**: one in-flight request per page, cancelled when the
//!   tab is hidden, retried when it comes back
//! - **HTTP backend** (default): `reqwest`-based [`source::HttpStatsSource`]
//! - **Pluggable**: anything implementing [`StatsSource`] and [`Surface`]
//!   can drive the controller
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use facex::{MemorySurface, Overlay, OverlayConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OverlayConfig::default();
//! let source = Arc::new(facex::source::HttpStatsSource::new(&config)?);
//! let surface = Arc::new(MemorySurface::new());
//!
//! let page = "https://steamcommunity.com/id/gabelogannewell";
//! if let Some(mut overlay) = Overlay::attach(&config, page, true, source, surface.clone()) {
//!     overlay.initial_load().await;
//!     println!("{}", surface.current().unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

pub mod error;
pub use error::{Error, Result};

pub mod controller;
pub mod feed;
pub mod model;
pub mod overlay;
pub mod page;
pub mod render;
pub mod results;
pub mod source;
pub mod surface;

pub use controller::{Controller, LoadSnapshot, PageEvent, Settlement};
pub use model::ProfileResponse;
pub use overlay::Overlay;
pub use page::ProfilePage;
pub use source::StatsSource;
pub use surface::{MemorySurface, Surface};

/// Configuration for the overlay
///
/// The defaults point at the public API and use the timings the overlay
/// has always used: a 30 s request timeout, a 100 ms settle delay before a
/// visibility-triggered retry and a 30 s feed refresh.
///
/// # Examples
///
/// ```
/// let cfg = facex::OverlayConfig::default();
/// assert_eq!(cfg.timeout_ms, 30000);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Profile lookup endpoint (`POST`)
    pub api_url: String,
    /// Recent searches endpoint (`GET`)
    pub recent_searches_url: String,
    /// Base URL for level icons and flags
    pub asset_base_url: String,
    /// Timeout for a lookup in milliseconds
    pub timeout_ms: u64,
    /// Delay before a visibility-triggered load in milliseconds
    pub settle_delay_ms: u64,
    /// Refresh interval of the recent searches feed in milliseconds
    pub feed_interval_ms: u64,
    /// User agent string to send with requests
    pub user_agent: String,
    /// Custom HTTP headers
    pub headers: HashMap<String, String>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.fullshow.uz/extension/find-faceit-by-steam".to_string(),
            recent_searches_url: "https://api.fullshow.uz/api/recent-searches".to_string(),
            asset_base_url: "https://api.fullshow.uz/static".to_string(),
            timeout_ms: 30000,
            settle_delay_ms: 100,
            feed_interval_ms: 30000,
            user_agent: concat!("facex/", env!("CARGO_PKG_VERSION")).to_string(),
            headers: HashMap::new(),
        }
    }
}

impl OverlayConfig {
    /// Load a (possibly partial) JSON config; missing keys keep their
    /// defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("api_url", &self.api_url),
            ("recent_searches_url", &self.recent_searches_url),
            ("asset_base_url", &self.asset_base_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| Error::ConfigError(format!("{} '{}': {}", name, value, e)))?;
        }
        if self.timeout_ms == 0 {
            return Err(Error::ConfigError("timeout_ms must be positive".into()));
        }
        if self.feed_interval_ms == 0 {
            return Err(Error::ConfigError("feed_interval_ms must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OverlayConfig::default();
        assert_eq!(config.timeout_ms, 30000);
        assert_eq!(config.settle_delay_ms, 100);
        assert!(config.api_url.ends_with("/extension/find-faceit-by-steam"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: OverlayConfig =
            serde_json::from_str(r#"{"api_url":"http://127.0.0.1:9000/lookup","timeout_ms":500}"#).unwrap();
        assert_eq!(config.api_url, "http://127.0.0.1:9000/lookup");
        assert_eq!(config.timeout_ms, 500);
        assert_eq!(config.feed_interval_ms, 30000);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let config = OverlayConfig {
            timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        let config = OverlayConfig {
            api_url: "not a url".into(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
    }
}
