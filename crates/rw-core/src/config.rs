//! Runtime configuration handed to the content script at mount time.

use crate::geometry::PlacementMetrics;
use serde::{Deserialize, Serialize};

/// Everything the extension needs to know about its environment.
///
/// Every field has a default, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RewriteConfig {
    /// Base URL of the rewrite service.
    pub api_base: String,
    /// Page opened when a logged-out user clicks the action control.
    pub login_url: String,
    /// Page offered when the account has no active agent.
    pub cta_url: String,
    /// Quiet window for selection events, in milliseconds.
    pub debounce_ms: f64,
    /// Local-storage key for the last used agent.
    pub storage_key: String,
    /// `id` of the root container injected into the page.
    pub root_id: String,
    /// Max log level (`error`, `warn`, `info`, `debug`, `trace`, `off`).
    pub log_level: String,
    pub metrics: PlacementMetrics,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:3000".to_string(),
            login_url: "http://localhost:3000/login".to_string(),
            cta_url: "http://localhost:3000/agents/new".to_string(),
            debounce_ms: 100.0,
            storage_key: "lastSelectedOption".to_string(),
            root_id: "fast-ai-rewrite-root".to_string(),
            log_level: "info".to_string(),
            metrics: PlacementMetrics::default(),
        }
    }
}

impl RewriteConfig {
    /// Parse a JSON configuration, falling back to defaults on error.
    pub fn from_json(json: &str) -> Self {
        if json.trim().is_empty() {
            return Self::default();
        }
        match serde_json::from_str(json) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("invalid configuration, using defaults: {e}");
                Self::default()
            }
        }
    }

    /// The configured log level, `Info` when unrecognized.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        assert_eq!(RewriteConfig::from_json("{}"), RewriteConfig::default());
        assert_eq!(RewriteConfig::from_json(""), RewriteConfig::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let c = RewriteConfig::from_json(
            r#"{"apiBase":"https://rewrite.example","debounceMs":250,"metrics":{"gap":4}}"#,
        );
        assert_eq!(c.api_base, "https://rewrite.example");
        assert_eq!(c.debounce_ms, 250.0);
        assert_eq!(c.metrics.gap, 4.0);
        assert_eq!(c.metrics.panel_width, 256.0);
        assert_eq!(c.storage_key, "lastSelectedOption");
    }

    #[test]
    fn malformed_json_falls_back() {
        assert_eq!(RewriteConfig::from_json("{nope"), RewriteConfig::default());
    }

    #[test]
    fn log_level_parses() {
        let mut c = RewriteConfig::default();
        c.log_level = "debug".into();
        assert_eq!(c.level_filter(), log::LevelFilter::Debug);
        c.log_level = "loud".into();
        assert_eq!(c.level_filter(), log::LevelFilter::Info);
    }
}
