//! Shared configuration and observability for the Vaporview workspace.
//!
//! Every other crate depends on this one, so it stays lightweight: the typed
//! runtime configuration with its YAML + environment loader, and the
//! centralised `tracing` initialisation used by binaries and integration
//! tests.
//!
//! # Overview
//!
//! - [`VaporConfig`]: Top-level runtime configuration
//! - [`VaporConfigLoader`]: YAML file + `VAPORVIEW__` env overlay
//! - [`observability`]: Centralised tracing/logging initialisation

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub mod observability;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// Runtime configuration for the review scraper service.
///
/// Every section has defaults matching the constants the service shipped
/// with, so an empty file (or no file at all) yields a working config.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct VaporConfig {
    pub version: Option<String>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub scrape: ScrapeConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

/// WebDriver connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    /// Address of a running WebDriver service (Chromedriver by default).
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default = "default_headless")]
    pub headless: bool,
}

/// Navigation and extraction tunables for a scrape session.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeConfig {
    #[serde(default = "default_storefront_url")]
    pub storefront_url: String,
    /// Stop once this many reviews have been collected.
    #[serde(default = "default_review_limit")]
    pub review_limit: usize,
    /// Bounded wait for expected page elements, in seconds.
    #[serde(default = "default_element_wait_secs")]
    pub element_wait_secs: u64,
    /// Shorter wait used before the direct click on the review link.
    #[serde(default = "default_click_wait_secs")]
    pub click_wait_secs: u64,
    /// Fixed pause after each scroll to let more cards render.
    #[serde(default = "default_scroll_pause_secs")]
    pub scroll_pause_secs: u64,
}

/// Location of the flat-file JSON stores.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_listen() -> String {
    "0.0.0.0:10000".into()
}
fn default_webdriver_url() -> String {
    "http://localhost:9515".into()
}
fn default_headless() -> bool {
    true
}
fn default_storefront_url() -> String {
    "https://store.steampowered.com/".into()
}
fn default_review_limit() -> usize {
    5
}
fn default_element_wait_secs() -> u64 {
    10
}
fn default_click_wait_secs() -> u64 {
    5
}
fn default_scroll_pause_secs() -> u64 {
    3
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}
impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
        }
    }
}
impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            storefront_url: default_storefront_url(),
            review_limit: default_review_limit(),
            element_wait_secs: default_element_wait_secs(),
            click_wait_secs: default_click_wait_secs(),
            scroll_pause_secs: default_scroll_pause_secs(),
        }
    }
}
impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (YAML + env overrides).
pub struct VaporConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for VaporConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl VaporConfigLoader {
    /// Start with `VAPORVIEW__`-prefixed env overrides as the base source.
    ///
    /// ```
    /// use vaporview_common::VaporConfigLoader;
    ///
    /// let config = VaporConfigLoader::new()
    ///     .with_yaml_str("version: '1'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.scrape.review_limit, 5);
    /// ```
    pub fn new() -> Self {
        let builder =
            Config::builder().add_source(Environment::with_prefix("VAPORVIEW").separator("__"));
        Self { builder }
    }

    /// Attach a config file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a config file that may be absent, so env-only deployments
    /// work without touching disk.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    ///
    /// Sources are merged, `${VAR}` placeholders expanded recursively (with a
    /// depth cap so cycles terminate), and the result materialised into
    /// [`VaporConfig`].
    pub fn load(self) -> Result<VaporConfig, ConfigError> {
        let cfg = self.builder.build()?;

        // Go through serde_json::Value so env expansion can walk the tree.
        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: VaporConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_nested_object() {
        temp_env::with_var("WD", Some("http://driver:4444"), || {
            let mut v = json!({ "browser": { "webdriver_url": "${WD}" } });
            expand_env_in_value(&mut v);
            assert_eq!(v["browser"]["webdriver_url"], json!("http://driver:4444"));
        });
    }

    #[test]
    fn stops_on_cycles_and_leaves_value_reasonable() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            // Only termination matters here; the cycle itself stays unresolved.
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST}"));
    }

    #[test]
    fn empty_sources_yield_defaults() {
        let cfg = VaporConfigLoader::new()
            .with_yaml_str("{}")
            .load()
            .expect("defaults");
        assert_eq!(cfg.server.listen, "0.0.0.0:10000");
        assert_eq!(cfg.browser.webdriver_url, "http://localhost:9515");
        assert!(cfg.browser.headless);
        assert_eq!(cfg.scrape.review_limit, 5);
        assert_eq!(cfg.scrape.element_wait_secs, 10);
        assert_eq!(cfg.store.data_dir, PathBuf::from("./data"));
    }
}
