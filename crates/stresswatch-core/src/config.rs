//! Layered runtime configuration.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. a TOML file (`--config <path>`, else `stresswatch.toml` when present)
//! 3. `GOOGLE_API_KEY`, mapped to `narrative.api_key`
//! 4. `STRESSWATCH_*` variables, nested with `__` (`STRESSWATCH_REFRESH__LIVE_TTL_SECS=30`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::narrative::DEFAULT_MODEL;
use crate::snapshot::SnapshotPolicy;
use crate::throttling::FetchThrottle;
use crate::{ConfigError, InstrumentCatalog, InstrumentSpec, UnitClass, ValidationError};

pub const DEFAULT_CONFIG_FILE: &str = "stresswatch.toml";
pub const ENV_PREFIX: &str = "STRESSWATCH_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub live_ttl_secs: u64,
    pub history_ttl_secs: u64,
    pub lookback: usize,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            live_ttl_secs: 60,
            history_ttl_secs: 600,
            lookback: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub max_concurrency: usize,
    pub timeout_ms: u64,
    pub requests_per_second: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            timeout_ms: 10_000,
            requests_per_second: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    pub model: String,
    pub api_key: Option<String>,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_owned(),
            api_key: None,
        }
    }
}

impl NarrativeConfig {
    /// The key, if one is set and not blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// Catalog entry as written in configuration; the unit class defaults to the symbol's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentEntry {
    pub id: String,
    pub symbol: String,
    pub display_name: String,
    pub ticker_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_class: Option<UnitClass>,
}

impl From<InstrumentEntry> for InstrumentSpec {
    fn from(entry: InstrumentEntry) -> Self {
        match entry.unit_class {
            Some(unit_class) => InstrumentSpec::new(
                entry.id,
                entry.symbol,
                entry.display_name,
                entry.ticker_label,
                unit_class,
            ),
            None => InstrumentSpec::classified(
                entry.id,
                entry.symbol,
                entry.display_name,
                entry.ticker_label,
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StresswatchConfig {
    pub refresh: RefreshConfig,
    pub fetch: FetchConfig,
    pub narrative: NarrativeConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<Vec<InstrumentEntry>>,
}

impl StresswatchConfig {
    /// Loads every layer. An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            if !path.is_file() {
                return Err(ConfigError::MissingFile {
                    path: path.to_path_buf(),
                });
            }
        }
        Self::from_figment(Self::figment(path))
    }

    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf);
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(file))
            .merge(
                Env::raw()
                    .only(&["GOOGLE_API_KEY"])
                    .map(|_| "narrative.api_key".into()),
            )
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extracts and validates a configuration from any figment.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.snapshot_policy().validate()?;
        if self.fetch.requests_per_second == 0 {
            return Err(ValidationError::NonPositive {
                field: "fetch.requests_per_second",
            });
        }
        if self.fetch.timeout_ms == 0 {
            return Err(ValidationError::NonPositive {
                field: "fetch.timeout_ms",
            });
        }
        self.instrument_catalog().map(|_| ())
    }

    /// The configured basket, or the built-in one.
    pub fn instrument_catalog(&self) -> Result<InstrumentCatalog, ValidationError> {
        match &self.catalog {
            Some(entries) => {
                InstrumentCatalog::new(entries.iter().cloned().map(InstrumentSpec::from).collect())
            }
            None => Ok(InstrumentCatalog::builtin()),
        }
    }

    pub fn snapshot_policy(&self) -> SnapshotPolicy {
        SnapshotPolicy {
            lookback: self.refresh.lookback,
            live_ttl: Duration::from_secs(self.refresh.live_ttl_secs),
            max_concurrency: self.fetch.max_concurrency,
        }
    }

    pub fn history_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh.history_ttl_secs)
    }

    pub fn throttle(&self) -> FetchThrottle {
        FetchThrottle::per_second(self.fetch.requests_per_second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn from_toml(toml: &str) -> Result<StresswatchConfig, ConfigError> {
        StresswatchConfig::from_figment(
            Figment::from(Serialized::defaults(StresswatchConfig::default()))
                .merge(Toml::string(toml)),
        )
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = StresswatchConfig::default();
        assert_eq!(config.snapshot_policy(), SnapshotPolicy::default());
        assert_eq!(config.history_ttl(), Duration::from_secs(600));
        assert_eq!(config.narrative.model, "gemini-1.5-flash");
        assert_eq!(
            config.instrument_catalog().expect("builtin"),
            InstrumentCatalog::builtin()
        );
    }

    #[test]
    fn toml_overrides_single_fields() {
        let config = from_toml("[refresh]\nlive_ttl_secs = 15\n[fetch]\nmax_concurrency = 2\n")
            .expect("valid config");
        assert_eq!(config.refresh.live_ttl_secs, 15);
        assert_eq!(config.refresh.lookback, 2);
        assert_eq!(config.fetch.max_concurrency, 2);
        assert_eq!(config.fetch.requests_per_second, 8);
    }

    #[test]
    fn catalog_override_is_validated() {
        let config = from_toml(
            r#"
            [[catalog]]
            id = "vix"
            symbol = "^VIX"
            display_name = "VIX"
            ticker_label = "VIX"

            [[catalog]]
            id = "eth"
            symbol = "ETH-USD"
            display_name = "Ether"
            ticker_label = "ETH/USD"
            unit_class = "points"
            "#,
        )
        .expect("valid catalog");
        let catalog = config.instrument_catalog().expect("valid catalog");
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.require("vix").expect("vix").unit_class, UnitClass::Points);
        assert_eq!(catalog.require("eth").expect("eth").unit_class, UnitClass::Points);

        let duplicate = from_toml(
            "[[catalog]]\nid = \"a\"\nsymbol = \"A\"\ndisplay_name = \"A\"\nticker_label = \"A\"\n\
             [[catalog]]\nid = \"a\"\nsymbol = \"B\"\ndisplay_name = \"B\"\nticker_label = \"B\"\n",
        );
        assert!(matches!(
            duplicate,
            Err(ConfigError::Validation(ValidationError::DuplicateInstrument { .. }))
        ));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let err = from_toml("[fetch]\nmax_concurrency = 0\n").expect_err("invalid");
        assert!(matches!(
            err,
            ConfigError::Validation(ValidationError::NonPositive { field: "max_concurrency" })
        ));
    }

    #[test]
    fn loads_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[narrative]\nmodel = \"gemini-1.5-pro\"").expect("write");

        let config = StresswatchConfig::load(Some(file.path())).expect("loads");
        assert_eq!(config.narrative.model, "gemini-1.5-pro");
    }

    #[test]
    fn blank_api_key_counts_as_absent() {
        let config = from_toml("[narrative]\napi_key = \"  \"\n").expect("valid config");
        assert_eq!(config.narrative.api_key(), None);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = StresswatchConfig::load(Some(&dir.path().join("absent.toml")))
            .expect_err("missing");
        assert!(matches!(err, ConfigError::MissingFile { .. }));
    }

    #[test]
    fn malformed_file_is_a_load_error() {
        let err = from_toml("[refresh]\nlookback = \"two\"\n").expect_err("wrong type");
        assert!(matches!(err, ConfigError::Load(_)));
    }
}
