use crumb_pricing::{Fee, PricingDefaults};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub pricing: PricingSettings,
    #[serde(default)]
    pub snapshot: SnapshotSettings,
    #[serde(default)]
    pub batch: BatchSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PricingSettings {
    #[serde(default = "default_margin")]
    pub default_margin_percentage: f64,
    #[serde(default)]
    pub default_wastage_percentage: f64,
    /// Applied in the listed order
    #[serde(default)]
    pub default_fees: Vec<Fee>,
    #[serde(default = "default_rounding")]
    pub rounding_decimals: u32,
}

fn default_margin() -> f64 { 30.0 }

fn default_rounding() -> u32 { 2 }

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            default_margin_percentage: default_margin(),
            default_wastage_percentage: 0.0,
            default_fees: Vec::new(),
            rounding_decimals: default_rounding(),
        }
    }
}

impl PricingSettings {
    pub fn defaults(&self) -> PricingDefaults {
        PricingDefaults {
            margin_percentage: self.default_margin_percentage,
            wastage_percentage: self.default_wastage_percentage,
            fees: self.default_fees.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SnapshotSettings {
    pub path: String,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            path: "data/catalog.json".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BatchSettings {
    #[serde(default)]
    pub parallel: bool,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Built-in defaults cover every key, so even this file is optional
            .add_source(config::File::with_name("config/default").required(false))
            // Per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `CRUMB_PRICING__DEFAULT_MARGIN_PERCENTAGE=35`
            .add_source(config::Environment::with_prefix("CRUMB").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Parse a TOML document with the same layout as `config/default.toml`
    pub fn from_toml(contents: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml(
            r#"
            [pricing]
            default_margin_percentage = 45.0
            default_wastage_percentage = 3.0
            rounding_decimals = 3

            [[pricing.default_fees]]
            name = "platform"
            percentage = 12.0

            [[pricing.default_fees]]
            name = "card"
            percentage = 3.5

            [snapshot]
            path = "/tmp/catalog.json"

            [batch]
            parallel = true
            "#,
        )
        .expect("Failed to parse config");

        assert_eq!(config.pricing.default_margin_percentage, 45.0);
        assert_eq!(config.pricing.rounding_decimals, 3);
        assert_eq!(config.snapshot.path, "/tmp/catalog.json");
        assert!(config.batch.parallel);

        let defaults = config.pricing.defaults();
        assert_eq!(defaults.fees, vec![Fee::new("platform", 12.0), Fee::new("card", 3.5)]);
        assert_eq!(defaults.wastage_percentage, 3.0);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = Config::from_toml("").expect("Failed to parse config");

        assert_eq!(config.pricing.default_margin_percentage, 30.0);
        assert_eq!(config.pricing.rounding_decimals, 2);
        assert!(config.pricing.default_fees.is_empty());
        assert_eq!(config.snapshot.path, "data/catalog.json");
        assert!(!config.batch.parallel);
    }
}
