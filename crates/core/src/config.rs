use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `CREATIVE_LIFT__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub split: SplitConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub artifacts: ArtifactConfig,
}

/// Input file locations.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_sessions_path")]
    pub sessions_path: String,
    #[serde(default = "default_campaigns_path")]
    pub campaigns_path: String,
    #[serde(default = "default_orders_path")]
    pub orders_path: String,
}

/// Chronological split fractions. Test takes the remainder.
#[derive(Debug, Clone, Deserialize)]
pub struct SplitConfig {
    #[serde(default = "default_train_fraction")]
    pub train_fraction: f64,
    #[serde(default = "default_tune_fraction")]
    pub tune_fraction: f64,
}

/// Randomized hyperparameter search settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_trials")]
    pub trials: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_early_stopping_rounds")]
    pub early_stopping_rounds: usize,
}

/// Output locations for the persisted model/feature-list pair.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

// Default functions
fn default_sessions_path() -> String {
    "sessions.csv".to_string()
}
fn default_campaigns_path() -> String {
    "campaigns.csv".to_string()
}
fn default_orders_path() -> String {
    "orders.csv".to_string()
}
fn default_train_fraction() -> f64 {
    0.70
}
fn default_tune_fraction() -> f64 {
    0.15
}
fn default_trials() -> usize {
    50
}
fn default_seed() -> u64 {
    42
}
fn default_early_stopping_rounds() -> usize {
    20
}
fn default_output_dir() -> String {
    "artifacts".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            sessions_path: default_sessions_path(),
            campaigns_path: default_campaigns_path(),
            orders_path: default_orders_path(),
        }
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_fraction: default_train_fraction(),
            tune_fraction: default_tune_fraction(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            trials: default_trials(),
            seed: default_seed(),
            early_stopping_rounds: default_early_stopping_rounds(),
        }
    }
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            split: SplitConfig::default(),
            search: SearchConfig::default(),
            artifacts: ArtifactConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("CREATIVE_LIFT")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_workflow() {
        let config = AppConfig::default();
        assert!((config.split.train_fraction - 0.70).abs() < f64::EPSILON);
        assert!((config.split.tune_fraction - 0.15).abs() < f64::EPSILON);
        assert_eq!(config.search.trials, 50);
        assert_eq!(config.search.early_stopping_rounds, 20);
    }
}
