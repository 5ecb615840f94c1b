use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SbError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub agents: AgentsConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub contract: ContractConfig,
}

impl Config {
    /// Load defaults, then global and project TOML, then environment overrides.
    ///
    /// An explicit path (or `SPRINTBOARD_CONFIG`) replaces both file layers.
    pub fn load(explicit_path: Option<&Path>, project_root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("SPRINTBOARD_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_project(project_root)? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;

        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("sprintboard/config.toml"))
    }

    fn load_project(project_root: &Path) -> Result<Option<ConfigPatch>> {
        Self::load_patch(&project_root.join("sprintboard.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| SbError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| SbError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.database {
            self.database.merge(patch);
        }
        if let Some(patch) = patch.server {
            self.server.merge(patch);
        }
        if let Some(patch) = patch.llm {
            self.llm.merge(patch);
        }
        if let Some(patch) = patch.agents {
            self.agents.merge(patch);
        }
        if let Some(patch) = patch.analytics {
            self.analytics.merge(patch);
        }
        if let Some(patch) = patch.contract {
            self.contract.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("SPRINTBOARD_DB") {
            self.database.path = PathBuf::from(value);
        }
        if let Some(value) = lookup("SPRINTBOARD_BIND") {
            self.server.bind = value;
        }
        if let Some(value) = lookup("SPRINTBOARD_LLM_ENDPOINT") {
            self.llm.endpoint = value;
        }
        if let Some(value) = lookup("OPENAI_API_KEY") {
            if !value.trim().is_empty() {
                self.llm.enabled = true;
            }
            self.llm.api_key = value;
        }
        if let Some(value) = lookup("OPENAI_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = lookup("SPRINTBOARD_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("SPRINTBOARD_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = lookup("AI_FALLBACK_ENABLED") {
            self.agents.fallback_enabled = parse_bool(&value);
        }
        if let Some(value) = lookup("SPRINTBOARD_CONTRACT_DEADLINE_DAYS") {
            self.contract.deadline_days = parse_i64("SPRINTBOARD_CONTRACT_DEADLINE_DAYS", &value)?;
        }
        if let Some(value) = lookup("SPRINTBOARD_CHURN_RISK_THRESHOLD") {
            self.analytics.churn_risk_threshold =
                parse_f64("SPRINTBOARD_CHURN_RISK_THRESHOLD", &value)?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("sprintboard.db"),
        }
    }
}

impl DatabaseConfig {
    fn merge(&mut self, patch: DatabasePatch) {
        if let Some(value) = patch.path {
            self.path = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub bind: String,
    #[serde(default)]
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            cors_permissive: true,
        }
    }
}

impl ServerConfig {
    fn merge(&mut self, patch: ServerPatch) {
        if let Some(value) = patch.bind {
            self.bind = value;
        }
        if let Some(value) = patch.cors_permissive {
            self.cors_permissive = value;
        }
    }
}

/// Chat completion endpoint settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("enabled", &self.enabled)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "gpt-3.5-turbo".to_string(),
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    fn merge(&mut self, patch: LlmPatch) {
        if let Some(value) = patch.enabled {
            self.enabled = value;
        }
        if let Some(value) = patch.endpoint {
            self.endpoint = value;
        }
        if let Some(value) = patch.api_key {
            self.api_key = value;
        }
        if let Some(value) = patch.model {
            self.model = value;
        }
        if let Some(value) = patch.timeout_secs {
            self.timeout_secs = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentsConfig {
    #[serde(default)]
    pub fallback_enabled: bool,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            fallback_enabled: true,
        }
    }
}

impl AgentsConfig {
    fn merge(&mut self, patch: AgentsPatch) {
        if let Some(value) = patch.fallback_enabled {
            self.fallback_enabled = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default)]
    pub churn_risk_threshold: f64,
    #[serde(default)]
    pub forecast_base_revenue: f64,
    #[serde(default)]
    pub forecast_growth_rate: f64,
    #[serde(default)]
    pub min_training_rows: usize,
    #[serde(default)]
    pub default_win_rate: f64,
    #[serde(default)]
    pub seed: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            churn_risk_threshold: 0.7,
            forecast_base_revenue: 100_000.0,
            forecast_growth_rate: 0.05,
            min_training_rows: 10,
            default_win_rate: 0.23,
            seed: 42,
        }
    }
}

impl AnalyticsConfig {
    fn merge(&mut self, patch: AnalyticsPatch) {
        if let Some(value) = patch.churn_risk_threshold {
            self.churn_risk_threshold = value;
        }
        if let Some(value) = patch.forecast_base_revenue {
            self.forecast_base_revenue = value;
        }
        if let Some(value) = patch.forecast_growth_rate {
            self.forecast_growth_rate = value;
        }
        if let Some(value) = patch.min_training_rows {
            self.min_training_rows = value;
        }
        if let Some(value) = patch.default_win_rate {
            self.default_win_rate = value;
        }
        if let Some(value) = patch.seed {
            self.seed = value;
        }
    }
}

/// Post-close paperwork policy for won deals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ContractConfig {
    #[serde(default)]
    pub deadline_days: i64,
    #[serde(default)]
    pub reminder_interval_days: i64,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            deadline_days: 30,
            reminder_interval_days: 7,
        }
    }
}

impl ContractConfig {
    fn merge(&mut self, patch: ContractPatch) {
        if let Some(value) = patch.deadline_days {
            self.deadline_days = value;
        }
        if let Some(value) = patch.reminder_interval_days {
            self.reminder_interval_days = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub database: Option<DatabasePatch>,
    pub server: Option<ServerPatch>,
    pub llm: Option<LlmPatch>,
    pub agents: Option<AgentsPatch>,
    pub analytics: Option<AnalyticsPatch>,
    pub contract: Option<ContractPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DatabasePatch {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ServerPatch {
    pub bind: Option<String>,
    pub cors_permissive: Option<bool>,
}

#[derive(Clone, Default, Deserialize)]
struct LlmPatch {
    pub enabled: Option<bool>,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl std::fmt::Debug for LlmPatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmPatch")
            .field("enabled", &self.enabled)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct AgentsPatch {
    pub fallback_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct AnalyticsPatch {
    pub churn_risk_threshold: Option<f64>,
    pub forecast_base_revenue: Option<f64>,
    pub forecast_growth_rate: Option<f64>,
    pub min_training_rows: Option<usize>,
    pub default_win_rate: Option<f64>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ContractPatch {
    pub deadline_days: Option<i64>,
    pub reminder_interval_days: Option<i64>,
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_u64(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|err| SbError::Config(format!("invalid {key} value {value}: {err}")))
}

fn parse_i64(key: &str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|err| SbError::Config(format!("invalid {key} value {value}: {err}")))
}

fn parse_f64(key: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|err| SbError::Config(format!("invalid {key} value {value}: {err}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use tempfile::TempDir;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    // =========================================================================
    // Defaults
    // =========================================================================

    #[test]
    fn config_defaults() {
        let config = Config::default();
        assert_eq!(config.database.path, PathBuf::from("sprintboard.db"));
        assert_eq!(config.server.bind, "127.0.0.1:8000");
        assert!(!config.llm.enabled);
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert!(config.agents.fallback_enabled);
        assert_eq!(config.contract.deadline_days, 30);
        assert_eq!(config.contract.reminder_interval_days, 7);
        assert!((config.analytics.churn_risk_threshold - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn api_key_is_never_serialized_or_debugged() {
        let mut config = Config::default();
        config.llm.api_key = "sk-secret".to_string();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
        assert!(!format!("{:?}", config.llm).contains("sk-secret"));
    }

    #[test]
    fn llm_patch_debug_redacts_api_key() {
        let patch: ConfigPatch =
            toml::from_str("[llm]\napi_key = \"sk-secret\"\nmodel = \"gpt-4o\"\n").unwrap();
        let debug = format!("{patch:?}");
        assert!(!debug.contains("sk-secret"), "{debug}");
        assert!(debug.contains("<redacted>"));
        assert!(debug.contains("gpt-4o"));
    }

    // =========================================================================
    // File layers
    // =========================================================================

    #[test]
    fn load_patch_nonexistent_file() {
        let result = Config::load_patch(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn load_patch_partial_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sprintboard.toml");
        std::fs::write(
            &path,
            r#"
[contract]
deadline_days = 45
"#,
        )
        .unwrap();

        let patch = Config::load_patch(&path).unwrap().unwrap();
        assert!(patch.contract.is_some());
        assert!(patch.llm.is_none());

        let mut config = Config::default();
        config.merge_patch(patch);
        assert_eq!(config.contract.deadline_days, 45);
        assert_eq!(config.contract.reminder_interval_days, 7);
    }

    #[test]
    fn load_patch_invalid_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sprintboard.toml");
        std::fs::write(&path, "this is not valid toml [[[").unwrap();

        let err = Config::load_patch(&path).unwrap_err();
        assert!(err.to_string().contains("parse config"));
    }

    #[test]
    fn load_from_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
[server]
bind = "0.0.0.0:9000"

[llm]
model = "gpt-4o-mini"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path), temp.path()).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.llm.model, "gpt-4o-mini");
    }

    // =========================================================================
    // Environment overrides
    // =========================================================================

    #[test]
    fn api_key_override_enables_llm() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup_from(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("OPENAI_MODEL", "gpt-4o"),
            ]))
            .unwrap();
        assert!(config.llm.enabled);
        assert_eq!(config.llm.api_key, "sk-test");
        assert_eq!(config.llm.model, "gpt-4o");
    }

    #[test]
    fn blank_api_key_keeps_llm_disabled() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup_from(&[("OPENAI_API_KEY", "  ")]))
            .unwrap();
        assert!(!config.llm.enabled);
    }

    #[test]
    fn fallback_override_parses_bool() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup_from(&[("AI_FALLBACK_ENABLED", "false")]))
            .unwrap();
        assert!(!config.agents.fallback_enabled);
    }

    #[test]
    fn invalid_numeric_override_is_config_error() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(lookup_from(&[("SPRINTBOARD_CONTRACT_DEADLINE_DAYS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, SbError::Config(_)));
        assert!(err.to_string().contains("SPRINTBOARD_CONTRACT_DEADLINE_DAYS"));
    }

    #[test]
    fn db_and_bind_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup_from(&[
                ("SPRINTBOARD_DB", "/tmp/x.db"),
                ("SPRINTBOARD_BIND", "0.0.0.0:1"),
            ]))
            .unwrap();
        assert_eq!(config.database.path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.server.bind, "0.0.0.0:1");
    }
}
