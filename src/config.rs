use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Default Anakin API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.anakin.ai";

/// API version sent as `X-Anakin-Api-Version` on every outbound call.
pub const DEFAULT_API_VERSION: &str = "2024-05-06";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_single_shot_models() -> Vec<String> {
    // These models reject stream=true upstream; the relay serves them through
    // a single-chunk event stream instead (see the endpoint handler).
    vec!["o1-preview".to_string(), "o1-mini".to_string()]
}

/// Relay configuration loaded from `config.yaml`.
///
/// The model map is the only required section:
///
/// ```yaml
/// models:
///   gpt-4o: 1024
///   claude-3-5-sonnet: 2048
/// ```
///
/// The loaded value is injected into the router state and treated as
/// read-only for the life of the process; requests for unmapped models are
/// rejected per-request rather than crashing anything.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayConfig {
    /// OpenAI-facing model name -> Anakin app id.
    pub models: HashMap<String, u64>,

    /// Models served with streaming response headers but a non-streaming
    /// backend call (wrapped as a one-chunk stream).
    #[serde(default = "default_single_shot_models")]
    pub single_shot_models: Vec<String>,

    /// Anakin API base URL. `ANAKIN_BASE_URL` overrides at load time.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Value for the `X-Anakin-Api-Version` header.
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl RelayConfig {
    /// Load relay configuration from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!(
                "Failed to read relay config file: {}",
                path.as_ref().display()
            )
        })?;

        let mut config: RelayConfig =
            serde_yaml::from_str(&content).with_context(|| "Failed to parse relay config YAML")?;

        // Environment override for the upstream endpoint (handy in tests and
        // when pointing at a regional mirror).
        if let Ok(base) = std::env::var("ANAKIN_BASE_URL") {
            let base = base.trim();
            if !base.is_empty() {
                config.base_url = base.trim_end_matches('/').to_string();
            }
        }

        Ok(config)
    }

    /// Build a config from an in-memory model map (tests, embedding).
    pub fn from_models(models: HashMap<String, u64>, base_url: impl Into<String>) -> Self {
        Self {
            models,
            single_shot_models: default_single_shot_models(),
            base_url: base_url.into(),
            api_version: default_api_version(),
        }
    }

    /// Look up the Anakin app id for a model name.
    pub fn app_id(&self, model: &str) -> Option<u64> {
        self.models.get(model).copied()
    }

    /// Whether this model should be served through the single-chunk shim.
    pub fn is_single_shot(&self, model: &str) -> bool {
        self.single_shot_models.iter().any(|m| m == model)
    }

    /// Names of all configured models.
    pub fn model_names(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }
}
