use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub share: ShareConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// `gemini` or `openai`
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    /// Environment variable holding the credential.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: providers::gemini::DEFAULT_MODEL.to_string(),
            base_url: None,
            api_key_env: "API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    pub name: String,
    pub demo_files: bool,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            name: "LAN Share".to_string(),
            demo_files: true,
        }
    }
}

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("LANSHARE")
            .prefix_separator("__")
            .separator("__"),
    );
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}

/// Reads the credential named by `api_key_env`; blank values count as absent.
pub fn resolve_credential(ai: &AiConfig) -> Option<String> {
    std::env::var(&ai.api_key_env)
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}
