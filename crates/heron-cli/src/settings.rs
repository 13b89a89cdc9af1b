use std::time::Duration;

use anyhow::{anyhow, Result};
use config::{Config, Environment};
use heron::agent::{AgentConfig, DEFAULT_MAX_ITERATIONS, DEFAULT_SYSTEM_PROMPT};
use heron::providers::configs::{OllamaProviderConfig, OpenAiProviderConfig, ProviderConfig};
use heron::providers::factory::ProviderType;
use heron::providers::ollama;
use heron::providers::openai;
use serde::Deserialize;
use strum::IntoEnumIterator;

#[derive(Debug, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default)]
    pub model_timeout_secs: Option<u64>,
    #[serde(default)]
    pub tool_timeout_secs: Option<u64>,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            model_timeout_secs: None,
            tool_timeout_secs: None,
            system_prompt: default_system_prompt(),
        }
    }
}

impl AgentSettings {
    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            max_iterations: self.max_iterations,
            model_timeout: self.model_timeout_secs.map(Duration::from_secs),
            tool_timeout: self.tool_timeout_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum ProviderSettings {
    OpenAi {
        #[serde(default = "default_openai_host")]
        host: String,
        api_key: String,
        #[serde(default = "default_openai_model")]
        model: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<i32>,
    },
    Ollama {
        #[serde(default = "default_ollama_host")]
        host: String,
        #[serde(default = "default_ollama_model")]
        model: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<i32>,
    },
}

impl ProviderSettings {
    pub fn into_config(self) -> ProviderConfig {
        match self {
            ProviderSettings::OpenAi {
                host,
                api_key,
                model,
                temperature,
                max_tokens,
            } => ProviderConfig::OpenAi(OpenAiProviderConfig {
                host,
                api_key,
                model,
                temperature,
                max_tokens,
            }),
            ProviderSettings::Ollama {
                host,
                model,
                temperature,
                max_tokens,
            } => ProviderConfig::Ollama(OllamaProviderConfig {
                host,
                model,
                temperature,
                max_tokens,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub agent: AgentSettings,
    pub provider: ProviderSettings,
}

impl Settings {
    /// Load settings from `HERON_`-prefixed environment variables, e.g.
    /// `HERON_PROVIDER__TYPE=openai HERON_PROVIDER__API_KEY=...`.
    pub fn new() -> Result<Self> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("HERON")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize().map_err(|err| {
            let supported: Vec<&str> = ProviderType::iter().map(|t| t.as_str()).collect();
            anyhow!(
                "{}. Set HERON_PROVIDER__TYPE to one of: {} (and HERON_PROVIDER__API_KEY for openai)",
                err,
                supported.join(", ")
            )
        })
    }
}

fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_openai_host() -> String {
    openai::OPENAI_HOST.to_string()
}

fn default_openai_model() -> String {
    openai::OPENAI_MODEL.to_string()
}

fn default_ollama_host() -> String {
    ollama::OLLAMA_HOST.to_string()
}

fn default_ollama_model() -> String {
    ollama::OLLAMA_MODEL.to_string()
}
