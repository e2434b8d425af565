use std::fmt;
use std::future::Future;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::{info, warn};

#[cfg(feature = "sdk")]
use super::managed::ManagedBackend;
use super::GenerationError;
use super::rest::{HttpTransport, RestBackend};
use super::secrets::{ApiKey, ApiKeyLookup, ApiKeySource, get_api_key_from_sources};

pub const DEFAULT_HOST: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Anything that turns a prompt into generated text.
pub trait TextGenerator {
    fn generate(
        &self,
        prompt: &str,
        temperature: f32,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send;
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: Option<ApiKey>,
    pub host: String,
    pub model: String,
    pub timeout: Duration,
    /// Skip the managed client even when it is compiled in.
    pub force_rest: bool,
}

impl LlmConfig {
    pub fn from_lookup(lookup: ApiKeyLookup) -> Self {
        Self {
            api_key: lookup.api_key,
            host: DEFAULT_HOST.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            force_rest: false,
        }
    }

    pub fn from_environment() -> Result<(Self, Option<ApiKeySource>)> {
        let lookup = get_api_key_from_sources()?;
        let source = lookup.source;
        Ok((Self::from_lookup(lookup), source))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    Managed,
    Rest,
    Unconfigured,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Managed => "managed client",
            Strategy::Rest => "REST fallback",
            Strategy::Unconfigured => "unconfigured",
        };
        f.write_str(name)
    }
}

/// Managed client when it is compiled in and wanted, raw HTTP when only a key
/// is present, nothing at all without a usable key.
pub fn select_strategy(has_key: bool, sdk_available: bool) -> Strategy {
    match (has_key, sdk_available) {
        (false, _) => Strategy::Unconfigured,
        (true, true) => Strategy::Managed,
        (true, false) => Strategy::Rest,
    }
}

enum Backend<T> {
    #[cfg(feature = "sdk")]
    Managed(ManagedBackend),
    Rest(RestBackend<T>),
    Unconfigured,
}

/// Generation client with its strategy fixed at construction.
pub struct Generator<T = reqwest::Client> {
    backend: Backend<T>,
    timeout: Duration,
}

impl Generator<reqwest::Client> {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self::with_transport(config, reqwest::Client::new())
    }
}

impl<T: HttpTransport + Send + Sync> Generator<T> {
    pub fn with_transport(config: &LlmConfig, transport: T) -> Self {
        let sdk_available = cfg!(feature = "sdk") && !config.force_rest;
        Self::select(config, transport, sdk_available)
    }

    fn select(config: &LlmConfig, transport: T, sdk_available: bool) -> Self {
        let strategy = select_strategy(config.api_key.is_some(), sdk_available);
        let backend = match (strategy, &config.api_key) {
            #[cfg(feature = "sdk")]
            (Strategy::Managed, Some(key)) => {
                Backend::Managed(ManagedBackend::new(key, &config.host, &config.model))
            }
            // Without the managed client compiled in, REST serves its requests.
            #[cfg(not(feature = "sdk"))]
            (Strategy::Managed, Some(key)) => {
                Backend::Rest(RestBackend::new(transport, key.clone(), &config.host, &config.model))
            }
            (Strategy::Rest, Some(key)) => {
                Backend::Rest(RestBackend::new(transport, key.clone(), &config.host, &config.model))
            }
            _ => Backend::Unconfigured,
        };

        let generator = Self {
            backend,
            timeout: config.timeout,
        };
        info!(
            strategy = %generator.strategy(),
            model = %config.model,
            "generation client ready"
        );
        generator
    }

    pub fn strategy(&self) -> Strategy {
        match self.backend {
            #[cfg(feature = "sdk")]
            Backend::Managed(_) => Strategy::Managed,
            Backend::Rest(_) => Strategy::Rest,
            Backend::Unconfigured => Strategy::Unconfigured,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.strategy() != Strategy::Unconfigured
    }
}

impl<T: HttpTransport + Send + Sync> TextGenerator for Generator<T> {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, GenerationError> {
        if !self.is_configured() {
            warn!("generation requested without a usable API key");
            return Err(GenerationError::Unconfigured);
        }

        let call = async {
            match &self.backend {
                #[cfg(feature = "sdk")]
                Backend::Managed(managed) => managed.generate(prompt, temperature).await,
                Backend::Rest(rest) => rest.generate(prompt, temperature).await,
                Backend::Unconfigured => Err(GenerationError::Unconfigured),
            }
        };

        info!(
            strategy = %self.strategy(),
            prompt_chars = prompt.chars().count(),
            temperature,
            "sending generation request"
        );
        let started = std::time::Instant::now();
        let result = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(self.timeout)),
        };

        match &result {
            Ok(text) => info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                response_chars = text.chars().count(),
                "generation succeeded"
            ),
            Err(err) => warn!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                error = %err,
                "generation failed"
            ),
        }
        result
    }
}

/// Checks the configured key with a tiny generation call.
pub async fn test_configured_api_key(force_rest: bool) -> Result<(ApiKeySource, Strategy)> {
    let (mut config, source) = LlmConfig::from_environment()?;
    config.force_rest = force_rest;
    let generator = Generator::from_config(&config);
    let source = source.ok_or(GenerationError::Unconfigured)?;

    generator
        .generate("Reply with the single word OK.", 0.0)
        .await
        .map_err(|err| anyhow!("Failed to validate the Gemini API key: {err}"))?;
    Ok((source, generator.strategy()))
}
