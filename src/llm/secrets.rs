use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use dialoguer::{Password, theme::ColorfulTheme};
use serde::{Deserialize, Serialize};

use crate::palette::Palette;
use crate::utils::{get_data_dir, strip_controls_and_escapes};

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const PLACEHOLDER_KEY: &str = "YOUR_API_KEY_HERE";

const AUTH_FILE_NAME: &str = "auth.json";
const GEMINI_PROVIDER: &str = "gemini";

/// A key that is known to be non-blank and not the placeholder.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == PLACEHOLDER_KEY {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeySource {
    Environment,
    AuthFile,
}

impl ApiKeySource {
    pub fn description(&self) -> &'static str {
        match self {
            ApiKeySource::Environment => "environment variable",
            ApiKeySource::AuthFile => "local auth file",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApiKeyLookup {
    pub api_key: Option<ApiKey>,
    pub source: Option<ApiKeySource>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct AuthFile {
    #[serde(flatten)]
    providers: HashMap<String, ProviderAuth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProviderAuth {
    key: String,
}

#[cfg(test)]
const TEST_AUTH_PATH_ENV: &str = "VOCAB_TEST_AUTH_PATH";

pub fn get_api_key_from_sources() -> Result<ApiKeyLookup> {
    let env_value = env::var(API_KEY_ENV).ok();
    let auth_path = auth_file_path()?;
    lookup_api_key(env_value.as_deref(), &auth_path)
}

fn lookup_api_key(env_value: Option<&str>, auth_path: &Path) -> Result<ApiKeyLookup> {
    if let Some(api_key) = env_value.and_then(ApiKey::parse) {
        return Ok(ApiKeyLookup {
            api_key: Some(api_key),
            source: Some(ApiKeySource::Environment),
        });
    }

    let Some(auth) = read_auth_file(auth_path)? else {
        return Ok(ApiKeyLookup::default());
    };

    let key = auth
        .providers
        .get(GEMINI_PROVIDER)
        .and_then(|entry| ApiKey::parse(&entry.key));

    match key {
        Some(api_key) => Ok(ApiKeyLookup {
            api_key: Some(api_key),
            source: Some(ApiKeySource::AuthFile),
        }),
        None => Ok(ApiKeyLookup::default()),
    }
}

pub fn store_api_key(api_key: &str) -> Result<()> {
    let Some(key) = ApiKey::parse(api_key) else {
        bail!("Cannot store an empty or placeholder API key");
    };

    let auth_path = auth_file_path()?;
    let mut auth = read_auth_file(&auth_path)?.unwrap_or_default();

    auth.providers.insert(
        GEMINI_PROVIDER.to_string(),
        ProviderAuth {
            key: key.expose().to_string(),
        },
    );

    write_auth_file(&auth_path, &auth)
}

pub fn clear_api_key() -> Result<bool> {
    let auth_path = auth_file_path()?;
    let Some(mut auth) = read_auth_file(&auth_path)? else {
        return Ok(false);
    };

    if auth.providers.remove(GEMINI_PROVIDER).is_none() {
        return Ok(false);
    }

    if auth.providers.is_empty() {
        fs::remove_file(&auth_path).with_context(|| {
            format!(
                "Failed to remove empty auth file at {}",
                auth_path.display()
            )
        })?;
        return Ok(true);
    }

    write_auth_file(&auth_path, &auth)?;
    Ok(true)
}

pub fn prompt_for_api_key() -> Result<String> {
    println!(
        "{} (https://aistudio.google.com/app/apikey). It's stored locally for future sessions.",
        Palette::paint(Palette::SUCCESS, "Enter your Gemini API key")
    );
    let raw_password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("API Key")
        .allow_empty_password(true)
        .interact()
        .context("Failed to read the API key")?;

    Ok(strip_controls_and_escapes(&raw_password))
}

fn auth_file_path() -> Result<PathBuf> {
    #[cfg(test)]
    {
        if let Ok(path) = env::var(TEST_AUTH_PATH_ENV)
            && !path.trim().is_empty()
        {
            return Ok(PathBuf::from(path));
        }
    }

    let data_dir = get_data_dir()?;
    Ok(data_dir.join(AUTH_FILE_NAME))
}

fn read_auth_file(path: &Path) -> Result<Option<AuthFile>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(parse_auth_contents(&contents, path)?),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => {
            Err(err).with_context(|| format!("Failed to read auth file at {}", path.display()))
        }
    }
}

fn write_auth_file(path: &Path, value: &AuthFile) -> Result<()> {
    let contents = serde_json::to_string_pretty(value)?;
    fs::write(path, format!("{contents}\n"))
        .with_context(|| format!("Failed to write auth file at {}", path.display()))?;
    Ok(())
}

fn parse_auth_contents(contents: &str, path: &Path) -> Result<Option<AuthFile>> {
    if contents.trim().is_empty() {
        return Ok(Some(AuthFile::default()));
    }

    let parsed: AuthFile = serde_json::from_str(contents)
        .with_context(|| format!("Failed to parse auth file at {}", path.display()))?;
    Ok(Some(parsed))
}
