// Reference-source credentials and source opening
//
// Tokens come from the environment variable named by `source.token_env`.
// They are never read from or written to the settings file.

use std::env;

use stuffcheck_io::{FileSource, HttpSource};
use stuffcheck_recon::{ReferenceSource, SourceError};

use crate::settings::SourceSettings;

/// Source of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Environment,
    None,
}

impl TokenSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenSource::Environment => "environment",
            TokenSource::None => "none",
        }
    }
}

/// Result of token lookup
#[derive(Debug, Clone)]
pub struct TokenLookup {
    pub token: Option<String>,
    pub source: TokenSource,
}

/// Read the token from `env_name`. Empty values count as unset.
pub fn get_token(env_name: &str) -> TokenLookup {
    match env::var(env_name) {
        Ok(token) if !token.trim().is_empty() => TokenLookup {
            token: Some(token.trim().to_string()),
            source: TokenSource::Environment,
        },
        _ => TokenLookup { token: None, source: TokenSource::None },
    }
}

/// Open the configured reference source for one request.
pub fn open_source(settings: &SourceSettings) -> Result<Box<dyn ReferenceSource>, SourceError> {
    open_source_with(settings, get_token(&settings.token_env))
}

pub fn open_source_with(
    settings: &SourceSettings,
    lookup: TokenLookup,
) -> Result<Box<dyn ReferenceSource>, SourceError> {
    if let Some(path) = &settings.path {
        log::debug!("reference source: file {} (sheet {})", path.display(), settings.sheet);
        return Ok(Box::new(FileSource::new(path, &settings.sheet)));
    }

    let Some(url) = &settings.url else {
        return Err(SourceError::NotConfigured);
    };

    if lookup.token.is_none() && settings.require_token {
        return Err(SourceError::MissingCredentials(settings.token_env.clone()));
    }
    log::debug!(
        "reference source: {} (sheet {}, token from {})",
        url,
        settings.sheet,
        lookup.source.as_str()
    );
    Ok(Box::new(HttpSource::new(url, &settings.sheet, lookup.token)?))
}
