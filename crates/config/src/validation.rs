//! Configuration validation
//!
//! Whole-file checks run while parsing. A failure here rejects the file.
//! Problems confined to one feed or route are reported by
//! [`FeedConfig::validate`](crate::FeedConfig::validate) and
//! [`RouteConfig::validate`](crate::RouteConfig::validate) instead, so the
//! caller can skip that entry and keep the rest.

use std::collections::BTreeMap;

use crate::Config;
use crate::error::{ConfigError, Result};

/// Validate the file-level settings
pub fn validate_config(config: &Config) -> Result<()> {
    validate_global(config)?;
    Ok(())
}

fn validate_global(config: &Config) -> Result<()> {
    if config.global.queue_size == 0 {
        return Err(ConfigError::invalid_value(
            "section",
            "global",
            "queue_size",
            "must be greater than 0",
        ));
    }
    Ok(())
}

/// Names of feeds that pass their own validation, with the errors of the rest
///
/// Malformed feed tables are reported after the validation errors.
pub fn usable_feeds(config: &Config) -> (Vec<&str>, Vec<ConfigError>) {
    let (ok, mut errors) =
        partition(config.feeds.iter().map(|(name, feed)| (name.as_str(), feed.validate(name))));
    errors.extend(malformed("feed", &config.malformed_feeds));
    (ok, errors)
}

/// Names of routes that pass their own validation, with the errors of the rest
///
/// Malformed route tables are reported after the validation errors.
pub fn usable_routes(config: &Config) -> (Vec<&str>, Vec<ConfigError>) {
    let (ok, mut errors) =
        partition(config.routes.iter().map(|(name, route)| (name.as_str(), route.validate(name))));
    errors.extend(malformed("route", &config.malformed_routes));
    (ok, errors)
}

fn malformed<'a>(
    component: &'static str,
    entries: &'a BTreeMap<String, String>,
) -> impl Iterator<Item = ConfigError> + 'a {
    entries
        .iter()
        .map(move |(name, message)| ConfigError::malformed(component, name.as_str(), message.as_str()))
}

fn partition<'a>(
    entries: impl Iterator<Item = (&'a str, Result<()>)>,
) -> (Vec<&'a str>, Vec<ConfigError>) {
    let mut ok = Vec::new();
    let mut errors = Vec::new();
    for (name, result) in entries {
        match result {
            Ok(()) => ok.push(name),
            Err(e) => errors.push(e),
        }
    }
    (ok, errors)
}
