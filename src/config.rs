//! Environment configuration.
//!
//! The routing API key is supplied out of band. A missing key is reported
//! when the client is configured, never per request.

use std::env;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::ors::OrsConfig;
use crate::planner::PlannerOptions;

pub const ORS_API_KEY: &str = "ORS_API_KEY";
pub const ORS_BASE_URL: &str = "ORS_BASE_URL";
pub const ORS_PROFILE: &str = "ORS_PROFILE";
pub const ORS_TIMEOUT_SECS: &str = "ORS_TIMEOUT_SECS";
pub const DISPATCH_MAX_IN_FLIGHT: &str = "DISPATCH_MAX_IN_FLIGHT";
pub const DISPATCH_MAX_ATTEMPTS: &str = "DISPATCH_MAX_ATTEMPTS";

impl OrsConfig {
    /// Reads the OpenRouteService settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(ORS_API_KEY)
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey(ORS_API_KEY))?;

        let defaults = OrsConfig::new(api_key);
        Ok(Self {
            base_url: lookup(ORS_BASE_URL).unwrap_or(defaults.base_url),
            profile: lookup(ORS_PROFILE).unwrap_or(defaults.profile),
            timeout_secs: parse_or(&lookup, ORS_TIMEOUT_SECS, defaults.timeout_secs)?,
            api_key: defaults.api_key,
        })
    }
}

impl PlannerOptions {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = PlannerOptions::default();
        let options = Self {
            max_in_flight: parse_or(&lookup, DISPATCH_MAX_IN_FLIGHT, defaults.max_in_flight)?,
            max_attempts: parse_or(&lookup, DISPATCH_MAX_ATTEMPTS, defaults.max_attempts)?,
        };

        if options.max_in_flight == 0 {
            return Err(ConfigError::InvalidValue {
                var: DISPATCH_MAX_IN_FLIGHT,
                value: "0".to_string(),
            });
        }
        if options.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                var: DISPATCH_MAX_ATTEMPTS,
                value: "0".to_string(),
            });
        }

        Ok(options)
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value }),
        None => Ok(default),
    }
}
