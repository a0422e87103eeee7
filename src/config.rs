//! Environment configuration.
//!
//! | Variable     | Default   | Meaning                                   |
//! |--------------|-----------|-------------------------------------------|
//! | `PORT`       | `8000`    | TCP port of the HTTP listener             |
//! | `CART_SCOPE` | `shared`  | `shared` (alias `process`) or `session`   |
//! | `ASSETS_DIR` | discovered| directory holding `shopping-cart.html`    |

use crate::error::ConfigError;
use std::path::PathBuf;
use std::str::FromStr;

/// Port used when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 8000;

/// Which cart a protocol session binds to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CartScope {
    /// One process-wide cart shared by every session, like a kiosk.
    #[default]
    Shared,
    /// A fresh empty cart per session, discarded when the session closes.
    Session,
}

/// Parses `shared`, `session` or `process`, case-insensitively.
/// `process` is another name for [`CartScope::Shared`].
impl FromStr for CartScope {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shared" | "process" => Ok(Self::Shared),
            "session" => Ok(Self::Session),
            _ => Err(ConfigError::InvalidScope(s.to_string())),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub cart_scope: CartScope,
    /// Explicit assets directory; discovered from the working directory when unset.
    pub assets_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            cart_scope: CartScope::default(),
            assets_dir: None,
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT").filter(|v| !v.trim().is_empty()) {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|source| ConfigError::InvalidPort { value, source })?,
            None => DEFAULT_PORT,
        };

        let cart_scope = lookup("CART_SCOPE")
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.parse::<CartScope>())
            .transpose()?
            .unwrap_or_default();

        let assets_dir = lookup("ASSETS_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            port,
            cart_scope,
            assets_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.port, 8000);
        assert_eq!(config.cart_scope, CartScope::Shared);
    }

    #[test]
    fn test_values_are_read() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "9100"),
            ("CART_SCOPE", "Session"),
            ("ASSETS_DIR", "/srv/widget"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.cart_scope, CartScope::Session);
        assert_eq!(config.assets_dir, Some(PathBuf::from("/srv/widget")));
    }

    #[test]
    fn test_process_is_an_alias_for_shared() {
        let config = Config::from_lookup(lookup(&[("CART_SCOPE", " PROCESS ")])).unwrap();
        assert_eq!(config.cart_scope, CartScope::Shared);
    }

    #[test]
    fn test_bad_values_are_errors() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("PORT", "eighty")])),
            Err(ConfigError::InvalidPort { .. })
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("CART_SCOPE", "tenant")])),
            Err(ConfigError::InvalidScope(_))
        ));
    }
}
