//! Configuration schema for scriptcreds
//!
//! Configuration is stored at `~/.config/scriptcreds/config.toml`

use crate::error::{ScriptCredsError, ScriptCredsResult};
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Target URL embedded into every generated script as `$url`
    pub url: String,

    /// Header script settings
    pub header: ScriptConfig,

    /// Cookie script settings
    pub cookie: ScriptConfig,
}

/// Settings for one script kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    /// Shell command producing the output (header lines, or one cookie line).
    /// Absent means this kind is unused.
    pub command: Option<String>,

    /// Seconds after which the cached value is regenerated.
    /// 0 means run once and never renew.
    pub renew_secs: u64,

    /// Optional hard limit on script runtime. Absent means no limit.
    pub timeout_secs: Option<u64>,
}

impl ScriptConfig {
    /// Whether this kind has a command configured
    pub fn is_configured(&self) -> bool {
        self.command.is_some()
    }
}

impl Config {
    /// Whether either script kind is configured
    pub fn uses_scripts(&self) -> bool {
        self.header.is_configured() || self.cookie.is_configured()
    }

    /// Reject inconsistent settings.
    ///
    /// A renew interval or timeout without a command is a mistake we want
    /// surfaced at load time, not silently ignored at request time.
    pub fn validate(&self) -> ScriptCredsResult<()> {
        Self::validate_kind("header", &self.header)?;
        Self::validate_kind("cookie", &self.cookie)?;

        if self.uses_scripts() && self.url.is_empty() {
            return Err(ScriptCredsError::config(
                "url must be set when a header or cookie command is configured",
            ));
        }

        Ok(())
    }

    fn validate_kind(name: &str, script: &ScriptConfig) -> ScriptCredsResult<()> {
        if script.command.is_none() {
            if script.renew_secs > 0 {
                return Err(ScriptCredsError::config(format!(
                    "{name}.renew_secs requires {name}.command",
                )));
            }
            if script.timeout_secs.is_some() {
                return Err(ScriptCredsError::config(format!(
                    "{name}.timeout_secs requires {name}.command",
                )));
            }
        }
        Ok(())
    }
}
