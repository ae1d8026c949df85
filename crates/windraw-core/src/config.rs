//! Runtime configuration
//!
//! Backend selection can be steered from the environment:
//!
//! ```bash
//! WINDRAW_BACKEND=gdiplus ./my_app          # never try Direct2D
//! WINDRAW_BUNDLED_FALLBACK=1 ./my_app       # allow an app-local GDIPLUS.DLL
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, WindrawError};
use crate::types::BackendKind;

pub const BACKEND_VAR: &str = "WINDRAW_BACKEND";
pub const BUNDLED_FALLBACK_VAR: &str = "WINDRAW_BUNDLED_FALLBACK";

/// Which backends the probe may pick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendPreference {
    /// Direct2D when usable, GDI+ otherwise.
    #[default]
    Auto,
    /// Direct2D only.
    Modern,
    /// GDI+ only; Direct2D is never touched.
    Legacy,
}

impl BackendPreference {
    /// Candidates in the order they are probed.
    pub fn candidates(self) -> &'static [BackendKind] {
        match self {
            BackendPreference::Auto => &[BackendKind::Modern, BackendKind::Legacy],
            BackendPreference::Modern => &[BackendKind::Modern],
            BackendPreference::Legacy => &[BackendKind::Legacy],
        }
    }
}

impl FromStr for BackendPreference {
    type Err = WindrawError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "auto" => Ok(BackendPreference::Auto),
            "d2d" | "direct2d" | "modern" => Ok(BackendPreference::Modern),
            "gdiplus" | "gdi+" | "legacy" => Ok(BackendPreference::Legacy),
            other => Err(WindrawError::Config(format!(
                "unknown backend '{}' (expected auto, d2d or gdiplus)",
                other
            ))),
        }
    }
}

impl fmt::Display for BackendPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendPreference::Auto => "auto",
            BackendPreference::Modern => "d2d",
            BackendPreference::Legacy => "gdiplus",
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Config {
    pub backend: BackendPreference,
    /// Allow loading GDI+ from the application directory when the system
    /// has none.
    pub bundled_fallback: bool,
}

impl Config {
    pub fn with_backend(mut self, backend: BackendPreference) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_bundled_fallback(mut self, enabled: bool) -> Self {
        self.bundled_fallback = enabled;
        self
    }

    /// Reads [`BACKEND_VAR`] and [`BUNDLED_FALLBACK_VAR`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(val) = lookup(BACKEND_VAR) {
            config.backend = val.parse()?;
            log::info!("Backend preference '{}' via {}", config.backend, BACKEND_VAR);
        }

        if let Some(val) = lookup(BUNDLED_FALLBACK_VAR) {
            config.bundled_fallback = parse_flag(&val).ok_or_else(|| {
                WindrawError::Config(format!("{}: not a boolean: '{}'", BUNDLED_FALLBACK_VAR, val))
            })?;
            if config.bundled_fallback {
                log::info!("Bundled library fallback enabled via {}", BUNDLED_FALLBACK_VAR);
            }
        }

        Ok(config)
    }
}

fn parse_flag(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
