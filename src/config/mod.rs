//! Configuration Loader (Figment-based)
//!
//! Resolves [`ScannerOptions`] from layered sources:
//! 1. Built-in defaults (Serialized)
//! 2. Project config (`pinata.toml` at the scan root)
//! 3. Environment variables (`PINATA_*` prefix)
//!
//! The `.pinataignore` file is a separate, simpler mechanism resolved by
//! the scanner itself; this loader only produces options.

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use tracing::debug;

use crate::scanner::ScannerOptions;
use crate::types::{PinataError, Result};

/// Config file name looked up at the scan root.
pub const CONFIG_FILE_NAME: &str = "pinata.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "PINATA_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Full resolution chain: defaults -> `pinata.toml` -> env vars.
    pub fn load(root: &Path) -> Result<ScannerOptions> {
        let mut figment = Figment::new().merge(Serialized::defaults(ScannerOptions::default()));

        let config_path = root.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            debug!(path = %config_path.display(), "loading project config");
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        figment
            .extract()
            .map_err(|err| PinataError::config(format!("configuration error: {}", err)))
    }

    /// Load from a specific file only (still layered over the defaults).
    pub fn load_from_file(path: &Path) -> Result<ScannerOptions> {
        Figment::new()
            .merge(Serialized::defaults(ScannerOptions::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|err| PinataError::config(format!("configuration error: {}", err)))
    }
}
