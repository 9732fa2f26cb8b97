//! Tool configuration.
//!
//! The config file is `.metaobjectsrc.yaml`:
//!
//! ```yaml
//! version: "2025-01"   # Admin API version
//! pageSize: 250        # optional
//! shops:
//!   my-shop: shpat_xxx
//! ```
//!
//! # Lookup order
//!
//! 1. An explicit `--config <path>`.
//! 2. `./.metaobjectsrc.yaml`.
//! 3. `<home>/.metaobjectsrc.yaml`.
//!
//! Like the store, every lookup has an `_at` form taking explicit
//! directories; tests must use it instead of the ambient wrappers.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

pub const CONFIG_FILE: &str = ".metaobjectsrc.yaml";

/// Environment variable that overrides the token of the selected shop.
pub const TOKEN_ENV: &str = "METADEF_TOKEN";

/// Largest page the remote listing accepts.
pub const MAX_PAGE_SIZE: u32 = 250;

/// On-disk config file contents.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    /// Admin API version, e.g. `2025-01`.
    pub version: String,
    #[serde(default)]
    pub page_size: Option<u32>,
    /// Shop handle → access token.
    #[serde(default)]
    pub shops: BTreeMap<String, String>,
}

/// Everything one invocation needs to talk to one shop.
///
/// Built once from the config file and the selected shop, then passed
/// explicitly to the client and the engine.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub shop: String,
    pub token: String,
    pub api_version: String,
    pub page_size: u32,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("shop", &self.shop)
            .field("token", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("page_size", &self.page_size)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Resolve which config file to use.
pub fn locate_at(
    explicit: Option<&Path>,
    cwd: &Path,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(ConfigError::NotFound {
            searched: vec![path.to_path_buf()],
        });
    }

    let mut searched = vec![cwd.join(CONFIG_FILE)];
    if let Some(home) = home {
        searched.push(home.join(CONFIG_FILE));
    }
    searched
        .iter()
        .find(|p| p.exists())
        .cloned()
        .ok_or(ConfigError::NotFound { searched })
}

/// `locate_at` convenience wrapper using the process cwd and home directory.
pub fn locate(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let cwd = std::env::current_dir().map_err(|source| ConfigError::Io {
        path: PathBuf::from("."),
        source,
    })?;
    let home = dirs::home_dir();
    if explicit.is_none() && home.is_none() && !cwd.join(CONFIG_FILE).exists() {
        return Err(ConfigError::HomeNotFound);
    }
    locate_at(explicit, &cwd, home.as_deref())
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Parse a config file.
pub fn load_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl ConfigFile {
    /// Build the session for `shop`. `token_override` wins over the file.
    pub fn session(
        &self,
        path: &Path,
        shop: &str,
        token_override: Option<String>,
    ) -> Result<SessionConfig, ConfigError> {
        let token = token_override
            .filter(|t| !t.is_empty())
            .or_else(|| self.shops.get(shop).cloned())
            .ok_or_else(|| ConfigError::UnknownShop {
                shop: shop.to_string(),
                path: path.to_path_buf(),
            })?;

        let page_size = self.page_size.unwrap_or(MAX_PAGE_SIZE);
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::PageSize(page_size));
        }

        Ok(SessionConfig {
            shop: shop.to_string(),
            token,
            api_version: self.version.clone(),
            page_size,
        })
    }
}

/// Locate, load and resolve the session for `shop` in one step.
pub fn load_session(explicit: Option<&Path>, shop: &str) -> Result<SessionConfig, ConfigError> {
    let path = locate(explicit)?;
    let file = load_file(&path)?;
    tracing::debug!("using config {}", path.display());
    file.session(&path, shop, std::env::var(TOKEN_ENV).ok())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
