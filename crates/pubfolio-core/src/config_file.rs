use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub dblp: Option<DblpConfig>,
    pub render: Option<RenderConfig>,
    /// Author pid -> CSS class applied to that author's span.
    pub highlight: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DblpConfig {
    pub url_template: Option<String>,
    pub timeout_secs: Option<u64>,
    pub array_tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderConfig {
    pub skip_publtype: Option<String>,
    pub title: Option<String>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Platform config directory path: `<config_dir>/pubfolio/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pubfolio").join("config.toml"))
}

/// Load config by cascading CWD `.pubfolio.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".pubfolio.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    match read_from_path(path) {
        Ok(config) => Some(config),
        Err(ConfigError::Io { .. }) => None,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring config file");
            None
        }
    }
}

/// Load a config the user pointed at explicitly; errors are reported.
pub fn read_from_path(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

/// Merge two configs: `overlay` values take precedence over `base`.
///
/// Highlight tables are merged entry by entry.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let highlight = match (base.highlight, overlay.highlight) {
        (None, None) => None,
        (Some(b), None) => Some(b),
        (None, Some(o)) => Some(o),
        (Some(mut b), Some(o)) => {
            b.extend(o);
            Some(b)
        }
    };

    ConfigFile {
        dblp: Some(DblpConfig {
            url_template: overlay
                .dblp
                .as_ref()
                .and_then(|d| d.url_template.clone())
                .or_else(|| base.dblp.as_ref().and_then(|d| d.url_template.clone())),
            timeout_secs: overlay
                .dblp
                .as_ref()
                .and_then(|d| d.timeout_secs)
                .or_else(|| base.dblp.as_ref().and_then(|d| d.timeout_secs)),
            array_tags: overlay
                .dblp
                .as_ref()
                .and_then(|d| d.array_tags.clone())
                .or_else(|| base.dblp.as_ref().and_then(|d| d.array_tags.clone())),
        }),
        render: Some(RenderConfig {
            skip_publtype: overlay
                .render
                .as_ref()
                .and_then(|r| r.skip_publtype.clone())
                .or_else(|| base.render.as_ref().and_then(|r| r.skip_publtype.clone())),
            title: overlay
                .render
                .as_ref()
                .and_then(|r| r.title.clone())
                .or_else(|| base.render.as_ref().and_then(|r| r.title.clone())),
        }),
        highlight,
    }
}
