//! Command line and environment configuration

use std::path::PathBuf;

use splat_painter_config::{ConfigError, PainterConfig};

/// Compositing backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// CPU reference compositor (always available)
    #[default]
    Cpu,
    /// wgpu compositor (requires the `gpu` feature)
    Gpu,
}

impl BackendKind {
    /// Parse from environment variable SPLAT_PAINTER_BACKEND
    pub fn from_env() -> Self {
        match std::env::var("SPLAT_PAINTER_BACKEND").as_deref() {
            Ok("gpu") => Self::Gpu,
            _ => Self::Cpu,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ArgsError {
    #[error("usage: splat-painter <script.json> [--assets <dir>] [--config <painter.json>]")]
    Usage,

    #[error("missing value for {0}")]
    MissingValue(String),

    #[error("unknown argument {0}")]
    Unknown(String),
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Recorded session to replay
    pub script: PathBuf,
    /// Directory asset ids resolve against
    pub asset_root: PathBuf,
    /// Optional painter config file; defaults apply when absent
    pub painter_config: Option<PathBuf>,
    pub backend: BackendKind,
}

impl AppConfig {
    /// Parse `args` (without the program name)
    pub fn from_args(args: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
        let mut script = None;
        let mut asset_root = None;
        let mut painter_config = None;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--assets" => {
                    asset_root = Some(PathBuf::from(
                        args.next().ok_or_else(|| ArgsError::MissingValue(arg.clone()))?,
                    ));
                }
                "--config" => {
                    painter_config = Some(PathBuf::from(
                        args.next().ok_or_else(|| ArgsError::MissingValue(arg.clone()))?,
                    ));
                }
                _ if arg.starts_with("--") => return Err(ArgsError::Unknown(arg)),
                _ if script.is_none() => script = Some(PathBuf::from(arg)),
                _ => return Err(ArgsError::Unknown(arg)),
            }
        }

        let script = script.ok_or(ArgsError::Usage)?;
        // Assets default to the script's directory
        let asset_root = asset_root.unwrap_or_else(|| {
            script
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."))
        });

        Ok(Self {
            script,
            asset_root,
            painter_config,
            backend: BackendKind::from_env(),
        })
    }

    pub fn load_painter_config(&self) -> Result<PainterConfig, ConfigError> {
        match &self.painter_config {
            Some(path) => PainterConfig::load(path),
            None => Ok(PainterConfig::default()),
        }
    }
}
