//! Client configuration.
//!
//! Stored as JSON. Every section has defaults, so a partial file (or none at
//! all) is a valid configuration.

use std::fs;
use std::path::{Path, PathBuf};

use kurbo::Size;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::RemotePeer;
use crate::transform::{CoordinateTransform, LogicalPoint, TransformError};

/// Default fuse for the per-frame peer enumeration.
pub const DEFAULT_PLOT_FUSE: usize = 10_000;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Parameters forwarded to the engine's `start`.
///
/// The core never interprets the TLS fields; they are passed through as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Server endpoint, `host:port`.
    pub endpoint: String,
    /// Room to join.
    pub room: String,
    /// Secure the transport with TLS.
    pub secure: bool,
    /// Compress traffic.
    pub compress: bool,
    /// Let the engine move the local cursor while nobody touches the canvas.
    pub auto_pilot: bool,
    pub ssl_verify_authority: Option<PathBuf>,
    pub ssl_client_cert: Option<PathBuf>,
    pub ssl_client_key: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: "localhost:4444".to_string(),
            room: "bubbles".to_string(),
            secure: false,
            compress: false,
            auto_pilot: false,
            ssl_verify_authority: None,
            ssl_client_cert: None,
            ssl_client_key: None,
        }
    }
}

/// Canvas drawing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Diameter of the local cursor circle, in pixels.
    pub local_diameter: f64,
    /// Diameter of each remote participant circle, in pixels.
    pub remote_diameter: f64,
    /// Outline width of every circle, in pixels.
    pub stroke_width: f64,
    /// Maximum peers enumerated per frame.
    pub plot_fuse: usize,
    /// Logical extent the canvas maps onto. `None` maps one unit per pixel.
    ///
    /// An extent smaller than the canvas makes one logical unit span several
    /// pixels, so a touch round-tripped through the engine can land up to half
    /// a unit (in pixels) away from where it was made.
    pub logical_extent: Option<Size>,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            local_diameter: 40.0,
            remote_diameter: 20.0,
            stroke_width: 3.0,
            plot_fuse: DEFAULT_PLOT_FUSE,
            logical_extent: None,
        }
    }
}

impl CanvasConfig {
    /// Build the coordinate transform described by this config.
    pub fn transform(&self) -> Result<CoordinateTransform, TransformError> {
        match self.logical_extent {
            Some(extent) => CoordinateTransform::with_logical_extent(extent),
            None => Ok(CoordinateTransform::new()),
        }
    }
}

/// Parameters of the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlessConfig {
    /// Number of ticks to run.
    pub frames: u32,
    /// Delay between ticks, in milliseconds.
    pub frame_interval_ms: u64,
    pub viewport_width: f64,
    pub viewport_height: f64,
    /// Replay a touch gesture across the run.
    pub scripted_touch: bool,
    /// Color the loopback engine assigns to the local participant.
    pub local_color: u32,
    /// Peers served by the loopback engine.
    pub peers: Vec<RemotePeer>,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            frames: 240,
            frame_interval_ms: 16,
            viewport_width: 1280.0,
            viewport_height: 720.0,
            scripted_touch: true,
            local_color: 0x336699,
            peers: vec![
                RemotePeer { position: LogicalPoint::new(-200, -120), color: 0xe4572e },
                RemotePeer { position: LogicalPoint::new(150, 80), color: 0x17bebb },
                RemotePeer { position: LogicalPoint::new(0, 250), color: 0xffc914 },
            ],
        }
    }
}

/// Top-level client configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub session: SessionConfig,
    pub canvas: CanvasConfig,
    pub headless: HeadlessConfig,
}

impl ClientConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: ClientConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> ConfigResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let json = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&json).map_err(|e| match e {
            ConfigError::Parse(msg) => {
                ConfigError::Parse(format!("Failed to parse {}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Write this configuration to a file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let json = self.to_json()?;
        fs::write(path, json)
            .map_err(|e| ConfigError::Io(format!("Failed to write {}: {}", path.display(), e)))
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        let canvas = &self.canvas;
        if !(canvas.remote_diameter > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "remote_diameter must be positive, got {}",
                canvas.remote_diameter
            )));
        }
        if !(canvas.local_diameter > canvas.remote_diameter) {
            return Err(ConfigError::Invalid(format!(
                "local_diameter ({}) must exceed remote_diameter ({})",
                canvas.local_diameter, canvas.remote_diameter
            )));
        }
        if !(canvas.stroke_width >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "stroke_width must not be negative, got {}",
                canvas.stroke_width
            )));
        }
        if canvas.plot_fuse == 0 {
            return Err(ConfigError::Invalid("plot_fuse must be at least 1".to_string()));
        }
        canvas
            .transform()
            .map_err(|e| ConfigError::Invalid(format!("logical_extent: {}", e)))?;
        if self.session.room.is_empty() {
            return Err(ConfigError::Invalid("room must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.canvas.local_diameter > config.canvas.remote_diameter);
        assert_eq!(config.canvas.plot_fuse, DEFAULT_PLOT_FUSE);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = ClientConfig::from_json(r#"{"session":{"room":"lobby","auto_pilot":true}}"#).unwrap();
        assert_eq!(config.session.room, "lobby");
        assert!(config.session.auto_pilot);
        assert_eq!(config.session.endpoint, "localhost:4444");
        assert_eq!(config.canvas, CanvasConfig::default());
    }

    #[test]
    fn test_rejects_local_not_larger_than_remote() {
        let err = ClientConfig::from_json(
            r#"{"canvas":{"local_diameter":10.0,"remote_diameter":20.0}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_zero_fuse_and_bad_extent() {
        assert!(ClientConfig::from_json(r#"{"canvas":{"plot_fuse":0}}"#).is_err());
        assert!(
            ClientConfig::from_json(r#"{"canvas":{"logical_extent":{"width":0.0,"height":10.0}}}"#)
                .is_err()
        );
    }

    #[test]
    fn test_malformed_json() {
        let err = ClientConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bubbles.json");

        let mut config = ClientConfig::default();
        config.session.secure = true;
        config.session.ssl_client_cert = Some(PathBuf::from("certs/client.pem"));
        config.canvas.logical_extent = Some(Size::new(1000.0, 1000.0));
        config.save(&path).unwrap();

        let loaded = ClientConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = ClientConfig::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
