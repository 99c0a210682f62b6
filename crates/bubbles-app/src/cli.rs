//! Command line arguments.

use std::path::PathBuf;

use bubbles_core::config::ClientConfig;
use clap::Parser;

use crate::error::ClientResult;
use crate::headless::load_config;

/// Session flags given on the command line override the configuration file.
#[derive(Parser, Debug, Clone, Default, PartialEq)]
#[command(name = "bubbles", about = "Headless bubbles client")]
pub struct Cli {
    /// JSON configuration file
    #[arg(long, env = "BUBBLES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Server endpoint: address:port
    #[arg(short = 'c', long = "connect")]
    pub connect: Option<String>,

    /// Room to join
    #[arg(short, long)]
    pub room: Option<String>,

    /// Use TLS to secure communication
    #[arg(short, long, num_args = 0..=1, default_missing_value = "true")]
    pub secure: Option<bool>,

    /// Compress communication
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub compress: Option<bool>,

    /// Let the engine move the bubble while nobody touches the canvas
    #[arg(short = 'a', long = "auto", num_args = 0..=1, default_missing_value = "true")]
    pub auto_pilot: Option<bool>,

    /// Number of ticks to run
    #[arg(long)]
    pub frames: Option<u32>,
}

impl Cli {
    /// Overwrite the config fields this command line sets.
    pub fn apply(&self, config: &mut ClientConfig) {
        let session = &mut config.session;
        if let Some(endpoint) = &self.connect {
            session.endpoint.clone_from(endpoint);
        }
        if let Some(room) = &self.room {
            session.room.clone_from(room);
        }
        if let Some(secure) = self.secure {
            session.secure = secure;
        }
        if let Some(compress) = self.compress {
            session.compress = compress;
        }
        if let Some(auto_pilot) = self.auto_pilot {
            session.auto_pilot = auto_pilot;
        }
        if let Some(frames) = self.frames {
            config.headless.frames = frames;
        }
    }

    /// Load the configuration file (or defaults) and apply the overrides.
    pub fn resolve(&self) -> ClientResult<ClientConfig> {
        let mut config = load_config(self.config.as_deref())?;
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use tempfile::TempDir;

    #[test]
    fn test_parse_session_flags() {
        let cli = Cli::try_parse_from([
            "bubbles",
            "--connect",
            "example.org:36444",
            "-r",
            "lobby",
            "--secure",
            "--compress=false",
            "-a",
        ])
        .unwrap();

        assert_eq!(cli.connect.as_deref(), Some("example.org:36444"));
        assert_eq!(cli.room.as_deref(), Some("lobby"));
        assert_eq!(cli.secure, Some(true));
        assert_eq!(cli.compress, Some(false));
        assert_eq!(cli.auto_pilot, Some(true));
        assert_eq!(cli.frames, None);
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bubbles.json");
        let mut stored = ClientConfig::default();
        stored.session.room = "from-file".to_string();
        stored.session.endpoint = "file.host:4444".to_string();
        stored.session.compress = true;
        stored.headless.frames = 7;
        stored.save(&path).unwrap();

        let cli = Cli {
            config: Some(path),
            room: Some("from-cli".to_string()),
            compress: Some(false),
            auto_pilot: Some(true),
            ..Cli::default()
        };
        let config = cli.resolve().unwrap();

        assert_eq!(config.session.room, "from-cli");
        assert_eq!(config.session.endpoint, "file.host:4444");
        assert!(!config.session.compress);
        assert!(config.session.auto_pilot);
        assert_eq!(config.headless.frames, 7);
    }

    #[test]
    fn test_no_flags_keeps_defaults() {
        let mut config = ClientConfig::default();
        Cli::default().apply(&mut config);
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_override_is_validated() {
        let cli = Cli {
            room: Some(String::new()),
            ..Cli::default()
        };
        assert!(matches!(cli.resolve(), Err(ClientError::Config(_))));
    }
}
