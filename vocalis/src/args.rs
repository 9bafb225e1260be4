use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Vocalis speech synthesis server
#[derive(Debug, Parser)]
#[command(name = "vocalis", about = "HTTP text-to-speech service with voice cloning")]
pub struct Args {
    /// Path to configuration file; built-in defaults apply when it does not exist
    #[arg(short, long, default_value = "vocalis.toml", env = "VOCALIS_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "VOCALIS_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Model to load at startup instead of the configured default
    #[arg(long, env = "VOCALIS_MODEL_NAME")]
    pub model_name: Option<String>,

    /// Log at debug level regardless of configuration
    #[arg(long)]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["vocalis"]).unwrap();

        assert_eq!(args.config, PathBuf::from("vocalis.toml"));
        assert!(args.listen.is_none());
        assert!(args.model_name.is_none());
        assert!(!args.debug);
    }

    #[test]
    fn launcher_flags() {
        let args = Args::try_parse_from([
            "vocalis",
            "--config",
            "/etc/vocalis.toml",
            "--listen",
            "127.0.0.1:5002",
            "--model-name",
            "tts_models/multilingual/multi-dataset/xtts_v2",
            "--debug",
        ])
        .unwrap();

        assert_eq!(args.listen, Some("127.0.0.1:5002".parse().unwrap()));
        assert_eq!(
            args.model_name.as_deref(),
            Some("tts_models/multilingual/multi-dataset/xtts_v2")
        );
        assert!(args.debug);
    }
}
