use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "retentive")]
#[command(version)]
#[command(about = "Bounded state memory for AI coding agents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Show configuration, limits, and a current memory sample
    Status,

    /// Run the memory monitor in the foreground
    Monitor {
        /// Take a single sample and exit
        #[arg(long)]
        once: bool,

        /// Override the sampling interval
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Truncate a file to a byte budget, syntax-aware
    Truncate {
        /// File to truncate
        file: String,

        /// Byte budget
        #[arg(long)]
        max_bytes: usize,

        /// Force a content type: json, code, tree, text
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Checkpoint a JSON state file through the redacting serializer
    Checkpoint {
        #[command(subcommand)]
        action: CheckpointAction,
    },

    /// List blobs in a blob directory
    Blobs {
        /// Blob directory (defaults to the configured one)
        #[arg(long)]
        dir: Option<String>,

        /// Re-hash every blob and fail on mismatches
        #[arg(long)]
        verify: bool,
    },

    /// Classify the tool calls in a JSON message log
    Analyze {
        /// File holding a JSON array of messages
        file: String,
    },

    /// Rewrite a JSON message log the way the context manager would
    Adapt {
        /// File holding a JSON array of messages
        file: String,

        /// Pin the pressure reading instead of sampling this process
        #[arg(long)]
        pressure: Option<f64>,

        /// Target provider: anthropic, openai, google
        #[arg(long, default_value = "anthropic")]
        provider: String,
    },

    /// Describe a checkpoint file and verify its blob references
    Report {
        /// Checkpoint file
        file: String,
        #[arg(long)]
        blob_dir: Option<String>,
    },

    /// Run environment self-checks
    Diagnostic,

    /// Print version information
    Version,
}

#[derive(Subcommand)]
pub enum CheckpointAction {
    /// Serialize a JSON file, externalizing oversized leaves
    Save {
        input: String,
        output: String,
        #[arg(long)]
        blob_dir: Option<String>,
    },
    /// Restore a checkpoint back to plain JSON
    Restore {
        input: String,
        output: String,
        #[arg(long)]
        blob_dir: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::try_parse_from(["retentive", "status"]);
        assert!(cli.is_ok());
        assert!(matches!(cli.unwrap().command, Commands::Status));
    }

    #[test]
    fn test_cli_parse_monitor_once() {
        let cli = Cli::try_parse_from(["retentive", "monitor", "--once"]).unwrap();
        if let Commands::Monitor { once, interval_ms } = cli.command {
            assert!(once);
            assert_eq!(interval_ms, None);
        } else {
            panic!("expected Monitor command");
        }
    }

    #[test]
    fn test_cli_parse_truncate() {
        let cli = Cli::try_parse_from([
            "retentive",
            "truncate",
            "big.json",
            "--max-bytes",
            "4096",
            "--content-type",
            "json",
        ])
        .unwrap();
        if let Commands::Truncate {
            file,
            max_bytes,
            content_type,
        } = cli.command
        {
            assert_eq!(file, "big.json");
            assert_eq!(max_bytes, 4096);
            assert_eq!(content_type.as_deref(), Some("json"));
        } else {
            panic!("expected Truncate command");
        }
    }

    #[test]
    fn test_cli_parse_adapt() {
        let cli = Cli::try_parse_from([
            "retentive",
            "adapt",
            "messages.json",
            "--pressure",
            "0.75",
            "--provider",
            "google",
        ])
        .unwrap();
        if let Commands::Adapt {
            file,
            pressure,
            provider,
        } = cli.command
        {
            assert_eq!(file, "messages.json");
            assert_eq!(pressure, Some(0.75));
            assert_eq!(provider, "google");
        } else {
            panic!("expected Adapt command");
        }
    }

    #[test]
    fn test_cli_adapt_provider_defaults_to_anthropic() {
        let cli = Cli::try_parse_from(["retentive", "adapt", "m.json"]).unwrap();
        if let Commands::Adapt { provider, pressure, .. } = cli.command {
            assert_eq!(provider, "anthropic");
            assert_eq!(pressure, None);
        } else {
            panic!("expected Adapt command");
        }
    }

    #[test]
    fn test_cli_parse_checkpoint_save() {
        let cli = Cli::try_parse_from([
            "retentive",
            "checkpoint",
            "save",
            "state.json",
            "state.ckpt",
            "--blob-dir",
            "/tmp/blobs",
        ]);
        assert!(cli.is_ok());
    }

    #[test]
    fn test_cli_rejects_unknown_command() {
        assert!(Cli::try_parse_from(["retentive", "explode"]).is_err());
    }
}
