pub mod adapt;
pub mod analyze;
pub mod blobs;
pub mod checkpoint;
pub mod diagnostic;
pub mod init;
pub mod monitor;
pub mod report;
pub mod status;
pub mod truncate;
pub mod version;

use std::path::PathBuf;

/// Configuration file location: `$RETENTIVE_CONFIG` wins, then
/// `~/.retentive/config.json`
pub fn config_path() -> PathBuf {
    if let Ok(explicit) = std::env::var("RETENTIVE_CONFIG") {
        return PathBuf::from(explicit);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".retentive")
        .join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_config_path_env_override() {
        unsafe { std::env::set_var("RETENTIVE_CONFIG", "/tmp/custom.json") };
        assert_eq!(config_path(), PathBuf::from("/tmp/custom.json"));
        unsafe { std::env::remove_var("RETENTIVE_CONFIG") };
    }

    #[test]
    #[serial]
    fn test_config_path_defaults_to_home() {
        unsafe { std::env::remove_var("RETENTIVE_CONFIG") };
        let path = config_path();
        assert!(path.ends_with(".retentive/config.json"));
    }
}
