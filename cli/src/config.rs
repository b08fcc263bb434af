use std::path::{Path, PathBuf};

use serde::Deserialize;

use sandbox::SandboxConfig;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "blockgrade.toml";

/// Contents of `blockgrade.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sandbox: SandboxConfig,
}

impl Config {
    /// Read `explicit`, or `blockgrade.toml` if present. A missing default
    /// file is not an error; a missing explicit one is.
    pub fn load(explicit: Option<&Path>) -> Result<Config, String> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Config::default());
                }
                default
            }
        };
        let text = std::fs::read_to_string(&path).map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
        let config: Config = toml::from_str(&text).map_err(|e| format!("{}: {}", path.display(), e))?;
        tracing::debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_sandbox_table_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sandbox]\nstep_limit = 500\nprompt_response = \"7\"").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.sandbox.step_limit, 500);
        assert_eq!(config.sandbox.prompt_response, "7");
        assert_eq!(config.sandbox.max_call_depth, SandboxConfig::default().max_call_depth);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.contains("cannot read"));
    }

    #[test]
    fn unknown_types_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sandbox]\nstep_limit = \"lots\"").unwrap();
        assert!(Config::load(Some(file.path())).is_err());
    }
}
