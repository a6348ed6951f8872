use argh::FromArgs;
use crate::error::{Result, ShellError};
use crate::history::HISTORY_FILE_NAME;
use std::path::PathBuf;

/// Prompt drawn in front of the input buffer.
pub const DEFAULT_PROMPT: &str = "gosh > $";

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "GOSH_LOG";

#[derive(FromArgs, Debug, Default)]
/// An interactive shell with line editing, history recall and pipes.
pub struct Options {
    #[argh(option)]
    /// history file to load at startup and overwrite on exit (default: ~/.gosh_history)
    pub history_file: Option<PathBuf>,

    #[argh(option)]
    /// prompt text shown before the input line
    pub prompt: Option<String>,

    #[argh(switch)]
    /// leave terminal modes alone, e.g. when input is piped in
    pub no_raw: bool,
}

/// Everything the interpreter needs to know before the first prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub prompt: String,
    pub history_path: PathBuf,
    pub raw_terminal: bool,
}

impl ShellConfig {
    /// Resolve options, falling back to the home directory for history.
    pub fn from_options(options: Options) -> Result<Self> {
        let history_path = match options.history_file {
            Some(path) => path,
            None => default_history_path()?,
        };
        Ok(Self {
            prompt: options.prompt.unwrap_or_else(|| DEFAULT_PROMPT.to_owned()),
            history_path,
            raw_terminal: !options.no_raw,
        })
    }
}

/// `~/.gosh_history`. Fails when the home directory is unknown.
pub fn default_history_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(ShellError::HomeDirectory)?;
    Ok(home.join(HISTORY_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ShellConfig::from_options(Options {
            history_file: Some(PathBuf::from("/tmp/h")),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(config.prompt, DEFAULT_PROMPT);
        assert_eq!(config.history_path, PathBuf::from("/tmp/h"));
        assert!(config.raw_terminal);
    }

    #[test]
    fn test_parse_flags() {
        let options = Options::from_args(
            &["gosh"],
            &["--prompt", "$", "--history-file", "/tmp/x", "--no-raw"],
        )
        .unwrap();
        let config = ShellConfig::from_options(options).unwrap();
        assert_eq!(config.prompt, "$");
        assert_eq!(config.history_path, PathBuf::from("/tmp/x"));
        assert!(!config.raw_terminal);
    }

    #[test]
    fn test_default_history_path_is_in_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(default_history_path().unwrap(), home.join(".gosh_history"));
        }
    }
}
