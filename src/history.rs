use crate::error::{Result, ShellError};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, warn};

/// File name of the persisted history, relative to the user's home directory.
pub const HISTORY_FILE_NAME: &str = ".gosh_history";

/// Browsing direction for [`History::recall`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Older,
    Newer,
}

/// Successful recall: the new cursor and the entry it points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recall<'a> {
    pub cursor: usize,
    pub entry: &'a str,
}

/// Oldest-first list of submitted lines.
///
/// Entries are never blank. Browsing uses a cursor counted from the most
/// recent entry: `0` is the live buffer, `1` the newest entry, `len()` the
/// oldest one.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<String>,
    path: Option<PathBuf>,
}

impl History {
    /// History without a backing file.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load history from `path`.
    ///
    /// A missing or unreadable file leaves the history empty; the shell
    /// never fails to start because of it.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(data) => parse(&data),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no history file yet");
                Vec::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read history, starting empty");
                Vec::new()
            }
        };
        Self {
            entries,
            path: Some(path),
        }
    }

    /// Overwrite the backing file with every entry, oldest first.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        fs::write(path, self.entries.join("\n")).map_err(|source| ShellError::History {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), entries = self.entries.len(), "history saved");
        Ok(())
    }

    /// Append a submitted line. Blank lines are ignored.
    pub fn append(&mut self, line: impl Into<String>) {
        let line = line.into();
        if line.trim().is_empty() {
            return;
        }
        self.entries.push(line);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Step the browsing cursor one entry in `direction`.
    ///
    /// Returns `None` when the step would leave the history; the caller keeps
    /// its cursor and buffer as they were.
    pub fn recall(&self, direction: Direction, cursor: usize) -> Option<Recall<'_>> {
        let len = self.entries.len();
        let (index, cursor) = match direction {
            Direction::Older => (len.checked_sub(cursor + 1)?, cursor + 1),
            Direction::Newer => ((len + 1).checked_sub(cursor)?, cursor.checked_sub(1)?),
        };
        let entry = self.entries.get(index)?;
        Some(Recall { cursor, entry })
    }
}

fn parse(data: &str) -> Vec<String> {
    data.split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(lines: &[&str]) -> History {
        let mut h = History::in_memory();
        for line in lines {
            h.append(*line);
        }
        h
    }

    #[test]
    fn test_append_skips_blank_lines() {
        let mut h = history(&["ls"]);
        h.append("");
        h.append("   \t");
        assert_eq!(h.entries(), ["ls"]);
    }

    #[test]
    fn test_recall_walks_back_to_oldest() {
        let h = history(&["one", "two", "three"]);
        let r = h.recall(Direction::Older, 0).unwrap();
        assert_eq!((r.cursor, r.entry), (1, "three"));
        let r = h.recall(Direction::Older, r.cursor).unwrap();
        assert_eq!((r.cursor, r.entry), (2, "two"));
        let r = h.recall(Direction::Older, r.cursor).unwrap();
        assert_eq!((r.cursor, r.entry), (3, "one"));
        assert_eq!(h.recall(Direction::Older, r.cursor), None);
    }

    #[test]
    fn test_recall_newer() {
        let h = history(&["one", "two", "three"]);
        let r = h.recall(Direction::Newer, 3).unwrap();
        assert_eq!((r.cursor, r.entry), (2, "two"));
        let r = h.recall(Direction::Newer, r.cursor).unwrap();
        assert_eq!((r.cursor, r.entry), (1, "three"));
        assert_eq!(h.recall(Direction::Newer, 1), None);
        assert_eq!(h.recall(Direction::Newer, 0), None);
    }

    #[test]
    fn test_recall_on_empty_history() {
        let h = History::in_memory();
        assert_eq!(h.recall(Direction::Older, 0), None);
        assert_eq!(h.recall(Direction::Newer, 0), None);
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let h = History::open(dir.path().join("nope"));
        assert!(h.is_empty());
    }

    #[test]
    fn test_save_then_open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HISTORY_FILE_NAME);
        let mut h = History::open(&path);
        h.append("ls -la");
        h.append("echo hi | wc -c");
        h.save().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "ls -la\necho hi | wc -c");
        let reloaded = History::open(&path);
        assert_eq!(reloaded.entries(), h.entries());
    }

    #[test]
    fn test_open_drops_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hist");
        fs::write(&path, "ls\n\n  \npwd\n").unwrap();
        assert_eq!(History::open(&path).entries(), ["ls", "pwd"]);
    }

    #[test]
    fn test_in_memory_save_is_noop() {
        assert!(history(&["ls"]).save().is_ok());
    }
}
