use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::compile_rules;
use crate::error::FillError;
use crate::types::Rule;

/// The on-disk rule file and its compiled view.
///
/// The file is the single source of truth: every load re-reads and
/// re-compiles it from scratch, so an edit is picked up by the very next
/// fill operation with no cache to invalidate. The only write path is
/// [`append`](Self::append), used by the capture flow.
#[derive(Debug, Clone)]
pub struct RuleStore {
    path: PathBuf,
}

impl RuleStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The per-user default location of the rule file:
    /// `$XDG_DATA_HOME/formfill/rules`, falling back to
    /// `$HOME/.local/share/formfill/rules`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        if let Some(dir) = std::env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
            return PathBuf::from(dir).join("formfill").join("rules");
        }
        let home = std::env::var_os("HOME").unwrap_or_default();
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join("formfill")
            .join("rules")
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and compile the rule file.
    ///
    /// A missing file is not an error; it yields an empty rule set.
    ///
    /// # Errors
    ///
    /// Returns [`FillError`] on any other I/O failure, or on a parse or
    /// compile fault in the file's contents.
    pub fn load(&self) -> Result<Vec<Rule>, FillError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        compile_rules(&text)
    }

    /// Like [`load`](Self::load), but a broken rule file degrades to an
    /// empty rule set with a warning instead of failing the caller.
    ///
    /// This is the path the fill operations use: one bad edit to the file
    /// must not take the whole autofill feature down.
    #[must_use]
    pub fn load_or_empty(&self) -> Vec<Rule> {
        match self.load() {
            Ok(rules) => rules,
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    %err,
                    "failed to load autofill rules, continuing with none"
                );
                Vec::new()
            }
        }
    }

    /// Append a rule fragment to the file, creating it (and its parent
    /// directory) if needed.
    ///
    /// The fragment goes out in a single `O_APPEND` write followed by
    /// fsync, so a concurrent [`load`](Self::load) sees either none of it
    /// or all of it, never a partial line. A trailing newline is added if
    /// the fragment lacks one.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error on failure.
    pub fn append(&self, fragment: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut buf = String::with_capacity(fragment.len() + 1);
        buf.push_str(fragment);
        if !fragment.ends_with('\n') {
            buf.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(buf.as_bytes())?;
        file.sync_all()?;
        Ok(())
    }
}
