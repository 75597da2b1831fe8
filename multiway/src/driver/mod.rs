//! Interactive driver comparing the two engines.
//!
//! Reads line commands, feeds the same keys to a `BTree` and a `BPlusTree`,
//! and reports timings, search results, renderings and structural figures.
//! It only talks to the trees through their public operations.
//!
//! # Usage
//!
//! ```
//! use std::io::Cursor;
//!
//! use multiway::config::DriverConfig;
//! use multiway::driver::Session;
//!
//! let mut session = Session::new(DriverConfig::default());
//! let mut out = Vec::new();
//! session
//!     .run(Cursor::new("insert 10\ninsert 5\nleaves\n"), &mut out)
//!     .expect("in-memory output");
//!
//! let output = String::from_utf8(out).expect("utf8");
//! assert!(output.contains("5 10"));
//! ```

mod command;
mod render;
mod session;

use std::path::PathBuf;

pub use command::{Command, CommandError, HELP};
pub use render::{BPlusTreeView, BTreeView, Comparison, LeafSequence};
pub use session::{BENCH_KEY_RANGE, BenchReport, Flow, RANDOM_KEY_RANGE, Session};

use crate::tree::TreeError;

/// Errors that can occur while running driver commands.
#[derive(Debug)]
pub enum DriverError {
    /// Command line could not be parsed.
    Command(CommandError),
    /// A tree operation failed.
    Tree(TreeError),
    /// Not enough unused keys left in the requested range.
    KeySpaceExhausted { requested: usize, available: usize },
    /// Writing a report file failed.
    Save {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Reading input or writing output failed.
    Io(std::io::Error),
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Command(e) => write!(f, "{e}"),
            Self::Tree(e) => write!(f, "tree error: {e}"),
            Self::KeySpaceExhausted {
                requested,
                available,
            } => write!(
                f,
                "cannot draw {requested} unique keys, only {available} unused keys left in range"
            ),
            Self::Save { path, source } => {
                write!(f, "failed to write report to {}: {source}", path.display())
            }
            Self::Io(e) => write!(f, "i/o error: {e}"),
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Command(e) => Some(e),
            Self::Tree(e) => Some(e),
            Self::Save { source, .. } => Some(source),
            Self::Io(e) => Some(e),
            Self::KeySpaceExhausted { .. } => None,
        }
    }
}

impl From<CommandError> for DriverError {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

impl From<TreeError> for DriverError {
    fn from(e: TreeError) -> Self {
        Self::Tree(e)
    }
}

impl From<std::io::Error> for DriverError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
