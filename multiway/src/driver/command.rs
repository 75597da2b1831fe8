//! Command parsing for the interactive driver.
//!
//! Commands are case-insensitive words followed by whitespace-separated
//! arguments, e.g. `insert 42` or `RANDOM 10`.

use std::path::PathBuf;

use crate::tree::Key;

/// A parsed driver command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Insert one key into both trees.
    Insert(Key),
    /// Search both trees for a key.
    Search(Key),
    /// Render both trees.
    Show,
    /// Insert `n` unique random keys.
    Random(usize),
    /// Print the comparison table.
    Compare,
    /// Time bulk insert and search on both trees.
    Bench,
    /// Rebuild both trees with a new minimum degree.
    Degree(usize),
    /// Reset both trees.
    Clear,
    /// Print the B+-tree leaf chain.
    Leaves,
    /// Validate both trees.
    Check,
    /// Write the rendering and comparison to a file.
    Save(PathBuf),
    /// Print the command list.
    Help,
    /// Leave the loop.
    Quit,
}

impl Command {
    /// Parse one input line.
    ///
    /// Returns `Ok(None)` for blank lines.
    ///
    /// # Errors
    ///
    /// Returns a `CommandError` if the command is unknown or its arguments
    /// are missing or malformed.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let name = name.to_ascii_lowercase();

        let command = match name.as_str() {
            "insert" | "i" => Self::Insert(parse_number(&name, words.next())?),
            "search" | "s" => Self::Search(parse_number(&name, words.next())?),
            "show" => Self::Show,
            "random" => Self::Random(parse_number(&name, words.next())?),
            "compare" => Self::Compare,
            "bench" => Self::Bench,
            "degree" => Self::Degree(parse_number(&name, words.next())?),
            "clear" => Self::Clear,
            "leaves" => Self::Leaves,
            "check" => Self::Check,
            "save" => {
                let path = words.next().ok_or_else(|| CommandError::MissingArgument {
                    command: name.clone(),
                })?;
                Self::Save(PathBuf::from(path))
            }
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => return Err(CommandError::Unknown(name)),
        };

        if let Some(extra) = words.next() {
            return Err(CommandError::UnexpectedArgument {
                command: name,
                argument: extra.to_string(),
            });
        }

        Ok(Some(command))
    }
}

fn parse_number<T: std::str::FromStr>(
    command: &str,
    word: Option<&str>,
) -> Result<T, CommandError> {
    let word = word.ok_or_else(|| CommandError::MissingArgument {
        command: command.to_string(),
    })?;
    word.parse().map_err(|_| CommandError::InvalidNumber {
        command: command.to_string(),
        value: word.to_string(),
    })
}

/// Help text listing every command.
pub const HELP: &str = "\
commands:
  insert <key>     insert a key into both trees
  search <key>     search both trees for a key
  show             render both trees
  random <n>       insert n unique random keys
  compare          compare tree characteristics
  bench            time bulk insert and search
  degree <t>       rebuild both trees with minimum degree t
  clear            remove every key
  leaves           print the B+-tree leaf chain
  check            validate both trees
  save <path>      write trees and comparison to a file
  help             show this list
  quit             leave";

/// Errors produced while parsing a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The command word is not recognised.
    Unknown(String),
    /// A required argument is absent.
    MissingArgument { command: String },
    /// An argument is not a valid number.
    InvalidNumber { command: String, value: String },
    /// More arguments than the command takes.
    UnexpectedArgument { command: String, argument: String },
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(name) => write!(f, "unknown command '{name}' (try 'help')"),
            Self::MissingArgument { command } => write!(f, "'{command}' needs an argument"),
            Self::InvalidNumber { command, value } => {
                write!(f, "'{command}' expects a number, got '{value}'")
            }
            Self::UnexpectedArgument { command, argument } => {
                write!(f, "'{command}' does not take '{argument}'")
            }
        }
    }
}

impl std::error::Error for CommandError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_line() {
        assert_eq!(Command::parse(""), Ok(None));
        assert_eq!(Command::parse("   \t "), Ok(None));
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("insert 42"), Ok(Some(Command::Insert(42))));
        assert_eq!(Command::parse("SEARCH -7"), Ok(Some(Command::Search(-7))));
        assert_eq!(
            Command::parse("  random 10 "),
            Ok(Some(Command::Random(10)))
        );
        assert_eq!(Command::parse("degree 4"), Ok(Some(Command::Degree(4))));
        assert_eq!(Command::parse("show"), Ok(Some(Command::Show)));
        assert_eq!(Command::parse("compare"), Ok(Some(Command::Compare)));
        assert_eq!(Command::parse("bench"), Ok(Some(Command::Bench)));
        assert_eq!(Command::parse("clear"), Ok(Some(Command::Clear)));
        assert_eq!(Command::parse("leaves"), Ok(Some(Command::Leaves)));
        assert_eq!(Command::parse("check"), Ok(Some(Command::Check)));
        assert_eq!(Command::parse("exit"), Ok(Some(Command::Quit)));
        assert_eq!(
            Command::parse("save out.txt"),
            Ok(Some(Command::Save(PathBuf::from("out.txt"))))
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            Command::parse("delete 4"),
            Err(CommandError::Unknown("delete".to_string()))
        );
    }

    #[test]
    fn test_missing_argument() {
        let error = Command::parse("insert").expect_err("missing key");
        assert_eq!(error.to_string(), "'insert' needs an argument");
        assert!(Command::parse("save").is_err());
    }

    #[test]
    fn test_invalid_number() {
        let error = Command::parse("random lots").expect_err("not a number");
        assert_eq!(error.to_string(), "'random' expects a number, got 'lots'");
        // Degrees are unsigned.
        assert!(Command::parse("degree -3").is_err());
    }

    #[test]
    fn test_unexpected_argument() {
        assert_eq!(
            Command::parse("show everything"),
            Err(CommandError::UnexpectedArgument {
                command: "show".to_string(),
                argument: "everything".to_string(),
            })
        );
    }
}
