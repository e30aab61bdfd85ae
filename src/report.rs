//! Leveled messages returned by workflow operations
//!
//! Operations collect what they did into a [`Report`]; the CLI decides how to
//! render it. Terminal failures travel as [`crate::error::Error`] instead.

/// Severity of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Progress or neutral information
    Info,
    /// A step completed
    Success,
    /// Something the user should look at; the operation continued or aborted cleanly
    Warning,
    /// The operation failed
    Failure,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Success => write!(f, "OK"),
            Self::Warning => write!(f, "WARN"),
            Self::Failure => write!(f, "FAIL"),
        }
    }
}

/// A single leveled line of output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Severity
    pub level: Level,
    /// Text, may span several lines
    pub text: String,
}

/// Ordered messages produced by one operation
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// Messages in the order they were produced
    pub messages: Vec<Message>,
}

impl Report {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message
    pub fn push(&mut self, level: Level, text: impl Into<String>) {
        self.messages.push(Message {
            level,
            text: text.into(),
        });
    }

    /// Append an informational message
    pub fn info(&mut self, text: impl Into<String>) {
        self.push(Level::Info, text);
    }

    /// Append a success message
    pub fn success(&mut self, text: impl Into<String>) {
        self.push(Level::Success, text);
    }

    /// Append a warning
    pub fn warn(&mut self, text: impl Into<String>) {
        self.push(Level::Warning, text);
    }

    /// Highest severity in the report, if any message was recorded
    pub fn max_level(&self) -> Option<Level> {
        self.messages.iter().map(|m| m.level).max()
    }

    /// Whether any message contains `needle` (used heavily by tests)
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.iter().any(|m| m.text.contains(needle))
    }
}
