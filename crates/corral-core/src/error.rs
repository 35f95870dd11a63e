use std::fmt;

/// Machine-readable error codes for the ambient surfaces.
///
/// Snapshot handling and local mutations are total and never produce one of
/// these; the codes cover config, feed, session, and write-back plumbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    FeedParseError,
    SessionCorrupt,
    SessionWriteFailed,
    WriteBackExhausted,
    UnknownLead,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::FeedParseError => "E1002",
            Self::SessionCorrupt => "E2001",
            Self::SessionWriteFailed => "E2002",
            Self::WriteBackExhausted => "E3001",
            Self::UnknownLead => "E3002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::FeedParseError => "Snapshot feed parse error",
            Self::SessionCorrupt => "Session file corrupt",
            Self::SessionWriteFailed => "Session file write failed",
            Self::WriteBackExhausted => "Remote write-back exhausted retries",
            Self::UnknownLead => "Lead not found on the board",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in corral.toml and retry."),
            Self::FeedParseError => Some("Check the feed file for malformed JSON lines."),
            Self::SessionCorrupt => Some("Log in again; the stale session file was ignored."),
            Self::SessionWriteFailed => Some("Check permissions on the platform data directory."),
            Self::WriteBackExhausted => {
                Some("The edit is kept locally; the next snapshot reconciles it.")
            }
            Self::UnknownLead => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
