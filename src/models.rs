use chrono::{DateTime, FixedOffset};

/// One accepted line of a Combined Log Format file.
///
/// Immutable once parsed; "editing" an entry means building a new one.
/// `timestamp` keeps the exact UTC offset that appeared in the source line.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct LogEntry {
    /// IP or hostname token, kept opaque.
    pub client_address: String,
    /// RFC 1413 identity, conventionally `-`.
    pub ident: String,
    /// HTTP auth user, conventionally `-`.
    pub auth_user: String,
    pub timestamp: DateTime<FixedOffset>,
    pub method: String,
    pub path: String,
    pub protocol: String,
    /// Three digits as written, no semantic validation beyond that.
    pub status_code: u16,
    /// The literal `-` in the source maps to 0.
    pub bytes_sent: u64,
    pub referer: String,
    pub user_agent: String,
    /// Original line text, kept for diagnostics.
    pub raw_line: String,
}

/// Why a line was rejected by the parser.
#[derive(thiserror::Error, PartialEq, Eq, Clone, Debug)]
pub enum RejectCause {
    #[error("line does not match the combined log format")]
    Structure,
    #[error("malformed datetime field")]
    Timestamp,
    #[error("malformed bytes field")]
    Bytes,
}

/// Diagnostic for one unparseable line. Pure data, `line_no` is 1-based.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Rejection {
    pub line_no: usize,
    pub line: String,
    pub cause: RejectCause,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}: {}", self.line_no, self.cause, self.line)
    }
}

/// Filter parameters for one query. Unset fields impose no constraint;
/// build a fresh value per query instead of patching an old one.
#[derive(Default, Clone, Debug)]
pub struct FilterSpec {
    /// Inclusive lower time bound.
    pub from: Option<DateTime<FixedOffset>>,
    /// Inclusive upper time bound.
    pub to: Option<DateTime<FixedOffset>>,
    /// Exact method, matched case-insensitively.
    pub method: Option<String>,
    /// First digit of the status code (4 selects all 4xx).
    pub status_family: Option<u16>,
    /// Case-insensitive substring of the request path.
    pub path_contains: Option<String>,
    pub exclude_bots: bool,
}
