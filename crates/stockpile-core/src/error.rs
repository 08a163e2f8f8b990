use std::fmt;

/// Machine-readable error codes for callers that render or branch on failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    UnknownItem,
    UnknownProject,
    InsufficientStock,
    InvalidRecipe,
    DuplicateProject,
    InvalidAmount,
    InvalidName,
    CorruptStore,
    LockContention,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::UnknownItem => "E2001",
            Self::UnknownProject => "E2002",
            Self::InsufficientStock => "E2003",
            Self::InvalidRecipe => "E2004",
            Self::DuplicateProject => "E2005",
            Self::InvalidAmount => "E2006",
            Self::InvalidName => "E2007",
            Self::CorruptStore => "E3001",
            Self::LockContention => "E5001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Stockpile not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::UnknownItem => "Item not found",
            Self::UnknownProject => "Project not found",
            Self::InsufficientStock => "Insufficient stock",
            Self::InvalidRecipe => "Invalid recipe",
            Self::DuplicateProject => "Project already exists",
            Self::InvalidAmount => "Invalid amount",
            Self::InvalidName => "Invalid name",
            Self::CorruptStore => "Corrupt SQLite store",
            Self::LockContention => "Lock contention",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `sp init` to create the stockpile database."),
            Self::ConfigParseError => Some("Fix syntax in .stockpile/config.toml and retry."),
            Self::UnknownItem => Some("Check the spelling with `sp items <fragment>`."),
            Self::UnknownProject => Some("List projects with `sp project list`."),
            Self::InsufficientStock => Some("Withdraw at most the available amount."),
            Self::InvalidRecipe => {
                Some("Use a positive ratio and distinct input and output items.")
            }
            Self::DuplicateProject => Some("Pick a different project name."),
            Self::InvalidAmount => None,
            Self::InvalidName => Some("Item and project names must not be blank."),
            Self::CorruptStore => Some("Restore .stockpile/stockpile.db from a backup."),
            Self::LockContention => Some("Retry after the other writer releases the database."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Failures returned by ledger, registry, recipe and project operations.
///
/// Every domain variant is a recoverable outcome the caller is expected to
/// render. [`LedgerError::Store`] wraps any failure of the underlying SQLite
/// store; the transaction that hit it has already been rolled back.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("item '{name}' does not exist")]
    UnknownItem { name: String },

    #[error("project '{name}' not found")]
    UnknownProject { name: String },

    #[error("insufficient stock of '{item}': {available} available, {requested} requested")]
    InsufficientStock {
        item: String,
        available: i64,
        requested: i64,
    },

    #[error("invalid recipe for '{output}': {reason}")]
    InvalidRecipe { output: String, reason: &'static str },

    #[error("project '{name}' already exists")]
    DuplicateProject { name: String },

    #[error("invalid amount {amount}: {reason}")]
    InvalidAmount { amount: i64, reason: &'static str },

    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("store failure: {0}")]
    Store(#[from] rusqlite::Error),
}

impl LedgerError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownItem { .. } => ErrorCode::UnknownItem,
            Self::UnknownProject { .. } => ErrorCode::UnknownProject,
            Self::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            Self::InvalidRecipe { .. } => ErrorCode::InvalidRecipe,
            Self::DuplicateProject { .. } => ErrorCode::DuplicateProject,
            Self::InvalidAmount { .. } => ErrorCode::InvalidAmount,
            Self::InvalidName { .. } => ErrorCode::InvalidName,
            Self::Store(err) => store_error_code(err),
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }

    /// Stock actually held when a withdrawal was refused.
    #[must_use]
    pub const fn available(&self) -> Option<i64> {
        match self {
            Self::InsufficientStock { available, .. } => Some(*available),
            _ => None,
        }
    }
}

fn store_error_code(err: &rusqlite::Error) -> ErrorCode {
    match err.sqlite_error_code() {
        Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked) => {
            ErrorCode::LockContention
        }
        Some(rusqlite::ErrorCode::DatabaseCorrupt | rusqlite::ErrorCode::NotADatabase) => {
            ErrorCode::CorruptStore
        }
        _ => ErrorCode::InternalUnexpected,
    }
}

/// Shorthand for results produced by engine operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::{ErrorCode, LedgerError};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::NotInitialized,
            ErrorCode::ConfigParseError,
            ErrorCode::UnknownItem,
            ErrorCode::UnknownProject,
            ErrorCode::InsufficientStock,
            ErrorCode::InvalidRecipe,
            ErrorCode::DuplicateProject,
            ErrorCode::InvalidAmount,
            ErrorCode::InvalidName,
            ErrorCode::CorruptStore,
            ErrorCode::LockContention,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::InsufficientStock.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn insufficient_stock_reports_available_amount() {
        let err = LedgerError::InsufficientStock {
            item: "Scrap".to_string(),
            available: 500,
            requested: 600,
        };
        assert_eq!(err.available(), Some(500));
        assert_eq!(err.code(), ErrorCode::InsufficientStock);
        assert_eq!(
            err.to_string(),
            "insufficient stock of 'Scrap': 500 available, 600 requested"
        );
    }

    #[test]
    fn busy_store_errors_map_to_lock_contention() {
        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        let err = LedgerError::from(busy);
        assert_eq!(err.code(), ErrorCode::LockContention);
        assert!(err.hint().is_some());
    }
}
