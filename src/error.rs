use thiserror::Error;

// ---------------------------------------------------------------------------
// EngineError – every way an engine operation can reject its input
// ---------------------------------------------------------------------------

/// Input errors raised by the table engine.
///
/// The set of kinds is closed. Each variant carries the message shown to the
/// user; callers match on the variant, never on the text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A required command argument was not supplied.
    #[error("{0}")]
    MissingArgument(String),

    /// The named column is not part of the schema.
    #[error("{0}")]
    ColumnNotFound(String),

    /// A value that must be a number (argument or cell) did not parse.
    #[error("{0}")]
    InvalidNumber(String),

    /// A numeric-only operation was asked about a categorical column.
    #[error("{0}")]
    NotNumericColumn(String),

    /// Sort direction was neither ascending nor descending.
    #[error("{0}")]
    InvalidOrder(String),

    /// An option or operation token was not recognised.
    #[error("{0}")]
    InvalidOption(String),
}

impl EngineError {
    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingArgument(_) => "missing_argument",
            Self::ColumnNotFound(_) => "column_not_found",
            Self::InvalidNumber(_) => "invalid_number",
            Self::NotNumericColumn(_) => "not_numeric_column",
            Self::InvalidOrder(_) => "invalid_order",
            Self::InvalidOption(_) => "invalid_option",
        }
    }

    /// The user-facing message.
    pub fn message(&self) -> &str {
        match self {
            Self::MissingArgument(m)
            | Self::ColumnNotFound(m)
            | Self::InvalidNumber(m)
            | Self::NotNumericColumn(m)
            | Self::InvalidOrder(m)
            | Self::InvalidOption(m) => m,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_bare_message() {
        let err = EngineError::ColumnNotFound("Column 'nope' does not exist".to_string());
        assert_eq!(err.to_string(), "Column 'nope' does not exist");
        assert_eq!(err.message(), "Column 'nope' does not exist");
        assert_eq!(err.kind(), "column_not_found");
    }

    #[test]
    fn converts_into_anyhow() {
        fn fails() -> anyhow::Result<()> {
            let res: Result<()> = Err(EngineError::InvalidOrder("bad order".to_string()));
            res?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::InvalidOrder(_))
        ));
    }
}
