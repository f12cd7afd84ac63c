/// Errors raised when the input to a statistical routine is invalid.
///
/// Every routine in this crate validates its input up front and fails before
/// doing any work. None of these errors are transient: retrying with the same
/// input yields the same error.
#[derive(
    Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::IsVariant,
)]
pub enum Error {
    /// Wrong dimensions: a table that is not 2×2, mismatched or empty lists,
    /// ragged point rows, a missing column.
    #[display("shape error: {message}")]
    Shape { message: String },
    /// A value outside its domain: negative counts, a zero grand total, too
    /// few observations, an invalid option.
    #[display("domain error: {message}")]
    Domain { message: String },
    /// The statistic is mathematically undefined for this input, e.g. zero
    /// variance or more clusters than points.
    #[display("degenerate input: {message}")]
    Degenerate { message: String },
}

impl Error {
    pub(crate) fn shape(message: impl Into<String>) -> Self {
        Self::Shape {
            message: message.into(),
        }
    }

    pub(crate) fn domain(message: impl Into<String>) -> Self {
        Self::Domain {
            message: message.into(),
        }
    }

    pub(crate) fn degenerate(message: impl Into<String>) -> Self {
        Self::Degenerate {
            message: message.into(),
        }
    }

    /// Returns the descriptive message without the category prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Shape { message } | Self::Domain { message } | Self::Degenerate { message } => {
                message
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
