use jobwire_core::envelope::Domain;

/// Failure raised by an operation while checking its own preconditions or
/// while running.
///
/// Preconditions are always reported, never silently clamped.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum OperationError {
    #[error("{operation}: missing required argument '{parameter}'")]
    MissingArgument {
        operation: &'static str,
        parameter: &'static str,
    },

    #[error("{operation} with invalid {parameter}: {reason}")]
    InvalidArgument {
        operation: &'static str,
        parameter: &'static str,
        reason: String,
    },

    #[error("{operation}: unexpected argument {name}")]
    UnexpectedArgument {
        operation: &'static str,
        name: String,
    },

    #[error("{operation} failed: {reason}")]
    Failed {
        operation: &'static str,
        reason: String,
    },
}

/// Failure of [`OperationRegistry::dispatch`](crate::OperationRegistry::dispatch).
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DispatchError {
    #[error("Unknown operation: {domain}.{operation}")]
    UnknownOperation { domain: Domain, operation: String },

    /// The operation's own failure, propagated verbatim.
    #[error(transparent)]
    Operation(#[from] OperationError),
}
