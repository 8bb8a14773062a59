//! Operation implementations and the registry that dispatches to them.

pub mod algebra;
pub mod args;
pub mod error;
pub mod image;
pub mod registry;
pub mod text;

pub use args::CallArgs;
pub use error::{DispatchError, OperationError};
pub use registry::{OperationFn, OperationRegistry, OperationTable};
