//! Shared building blocks for the jobwire dispatcher.
//!
//! - [`codec`]: typed value codec between native values and the tagged
//!   JSON wire form.
//! - [`envelope`]: request envelope validation.
//! - [`job`]: job model and lifecycle states.
//!
//! Everything here is pure and synchronous so that the API, the worker and
//! the client all agree on the same rules.

pub mod codec;
pub mod envelope;
pub mod error;
pub mod job;
pub mod types;
