//! Per-domain operation registry.
//!
//! Built once at startup and never mutated afterwards, so it can be shared
//! across worker threads behind an `Arc` without locking.

use std::collections::HashMap;

use jobwire_core::codec::Value;
use jobwire_core::envelope::Domain;

use crate::args::CallArgs;
use crate::error::{DispatchError, OperationError};

/// Signature every registered operation implements.
pub type OperationFn = fn(&CallArgs) -> Result<Value, OperationError>;

/// Named operations of one domain.
#[derive(Debug, Clone, Default)]
pub struct OperationTable {
    entries: HashMap<&'static str, OperationFn>,
}

impl OperationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, operation: OperationFn) -> Self {
        self.entries.insert(name, operation);
        self
    }

    pub fn get(&self, name: &str) -> Option<OperationFn> {
        self.entries.get(name).copied()
    }

    /// Operation names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

#[derive(Debug, Clone, Default)]
pub struct OperationRegistry {
    domains: HashMap<Domain, OperationTable>,
}

impl OperationRegistry {
    pub fn new(tables: impl IntoIterator<Item = (Domain, OperationTable)>) -> Self {
        Self {
            domains: tables.into_iter().collect(),
        }
    }

    /// The built-in operation set. `video` is a recognised domain with no
    /// operations yet.
    pub fn standard() -> Self {
        Self::new([
            (Domain::Image, crate::image::table()),
            (Domain::Algebra, crate::algebra::table()),
            (Domain::Text, crate::text::table()),
            (Domain::Video, OperationTable::new()),
        ])
    }

    pub fn lookup(&self, domain: Domain, operation: &str) -> Option<OperationFn> {
        self.domains.get(&domain)?.get(operation)
    }

    /// Operation names registered for `domain`, sorted.
    pub fn operations(&self, domain: Domain) -> Vec<&'static str> {
        self.domains
            .get(&domain)
            .map(OperationTable::names)
            .unwrap_or_default()
    }

    /// Look up `operation` under `domain` and invoke it.
    ///
    /// No generic argument checking happens here; each operation validates
    /// its own inputs.
    pub fn dispatch(
        &self,
        domain: Domain,
        operation: &str,
        args: &CallArgs,
    ) -> Result<Value, DispatchError> {
        let run = self
            .lookup(domain, operation)
            .ok_or_else(|| DispatchError::UnknownOperation {
                domain,
                operation: operation.to_string(),
            })?;
        tracing::debug!(%domain, operation, "Dispatching operation");
        Ok(run(args)?)
    }
}
