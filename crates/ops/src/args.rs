//! Positional-or-keyword argument binding.
//!
//! Operations are called with decoded positional `args` and keyword
//! `kwargs`. Each operation declares its parameter names and binds them
//! itself; a parameter may be supplied either way, but not both.

use std::collections::BTreeMap;

use image::RgbImage;
use jobwire_core::codec::Value;

use crate::error::OperationError;

/// Decoded call arguments for one operation invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    args: Vec<Value>,
    kwargs: BTreeMap<String, Value>,
}

impl CallArgs {
    pub fn new(args: Vec<Value>, kwargs: BTreeMap<String, Value>) -> Self {
        Self { args, kwargs }
    }

    /// Positional arguments only.
    pub fn positional(args: Vec<Value>) -> Self {
        Self::new(args, BTreeMap::new())
    }

    /// Add a keyword argument.
    pub fn with_kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    /// Bind arguments to the declared parameter list of `operation`.
    ///
    /// Rejects surplus positional arguments, unknown keywords, and
    /// parameters given both positionally and by keyword. Missing
    /// parameters are only reported when the operation asks for them.
    pub fn bind<'a>(
        &'a self,
        operation: &'static str,
        params: &[&'static str],
    ) -> Result<Bound<'a>, OperationError> {
        if self.args.len() > params.len() {
            return Err(OperationError::UnexpectedArgument {
                operation,
                name: format!(
                    "at position {} (takes {} positional arguments)",
                    params.len(),
                    params.len()
                ),
            });
        }
        if let Some(name) = self.kwargs.keys().find(|k| !params.contains(&k.as_str())) {
            return Err(OperationError::UnexpectedArgument {
                operation,
                name: format!("'{name}'"),
            });
        }

        let mut values = Vec::with_capacity(params.len());
        for (index, name) in params.iter().enumerate() {
            let positional = self.args.get(index);
            let keyword = self.kwargs.get(*name);
            if positional.is_some() && keyword.is_some() {
                return Err(OperationError::UnexpectedArgument {
                    operation,
                    name: format!("'{name}' given both positionally and by keyword"),
                });
            }
            values.push(positional.or(keyword));
        }

        Ok(Bound {
            operation,
            params: params.to_vec(),
            values,
        })
    }
}

/// Arguments bound to parameter slots.
#[derive(Debug)]
pub struct Bound<'a> {
    operation: &'static str,
    params: Vec<&'static str>,
    values: Vec<Option<&'a Value>>,
}

impl<'a> Bound<'a> {
    /// The value bound to parameter `index`, if one was supplied.
    pub fn optional(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index).copied().flatten()
    }

    pub fn required(&self, index: usize) -> Result<&'a Value, OperationError> {
        self.optional(index)
            .ok_or(OperationError::MissingArgument {
                operation: self.operation,
                parameter: self.param(index),
            })
    }

    pub fn image(&self, index: usize) -> Result<&'a RgbImage, OperationError> {
        let value = self.required(index)?;
        value
            .as_image()
            .ok_or_else(|| self.invalid(index, format!("expected an image, got {}", value.type_name())))
    }

    pub fn int(&self, index: usize) -> Result<i64, OperationError> {
        let value = self.required(index)?;
        value
            .as_i64()
            .ok_or_else(|| self.invalid(index, format!("expected an int, got {}", value.type_name())))
    }

    /// Int or float, widened to `f64`.
    pub fn number(&self, index: usize) -> Result<f64, OperationError> {
        let value = self.required(index)?;
        value
            .as_f64()
            .ok_or_else(|| self.invalid(index, format!("expected a number, got {}", value.type_name())))
    }

    pub fn string(&self, index: usize) -> Result<&'a str, OperationError> {
        let value = self.required(index)?;
        value
            .as_str()
            .ok_or_else(|| self.invalid(index, format!("expected a string, got {}", value.type_name())))
    }

    /// Build an [`OperationError::InvalidArgument`] for parameter `index`.
    pub fn invalid(&self, index: usize, reason: impl Into<String>) -> OperationError {
        OperationError::InvalidArgument {
            operation: self.operation,
            parameter: self.param(index),
            reason: reason.into(),
        }
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    fn param(&self, index: usize) -> &'static str {
        self.params.get(index).copied().unwrap_or("argument")
    }
}
