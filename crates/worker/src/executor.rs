//! Executes one job message against the operation registry.
//!
//! Pure and synchronous: decode, dispatch, encode. Every failure becomes a
//! `FAILURE` record; nothing escapes to the caller.

use std::error::Error as _;
use std::fmt::Write as _;
use std::time::{Duration, Instant};

use jobwire_broker::{JobMessage, TaskRecord};
use jobwire_core::codec::{self, Value};
use jobwire_core::error::CodecError;
use jobwire_core::job::{round_elapsed, JobOutput};
use jobwire_ops::{CallArgs, DispatchError, OperationRegistry};

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Failed to decode arguments: {0}")]
    Decode(CodecError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Failed to encode result: {0}")]
    Encode(CodecError),
}

impl ExecutionError {
    fn kind(&self) -> &'static str {
        match self {
            ExecutionError::Decode(_) => "DecodeError",
            ExecutionError::Dispatch(DispatchError::UnknownOperation { .. }) => "UnknownOperation",
            ExecutionError::Dispatch(DispatchError::Operation(_)) => "OperationError",
            ExecutionError::Encode(_) => "EncodeError",
        }
    }
}

/// Run `message` and produce its terminal record.
///
/// `elapsed` covers the operation call only, not argument decoding or
/// result encoding.
pub fn execute(registry: &OperationRegistry, message: &JobMessage) -> TaskRecord {
    match run(registry, message) {
        Ok((output, elapsed)) => TaskRecord::success(JobOutput {
            output,
            elapsed: round_elapsed(elapsed.as_secs_f64()),
            finish_time: chrono::Utc::now(),
        }),
        Err(err) => TaskRecord::failure(err.to_string(), traceback(message, &err)),
    }
}

fn run(
    registry: &OperationRegistry,
    message: &JobMessage,
) -> Result<(codec::TaggedValue, Duration), ExecutionError> {
    let request = &message.request;
    let args = codec::decode_args(&request.args).map_err(ExecutionError::Decode)?;
    let kwargs = codec::decode_kwargs(&request.kwargs).map_err(ExecutionError::Decode)?;
    let call = CallArgs::new(args, kwargs);

    let started = Instant::now();
    let result: Value = registry.dispatch(request.domain, &request.operation, &call)?;
    let elapsed = started.elapsed();

    let output = codec::encode(&result).map_err(ExecutionError::Encode)?;
    Ok((output, elapsed))
}

/// Diagnostic trace: job identity, error kind and the error source chain.
pub fn traceback(message: &JobMessage, err: &ExecutionError) -> String {
    let mut trace = job_header(message);
    let _ = writeln!(trace, "{}: {err}", err.kind());
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = writeln!(trace, "  caused by: {cause}");
        source = cause.source();
    }
    trace
}

/// First lines of every trace, identifying the job.
pub fn job_header(message: &JobMessage) -> String {
    format!(
        "Job {} ({}.{}) submitted at {}\n",
        message.id,
        message.request.domain,
        message.request.operation,
        message.submitted_at.to_rfc3339(),
    )
}
