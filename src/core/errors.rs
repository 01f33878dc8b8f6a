/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use crate::core::types::{Pid, ResourceId, Tick};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Engine-level errors with serialization support
///
/// Blocking, forced release, and quantum expiry are normal control flow and
/// never surface here.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SimulationError {
    #[error("process {pid} referenced unknown resource R{resource} at tick {tick}")]
    #[diagnostic(
        code(engine::unknown_resource),
        help("The script names a resource outside the declared pool. The offending process is aborted.")
    )]
    UnknownResource {
        pid: Pid,
        resource: ResourceId,
        tick: Tick,
    },

    #[error("R{resource} is not held by any process in the deadlock cycle (tick {tick})")]
    #[diagnostic(
        code(engine::invalid_resolution),
        help("Pick one of the candidate resources offered with the deadlock report.")
    )]
    InvalidResolution { resource: ResourceId, tick: Tick },

    #[error("no process is runnable at tick {tick} and no wait-for cycle exists")]
    #[diagnostic(
        code(engine::stall_without_cycle),
        help("Internal invariant violation: the resource table and the detector disagree.")
    )]
    StallWithoutCycle { tick: Tick },
}

/// Program loader errors
#[derive(Error, Debug, Diagnostic)]
pub enum LoadError {
    #[error("failed to read program file")]
    #[diagnostic(code(loader::io))]
    Io(#[from] std::io::Error),

    #[error("line {line}: instruction before any `program` header: {text}")]
    #[diagnostic(
        code(loader::missing_header),
        help("Every instruction must appear under a `program <name>` header.")
    )]
    MissingHeader { line: usize, text: String },

    #[error("line {line}: unknown instruction: {text}")]
    #[diagnostic(
        code(loader::unknown_instruction),
        help("Valid instructions are `resource(<id>, allocate)`, `wait(<ticks>)`, and `end`.")
    )]
    UnknownInstruction { line: usize, text: String },

    #[error("line {line}: malformed number in {text}")]
    #[diagnostic(code(loader::invalid_number))]
    InvalidNumber { line: usize, text: String },

    #[error("line {line}: unsupported resource operation `{op}`")]
    #[diagnostic(
        code(loader::unsupported_operation),
        help("Only `allocate` is supported; resources are released implicitly at `end`.")
    )]
    UnsupportedOperation { line: usize, op: String },

    #[error("line {line}: duplicate program name `{name}`")]
    #[diagnostic(code(loader::duplicate_program))]
    DuplicateProgram { line: usize, name: String },
}
