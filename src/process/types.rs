/*!
 * Process Types
 * Instruction variants and lifecycle states
 */

use crate::core::types::{ResourceId, Tick};
use serde::{Deserialize, Serialize};

/// One step of a process script, fixed at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    /// Acquire exclusive ownership of a resource, blocking if it is taken
    Request(ResourceId),
    /// Consume the given number of simulated ticks of computation
    Wait(Tick),
    /// Terminate and release every held resource
    End,
}

/// Process lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// Loaded but not yet admitted to the ready queue
    New,
    /// Admitted and runnable
    Ready,
    /// Currently executing an instruction step
    Running,
    /// Parked on exactly one resource wait queue
    Blocked,
    /// Finished or aborted; absorbing
    Terminated,
}
