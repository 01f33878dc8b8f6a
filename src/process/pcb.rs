/*!
 * Process Control Block
 * Per-process mutable record, owned and mutated exclusively by the engine
 */

use super::types::{Instruction, ProcessState};
use crate::core::types::{ArrivalOrder, Pid, ResourceId, Tick};

/// Per-process record: an immutable script plus the engine-driven state
#[derive(Debug, Clone)]
pub struct Process {
    pub pid: Pid,
    pub name: String,
    /// Load-time position, used as the FCFS/SJF tie-break
    pub arrival: ArrivalOrder,
    /// Tick at which the process was admitted (0 for batch arrival)
    pub arrival_tick: Tick,
    instructions: Vec<Instruction>,
    /// Index of the next instruction; a blocked `Request` is not advanced past
    pub pc: usize,
    pub state: ProcessState,
    /// Ticks left in an in-progress `Wait`
    pub wait_remaining: Tick,
    /// Resource this process is parked on, if any
    pub blocked_on: Option<ResourceId>,
    /// Set once, at termination
    pub completion_tick: Option<Tick>,
    /// True when the process was killed by an `UnknownResource` fault
    pub aborted: bool,
    /// Full-script burst estimate, computed once at load
    pub burst_estimate: u64,
}

impl Process {
    #[must_use]
    pub fn new(pid: Pid, name: String, arrival: ArrivalOrder, instructions: Vec<Instruction>) -> Self {
        let burst_estimate = estimate_burst(&instructions, 0, 0);
        Self {
            pid,
            name,
            arrival,
            arrival_tick: 0,
            instructions,
            pc: 0,
            state: ProcessState::New,
            wait_remaining: 0,
            blocked_on: None,
            completion_tick: None,
            aborted: false,
            burst_estimate,
        }
    }

    /// Next instruction to execute, or `None` when the script is exhausted
    #[inline]
    #[must_use]
    pub fn current_instruction(&self) -> Option<Instruction> {
        self.instructions.get(self.pc).copied()
    }

    #[inline]
    pub fn advance(&mut self) {
        self.pc += 1;
    }

    /// Remaining burst estimate: Σ outstanding wait ticks plus one tick per
    /// outstanding `Request`. The SJF pick metric, recomputed on demand.
    #[must_use]
    pub fn remaining_burst(&self) -> u64 {
        estimate_burst(&self.instructions, self.pc, self.wait_remaining)
    }

    #[inline(always)]
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.state, ProcessState::Ready)
    }

    #[inline(always)]
    #[must_use]
    pub const fn is_blocked(&self) -> bool {
        matches!(self.state, ProcessState::Blocked)
    }

    #[inline(always)]
    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        matches!(self.state, ProcessState::Terminated)
    }

    /// Completion tick minus arrival tick, once terminated
    #[must_use]
    pub fn turnaround(&self) -> Option<Tick> {
        self.completion_tick.map(|c| c - self.arrival_tick)
    }
}

fn estimate_burst(instructions: &[Instruction], pc: usize, wait_remaining: Tick) -> u64 {
    let mut total = 0u64;
    for (idx, instr) in instructions.iter().enumerate().skip(pc) {
        total += match *instr {
            // An in-progress wait only owes its remaining ticks
            Instruction::Wait(_) if idx == pc && wait_remaining > 0 => wait_remaining,
            Instruction::Wait(ticks) => ticks,
            Instruction::Request(_) => 1,
            Instruction::End => 0,
        };
    }
    total
}
