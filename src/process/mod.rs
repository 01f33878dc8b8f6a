/*!
 * Process Module
 * Process scripts and the per-process state machine
 */

pub mod pcb;
pub mod types;

// Re-export for convenience
pub use pcb::Process;
pub use types::{Instruction, ProcessState};
