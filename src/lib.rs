/*!
 * Pseudo-OS Simulator Library
 * Cooperative scheduling, exclusive resource allocation, and
 * operator-directed deadlock resolution over scripted processes
 */

pub mod core;
pub mod deadlock;
pub mod engine;
pub mod events;
pub mod loader;
pub mod process;
pub mod resources;
pub mod scheduler;
pub mod trace;

// Re-exports
pub use crate::core::errors::{LoadError, SimulationError};
pub use crate::core::types::{Pid, ResourceId, Tick};
pub use crate::deadlock::{cycle_resources, WaitForGraph};
pub use crate::engine::{Completion, Engine, FirstCandidate, Resolver, Scripted, Summary};
pub use crate::events::{Collector, Event, Payload};
pub use crate::loader::{load_programs, parse, Program};
pub use crate::process::{Instruction, Process, ProcessState};
pub use crate::resources::{Acquisition, ResourceTable};
pub use crate::scheduler::{Policy, Scheduler};
pub use crate::trace::init_tracing;
