/*!
 * Core Types
 * Common types used across the simulator
 */

/// Process ID type
pub type Pid = u32;

/// Resource ID type
pub type ResourceId = u32;

/// Simulated time, in ticks since simulation start
pub type Tick = u64;

/// Arrival order assigned at load time (FCFS/SJF tie-break)
pub type ArrivalOrder = u32;

/// Common result type for engine operations
pub type SimResult<T> = Result<T, super::errors::SimulationError>;

/// Number of resources in the default pool (R0..R9)
pub const DEFAULT_RESOURCES: u32 = 10;

/// Default Round Robin quantum, in ticks
pub const DEFAULT_QUANTUM: u64 = 2;
