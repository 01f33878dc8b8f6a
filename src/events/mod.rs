/*!
 * Event System
 * Strongly-typed simulation events recorded in exact occurrence order
 */

use crate::core::types::{Pid, ResourceId, Tick};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One simulation event, stamped with the tick it occurred at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Event {
    pub tick: Tick,
    pub payload: Payload,
}

/// Event payload - strongly typed variants for each event type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    ResourceGranted {
        pid: Pid,
        resource: ResourceId,
    },
    ResourceBlocked {
        pid: Pid,
        resource: ResourceId,
    },
    DeadlockDetected {
        involved: Vec<Pid>,
    },
    ForcedRelease {
        resource: ResourceId,
        former_owner: Pid,
        new_owner: Option<Pid>,
    },
    ProcessTerminated {
        pid: Pid,
        turnaround: Tick,
    },
    /// Process killed by an `UnknownResource` fault; its holdings were freed
    ProcessAborted {
        pid: Pid,
        resource: ResourceId,
    },
}

impl Event {
    #[inline]
    #[must_use]
    pub const fn new(tick: Tick, payload: Payload) -> Self {
        Self { tick, payload }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>5}  ", self.tick)?;
        match &self.payload {
            Payload::ResourceGranted { pid, resource } => {
                write!(f, "P{pid:<4} allocated resource         R{resource}")
            }
            Payload::ResourceBlocked { pid, resource } => {
                write!(f, "P{pid:<4} blocked on resource        R{resource}")
            }
            Payload::DeadlockDetected { involved } => {
                let pids: Vec<String> = involved.iter().map(|p| format!("P{p}")).collect();
                write!(f, "SYS   deadlock detected          ({})", pids.join(", "))
            }
            Payload::ForcedRelease {
                resource,
                former_owner,
                new_owner,
            } => {
                write!(f, "SYS   force released             R{resource} (from P{former_owner}")?;
                match new_owner {
                    Some(pid) => write!(f, ", to P{pid})"),
                    None => write!(f, ", no waiter)"),
                }
            }
            Payload::ProcessTerminated { pid, turnaround } => {
                write!(f, "P{pid:<4} terminated                 (turnaround {turnaround})")
            }
            Payload::ProcessAborted { pid, resource } => {
                write!(f, "P{pid:<4} aborted                    R{resource} (unknown resource)")
            }
        }
    }
}

/// Append-only event log shared between the engine and its observers.
///
/// The collector never influences engine state; it only records.
#[derive(Debug, Default)]
pub struct Collector {
    events: RwLock<Vec<Event>>,
}

impl Collector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: Event) {
        log::info!("{event}");
        self.events.write().push(event);
    }

    /// Copy of the event log in emission order
    #[must_use]
    pub fn snapshot(&self) -> Vec<Event> {
        self.events.read().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}
