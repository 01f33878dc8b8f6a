/*!
 * Resource Table
 * Exclusive ownership tracking with FIFO wait queues per resource
 */

use crate::core::types::{Pid, ResourceId, DEFAULT_RESOURCES};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Outcome of a `try_acquire`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Acquisition {
    /// Ownership assigned to the requester
    Granted,
    /// Requester already owned the resource; idempotent no-op
    AlreadyHeld,
    /// Resource taken; requester appended to the FIFO wait queue
    Enqueued,
}

/// Ownership and wait-queue state for a fixed universe of resources.
///
/// The table is the single source of truth for holdings; per-process held
/// sets are derived views over it. Invariants: at most one owner per
/// resource, a pid queues on at most one resource, and an unowned resource
/// always has an empty queue.
#[derive(Debug, Clone)]
pub struct ResourceTable {
    owners: BTreeMap<ResourceId, Pid>,
    waiters: BTreeMap<ResourceId, VecDeque<Pid>>,
    count: u32,
}

impl ResourceTable {
    #[must_use]
    pub fn new(count: u32) -> Self {
        Self {
            owners: BTreeMap::new(),
            waiters: BTreeMap::new(),
            count,
        }
    }

    /// True when `resource` belongs to the declared pool
    #[inline]
    #[must_use]
    pub fn contains(&self, resource: ResourceId) -> bool {
        resource < self.count
    }

    #[inline]
    #[must_use]
    pub fn resource_count(&self) -> u32 {
        self.count
    }

    #[inline]
    #[must_use]
    pub fn owner(&self, resource: ResourceId) -> Option<Pid> {
        self.owners.get(&resource).copied()
    }

    /// Resources currently owned by `pid`, in ascending id order
    #[must_use]
    pub fn holdings(&self, pid: Pid) -> Vec<ResourceId> {
        self.owners
            .iter()
            .filter(|(_, &owner)| owner == pid)
            .map(|(&resource, _)| resource)
            .collect()
    }

    /// Wait queues `pid` currently sits in (the invariant allows at most one)
    #[must_use]
    pub fn queued_on(&self, pid: Pid) -> Vec<ResourceId> {
        self.waiters
            .iter()
            .filter(|(_, queue)| queue.contains(&pid))
            .map(|(&resource, _)| resource)
            .collect()
    }

    #[must_use]
    pub fn waiter_count(&self, resource: ResourceId) -> usize {
        self.waiters.get(&resource).map_or(0, VecDeque::len)
    }

    /// All (resource, owner) pairs, ascending by resource id
    pub fn owned(&self) -> impl Iterator<Item = (ResourceId, Pid)> + '_ {
        self.owners.iter().map(|(&resource, &pid)| (resource, pid))
    }

    /// Acquire `resource` for `pid`, or park `pid` on its FIFO wait queue.
    ///
    /// Re-requesting a held resource and re-requesting while already queued
    /// are both idempotent. Callers must validate the id via [`contains`]
    /// first.
    ///
    /// [`contains`]: Self::contains
    pub fn try_acquire(&mut self, resource: ResourceId, pid: Pid) -> Acquisition {
        debug_assert!(self.contains(resource), "undeclared resource R{resource}");
        match self.owners.get(&resource) {
            None => {
                self.owners.insert(resource, pid);
                info!("R{resource} allocated to process {pid}");
                Acquisition::Granted
            }
            Some(&owner) if owner == pid => Acquisition::AlreadyHeld,
            Some(_) => {
                let queue = self.waiters.entry(resource).or_default();
                if !queue.contains(&pid) {
                    queue.push_back(pid);
                }
                Acquisition::Enqueued
            }
        }
    }

    /// Release every resource owned by `pid`, handing each freed resource to
    /// the head of its wait queue. Returns `(resource, newly_granted)` pairs
    /// in ascending resource order so the engine can unblock the recipients.
    pub fn release_all(&mut self, pid: Pid) -> Vec<(ResourceId, Option<Pid>)> {
        let held = self.holdings(pid);
        let mut released = Vec::with_capacity(held.len());
        for resource in held {
            self.owners.remove(&resource);
            let granted = self.grant_to_head(resource);
            info!("process {pid} released R{resource}");
            released.push((resource, granted));
        }
        released
    }

    /// Unconditionally strip ownership of `resource`, granting it to the
    /// queue head if one exists. Returns `(former_owner, newly_granted)`, or
    /// `None` when the resource was not owned.
    pub fn force_release(&mut self, resource: ResourceId) -> Option<(Pid, Option<Pid>)> {
        let former = self.owners.remove(&resource)?;
        let granted = self.grant_to_head(resource);
        warn!("R{resource} force-released from process {former}");
        Some((former, granted))
    }

    /// Strict FIFO: first blocked, first served
    fn grant_to_head(&mut self, resource: ResourceId) -> Option<Pid> {
        let next = self.waiters.get_mut(&resource)?.pop_front()?;
        self.owners.insert(resource, next);
        next.into()
    }
}

impl Default for ResourceTable {
    fn default() -> Self {
        Self::new(DEFAULT_RESOURCES)
    }
}
