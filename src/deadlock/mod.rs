/*!
 * Deadlock Detector
 * Wait-for graph derived on demand from process state and the resource table
 */

use crate::core::types::{Pid, ResourceId};
use crate::process::Process;
use crate::resources::ResourceTable;
use ahash::{HashMap, HashMapExt};
use std::collections::BTreeMap;

/// Wait-for graph over currently blocked processes.
///
/// Edge A → B iff A is blocked on a resource owned by B. A blocked process
/// waits on exactly one resource, so out-degree is at most one and cycle
/// detection reduces to colored chain-walking.
#[derive(Debug)]
pub struct WaitForGraph {
    edges: HashMap<Pid, Pid>,
    blocked: Vec<Pid>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    Gray,
    Black,
}

impl WaitForGraph {
    /// Derive the graph from current state; never stored between steps so it
    /// cannot drift from actual ownership.
    #[must_use]
    pub fn build(processes: &BTreeMap<Pid, Process>, resources: &ResourceTable) -> Self {
        let mut edges = HashMap::new();
        let mut blocked = Vec::new();
        for process in processes.values().filter(|p| p.is_blocked()) {
            blocked.push(process.pid);
            if let Some(owner) = process.blocked_on.and_then(|r| resources.owner(r)) {
                edges.insert(process.pid, owner);
            }
        }
        Self { edges, blocked }
    }

    /// Members of the first cycle found, in ascending pid order, or an empty
    /// vector when the graph is acyclic. With several disjoint cycles one is
    /// reported per call; re-derive after resolving to find the rest.
    #[must_use]
    pub fn find_cycle(&self) -> Vec<Pid> {
        let mut colors: HashMap<Pid, Color> = HashMap::new();

        // Blocked pids come from a BTreeMap, so start points are ascending
        // and the result is deterministic.
        for &start in &self.blocked {
            if colors.contains_key(&start) {
                continue;
            }

            let mut chain = Vec::new();
            let mut node = start;
            let cycle_entry = loop {
                colors.insert(node, Color::Gray);
                chain.push(node);
                let Some(&next) = self.edges.get(&node) else {
                    break None;
                };
                match colors.get(&next) {
                    // Walked back into the current chain: cycle at `next`
                    Some(Color::Gray) => break Some(next),
                    Some(Color::Black) => break None,
                    None => node = next,
                }
            };

            if let Some(entry) = cycle_entry {
                let mut cycle = self.collect_cycle(entry);
                cycle.sort_unstable();
                return cycle;
            }

            // Chain exhausted without a cycle; retire it
            for visited in chain {
                colors.insert(visited, Color::Black);
            }
        }

        Vec::new()
    }

    fn collect_cycle(&self, entry: Pid) -> Vec<Pid> {
        let mut cycle = vec![entry];
        let mut node = self.edges[&entry];
        while node != entry {
            cycle.push(node);
            node = self.edges[&node];
        }
        cycle
    }
}

/// Resources the cycle is wedged on: each member's blocked-on resource.
/// Owned by a cycle member by construction; sorted and deduplicated for a
/// deterministic candidate list.
#[must_use]
pub fn cycle_resources(cycle: &[Pid], processes: &BTreeMap<Pid, Process>) -> Vec<ResourceId> {
    let mut candidates: Vec<ResourceId> = cycle
        .iter()
        .filter_map(|pid| processes.get(pid).and_then(|p| p.blocked_on))
        .collect();
    candidates.sort_unstable();
    candidates.dedup();
    candidates
}
