/*!
 * Scheduler Policy
 * Pluggable ready-queue ordering: FCFS, SJF, and Round Robin
 */

use crate::core::types::Pid;
use crate::process::Process;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Scheduling discipline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// First-come-first-serve; non-preemptive
    Fcfs,
    /// Shortest job first by remaining burst estimate; non-preemptive
    Sjf,
    /// Fixed-quantum preemptive round robin
    RoundRobin,
}

impl Policy {
    /// Only Round Robin preempts, by quantum expiry
    #[inline]
    #[must_use]
    pub const fn is_preemptive(&self) -> bool {
        matches!(self, Policy::RoundRobin)
    }
}

/// Ready queue with a policy-directed pick.
///
/// Admission and removal are the engine's job; [`pick_next`] never mutates
/// the queue as a side effect of picking.
///
/// [`pick_next`]: Self::pick_next
#[derive(Debug, Clone)]
pub struct Scheduler {
    policy: Policy,
    ready: VecDeque<Pid>,
}

impl Scheduler {
    #[must_use]
    pub fn new(policy: Policy) -> Self {
        info!("scheduler initialized: policy={policy:?}");
        Self {
            policy,
            ready: VecDeque::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Admit at the tail; returning (unblocked or preempted) processes queue
    /// behind everyone already waiting
    pub fn admit(&mut self, pid: Pid) {
        debug_assert!(!self.ready.contains(&pid), "process {pid} admitted twice");
        self.ready.push_back(pid);
    }

    /// Select the next process to run without removing it.
    ///
    /// FCFS and Round Robin take the queue head; SJF recomputes remaining
    /// burst across the ready set, breaking ties by arrival order, then pid.
    #[must_use]
    pub fn pick_next(&self, processes: &BTreeMap<Pid, Process>) -> Option<Pid> {
        match self.policy {
            Policy::Fcfs | Policy::RoundRobin => self.ready.front().copied(),
            Policy::Sjf => self
                .ready
                .iter()
                .min_by_key(|&&pid| {
                    let process = &processes[&pid];
                    (process.remaining_burst(), process.arrival, pid)
                })
                .copied(),
        }
    }

    /// Remove a picked process from the ready queue
    pub fn take(&mut self, pid: Pid) -> bool {
        if let Some(pos) = self.ready.iter().position(|&p| p == pid) {
            self.ready.remove(pos);
            true
        } else {
            false
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ready.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ready.is_empty()
    }

    #[must_use]
    pub fn contains(&self, pid: Pid) -> bool {
        self.ready.contains(&pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Instruction;

    fn proc(pid: Pid, arrival: u32, instructions: Vec<Instruction>) -> Process {
        Process::new(pid, format!("P{pid}"), arrival, instructions)
    }

    fn table(processes: Vec<Process>) -> BTreeMap<Pid, Process> {
        processes.into_iter().map(|p| (p.pid, p)).collect()
    }

    #[test]
    fn test_fcfs_picks_queue_head() {
        let processes = table(vec![
            proc(1, 0, vec![Instruction::Wait(5), Instruction::End]),
            proc(2, 1, vec![Instruction::End]),
        ]);
        let mut sched = Scheduler::new(Policy::Fcfs);
        sched.admit(1);
        sched.admit(2);

        assert_eq!(sched.pick_next(&processes), Some(1));
        // Picking twice without take() returns the same pid
        assert_eq!(sched.pick_next(&processes), Some(1));
    }

    #[test]
    fn test_take_preserves_remaining_order() {
        let processes = table(vec![
            proc(1, 0, vec![Instruction::End]),
            proc(2, 1, vec![Instruction::End]),
            proc(3, 2, vec![Instruction::End]),
        ]);
        let mut sched = Scheduler::new(Policy::Fcfs);
        for pid in [1, 2, 3] {
            sched.admit(pid);
        }

        assert!(sched.take(2));
        assert_eq!(sched.pick_next(&processes), Some(1));
        assert!(sched.take(1));
        assert_eq!(sched.pick_next(&processes), Some(3));
        assert!(!sched.take(2));
    }

    #[test]
    fn test_sjf_picks_shortest_remaining_burst() {
        let processes = table(vec![
            proc(1, 0, vec![Instruction::Wait(4), Instruction::End]),
            proc(2, 1, vec![Instruction::Wait(1), Instruction::End]),
            proc(3, 2, vec![Instruction::Wait(2), Instruction::End]),
        ]);
        let mut sched = Scheduler::new(Policy::Sjf);
        for pid in [1, 2, 3] {
            sched.admit(pid);
        }

        assert_eq!(sched.pick_next(&processes), Some(2));
    }

    #[test]
    fn test_sjf_ties_break_by_arrival_then_pid() {
        // Equal bursts, equal arrival order: ascending pid wins
        let script = || vec![Instruction::Wait(2), Instruction::End];
        let processes = table(vec![proc(4, 0, script()), proc(2, 0, script())]);
        let mut sched = Scheduler::new(Policy::Sjf);
        sched.admit(4);
        sched.admit(2);

        for _ in 0..10 {
            assert_eq!(sched.pick_next(&processes), Some(2));
        }

        // Earlier arrival beats smaller pid
        let processes = table(vec![proc(4, 0, script()), proc(2, 1, script())]);
        assert_eq!(sched.pick_next(&processes), Some(4));
    }

    #[test]
    fn test_round_robin_picks_head() {
        let processes = table(vec![
            proc(1, 0, vec![Instruction::End]),
            proc(2, 1, vec![Instruction::End]),
        ]);
        let mut sched = Scheduler::new(Policy::RoundRobin);
        sched.admit(1);
        sched.admit(2);

        assert_eq!(sched.pick_next(&processes), Some(1));
        sched.take(1);
        sched.admit(1); // preempted, back to the tail
        assert_eq!(sched.pick_next(&processes), Some(2));
    }
}
