/*!
 * Simulation Engine
 * Driver loop: advances simulated time, dispatches the policy-selected
 * process, interprets instructions against the resource table, and applies
 * operator-chosen deadlock resolutions
 */

use crate::core::errors::SimulationError;
use crate::core::types::{Pid, ResourceId, SimResult, Tick, DEFAULT_QUANTUM};
use crate::deadlock::{cycle_resources, WaitForGraph};
use crate::events::{Collector, Event, Payload};
use crate::loader::Program;
use crate::process::{Instruction, Process, ProcessState};
use crate::resources::{Acquisition, ResourceTable};
use crate::scheduler::{Policy, Scheduler};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Operator-directed deadlock resolution, injected into the engine.
///
/// Called synchronously whenever a wait-for cycle is found; the only point
/// where the simulation waits on something outside its own control. The
/// returned id must be a resource currently owned by a cycle member; the
/// engine validates and re-prompts otherwise.
pub trait Resolver {
    fn choose_resource_to_release(&mut self, candidates: &[ResourceId]) -> ResourceId;
}

/// Headless resolver: always frees the lowest-numbered candidate
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstCandidate;

impl Resolver for FirstCandidate {
    fn choose_resource_to_release(&mut self, candidates: &[ResourceId]) -> ResourceId {
        candidates.first().copied().unwrap_or_default()
    }
}

/// Replays a fixed sequence of choices, then falls back to the first
/// candidate; for scripted test harnesses
#[derive(Debug, Default)]
pub struct Scripted {
    choices: std::collections::VecDeque<ResourceId>,
}

impl Scripted {
    #[must_use]
    pub fn new(choices: impl IntoIterator<Item = ResourceId>) -> Self {
        Self {
            choices: choices.into_iter().collect(),
        }
    }
}

impl Resolver for Scripted {
    fn choose_resource_to_release(&mut self, candidates: &[ResourceId]) -> ResourceId {
        self.choices
            .pop_front()
            .or_else(|| candidates.first().copied())
            .unwrap_or_default()
    }
}

/// Final per-process accounting row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Completion {
    pub pid: Pid,
    pub name: String,
    pub completion_tick: Tick,
    pub turnaround: Tick,
    pub burst_estimate: u64,
    pub aborted: bool,
}

pub type Summary = Vec<Completion>;

/// The simulation driver.
///
/// Logically single-threaded and deterministic: exactly one instruction-step
/// executes per [`step`], and all process/resource mutations happen on
/// behalf of the currently stepping process, one sequence at a time. The
/// global tick advances once per time-consuming step (one elapsed wait tick
/// or one granted request); `End` and a blocked request consume no time.
///
/// [`step`]: Self::step
pub struct Engine {
    processes: BTreeMap<Pid, Process>,
    resources: ResourceTable,
    scheduler: Scheduler,
    clock: Tick,
    quantum: u64,
    quantum_left: u64,
    current: Option<Pid>,
    collector: Arc<Collector>,
}

impl Engine {
    /// Load programs in file order: pids and arrival order follow that
    /// order, and every process is admitted ready at tick 0.
    #[must_use]
    pub fn new(programs: Vec<Program>, policy: Policy) -> Self {
        let mut processes = BTreeMap::new();
        let mut scheduler = Scheduler::new(policy);
        for (index, program) in programs.into_iter().enumerate() {
            let pid = index as Pid + 1;
            let mut process = Process::new(pid, program.name, index as u32, program.instructions);
            process.state = ProcessState::Ready;
            scheduler.admit(pid);
            processes.insert(pid, process);
        }
        Self {
            processes,
            resources: ResourceTable::default(),
            scheduler,
            clock: 0,
            quantum: DEFAULT_QUANTUM,
            quantum_left: DEFAULT_QUANTUM,
            current: None,
            collector: Arc::new(Collector::new()),
        }
    }

    /// Round Robin quantum, in ticks (clamped to at least 1)
    #[must_use]
    pub fn with_quantum(mut self, quantum: u64) -> Self {
        self.quantum = quantum.max(1);
        self.quantum_left = self.quantum;
        self
    }

    /// Size of the resource pool (ids `0..count`)
    #[must_use]
    pub fn with_resources(mut self, count: u32) -> Self {
        self.resources = ResourceTable::new(count);
        self
    }

    /// Share an externally owned event collector
    #[must_use]
    pub fn with_collector(mut self, collector: Arc<Collector>) -> Self {
        self.collector = collector;
        self
    }

    /// Run to completion: loops [`step`] until every process terminated
    ///
    /// [`step`]: Self::step
    pub fn run(&mut self, resolver: &mut dyn Resolver) -> SimResult<Summary> {
        info!(
            "simulation starting: {} processes, policy {:?}, quantum {}",
            self.processes.len(),
            self.scheduler.policy(),
            self.quantum
        );
        while self.step(resolver)? {}
        info!("simulation complete at tick {}", self.clock);
        Ok(self.summary())
    }

    /// Execute one scheduling decision. Returns `Ok(false)` once every
    /// process has terminated.
    pub fn step(&mut self, resolver: &mut dyn Resolver) -> SimResult<bool> {
        if self.all_terminated() {
            return Ok(false);
        }

        let pid = match self.current {
            Some(pid) => pid,
            None => {
                let Some(pid) = self.scheduler.pick_next(&self.processes) else {
                    // Nothing runnable but work remains: everyone is blocked,
                    // so a cycle must exist and must be resolved first
                    self.resolve_stall(resolver)?;
                    return Ok(true);
                };
                self.scheduler.take(pid);
                if let Some(process) = self.processes.get_mut(&pid) {
                    process.state = ProcessState::Running;
                }
                self.current = Some(pid);
                self.quantum_left = self.quantum;
                pid
            }
        };

        self.dispatch(pid, resolver)?;
        Ok(true)
    }

    fn dispatch(&mut self, pid: Pid, resolver: &mut dyn Resolver) -> SimResult<()> {
        let instruction = self.processes.get(&pid).and_then(Process::current_instruction);
        match instruction {
            // An exhausted script terminates like an explicit `End`
            None | Some(Instruction::End) => {
                self.terminate(pid);
                Ok(())
            }
            Some(Instruction::Request(resource)) => self.execute_request(pid, resource, resolver),
            Some(Instruction::Wait(ticks)) => {
                self.execute_wait(pid, ticks);
                Ok(())
            }
        }
    }

    fn execute_request(
        &mut self,
        pid: Pid,
        resource: ResourceId,
        resolver: &mut dyn Resolver,
    ) -> SimResult<()> {
        if !self.resources.contains(resource) {
            self.abort(pid, resource);
            return Ok(());
        }

        match self.resources.try_acquire(resource, pid) {
            Acquisition::Granted => {
                self.emit(Payload::ResourceGranted { pid, resource });
                self.finish_unit_step(pid);
            }
            // Idempotent re-request; also the retry of a request already
            // satisfied by a release or forced release
            Acquisition::AlreadyHeld => {
                self.finish_unit_step(pid);
            }
            Acquisition::Enqueued => {
                if let Some(process) = self.processes.get_mut(&pid) {
                    process.state = ProcessState::Blocked;
                    process.blocked_on = Some(resource);
                }
                self.current = None;
                self.emit(Payload::ResourceBlocked { pid, resource });

                // A fresh block is the only transition that can close a cycle
                let cycle = WaitForGraph::build(&self.processes, &self.resources).find_cycle();
                if !cycle.is_empty() {
                    self.resolve_cycle(cycle, resolver);
                }
            }
        }
        Ok(())
    }

    /// A granted request consumes one tick and advances the program counter
    fn finish_unit_step(&mut self, pid: Pid) {
        if let Some(process) = self.processes.get_mut(&pid) {
            process.advance();
        }
        self.clock += 1;
        self.charge_quantum(pid);
    }

    fn execute_wait(&mut self, pid: Pid, ticks: Tick) {
        let Some(process) = self.processes.get_mut(&pid) else {
            return;
        };
        if process.wait_remaining == 0 {
            process.wait_remaining = ticks;
        }
        if process.wait_remaining == 0 {
            // wait(0) completes without consuming time
            process.advance();
            return;
        }

        process.wait_remaining -= 1;
        if process.wait_remaining == 0 {
            process.advance();
        }
        self.clock += 1;

        if self.scheduler.policy().is_preemptive() {
            self.charge_quantum(pid);
        } else {
            // A wait tick models timed I/O: the CPU is relinquished and the
            // process re-enters the ready queue at the tail
            self.yield_to_ready(pid);
        }
    }

    /// Round Robin accounting: one tick of progress against the quantum
    fn charge_quantum(&mut self, pid: Pid) {
        if !self.scheduler.policy().is_preemptive() {
            return;
        }
        self.quantum_left = self.quantum_left.saturating_sub(1);
        if self.quantum_left == 0 && self.current == Some(pid) {
            self.yield_to_ready(pid);
        }
    }

    fn yield_to_ready(&mut self, pid: Pid) {
        if let Some(process) = self.processes.get_mut(&pid) {
            process.state = ProcessState::Ready;
        }
        self.scheduler.admit(pid);
        self.current = None;
    }

    fn terminate(&mut self, pid: Pid) {
        let turnaround = if let Some(process) = self.processes.get_mut(&pid) {
            process.state = ProcessState::Terminated;
            process.completion_tick = Some(self.clock);
            self.clock - process.arrival_tick
        } else {
            self.clock
        };
        self.current = None;
        self.emit(Payload::ProcessTerminated { pid, turnaround });
        self.release_holdings(pid);
    }

    /// Kill a process that referenced an undeclared resource; the rest of
    /// the simulation continues
    fn abort(&mut self, pid: Pid, resource: ResourceId) {
        let fault = SimulationError::UnknownResource {
            pid,
            resource,
            tick: self.clock,
        };
        error!("{fault}");
        self.emit(Payload::ProcessAborted { pid, resource });
        if let Some(process) = self.processes.get_mut(&pid) {
            process.state = ProcessState::Terminated;
            process.completion_tick = Some(self.clock);
            process.aborted = true;
        }
        self.current = None;
        self.release_holdings(pid);
    }

    /// Free everything `pid` held and wake the FIFO heads that inherit it
    fn release_holdings(&mut self, pid: Pid) {
        for (resource, granted) in self.resources.release_all(pid) {
            if let Some(waiter) = granted {
                self.emit(Payload::ResourceGranted { pid: waiter, resource });
                self.unblock(waiter);
            }
        }
    }

    /// Blocked → Ready; ownership was already assigned by the table, so the
    /// retried request will observe it as already held
    fn unblock(&mut self, pid: Pid) {
        if let Some(process) = self.processes.get_mut(&pid) {
            process.state = ProcessState::Ready;
            process.blocked_on = None;
        }
        self.scheduler.admit(pid);
    }

    /// Ready set empty with work remaining: verify the deadlock-only stall
    fn resolve_stall(&mut self, resolver: &mut dyn Resolver) -> SimResult<()> {
        let cycle = WaitForGraph::build(&self.processes, &self.resources).find_cycle();
        if cycle.is_empty() {
            return Err(SimulationError::StallWithoutCycle { tick: self.clock });
        }
        self.resolve_cycle(cycle, resolver);
        Ok(())
    }

    /// Report the cycle, then apply one operator-chosen forced release.
    /// Invalid choices are surfaced and the resolver re-prompted; no timeout.
    fn resolve_cycle(&mut self, cycle: Vec<Pid>, resolver: &mut dyn Resolver) {
        let candidates = cycle_resources(&cycle, &self.processes);
        self.emit(Payload::DeadlockDetected {
            involved: cycle.clone(),
        });

        loop {
            let choice = resolver.choose_resource_to_release(&candidates);
            let held_in_cycle = self
                .resources
                .owner(choice)
                .is_some_and(|owner| cycle.contains(&owner));
            if !held_in_cycle {
                let rejected = SimulationError::InvalidResolution {
                    resource: choice,
                    tick: self.clock,
                };
                warn!("{rejected}; re-prompting resolver");
                continue;
            }

            if let Some((former, granted)) = self.resources.force_release(choice) {
                self.emit(Payload::ForcedRelease {
                    resource: choice,
                    former_owner: former,
                    new_owner: granted,
                });
                if let Some(waiter) = granted {
                    self.unblock(waiter);
                }
            }
            return;
        }
    }

    fn emit(&self, payload: Payload) {
        self.collector.record(Event::new(self.clock, payload));
    }

    fn all_terminated(&self) -> bool {
        self.processes.values().all(Process::is_terminated)
    }

    /// Final accounting, ascending by pid
    #[must_use]
    pub fn summary(&self) -> Summary {
        self.processes
            .values()
            .map(|process| Completion {
                pid: process.pid,
                name: process.name.clone(),
                completion_tick: process.completion_tick.unwrap_or(self.clock),
                turnaround: process.turnaround().unwrap_or(self.clock),
                burst_estimate: process.burst_estimate,
                aborted: process.aborted,
            })
            .collect()
    }

    #[inline]
    #[must_use]
    pub fn tick(&self) -> Tick {
        self.clock
    }

    #[must_use]
    pub fn policy(&self) -> Policy {
        self.scheduler.policy()
    }

    #[must_use]
    pub fn process(&self, pid: Pid) -> Option<&Process> {
        self.processes.get(&pid)
    }

    pub fn processes(&self) -> impl Iterator<Item = &Process> {
        self.processes.values()
    }

    #[must_use]
    pub fn resources(&self) -> &ResourceTable {
        &self.resources
    }

    #[must_use]
    pub fn collector(&self) -> &Arc<Collector> {
        &self.collector
    }

    /// Emission-order copy of the event log
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.collector.snapshot()
    }
}
