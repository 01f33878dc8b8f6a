/*!
 * Invariant Tests
 * Property-based checks over randomized scripts: ownership and
 * state-partition invariants hold at every step, and every run terminates
 */

use proptest::prelude::*;
use pseudos::{Engine, FirstCandidate, Instruction, Policy, Program, ProcessState};

const RESOURCE_POOL: u32 = 4;
const STEP_LIMIT: usize = 10_000;

fn instruction() -> impl Strategy<Value = Instruction> {
    prop_oneof![
        (0..RESOURCE_POOL).prop_map(Instruction::Request),
        (1u64..4).prop_map(Instruction::Wait),
    ]
}

fn programs() -> impl Strategy<Value = Vec<Program>> {
    prop::collection::vec(prop::collection::vec(instruction(), 0..6), 1..5).prop_map(|scripts| {
        scripts
            .into_iter()
            .enumerate()
            .map(|(index, mut instructions)| {
                instructions.push(Instruction::End);
                Program {
                    name: format!("P{}", index + 1),
                    instructions,
                }
            })
            .collect()
    })
}

fn policies() -> impl Strategy<Value = Policy> {
    prop_oneof![
        Just(Policy::Fcfs),
        Just(Policy::Sjf),
        Just(Policy::RoundRobin),
    ]
}

fn check_invariants(engine: &Engine, total: usize) -> Result<(), TestCaseError> {
    // State partition: the four live states plus Terminated cover everyone
    let mut counts = [0usize; 5];
    for process in engine.processes() {
        let slot = match process.state {
            ProcessState::New => 0,
            ProcessState::Ready => 1,
            ProcessState::Running => 2,
            ProcessState::Blocked => 3,
            ProcessState::Terminated => 4,
        };
        counts[slot] += 1;
    }
    prop_assert_eq!(counts.iter().sum::<usize>(), total);

    for process in engine.processes() {
        let queued = engine.resources().queued_on(process.pid);
        if process.is_blocked() {
            // A blocked process waits on exactly one queue, and on the
            // resource it says it is blocked on
            prop_assert_eq!(queued.len(), 1);
            prop_assert_eq!(Some(queued[0]), process.blocked_on);
        } else {
            prop_assert!(queued.is_empty());
        }
    }

    // An unowned resource never has waiters
    for resource in 0..RESOURCE_POOL {
        if engine.resources().owner(resource).is_none() {
            prop_assert_eq!(engine.resources().waiter_count(resource), 0);
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn randomized_runs_preserve_invariants(
        programs in programs(),
        policy in policies(),
        quantum in 1u64..4,
    ) {
        let total = programs.len();
        let mut engine = Engine::new(programs, policy)
            .with_quantum(quantum)
            .with_resources(RESOURCE_POOL);
        let mut resolver = FirstCandidate;

        let mut steps = 0usize;
        loop {
            let more = engine.step(&mut resolver).unwrap();
            check_invariants(&engine, total)?;
            if !more {
                break;
            }
            steps += 1;
            prop_assert!(steps < STEP_LIMIT, "simulation did not terminate");
        }

        // Every process ran to completion and every resource came back
        for process in engine.processes() {
            prop_assert!(process.is_terminated());
            prop_assert!(process.turnaround().is_some());
        }
        prop_assert_eq!(engine.resources().owned().count(), 0);
    }

    #[test]
    fn identical_runs_produce_identical_event_streams(
        programs in programs(),
        policy in policies(),
    ) {
        let run = |programs: Vec<Program>| {
            let mut engine = Engine::new(programs, policy).with_resources(RESOURCE_POOL);
            let summary = engine.run(&mut FirstCandidate).unwrap();
            (engine.events(), summary)
        };
        prop_assert_eq!(run(programs.clone()), run(programs));
    }
}
