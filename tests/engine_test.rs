/*!
 * Integration Tests for the Simulation Engine
 * Full runs: determinism, fairness, and deadlock resolution end to end
 */

use pretty_assertions::assert_eq;
use pseudos::{
    Engine, Event, FirstCandidate, Instruction, Payload, Policy, Program, Scripted,
};
use Instruction::{End, Request, Wait};

fn program(name: &str, instructions: Vec<Instruction>) -> Program {
    Program {
        name: name.into(),
        instructions,
    }
}

/// P1 and P2 each grab one resource, then ask for the other's
fn deadlock_pair() -> Vec<Program> {
    vec![
        program("P1", vec![Request(1), Wait(2), Request(2), End]),
        program("P2", vec![Request(2), Wait(1), Request(1), End]),
    ]
}

#[test]
fn fcfs_classic_deadlock_resolves_through_forced_release() {
    let mut engine = Engine::new(deadlock_pair(), Policy::Fcfs);
    let summary = engine.run(&mut Scripted::new([1])).unwrap();

    let expected = vec![
        Event::new(0, Payload::ResourceGranted { pid: 1, resource: 1 }),
        Event::new(2, Payload::ResourceGranted { pid: 2, resource: 2 }),
        Event::new(5, Payload::ResourceBlocked { pid: 2, resource: 1 }),
        Event::new(5, Payload::ResourceBlocked { pid: 1, resource: 2 }),
        Event::new(5, Payload::DeadlockDetected { involved: vec![1, 2] }),
        Event::new(
            5,
            Payload::ForcedRelease {
                resource: 1,
                former_owner: 1,
                new_owner: Some(2),
            },
        ),
        Event::new(6, Payload::ProcessTerminated { pid: 2, turnaround: 6 }),
        Event::new(6, Payload::ResourceGranted { pid: 1, resource: 2 }),
        Event::new(7, Payload::ProcessTerminated { pid: 1, turnaround: 7 }),
    ];
    assert_eq!(engine.events(), expected);

    // Releasing R1 hands it to P2, the sole waiter; P2's exit frees R2 for P1
    assert_eq!(summary[0].turnaround, 7);
    assert_eq!(summary[1].turnaround, 6);
    assert!(engine.resources().owned().next().is_none());
}

#[test]
fn fcfs_reruns_are_bit_identical() {
    let run = || {
        let mut engine = Engine::new(deadlock_pair(), Policy::Fcfs);
        let summary = engine.run(&mut Scripted::new([1])).unwrap();
        (engine.events(), summary)
    };
    assert_eq!(run(), run());
}

#[test]
fn round_robin_classic_deadlock_resolves_too() {
    let mut engine = Engine::new(deadlock_pair(), Policy::RoundRobin).with_quantum(2);
    let summary = engine.run(&mut Scripted::new([1])).unwrap();

    assert!(engine
        .events()
        .iter()
        .any(|e| e.payload == Payload::DeadlockDetected { involved: vec![1, 2] }));
    assert!(summary.iter().all(|c| !c.aborted));
    assert!(engine.resources().owned().next().is_none());
}

#[test]
fn round_robin_quantum_one_alternates_and_finishes_at_tick_six() {
    let compute = || vec![Wait(1), Wait(1), Wait(1), End];
    let mut engine = Engine::new(
        vec![program("P1", compute()), program("P2", compute())],
        Policy::RoundRobin,
    )
    .with_quantum(1);
    let mut resolver = FirstCandidate;

    // Strict alternation, one wait tick per turn
    let expected = [(1, 2), (2, 2), (1, 1), (2, 1), (1, 0), (2, 0)];
    for (step, (pid, burst)) in expected.into_iter().enumerate() {
        assert!(engine.step(&mut resolver).unwrap());
        assert_eq!(engine.process(pid).unwrap().remaining_burst(), burst);
        assert_eq!(engine.tick(), step as u64 + 1); // every turn is one wait tick
    }

    // Two `End` dispatches consume no time
    assert!(engine.step(&mut resolver).unwrap());
    assert!(engine.step(&mut resolver).unwrap());
    assert!(!engine.step(&mut resolver).unwrap());

    assert_eq!(engine.tick(), 6);
    for pid in [1, 2] {
        let process = engine.process(pid).unwrap();
        assert_eq!(process.completion_tick, Some(6));
        assert_eq!(process.turnaround(), Some(6));
    }
}

#[test]
fn sjf_runs_shortest_job_first() {
    let mut engine = Engine::new(
        vec![
            program("long", vec![Wait(5), End]),
            program("short", vec![Wait(1), End]),
        ],
        Policy::Sjf,
    );
    let summary = engine.run(&mut FirstCandidate).unwrap();

    // short (pid 2) finishes its single tick before long gets the CPU
    assert_eq!(summary[1].completion_tick, 1);
    assert_eq!(summary[0].completion_tick, 6);
}

#[test]
fn invalid_resolution_is_rejected_and_reprompted() {
    let mut engine = Engine::new(deadlock_pair(), Policy::Fcfs);
    // R7 is owned by nobody: rejected, then R2 (owned by cycle member P2)
    let summary = engine.run(&mut Scripted::new([7, 2])).unwrap();

    let events = engine.events();
    let forced: Vec<&Event> = events
        .iter()
        .filter(|e| matches!(e.payload, Payload::ForcedRelease { .. }))
        .collect();
    assert_eq!(forced.len(), 1);
    assert_eq!(
        forced[0].payload,
        Payload::ForcedRelease {
            resource: 2,
            former_owner: 2,
            new_owner: Some(1),
        }
    );
    assert!(summary.iter().all(|c| !c.aborted));
}

#[test]
fn three_way_circular_wait_is_detected() {
    let programs = vec![
        program("P1", vec![Request(1), Wait(3), Request(2), End]),
        program("P2", vec![Request(2), Wait(3), Request(3), End]),
        program("P3", vec![Request(3), Wait(3), Request(1), End]),
    ];
    let mut engine = Engine::new(programs, Policy::RoundRobin).with_quantum(1);
    let summary = engine.run(&mut FirstCandidate).unwrap();

    assert!(engine
        .events()
        .iter()
        .any(|e| e.payload == Payload::DeadlockDetected { involved: vec![1, 2, 3] }));
    assert!(summary.iter().all(|c| !c.aborted));
    assert!(engine.resources().owned().next().is_none());
}
