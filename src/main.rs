/*!
 * Pseudo-OS Simulator - Interactive Front End
 *
 * Loads a program file, asks the operator for a scheduling discipline, runs
 * the simulation, and renders the event log and completion tables. Deadlock
 * resolution prompts go through stdin, mirroring the engine's resolver
 * abstraction.
 */

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use miette::{miette, IntoDiagnostic, Result};
use pseudos::{
    init_tracing, load_programs, Collector, Engine, Payload, Policy, Resolver, ResourceId,
};
use tracing::info;

/// Interactive resolver: prompts until the operator names a candidate
struct StdinResolver;

impl Resolver for StdinResolver {
    fn choose_resource_to_release(&mut self, candidates: &[ResourceId]) -> ResourceId {
        let rendered: Vec<String> = candidates.iter().map(|r| format!("R{r}")).collect();
        loop {
            println!("Resources involved in the deadlock: {}", rendered.join(", "));
            print!("Enter the resource ID to force-release: ");
            let _ = io::stdout().flush();

            let mut line = String::new();
            if io::stdin().lock().read_line(&mut line).is_err() || line.is_empty() {
                // stdin closed: fall back to the first candidate so a piped
                // run can still finish
                return candidates.first().copied().unwrap_or_default();
            }
            match line.trim().trim_start_matches(['r', 'R']).parse() {
                Ok(resource) => return resource,
                Err(_) => println!("Invalid input, enter a number (e.g. 1 for R1)."),
            }
        }
    }
}

fn prompt(text: &str) -> Result<String> {
    print!("{text}");
    io::stdout().flush().into_diagnostic()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .into_diagnostic()?;
    Ok(line.trim().to_string())
}

fn choose_policy() -> Result<(Policy, u64)> {
    println!("Choose scheduling algorithm:");
    println!("1. First-Come-First-Serve (FCFS)");
    println!("2. Shortest Job First (SJF)");
    println!("3. Round Robin (RR)");
    let choice = prompt("Enter choice (1/2/3): ")?;

    match choice.as_str() {
        "2" => Ok((Policy::Sjf, 0)),
        "3" => {
            let quantum = prompt("Enter time quantum in ticks (default=2): ")?
                .parse()
                .unwrap_or(2);
            Ok((Policy::RoundRobin, quantum))
        }
        "1" => Ok((Policy::Fcfs, 0)),
        _ => {
            println!("Invalid choice, defaulting to FCFS");
            Ok((Policy::Fcfs, 0))
        }
    }
}

fn main() -> Result<()> {
    init_tracing();

    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| miette!("usage: pseudos <program-file>"))?;
    let programs = load_programs(&path)?;
    if programs.is_empty() {
        return Err(miette!("no programs defined in {path}"));
    }
    info!(programs = programs.len(), %path, "programs loaded");

    let (policy, quantum) = choose_policy()?;
    let collector = Arc::new(Collector::new());
    let mut engine = Engine::new(programs, policy).with_collector(Arc::clone(&collector));
    if quantum > 0 {
        engine = engine.with_quantum(quantum);
    }

    let summary = engine.run(&mut StdinResolver)?;

    println!("\nSimulation complete at tick {}.", engine.tick());

    println!("\nAction log:");
    println!("{:>5}  {:<5} {:<26} {}", "tick", "who", "action", "detail");
    for event in collector.snapshot() {
        println!("{event}");
    }

    println!("\nProcess completion table:");
    println!(
        "{:<10}{:>12}{:>12}{:>12}  {}",
        "process", "finish", "turnaround", "burst est.", "status"
    );
    for row in &summary {
        println!(
            "{:<10}{:>12}{:>12}{:>12}  {}",
            row.name,
            row.completion_tick,
            row.turnaround,
            row.burst_estimate,
            if row.aborted { "aborted" } else { "completed" }
        );
    }

    println!("\nFinal resource allocation:");
    for resource in 0..engine.resources().resource_count() {
        match engine.resources().owner(resource) {
            Some(pid) => println!("  R{resource}: P{pid}"),
            None => println!("  R{resource}: free"),
        }
    }

    let forced: Vec<_> = collector
        .snapshot()
        .into_iter()
        .filter(|e| matches!(e.payload, Payload::ForcedRelease { .. }))
        .collect();
    if !forced.is_empty() {
        println!("\nForce-released resources:");
        for event in forced {
            if let Payload::ForcedRelease {
                resource,
                former_owner,
                ..
            } = event.payload
            {
                println!("  R{resource} was taken from P{former_owner} at tick {}", event.tick);
            }
        }
    }

    if std::env::var("PSEUDOS_LOG_JSON").map(|v| v == "1" || v == "true") == Ok(true) {
        let json = serde_json::to_string_pretty(&collector.snapshot()).into_diagnostic()?;
        println!("\n{json}");
    }

    Ok(())
}
