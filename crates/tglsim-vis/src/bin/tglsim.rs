//! TGL Simulator CLI
//!
//! Runs flooding and TGL side by side on freshly built networks and reports
//! how many messages, rounds and simulated milliseconds each needed.
//!
//! # Example
//!
//! ```bash
//! # Reproducible run with 20% malicious nodes
//! tglsim --seed 42 -n 60 -k 6 --malicious 20
//!
//! # Load settings from a file, watch it play out in real time
//! tglsim --config settings.json --realtime --speed 4x
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;
use tglsim_engine::Settings;
use tglsim_metrics::{compare_runs, ComparisonMetrics, RunSummary};
use tglsim_vis::{PlaybackSpeed, Scheduler, SimEvent};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Flooding vs. three-stage TGL dissemination
///
/// Command-line values override those loaded with `--config`. Runs are
/// reproducible when the same seed is used.
#[derive(Parser, Debug)]
#[command(name = "tglsim")]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON settings file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Total nodes in each network (10-100)
    #[arg(short = 'n', long)]
    nodes: Option<usize>,

    /// Flooding ring degree
    #[arg(short = 'k', long)]
    degree: Option<usize>,

    /// Share of TGL nodes that are relays, in percent
    #[arg(long)]
    relay_percentage: Option<f64>,

    /// Relays each leaf pushes to
    #[arg(long)]
    push: Option<usize>,

    /// Relays each relay gossips to per stage
    #[arg(long)]
    gossip: Option<usize>,

    /// Leaves each relay pulls to per stage
    #[arg(long)]
    pull: Option<usize>,

    /// Simulated milliseconds between rounds (and between TGL stages)
    #[arg(long)]
    round_delay_ms: Option<u64>,

    /// Round cap for both protocols
    #[arg(long)]
    max_rounds: Option<u32>,

    /// Percentage of non-source nodes that drop every message
    #[arg(short = 'm', long)]
    malicious: Option<f64>,

    /// Share of flooding contacts aimed at uncovered neighbors
    #[arg(long)]
    useful_fraction: Option<f64>,

    /// Simulated milliseconds a message spends on an edge
    #[arg(long)]
    transfer_duration_ms: Option<f64>,

    /// Random seed for reproducible results. When omitted, a random seed is used.
    #[arg(long)]
    seed: Option<u64>,

    /// Playback speed: 0.25x, 0.5x, 1x, 2x, 4x, 10x or max
    #[arg(long, default_value = "max")]
    speed: PlaybackSpeed,

    /// Play in wall-clock time instead of as fast as possible
    #[arg(long)]
    realtime: bool,

    /// Frame length in milliseconds
    #[arg(long, default_value = "16")]
    frame_ms: u64,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Include the event timeline in the JSON report
    #[arg(long, requires = "json")]
    timeline: bool,
}

impl Args {
    fn settings(&self) -> Result<Settings, tglsim_engine::Error> {
        let mut settings = match &self.config {
            Some(path) => Settings::from_json_file(path)?,
            None => Settings::default(),
        };

        if let Some(v) = self.nodes {
            settings.set_node_count(v);
        }
        if let Some(v) = self.degree {
            settings.set_average_degree(v);
        }
        if let Some(v) = self.relay_percentage {
            settings.set_relay_percentage(v);
        }
        if let Some(v) = self.push {
            settings.set_push_budget(v);
        }
        if let Some(v) = self.gossip {
            settings.set_gossip_budget(v);
        }
        if let Some(v) = self.pull {
            settings.set_pull_budget(v);
        }
        if let Some(v) = self.round_delay_ms {
            settings.set_round_delay_ms(v);
        }
        if let Some(v) = self.max_rounds {
            settings.set_max_rounds(v);
        }
        if let Some(v) = self.malicious {
            settings.set_malicious_percentage(v);
        }
        if let Some(v) = self.useful_fraction {
            settings.set_useful_fraction(v);
        }
        if let Some(v) = self.transfer_duration_ms {
            settings.set_transfer_duration_ms(v);
        }
        if self.seed.is_some() {
            settings.set_seed(self.seed);
        }
        Ok(settings)
    }
}

#[derive(Serialize)]
struct Report<'a> {
    seed: u64,
    frames: u64,
    settings: &'a Settings,
    flooding: RunSummary,
    hierarchical: RunSummary,
    comparison: Option<ComparisonMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeline: Option<&'a [SimEvent]>,
}

fn print_summary(label: &str, summary: &RunSummary) {
    println!("{label}:");
    println!("  Messages: {}", summary.messages);
    println!("  Rounds:   {}", summary.rounds);
    println!("  Time:     {:.0} ms", summary.elapsed_ms);
    println!("  Coverage: {:.1}%", summary.coverage);
    if let Some(reason) = summary.termination {
        println!("  Outcome:  {reason:?}");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,tglsim=info")),
        )
        .init();

    let args = Args::parse();
    let settings = args.settings()?;

    let mut scheduler = Scheduler::new(settings)?;
    scheduler.set_speed(args.speed);

    info!(
        seed = scheduler.seed(),
        nodes = scheduler.settings().node_count(),
        speed = %args.speed,
        realtime = args.realtime,
        "starting simulation"
    );

    let frames = if args.realtime {
        scheduler
            .run_realtime(Duration::from_millis(args.frame_ms.max(1)))
            .await?
    } else {
        scheduler.run_headless(args.frame_ms as f64)?
    };

    let flooding = RunSummary::from_state(scheduler.flooding());
    let hierarchical = RunSummary::from_state(scheduler.hierarchical());
    let comparison = compare_runs(scheduler.flooding(), scheduler.hierarchical());

    if args.json {
        let report = Report {
            seed: scheduler.seed(),
            frames,
            settings: scheduler.settings(),
            flooding,
            hierarchical,
            comparison,
            timeline: args.timeline.then(|| scheduler.events()),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("TGL Simulator");
    println!("=============");
    println!("Seed: {}", scheduler.seed());
    println!();
    print_summary("Flooding (P2P)", &flooding);
    println!();
    print_summary("Hierarchical (TGL)", &hierarchical);
    println!();

    match comparison {
        Some(m) => {
            println!("Comparison:");
            println!("  Message reduction:      {:.1}%", m.message_reduction);
            println!("  Round difference:       {}", m.round_difference);
            println!("  Time difference:        {:.0} ms", m.time_difference);
            println!("  Efficiency improvement: {:.1}%", m.efficiency_improvement);
        }
        None => println!("Comparison: undefined (a protocol sent no messages)"),
    }

    Ok(())
}
