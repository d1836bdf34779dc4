use clap::Parser;
use driver::realtime::run_paced;
use driver::{Driver, Route};
use log::info;
use shared::config::LOCAL_ACTOR;
use shared::{
    InputKind, SimConfig, SyncedField, SyncedProperty, DT, HISTORY_DURATION, LATENCY,
    LATENCY_SWAY, RUBBERBAND_STRENGTH,
};
use tokio::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base one-way latency in milliseconds
    #[arg(short = 'l', long, default_value_t = LATENCY)]
    latency: u64,

    /// Jitter fraction around the base latency, in [0, 1]
    #[arg(long, default_value_t = LATENCY_SWAY)]
    sway: f64,

    /// Tick size in milliseconds
    #[arg(long, default_value_t = DT, value_parser = clap::value_parser!(u64).range(1..))]
    dt: u64,

    /// Retention window of histories and events in milliseconds
    #[arg(long, default_value_t = HISTORY_DURATION)]
    history: u64,

    /// Fraction of the client/server gap closed per snapshot, in (0, 1)
    #[arg(short = 's', long, default_value_t = RUBBERBAND_STRENGTH)]
    strength: f64,

    /// Simulated duration in milliseconds
    #[arg(short = 'd', long, default_value_t = 3000)]
    duration: u64,

    /// Seed for the latency jitter, random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Pace the simulation against the wall clock until done or Ctrl+C
    #[arg(short = 'r', long)]
    realtime: bool,

    /// Press MoveRight locally this many milliseconds after start
    #[arg(long)]
    press_at: Option<u64>,

    /// Release MoveRight locally this many milliseconds after start
    #[arg(long)]
    release_at: Option<u64>,

    /// Print a frame every n ticks
    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u64).range(1..))]
    frame_every: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    if !(0.0..=1.0).contains(&args.sway) {
        return Err(format!("sway must be within [0, 1], got {}", args.sway).into());
    }
    if !(args.strength > 0.0 && args.strength < 1.0) {
        return Err(format!("strength must be within (0, 1), got {}", args.strength).into());
    }

    let seed = args.seed.unwrap_or_else(rand::random);
    let config = SimConfig {
        history_duration: args.history,
        dt: args.dt,
        latency: args.latency,
        latency_sway: args.sway,
        synced: vec![SyncedProperty {
            actor: LOCAL_ACTOR,
            field: SyncedField::Position,
            strength: args.strength,
        }],
    };

    // Start one full window in so the seeded histories cover it
    let start = args.history;
    let until = start + args.duration;

    let mut driver = Driver::new(config, start, seed);
    driver.script_remote_actor();
    if let Some(at) = args.press_at {
        driver.schedule_input(start + at, LOCAL_ACTOR, InputKind::MoveRight, true, Route::Local);
    }
    if let Some(at) = args.release_at {
        driver.schedule_input(start + at, LOCAL_ACTOR, InputKind::MoveRight, false, Route::Local);
    }

    let every = args.dt * args.frame_every;
    if args.realtime {
        info!("Running in real time, press Ctrl+C to stop");
        let mut next_frame = start;
        run_paced(
            &mut driver,
            until,
            Duration::from_millis(args.dt),
            tokio::signal::ctrl_c(),
            |frame| {
                if frame.time >= next_frame {
                    println!("{}", frame);
                    next_frame = frame.time + every;
                }
            },
        )
        .await;
    } else {
        while driver.now() < until {
            let target = (driver.now() + every).min(until);
            driver.run_until(target);
            println!("{}", driver.frame());
        }
    }

    driver.shutdown();

    let stats = driver.stats();
    let replays = driver.server().stats();
    let corrections = driver.client().stats();
    info!(
        "Ticks: {} server, {} client; packets: {} snapshots, {} event batches, {} delivered, {} rejected",
        stats.server_ticks,
        stats.client_ticks,
        stats.snapshots_sent,
        stats.event_packets_sent,
        stats.packets_delivered,
        stats.rejected_packets
    );
    info!(
        "Server replays: {} ({} ticks recomputed, {} stale events, {} missing anchors)",
        replays.replays, replays.recomputed_ticks, replays.stale_events, replays.missing_anchors
    );
    for (actor, record) in driver.server().events().actors() {
        info!(
            "Actor {}: {} events received, latest stamped {}, last heard at {}",
            actor, record.received, record.latest_event, record.last_seen
        );
    }
    info!(
        "Client reconciliation: {} passes, {} corrections, total {:.4}",
        corrections.passes, corrections.corrected, corrections.total_correction
    );

    Ok(())
}
