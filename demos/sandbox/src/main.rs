use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use engine_app::{EngineConfig, TickLoop};
use sandbox::{BalanceBook, Sandbox, scene};
use tracing::info;

#[derive(Parser)]
#[command(name = "sandbox", about = "Event-bus engine demo world")]
struct Args {
    /// Path to a JSON engine config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop after this many ticks (0 runs until the autopilot is done)
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Target frames per second (0 runs uncapped)
    #[arg(long)]
    tick_rate: Option<f64>,

    /// Log a world summary every this many frames (0 disables it)
    #[arg(long, default_value_t = 60)]
    report_every: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(ticks) = args.ticks {
        config.tick.max_ticks = ticks;
    }
    if let Some(rate) = args.tick_rate {
        config.tick.tick_rate = rate;
    }
    config.validate()?;
    info!(?config, "starting sandbox");

    let mut tick_loop = TickLoop::new(config).context("failed to create tick loop")?;
    let book = BalanceBook::default();
    let scene = scene::populate(&tick_loop.commands(), &book);
    let sandbox = Sandbox::attach(&mut tick_loop, book.clone(), scene.itinerary(), args.report_every)?;
    for system in tick_loop.registry().iter() {
        info!(
            system = system.name,
            index = system.index,
            instance_id = %system.instance_id,
            "system ready"
        );
    }

    let run = tick_loop.run_flag().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            run.stop();
        }
    });

    tick_loop.run().await;
    let finished = sandbox.join().await?;

    info!(
        ticks = tick_loop.tick_id(),
        frames = finished.report.frames(),
        visited = finished.autopilot.visited(),
        balance = ?book.balance(scene.player),
        "sandbox finished"
    );
    Ok(())
}
