//! respawn-server binary
//!
//! Runs the respawn authority against an in-process world with a demo level,
//! an outpost base and a roster of participants, and logs every event.
//!
//! ## Configuration (env / TOML via `config` crate)
//!
//! | Key                                   | Default   | Description                         |
//! |---------------------------------------|-----------|-------------------------------------|
//! | `RESPAWN_SESSION`                     | `default` | Session name stamped on events      |
//! | `RESPAWN_TICK_RATE_HZ`                | `30`      | Simulation tick rate                |
//! | `RESPAWN_RESPAWN__RESPAWN_INTERVAL`   | `180`     | Seconds between dispatches          |
//! | `RESPAWN_RESPAWN__MAX_TRANSPORT_TIME` | `180`     | Transport budget, `0` = unlimited   |
//! | `RESPAWN_RESPAWN__MIN_RESPAWN_RATIO`  | `0.2`     | Eligible fraction to start countdown |
//!
//! The loadout can only be changed from the TOML file (`[[respawn.loadout]]`).

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::{Mutex, RwLock};
use shuttle_respawn::{
    agent::{AgentConfig, LogSink, RespawnAgent},
    config::{self, RespawnSettings},
    coordinator::RespawnAuthority,
    prefab::PrefabCatalog,
    session::{LocalSession, Participant},
    template::VehicleTemplate,
    types::{ParticipantId, Vec2},
    world::{Level, World},
};
use std::path::PathBuf;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "respawn-server", about = "Respawn shuttle coordinator", version)]
struct Args {
    /// TOML settings file
    #[arg(long, env = "RESPAWN_CONFIG")]
    config: Option<PathBuf>,

    /// Session name (overrides settings)
    #[arg(long)]
    session: Option<String>,

    /// Tick rate in Hz (overrides settings)
    #[arg(long)]
    tick_rate_hz: Option<f32>,

    /// Number of demo participants in the roster
    #[arg(long, env = "RESPAWN_PARTICIPANTS", default_value_t = 4)]
    participants: u64,

    /// Stop after this many ticks instead of waiting for Ctrl-C
    #[arg(long)]
    ticks: Option<u64>,

    /// JSON vehicle template for the shuttle (defaults to the stock shuttle)
    #[arg(long, env = "RESPAWN_SHUTTLE")]
    shuttle: Option<PathBuf>,
}

fn load_settings(args: &Args) -> Result<RespawnSettings> {
    let mut settings = RespawnSettings::load(args.config.as_deref(), config::environment())
        .context("failed to load settings")?;

    if let Some(session) = &args.session {
        settings.session = session.clone();
    }
    if let Some(rate) = args.tick_rate_hz {
        settings.tick_rate_hz = rate;
    }
    settings.validate()?;
    Ok(settings)
}

fn load_shuttle(path: Option<&PathBuf>) -> Result<VehicleTemplate> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("invalid vehicle template {}", path.display()))
        }
        None => Ok(VehicleTemplate::respawn_shuttle()),
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("shuttle_respawn=debug".parse()?),
        )
        .init();

    let args = Args::parse();
    let settings = load_settings(&args)?;
    let shuttle_template = load_shuttle(args.shuttle.as_ref())?;

    log::info!(
        "Starting respawn-server (session='{}', interval={}s, transport={}s, ratio={})",
        settings.session,
        settings.respawn.respawn_interval,
        settings.respawn.max_transport_time,
        settings.respawn.min_respawn_ratio,
    );

    // Demo level with the outpost sitting at the bottom of the shaft
    let mut world = World::new(Level::new(
        Vec2::new(0.0, 1000.0),
        Vec2::new(8000.0, 2000.0),
        400.0,
    ));
    let base = world.instantiate(&VehicleTemplate::outpost(), Vec2::new(0.0, -200.0))?;
    let world = Arc::new(RwLock::new(world));

    let mut session = LocalSession::new().with_job_pool(&[
        "captain",
        "engineer",
        "mechanic",
        "medicaldoctor",
        "securityofficer",
    ]);
    for i in 0..args.participants {
        session.add_participant(Participant::new(ParticipantId(i), format!("diver{i}")));
    }

    let authority = RespawnAuthority::new(
        settings.respawn.clone(),
        world,
        Arc::new(PrefabCatalog::with_defaults()),
        session,
        &shuttle_template,
        Some(base),
    )?;

    let agent_config = AgentConfig {
        session: settings.session,
        tick_rate_hz: settings.tick_rate_hz,
    };
    let mut agent = RespawnAgent::new(
        agent_config,
        Arc::new(Mutex::new(authority)),
        Arc::new(LogSink),
    );

    match args.ticks {
        Some(ticks) => {
            agent.run_for(ticks).await;
            let stats = agent.stats();
            log::info!(
                "Stopped after {} tick(s): {} dispatch(es), {} return(s)",
                ticks,
                stats.dispatches,
                stats.returns
            );
            Ok(())
        }
        None => agent.run().await,
    }
}
