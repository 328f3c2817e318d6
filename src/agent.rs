//! RespawnAgent – drives a [`RespawnAuthority`] at a fixed tick rate and
//! publishes what happened.
//!
//! ## Event contract (outbound)
//!
//! | Subject              | Payload type                            | When                     |
//! |----------------------|-----------------------------------------|--------------------------|
//! | `respawn.status`     | `RespawnEvent<RespawnStatus>`           | state or countdown change |
//! | `respawn.dispatched` | `RespawnEvent<ShuttleDispatched>`       | every dispatch           |
//! | `respawn.notice`     | `RespawnEvent<ServerNotice>`            | every server notice      |
//!
//! Timers are not republished every tick; observers count down locally
//! between status events.

use crate::coordinator::RespawnAuthority;
use crate::manager::RespawnManager;
use crate::protocol::{subjects, RespawnEvent, RespawnStatus};
use crate::session::LocalSession;
use crate::types::RespawnStats;
use anyhow::{Context, Result};
use bytes::Bytes;
use log::{info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Where serialized events go (a message bus, a socket, a log…).
pub trait EventSink: Send + Sync {
    fn publish(&self, subject: &str, payload: Bytes) -> Result<()>;
}

/// Writes every event to the log at `info` level.
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn publish(&self, subject: &str, payload: Bytes) -> Result<()> {
        let text = std::str::from_utf8(&payload).context("event payload is not UTF-8")?;
        info!("{} {}", subject, text);
        Ok(())
    }
}

/// Keeps every published event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<(String, Bytes)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Published events as `(subject, payload)` pairs, oldest first.
    pub fn events(&self) -> Vec<(String, Bytes)> {
        self.events.lock().clone()
    }

    pub fn subjects(&self) -> Vec<String> {
        self.events.lock().iter().map(|(s, _)| s.clone()).collect()
    }
}

impl EventSink for MemorySink {
    fn publish(&self, subject: &str, payload: Bytes) -> Result<()> {
        self.events.lock().push((subject.to_string(), payload));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Session name stamped on every event.
    pub session: String,
    /// Tick rate in Hz.
    pub tick_rate_hz: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            session: "default".into(),
            tick_rate_hz: 30.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

pub struct RespawnAgent {
    config: AgentConfig,
    authority: Arc<Mutex<RespawnAuthority<LocalSession>>>,
    sink: Arc<dyn EventSink>,
    frame: u64,
    last_status: Option<RespawnStatus>,
}

impl RespawnAgent {
    pub fn new(
        config: AgentConfig,
        authority: Arc<Mutex<RespawnAuthority<LocalSession>>>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            config,
            authority,
            sink,
            frame: 0,
            last_status: None,
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn stats(&self) -> RespawnStats {
        self.authority.lock().stats().clone()
    }

    fn delta_time(&self) -> f32 {
        1.0 / self.config.tick_rate_hz
    }

    /// Run one simulation step: physics, then respawn logic, then publish.
    pub fn tick(&mut self) {
        self.frame += 1;
        let dt = self.delta_time();
        let span = tracing::debug_span!("respawn_tick", frame = self.frame);
        let _enter = span.enter();

        let (status, notices, dispatches) = {
            let mut authority = self.authority.lock();
            {
                let mut world = authority.world().write();
                world.step_physics(dt);
                world.flush_removals();
            }
            authority.update(dt);
            let status = authority.status();
            let host = authority.host_mut();
            (status, host.drain_notices(), host.drain_dispatches())
        };

        let changed = self.last_status.map_or(true, |last| {
            last.state != status.state || last.countdown_started != status.countdown_started
        });
        if changed {
            self.publish(subjects::STATUS, status);
        }
        self.last_status = Some(status);

        for dispatched in dispatches {
            self.publish(subjects::DISPATCHED, dispatched);
        }
        for notice in notices {
            self.publish(subjects::NOTICE, notice);
        }
    }

    /// Tick at the configured rate `ticks` times.
    pub async fn run_for(&mut self, ticks: u64) {
        let period = std::time::Duration::from_secs_f32(self.delta_time());
        let mut timer = tokio::time::interval(period);
        for _ in 0..ticks {
            timer.tick().await;
            self.tick();
        }
    }

    /// Tick at the configured rate until Ctrl-C.
    pub async fn run(mut self) -> Result<()> {
        info!(
            "RespawnAgent active in session '{}' – ticking at {:.0}Hz",
            self.config.session, self.config.tick_rate_hz
        );

        let period = std::time::Duration::from_secs_f32(self.delta_time());
        let mut timer = tokio::time::interval(period);
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = timer.tick() => self.tick(),
                result = &mut shutdown => {
                    result.context("failed to listen for Ctrl-C")?;
                    info!("RespawnAgent shutting down (SIGINT)");
                    break;
                }
            }
        }

        let stats = self.stats();
        info!(
            "{} dispatch(es), {} character(s) revived, {} return(s) over {} tick(s)",
            stats.dispatches, stats.characters_spawned, stats.returns, stats.total_ticks
        );
        Ok(())
    }

    /// Serialise `payload` and publish it on `subject`.
    ///
    /// Errors are logged and swallowed.
    fn publish<T: Serialize>(&self, subject: &str, payload: T) {
        let event = RespawnEvent::new(self.config.session.as_str(), self.frame, payload);
        match serde_json::to_vec(&event) {
            Ok(bytes) => {
                if let Err(e) = self.sink.publish(subject, Bytes::from(bytes)) {
                    warn!("Failed to publish to {}: {}", subject, e);
                }
            }
            Err(e) => warn!("Failed to serialise event for {}: {}", subject, e),
        }
    }
}
