//! Shuttle Respawn
//!
//! Periodic respawn of dead participants aboard a shuttle that is flown into
//! the level, held there for a while, and recalled.
//!
//! ## Architecture
//!
//! ```text
//! RespawnAgent  (agent.rs)
//!   └── RespawnAuthority  (coordinator.rs)  ← Waiting / Transporting / Returning
//!         ├── SessionHost        (session.rs)     ← roster, jobs, notices
//!         ├── SpawnAssignment    (spawn.rs)       ← slot selection
//!         ├── VehicleController  (vehicle.rs)     ← steering, doors, docking, wiring
//!         ├── sanitize           (sanitizer.rs)   ← shuttle reset
//!         ├── TaskScheduler      (convergence.rs) ← forced positioning
//!         └── World              (world.rs)       ← data layer
//!               ├── VehicleTemplate (template.rs)
//!               └── PrefabCatalog   (prefab.rs)
//! ```
//!
//! Non-hosting participants run a [`RespawnObserver`] fed with the
//! replicated [`RespawnStatus`](protocol::RespawnStatus).

// Protocol and config types are always available (no server feature needed).
pub mod config;
pub mod error;
pub mod manager;
pub mod protocol;
pub mod types;

// Server-side modules require the `server` feature.
#[cfg(feature = "server")]
pub mod agent;
#[cfg(feature = "server")]
pub mod convergence;
#[cfg(feature = "server")]
pub mod coordinator;
#[cfg(feature = "server")]
pub mod entity;
#[cfg(feature = "server")]
pub mod prefab;
#[cfg(feature = "server")]
pub mod sanitizer;
#[cfg(feature = "server")]
pub mod session;
#[cfg(feature = "server")]
pub mod spawn;
#[cfg(feature = "server")]
pub mod template;
#[cfg(feature = "server")]
pub mod vehicle;
#[cfg(feature = "server")]
pub mod world;

// Convenience re-exports (server only)
#[cfg(feature = "server")]
pub use agent::{AgentConfig, EventSink, RespawnAgent};
#[cfg(feature = "server")]
pub use coordinator::RespawnAuthority;
#[cfg(feature = "server")]
pub use session::{LocalSession, SessionHost};
#[cfg(feature = "server")]
pub use world::{Level, World};
pub use config::{RespawnConfig, RespawnSettings, TransportLimit};
pub use error::{RespawnError, Result};
pub use manager::{RespawnManager, RespawnObserver};
pub use types::{EntityId, ParticipantId, RespawnState, RespawnStats, Vec2};
