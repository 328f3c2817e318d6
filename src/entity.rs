//! Entities held in the world registries: characters, items and their
//! components, wall sections, gaps, hulls and waypoints.
//!
//! Every entity records the vehicle it belongs to (`vehicle`), which is how
//! "everything aboard the shuttle" is computed on demand.

use crate::types::{EntityId, Vec2};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Characters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CauseOfDeath {
    Damage,
    Suffocation,
    Drowning,
    Disconnected,
}

/// Persistent description of a participant's character, used to create a
/// fresh [`Character`] on every revival.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CharacterInfo {
    pub name: String,
    /// Assigned by the host before spawning; used to pick matching slots.
    pub job: Option<String>,
}

impl CharacterInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            job: None,
        }
    }

    pub fn with_job(mut self, job: impl Into<String>) -> Self {
        self.job = Some(job.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct Character {
    pub id: EntityId,
    pub info: CharacterInfo,
    pub vehicle: Option<EntityId>,
    pub position: Vec2,
    pub enabled: bool,
    /// Controlled by a remote participant rather than the host.
    pub is_remote: bool,
    pub is_dead: bool,
    pub cause_of_death: Option<CauseOfDeath>,
    /// Access tags granted on spawn (identification card).
    pub tags: Vec<String>,
}

impl Character {
    /// Returns `false` if the character was already dead.
    ///
    /// A silent kill skips the death notification the host would otherwise
    /// show.
    pub fn kill(&mut self, cause: CauseOfDeath, silent: bool) -> bool {
        if self.is_dead {
            return false;
        }
        self.is_dead = true;
        self.cause_of_death = Some(cause);
        if !silent {
            log::info!("{} ({}) died: {:?}", self.info.name, self.id, cause);
        }
        true
    }

    pub fn grant_tags(&mut self, tags: &[String]) {
        for tag in tags {
            if !self.tags.contains(tag) {
                self.tags.push(tag.clone());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Item components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PowerContainer {
    pub charge: f32,
    pub capacity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SteeringPath {
    pub finished: bool,
}

/// Navigation actuator of a vehicle.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Steering {
    pub autopilot: bool,
    pub maintain_position: bool,
    pub target_position: Option<Vec2>,
    pub target_velocity: Vec2,
    /// Path being followed by the autopilot, if any.
    pub path: Option<SteeringPath>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Door {
    pub open: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DockingPort {
    pub docked_to: Option<EntityId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Wire {
    pub locked: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConnectionPanel {
    pub wires: Vec<Wire>,
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Item {
    pub id: EntityId,
    /// Identifier of the prefab this item was created from.
    pub prefab: String,
    pub vehicle: Option<EntityId>,
    pub position: Vec2,
    /// 0–100.
    pub condition: f32,
    /// Whether the item currently has an active physics body, i.e. lies
    /// loose in the world.
    pub body_enabled: bool,
    /// Item or character whose inventory holds this item.
    pub parent_inventory: Option<EntityId>,
    pub contained: Vec<EntityId>,
    pub power: Option<PowerContainer>,
    pub steering: Option<Steering>,
    pub door: Option<Door>,
    pub docking_port: Option<DockingPort>,
    pub connection_panel: Option<ConnectionPanel>,
}

impl Item {
    pub fn new(id: EntityId, prefab: impl Into<String>, position: Vec2) -> Self {
        Self {
            id,
            prefab: prefab.into(),
            vehicle: None,
            position,
            condition: 100.0,
            body_enabled: true,
            parent_inventory: None,
            contained: Vec::new(),
            power: None,
            steering: None,
            door: None,
            docking_port: None,
            connection_panel: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

/// A wall split into independently damageable sections.
#[derive(Debug, Clone)]
pub struct Wall {
    pub id: EntityId,
    pub vehicle: Option<EntityId>,
    pub max_health: f32,
    /// Accumulated damage per section, within `[0, max_health]`.
    pub section_damage: Vec<f32>,
}

impl Wall {
    pub fn section_count(&self) -> usize {
        self.section_damage.len()
    }

    /// Negative amounts repair. Out-of-range sections are ignored.
    pub fn add_damage(&mut self, section: usize, amount: f32) {
        let max = self.max_health;
        if let Some(damage) = self.section_damage.get_mut(section) {
            *damage = (*damage + amount).clamp(0.0, max);
        }
    }

    pub fn is_intact(&self) -> bool {
        self.section_damage.iter().all(|d| *d <= 0.0)
    }
}

/// An opening between compartments or to the outside. Gaps attached to a
/// wall are breaches.
#[derive(Debug, Clone)]
pub struct Gap {
    pub id: EntityId,
    pub vehicle: Option<EntityId>,
    pub connected_wall: Option<EntityId>,
}

/// A compartment with its own atmosphere and flooding.
#[derive(Debug, Clone)]
pub struct Hull {
    pub id: EntityId,
    pub vehicle: Option<EntityId>,
    pub oxygen_percentage: f32,
    pub water_volume: f32,
}

// ---------------------------------------------------------------------------
// Waypoints
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpawnType {
    Path,
    Human,
    Cargo,
    Enemy,
}

/// A designated location on a vehicle, positioned relative to the vehicle's
/// origin so it follows the vehicle around.
#[derive(Debug, Clone)]
pub struct WayPoint {
    pub id: EntityId,
    pub vehicle: Option<EntityId>,
    pub offset: Vec2,
    pub spawn_type: SpawnType,
    /// Restricts a human spawn point to one job.
    pub job: Option<String>,
    pub id_card_tags: Vec<String>,
}
