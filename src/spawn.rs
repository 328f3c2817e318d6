//! Spawn slot assignment for revived characters.
//!
//! Slots are picked per candidate, in order:
//!
//! 1. an unused human spawn point reserved for the candidate's job,
//! 2. an unused human spawn point with no job restriction,
//! 3. any unused human spawn point.
//!
//! When every slot has been used once, the pool is recycled and the same
//! preference order applies again, so a crowd larger than the vehicle still
//! gets one slot each. A vehicle without any human spawn point yields
//! synthetic slots at its origin.

use crate::entity::{CharacterInfo, SpawnType, WayPoint};
use crate::types::{EntityId, Vec2};
use crate::world::World;
use log::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnSlot {
    /// `None` for a synthetic slot.
    pub waypoint: Option<EntityId>,
    pub position: Vec2,
    pub job: Option<String>,
    /// Access tags a character spawning here receives.
    pub id_card_tags: Vec<String>,
}

impl SpawnSlot {
    fn from_waypoint(world: &World, waypoint: &WayPoint) -> Self {
        Self {
            waypoint: Some(waypoint.id),
            position: world.waypoint_position(waypoint),
            job: waypoint.job.clone(),
            id_card_tags: waypoint.id_card_tags.clone(),
        }
    }

    fn synthetic(position: Vec2) -> Self {
        Self {
            waypoint: None,
            position,
            job: None,
            id_card_tags: Vec::new(),
        }
    }
}

/// Pick one slot on `vehicle` for each entry of `crew`, in order.
pub fn select_crew_spawn_points(
    world: &World,
    crew: &[CharacterInfo],
    vehicle: EntityId,
) -> Vec<SpawnSlot> {
    let points: Vec<&WayPoint> = world
        .waypoints_in(vehicle)
        .filter(|w| w.spawn_type == SpawnType::Human)
        .collect();

    if points.is_empty() {
        let origin = world
            .vehicle(vehicle)
            .map(|v| v.position)
            .unwrap_or(Vec2::ZERO);
        if !crew.is_empty() {
            warn!(
                "Vehicle {} has no human spawn points; spawning {} character(s) at its origin",
                vehicle,
                crew.len()
            );
        }
        return vec![SpawnSlot::synthetic(origin); crew.len()];
    }

    if crew.len() > points.len() {
        warn!(
            "Vehicle {} has {} spawn point(s) for {} character(s); reusing slots",
            vehicle,
            points.len(),
            crew.len()
        );
    }

    let mut used = vec![false; points.len()];
    let mut slots = Vec::with_capacity(crew.len());
    for info in crew {
        if used.iter().all(|u| *u) {
            used.iter_mut().for_each(|u| *u = false);
        }
        let index = pick(&points, &used, info.job.as_deref());
        used[index] = true;
        slots.push(SpawnSlot::from_waypoint(world, points[index]));
    }
    slots
}

/// Index of the best unused point. At least one point must be unused.
fn pick(points: &[&WayPoint], used: &[bool], job: Option<&str>) -> usize {
    let unused = move || (0..points.len()).filter(move |i| !used[*i]);

    if let Some(job) = job {
        if let Some(i) = unused().find(|i| points[*i].job.as_deref() == Some(job)) {
            return i;
        }
    }
    unused()
        .find(|i| points[*i].job.is_none())
        .or_else(|| unused().next())
        .unwrap_or(0)
}

/// Slots for a batch of revivals: where they spawn, and where they would
/// have spawned on the primary base (which decides their access tags).
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnAssignment {
    pub shuttle: Vec<SpawnSlot>,
    pub base: Vec<SpawnSlot>,
}

impl SpawnAssignment {
    /// Both lists always have exactly `crew.len()` entries.
    pub fn compute(
        world: &World,
        crew: &[CharacterInfo],
        shuttle: EntityId,
        base: Option<EntityId>,
    ) -> Self {
        let shuttle_slots = select_crew_spawn_points(world, crew, shuttle);
        let base_slots = match base {
            Some(base) => select_crew_spawn_points(world, crew, base),
            None => vec![SpawnSlot::synthetic(Vec2::ZERO); crew.len()],
        };
        Self {
            shuttle: shuttle_slots,
            base: base_slots,
        }
    }

    pub fn len(&self) -> usize {
        self.shuttle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shuttle.is_empty()
    }
}

/// World position of the vehicle's cargo spot, if it has one.
pub fn cargo_point(world: &World, vehicle: EntityId) -> Option<Vec2> {
    world
        .waypoints_in(vehicle)
        .find(|w| w.spawn_type == SpawnType::Cargo)
        .map(|w| world.waypoint_position(w))
}
