//! Occupancy sanitizer: returns a vehicle and everything aboard it to a
//! pristine, reusable state.
//!
//! Idempotent. Running it on an already clean vehicle changes nothing except
//! re-parking the vehicle at its holding point.

use crate::entity::CauseOfDeath;
use crate::types::{EntityId, Vec2};
use crate::world::World;
use log::debug;

/// Large enough to repair any wall section completely.
const FULL_REPAIR: f32 = -100_000.0;

/// What a single [`sanitize`] pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    /// Loose items queued for deferred removal.
    pub items_queued: usize,
    /// Breaches removed.
    pub breaches_removed: usize,
    /// Characters that were alive and got killed.
    pub characters_killed: usize,
}

/// Reset `vehicle`: remove loose items, restore items, structure and
/// atmosphere, kill everyone aboard and park it above the level.
pub fn sanitize(world: &mut World, vehicle: EntityId) -> SanitizeReport {
    let mut report = SanitizeReport::default();

    // Items: loose ones go, everything else is restored.
    let mut loose = Vec::new();
    for item in world.items_in_mut(vehicle) {
        if item.body_enabled && item.parent_inventory.is_none() {
            loose.push(item.id);
        }
        item.condition = 100.0;
        if let Some(power) = item.power.as_mut() {
            power.charge = power.capacity;
        }
    }
    for id in loose {
        if !world.pending_removals().contains(&id) {
            report.items_queued += 1;
        }
        world.queue_removal(id);
    }

    for wall in world.walls_in_mut(vehicle) {
        for section in 0..wall.section_count() {
            wall.add_damage(section, FULL_REPAIR);
        }
    }

    report.breaches_removed = world.remove_breaches(vehicle);

    for hull in world.hulls_in_mut(vehicle) {
        hull.oxygen_percentage = 100.0;
        hull.water_volume = 0.0;
    }

    // Occupants.
    let controlled = world.controlled;
    let mut release_control = false;
    for character in world.characters_in_mut(vehicle) {
        if controlled == Some(character.id) {
            release_control = true;
        }
        character.enabled = false;
        if character.kill(CauseOfDeath::Damage, true) {
            report.characters_killed += 1;
        }
    }
    if release_control {
        world.controlled = None;
    }

    // Park above the level and drop the shaft collision exception.
    let shaft = world.shaft_body();
    let level = world.level.clone();
    if let Some(v) = world.vehicle_mut(vehicle) {
        v.position = level.holding_point(v.borders.height);
        v.velocity = Vec2::ZERO;
        if let Some(body) = v.body.as_mut() {
            body.restore_collision_with(shaft);
        }
    }

    debug!(
        "Sanitized vehicle {}: {} item(s) queued, {} breach(es) removed, {} character(s) killed",
        vehicle, report.items_queued, report.breaches_removed, report.characters_killed
    );
    report
}
