//! The world data layer: level geometry, vehicles and the entity registries.
//!
//! The host owns a [`World`] behind an `Arc<RwLock<_>>` and shares it with the
//! respawn coordinator, which takes the write lock once per tick.
//! Registries are ordered maps so iteration (and therefore spawn slot
//! assignment) is deterministic.

use crate::entity::{
    Character, CharacterInfo, ConnectionPanel, DockingPort, Door, Gap, Hull, Item, PowerContainer,
    Steering, Wall, WayPoint, Wire,
};
use crate::error::Result;
use crate::prefab::ItemPrefab;
use crate::template::{ComponentBlueprint, VehicleTemplate};
use crate::types::{Borders, EntityId, Vec2};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

/// Distance above the level's vertical bound the return leg aims for.
pub const HOME_CLEARANCE: f32 = 1000.0;
/// Fraction of vehicle velocity lost per second in [`World::step_physics`].
pub const WATER_DRAG: f32 = 0.5;

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Level {
    /// Where the level's entrance shaft opens into the playable area.
    pub start_position: Vec2,
    /// Width and height of the playable area; `size.y` is the vertical bound.
    pub size: Vec2,
    /// Height of the entrance shaft below `start_position`.
    pub shaft_height: f32,
}

impl Level {
    pub fn new(start_position: Vec2, size: Vec2, shaft_height: f32) -> Self {
        Self {
            start_position,
            size,
            shaft_height,
        }
    }

    pub fn bound(&self) -> f32 {
        self.size.y
    }

    /// Bottom of the entrance shaft, where the shuttle drops off its crew.
    pub fn exit_point(&self) -> Vec2 {
        Vec2::new(
            self.start_position.x,
            self.start_position.y - self.shaft_height,
        )
    }

    /// Target of the return leg, well above the vertical bound.
    pub fn home_point(&self) -> Vec2 {
        Vec2::new(self.start_position.x, self.size.y + HOME_CLEARANCE)
    }

    /// Parking spot above the vertical bound for a vehicle of the given height.
    pub fn holding_point(&self, vehicle_height: f32) -> Vec2 {
        Vec2::new(self.start_position.x, self.size.y + vehicle_height)
    }
}

// ---------------------------------------------------------------------------
// Vehicles
// ---------------------------------------------------------------------------

/// Physical body of a vehicle.
#[derive(Debug, Clone, Default)]
pub struct SubBody {
    /// Bodies this vehicle currently passes through.
    ignored: BTreeSet<EntityId>,
}

impl SubBody {
    pub fn ignore_collision_with(&mut self, body: EntityId) {
        self.ignored.insert(body);
    }

    pub fn restore_collision_with(&mut self, body: EntityId) {
        self.ignored.remove(&body);
    }

    pub fn ignores(&self, body: EntityId) -> bool {
        self.ignored.contains(&body)
    }
}

#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: EntityId,
    pub name: String,
    /// Hash of the template the vehicle was built from.
    pub template_hash: String,
    pub position: Vec2,
    pub velocity: Vec2,
    pub borders: Borders,
    /// `None` once the physics body has been destroyed.
    pub body: Option<SubBody>,
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

pub struct World {
    pub level: Level,
    shaft_body: EntityId,
    next_id: u32,
    vehicles: BTreeMap<EntityId, Vehicle>,
    characters: BTreeMap<EntityId, Character>,
    items: BTreeMap<EntityId, Item>,
    walls: BTreeMap<EntityId, Wall>,
    gaps: BTreeMap<EntityId, Gap>,
    hulls: BTreeMap<EntityId, Hull>,
    waypoints: BTreeMap<EntityId, WayPoint>,
    /// Character driven by the local (hosting) participant's input.
    pub controlled: Option<EntityId>,
    removal_queue: Vec<EntityId>,
}

impl World {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            shaft_body: EntityId(0),
            next_id: 1,
            vehicles: BTreeMap::new(),
            characters: BTreeMap::new(),
            items: BTreeMap::new(),
            walls: BTreeMap::new(),
            gaps: BTreeMap::new(),
            hulls: BTreeMap::new(),
            waypoints: BTreeMap::new(),
            controlled: None,
            removal_queue: Vec::new(),
        }
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Collision body of the level's entrance shaft.
    pub fn shaft_body(&self) -> EntityId {
        self.shaft_body
    }

    // -----------------------------------------------------------------------
    // Vehicles
    // -----------------------------------------------------------------------

    /// Build a new vehicle and all of its entities from `template`.
    pub fn instantiate(&mut self, template: &VehicleTemplate, position: Vec2) -> Result<EntityId> {
        let template_hash = template.hash()?;
        let vehicle = self.allocate_id();
        self.vehicles.insert(
            vehicle,
            Vehicle {
                id: vehicle,
                name: template.name.clone(),
                template_hash,
                position,
                velocity: Vec2::ZERO,
                borders: template.borders,
                body: Some(SubBody::default()),
            },
        );

        for blueprint in &template.items {
            let id = self.allocate_id();
            let mut item = Item::new(id, blueprint.prefab.clone(), position + blueprint.offset);
            item.vehicle = Some(vehicle);
            item.body_enabled = !blueprint.fixed;
            for component in &blueprint.components {
                match component {
                    ComponentBlueprint::Steering => item.steering = Some(Steering::default()),
                    ComponentBlueprint::Door { open } => item.door = Some(Door { open: *open }),
                    ComponentBlueprint::DockingPort => {
                        item.docking_port = Some(DockingPort::default())
                    }
                    ComponentBlueprint::ConnectionPanel { wires } => {
                        item.connection_panel = Some(ConnectionPanel {
                            wires: vec![Wire::default(); *wires],
                        })
                    }
                    ComponentBlueprint::PowerContainer { charge, capacity } => {
                        item.power = Some(PowerContainer {
                            charge: *charge,
                            capacity: *capacity,
                        })
                    }
                }
            }
            self.items.insert(id, item);
        }

        let mut wall_ids = Vec::with_capacity(template.walls.len());
        for blueprint in &template.walls {
            let id = self.allocate_id();
            wall_ids.push(id);
            self.walls.insert(
                id,
                Wall {
                    id,
                    vehicle: Some(vehicle),
                    max_health: blueprint.max_health,
                    section_damage: vec![0.0; blueprint.sections],
                },
            );
        }

        for _ in &template.hulls {
            self.add_hull(vehicle);
        }

        for blueprint in &template.gaps {
            let wall = blueprint.wall.and_then(|i| wall_ids.get(i).copied());
            self.add_gap(vehicle, wall);
        }

        for blueprint in &template.waypoints {
            let id = self.allocate_id();
            self.waypoints.insert(
                id,
                WayPoint {
                    id,
                    vehicle: Some(vehicle),
                    offset: blueprint.offset,
                    spawn_type: blueprint.spawn_type,
                    job: blueprint.job.clone(),
                    id_card_tags: blueprint.id_card_tags.clone(),
                },
            );
        }

        debug!(
            "Instantiated vehicle '{}' as {} at {}",
            template.name, vehicle, position
        );
        Ok(vehicle)
    }

    pub fn vehicle(&self, id: EntityId) -> Option<&Vehicle> {
        self.vehicles.get(&id)
    }

    pub fn vehicle_mut(&mut self, id: EntityId) -> Option<&mut Vehicle> {
        self.vehicles.get_mut(&id)
    }

    /// World position of a waypoint, following its vehicle.
    pub fn waypoint_position(&self, waypoint: &WayPoint) -> Vec2 {
        let origin = waypoint
            .vehicle
            .and_then(|v| self.vehicle(v))
            .map(|v| v.position)
            .unwrap_or(Vec2::ZERO);
        origin + waypoint.offset
    }

    /// Integrate vehicle velocities over `dt` seconds, then apply drag.
    ///
    /// Stand-in for the host's physics step; vehicles without a body stay put.
    pub fn step_physics(&mut self, dt: f32) {
        let damping = (1.0 - WATER_DRAG * dt).max(0.0);
        for vehicle in self.vehicles.values_mut() {
            if vehicle.body.is_some() {
                vehicle.position = vehicle.position + vehicle.velocity * dt;
                vehicle.velocity = vehicle.velocity * damping;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Characters
    // -----------------------------------------------------------------------

    /// Characters stay registered after death; disposing of corpses is the
    /// host's job.
    pub fn spawn_character(
        &mut self,
        info: CharacterInfo,
        position: Vec2,
        vehicle: Option<EntityId>,
        is_remote: bool,
    ) -> EntityId {
        let id = self.allocate_id();
        self.characters.insert(
            id,
            Character {
                id,
                info,
                vehicle,
                position,
                enabled: true,
                is_remote,
                is_dead: false,
                cause_of_death: None,
                tags: Vec::new(),
            },
        );
        id
    }

    pub fn character(&self, id: EntityId) -> Option<&Character> {
        self.characters.get(&id)
    }

    pub fn character_mut(&mut self, id: EntityId) -> Option<&mut Character> {
        self.characters.get_mut(&id)
    }

    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    pub fn characters_in(&self, vehicle: EntityId) -> impl Iterator<Item = &Character> {
        self.characters
            .values()
            .filter(move |c| c.vehicle == Some(vehicle))
    }

    pub fn characters_in_mut(&mut self, vehicle: EntityId) -> impl Iterator<Item = &mut Character> {
        self.characters
            .values_mut()
            .filter(move |c| c.vehicle == Some(vehicle))
    }

    // -----------------------------------------------------------------------
    // Items
    // -----------------------------------------------------------------------

    pub fn spawn_item(
        &mut self,
        prefab: &ItemPrefab,
        position: Vec2,
        vehicle: Option<EntityId>,
    ) -> EntityId {
        let id = self.allocate_id();
        let mut item = Item::new(id, prefab.identifier.clone(), position);
        item.vehicle = vehicle;
        item.power = prefab.power_capacity.map(|capacity| PowerContainer {
            charge: capacity,
            capacity,
        });
        self.items.insert(id, item);
        id
    }

    /// Put `contained` inside `container`, e.g. an oxygen tank into a diving
    /// suit. Returns `false` if either item is unknown or they are the same.
    pub fn combine_items(&mut self, container: EntityId, contained: EntityId) -> bool {
        if container == contained
            || !self.items.contains_key(&container)
            || !self.items.contains_key(&contained)
        {
            return false;
        }
        if let Some(inner) = self.items.get_mut(&contained) {
            inner.parent_inventory = Some(container);
            inner.body_enabled = false;
        }
        if let Some(outer) = self.items.get_mut(&container) {
            if !outer.contained.contains(&contained) {
                outer.contained.push(contained);
            }
        }
        true
    }

    pub fn insert_item(&mut self, mut item: Item) -> EntityId {
        let id = self.allocate_id();
        item.id = id;
        self.items.insert(id, item);
        id
    }

    pub fn item(&self, id: EntityId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn item_mut(&mut self, id: EntityId) -> Option<&mut Item> {
        self.items.get_mut(&id)
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn items_in(&self, vehicle: EntityId) -> impl Iterator<Item = &Item> {
        self.items
            .values()
            .filter(move |i| i.vehicle == Some(vehicle))
    }

    pub fn items_in_mut(&mut self, vehicle: EntityId) -> impl Iterator<Item = &mut Item> {
        self.items
            .values_mut()
            .filter(move |i| i.vehicle == Some(vehicle))
    }

    // -----------------------------------------------------------------------
    // Deferred removal
    // -----------------------------------------------------------------------

    /// Queue an item for removal at the host's next flush. Queuing the same
    /// item twice has no further effect.
    pub fn queue_removal(&mut self, item: EntityId) {
        if !self.removal_queue.contains(&item) {
            self.removal_queue.push(item);
        }
    }

    pub fn pending_removals(&self) -> &[EntityId] {
        &self.removal_queue
    }

    /// Remove every queued item (and anything inside it). Returns how many
    /// items were removed.
    pub fn flush_removals(&mut self) -> usize {
        let mut removed = 0;
        let mut queue = std::mem::take(&mut self.removal_queue);
        while let Some(id) = queue.pop() {
            if let Some(item) = self.items.remove(&id) {
                removed += 1;
                queue.extend(item.contained);
            }
        }
        removed
    }

    // -----------------------------------------------------------------------
    // Structure
    // -----------------------------------------------------------------------

    pub fn wall(&self, id: EntityId) -> Option<&Wall> {
        self.walls.get(&id)
    }

    pub fn wall_mut(&mut self, id: EntityId) -> Option<&mut Wall> {
        self.walls.get_mut(&id)
    }

    pub fn walls_in(&self, vehicle: EntityId) -> impl Iterator<Item = &Wall> {
        self.walls
            .values()
            .filter(move |w| w.vehicle == Some(vehicle))
    }

    pub fn walls_in_mut(&mut self, vehicle: EntityId) -> impl Iterator<Item = &mut Wall> {
        self.walls
            .values_mut()
            .filter(move |w| w.vehicle == Some(vehicle))
    }

    pub fn add_gap(&mut self, vehicle: EntityId, connected_wall: Option<EntityId>) -> EntityId {
        let id = self.allocate_id();
        self.gaps.insert(
            id,
            Gap {
                id,
                vehicle: Some(vehicle),
                connected_wall,
            },
        );
        id
    }

    pub fn gaps_in(&self, vehicle: EntityId) -> impl Iterator<Item = &Gap> {
        self.gaps
            .values()
            .filter(move |g| g.vehicle == Some(vehicle))
    }

    /// Remove every gap of `vehicle` that is attached to a wall. Returns how
    /// many were removed.
    pub fn remove_breaches(&mut self, vehicle: EntityId) -> usize {
        let before = self.gaps.len();
        self.gaps
            .retain(|_, g| !(g.vehicle == Some(vehicle) && g.connected_wall.is_some()));
        before - self.gaps.len()
    }

    pub fn add_hull(&mut self, vehicle: EntityId) -> EntityId {
        let id = self.allocate_id();
        self.hulls.insert(
            id,
            Hull {
                id,
                vehicle: Some(vehicle),
                oxygen_percentage: 100.0,
                water_volume: 0.0,
            },
        );
        id
    }

    pub fn hulls_in(&self, vehicle: EntityId) -> impl Iterator<Item = &Hull> {
        self.hulls
            .values()
            .filter(move |h| h.vehicle == Some(vehicle))
    }

    pub fn hulls_in_mut(&mut self, vehicle: EntityId) -> impl Iterator<Item = &mut Hull> {
        self.hulls
            .values_mut()
            .filter(move |h| h.vehicle == Some(vehicle))
    }

    // -----------------------------------------------------------------------
    // Waypoints
    // -----------------------------------------------------------------------

    pub fn waypoints_in(&self, vehicle: EntityId) -> impl Iterator<Item = &WayPoint> {
        self.waypoints
            .values()
            .filter(move |w| w.vehicle == Some(vehicle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        World::new(Level::new(
            Vec2::new(0.0, 1000.0),
            Vec2::new(5000.0, 2000.0),
            300.0,
        ))
    }

    #[test]
    fn level_reference_points() {
        let w = world();
        assert_eq!(w.level.exit_point(), Vec2::new(0.0, 700.0));
        assert_eq!(w.level.home_point(), Vec2::new(0.0, 3000.0));
        assert_eq!(w.level.holding_point(400.0), Vec2::new(0.0, 2400.0));
    }

    #[test]
    fn instantiate_binds_every_entity_to_the_vehicle() {
        let mut w = world();
        let template = VehicleTemplate::respawn_shuttle();
        let shuttle = w.instantiate(&template, Vec2::new(10.0, 20.0)).unwrap();

        assert_eq!(w.items_in(shuttle).count(), template.items.len());
        assert_eq!(w.walls_in(shuttle).count(), template.walls.len());
        assert_eq!(w.hulls_in(shuttle).count(), template.hulls.len());
        assert_eq!(w.waypoints_in(shuttle).count(), template.waypoints.len());
        assert_eq!(
            w.vehicle(shuttle).unwrap().template_hash,
            template.hash().unwrap()
        );
        assert!(w.items_in(shuttle).all(|i| !i.body_enabled));
    }

    #[test]
    fn flush_removes_contained_items_too() {
        let mut w = world();
        let suit = w.spawn_item(&ItemPrefab::new("divingsuit", "Diving Suit"), Vec2::ZERO, None);
        let tank = w.spawn_item(&ItemPrefab::new("oxygentank", "Oxygen Tank"), Vec2::ZERO, None);
        assert!(w.combine_items(suit, tank));
        assert!(!w.combine_items(suit, suit));

        w.queue_removal(suit);
        w.queue_removal(suit);
        assert_eq!(w.pending_removals(), &[suit]);
        assert_eq!(w.flush_removals(), 2);
        assert_eq!(w.items().count(), 0);
    }

    #[test]
    fn step_physics_skips_vehicles_without_body() {
        let mut w = world();
        let template = VehicleTemplate::new("raft", Borders::new(10.0, 10.0));
        let a = w.instantiate(&template, Vec2::ZERO).unwrap();
        let b = w.instantiate(&template, Vec2::ZERO).unwrap();
        for id in [a, b] {
            w.vehicle_mut(id).unwrap().velocity = Vec2::new(0.0, 10.0);
        }
        w.vehicle_mut(b).unwrap().body = None;

        w.step_physics(1.0);
        assert_eq!(w.vehicle(a).unwrap().position, Vec2::new(0.0, 10.0));
        assert_eq!(w.vehicle(a).unwrap().velocity, Vec2::new(0.0, 5.0));
        assert_eq!(w.vehicle(b).unwrap().position, Vec2::ZERO);
    }
}
