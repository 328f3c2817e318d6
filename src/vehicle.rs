//! Vehicle controller: the shuttle's steering, doors and docking ports.
//!
//! Every command is fire-and-forget. It mutates the component right away and
//! the host's physics step picks it up. A vehicle without a steering
//! terminal simply ignores steering commands.

use crate::entity::Steering;
use crate::types::{EntityId, Vec2};
use crate::world::World;
use log::{debug, warn};

#[derive(Debug, Clone)]
pub struct VehicleController {
    vehicle: EntityId,
    steering: Option<EntityId>,
    doors: Vec<EntityId>,
    docking_ports: Vec<EntityId>,
    panels: Vec<EntityId>,
}

impl VehicleController {
    /// Find the vehicle's steering terminal, doors, docking ports and wiring
    /// panels.
    pub fn scan(world: &World, vehicle: EntityId) -> Self {
        let mut controller = Self {
            vehicle,
            steering: None,
            doors: Vec::new(),
            docking_ports: Vec::new(),
            panels: Vec::new(),
        };

        for item in world.items_in(vehicle) {
            if item.steering.is_some() {
                controller.steering = Some(item.id);
            }
            if item.door.is_some() {
                controller.doors.push(item.id);
            }
            if item.docking_port.is_some() {
                controller.docking_ports.push(item.id);
            }
            if item.connection_panel.is_some() {
                controller.panels.push(item.id);
            }
        }

        if controller.steering.is_none() {
            warn!("Vehicle {} has no steering terminal", vehicle);
        }
        debug!(
            "Vehicle {}: {} door(s), {} docking port(s), {} wiring panel(s)",
            vehicle,
            controller.doors.len(),
            controller.docking_ports.len(),
            controller.panels.len()
        );
        controller
    }

    pub fn vehicle(&self) -> EntityId {
        self.vehicle
    }

    pub fn has_steering(&self) -> bool {
        self.steering.is_some()
    }

    fn with_steering(&self, world: &mut World, f: impl FnOnce(&mut Steering)) {
        if let Some(steering) = self
            .steering
            .and_then(|id| world.item_mut(id))
            .and_then(|item| item.steering.as_mut())
        {
            f(steering);
        }
    }

    pub fn set_autopilot(&self, world: &mut World, enabled: bool) {
        self.with_steering(world, |s| s.autopilot = enabled);
    }

    pub fn set_maintain_position(&self, world: &mut World, enabled: bool) {
        self.with_steering(world, |s| s.maintain_position = enabled);
    }

    pub fn set_target_position(&self, world: &mut World, position: Vec2) {
        self.with_steering(world, |s| s.target_position = Some(position));
    }

    pub fn set_target_velocity(&self, world: &mut World, velocity: Vec2) {
        self.with_steering(world, |s| s.target_velocity = velocity);
    }

    /// Whether the autopilot has finished the path it was following.
    pub fn path_finished(&self, world: &World) -> bool {
        self.steering
            .and_then(|id| world.item(id))
            .and_then(|item| item.steering.as_ref())
            .and_then(|s| s.path.as_ref())
            .is_some_and(|p| p.finished)
    }

    /// Close every open door. Returns how many were closed.
    pub fn close_all_doors(&self, world: &mut World) -> usize {
        let mut closed = 0;
        for id in &self.doors {
            if let Some(door) = world.item_mut(*id).and_then(|i| i.door.as_mut()) {
                if door.open {
                    door.open = false;
                    closed += 1;
                }
            }
        }
        closed
    }

    /// Release every docking port. Returns how many were docked.
    pub fn undock_all(&self, world: &mut World) -> usize {
        let mut undocked = 0;
        for id in &self.docking_ports {
            if let Some(port) = world.item_mut(*id).and_then(|i| i.docking_port.as_mut()) {
                if port.docked_to.take().is_some() {
                    undocked += 1;
                }
            }
        }
        undocked
    }

    /// Lock every wire so passengers cannot rewire the shuttle.
    pub fn lock_wiring(&self, world: &mut World) -> usize {
        let mut locked = 0;
        for id in &self.panels {
            if let Some(panel) = world.item_mut(*id).and_then(|i| i.connection_panel.as_mut()) {
                for wire in &mut panel.wires {
                    wire.locked = true;
                    locked += 1;
                }
            }
        }
        locked
    }
}
