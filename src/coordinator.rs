//! RespawnAuthority – the server-side respawn state machine.
//!
//! ```text
//!   Waiting ──countdown elapsed──▶ Transporting ──transport time up──▶ Returning
//!      ▲                                                                  │
//!      └──────────── shuttle left the level / return time up ◀────────────┘
//! ```
//!
//! The authority owns the respawn shuttle for the whole session. It never
//! destroys it; every cycle ends with the shuttle being sanitized and parked
//! above the level again.

use crate::config::{LoadoutPair, RespawnConfig, TransportLimit};
use crate::convergence::{ConvergenceTask, TaskScheduler};
use crate::entity::CharacterInfo;
use crate::error::{RespawnError, Result};
use crate::manager::RespawnManager;
use crate::prefab::PrefabCatalog;
use crate::protocol::{RespawnStatus, ServerNotice, ShuttleDispatched};
use crate::sanitizer;
use crate::session::{SessionHost, SpawnTarget};
use crate::spawn::{self, SpawnAssignment};
use crate::template::VehicleTemplate;
use crate::types::{EntityId, ParticipantId, RespawnState, RespawnStats, Vec2};
use crate::vehicle::VehicleController;
use crate::world::World;
use log::{debug, info, warn};
use parking_lot::RwLock;
use std::sync::Arc;

/// Name of the slot the shuttle's convergence task runs under.
pub const FORCE_POSITION_TASK: &str = "forcepos";
/// Closing speed of the convergence task.
pub const SHUTTLE_SPEED: f32 = 100.0;
/// Cadence of the return-leg housekeeping, in simulated seconds.
pub const RETURN_CHECK_INTERVAL: f32 = 10.0;
/// Remaining transport time at which occupants are told to get out.
pub const EVACUATION_WARNING_TIME: f32 = 15.0;
/// Horizontal distance from the shaft within which the shuttle counts as
/// lined up for the trip home.
pub const SHAFT_ALIGNMENT_DISTANCE: f32 = 1000.0;

pub struct RespawnAuthority<H: SessionHost> {
    config: RespawnConfig,
    limit: TransportLimit,
    world: Arc<RwLock<World>>,
    prefabs: Arc<PrefabCatalog>,
    host: H,

    shuttle: EntityId,
    base: Option<EntityId>,
    controller: VehicleController,
    tasks: TaskScheduler,

    state: RespawnState,
    countdown_started: bool,
    respawn_timer: f32,
    transport_timer: f32,
    return_timer: f32,
    periodic_check_timer: f32,
    evacuation_warned: bool,

    stats: RespawnStats,
}

impl<H: SessionHost> RespawnAuthority<H> {
    /// Build the shuttle from `shuttle_template`, lock its wiring and park it
    /// above the level.
    ///
    /// `base` is the primary base vehicle whose spawn points decide the
    /// access tags of revived characters.
    pub fn new(
        config: RespawnConfig,
        world: Arc<RwLock<World>>,
        prefabs: Arc<PrefabCatalog>,
        host: H,
        shuttle_template: &VehicleTemplate,
        base: Option<EntityId>,
    ) -> Result<Self> {
        config.validate()?;
        let limit = config.transport_limit();
        if limit.is_unlimited() {
            info!("Max transport time is unlimited; the shuttle will not return on its own");
        }

        let (shuttle, controller) = {
            let mut w = world.write();
            if let Some(base) = base {
                if w.vehicle(base).is_none() {
                    return Err(RespawnError::UnknownVehicle(base));
                }
            }
            let start = w.level.start_position;
            let shuttle = w.instantiate(shuttle_template, start)?;
            let controller = VehicleController::scan(&w, shuttle);
            let locked = controller.lock_wiring(&mut w);
            debug!("Locked {} wire(s) on the respawn shuttle", locked);
            controller.set_target_position(&mut w, start);
            (shuttle, controller)
        };

        let mut authority = Self {
            respawn_timer: config.respawn_interval,
            config,
            limit,
            world,
            prefabs,
            host,
            shuttle,
            base,
            controller,
            tasks: TaskScheduler::new(),
            state: RespawnState::Waiting,
            countdown_started: false,
            transport_timer: 0.0,
            return_timer: 0.0,
            periodic_check_timer: 0.0,
            evacuation_warned: false,
            stats: RespawnStats::default(),
        };
        {
            let world = Arc::clone(&authority.world);
            let mut w = world.write();
            authority.reset_shuttle(&mut w);
        }
        Ok(authority)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn shuttle(&self) -> EntityId {
        self.shuttle
    }

    pub fn world(&self) -> &Arc<RwLock<World>> {
        &self.world
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn tasks(&self) -> &TaskScheduler {
        &self.tasks
    }

    pub fn controller(&self) -> &VehicleController {
        &self.controller
    }

    pub fn return_timer(&self) -> f32 {
        self.return_timer
    }

    pub fn transport_limit(&self) -> TransportLimit {
        self.limit
    }

    pub fn stats(&self) -> &RespawnStats {
        &self.stats
    }

    // -----------------------------------------------------------------------
    // Population
    // -----------------------------------------------------------------------

    fn is_dead(world: &World, character: Option<EntityId>) -> bool {
        character
            .and_then(|id| world.character(id))
            .map_or(true, |c| c.is_dead)
    }

    /// Participants in the round whose character is missing or dead.
    pub fn candidates(&self, world: &World) -> Vec<ParticipantId> {
        self.host
            .participants()
            .iter()
            .filter(|p| p.in_game && Self::is_dead(world, p.character))
            .map(|p| p.id)
            .collect()
    }

    /// `(eligible, total)`, counting the hosting participant when it has a
    /// character.
    fn population(&self, world: &World) -> (usize, usize) {
        let mut eligible = self.candidates(world).len();
        let mut total = self.host.participants().len();
        if let Some(character) = self.host.local_participant().and_then(|l| l.character) {
            total += 1;
            if Self::is_dead(world, Some(character)) {
                eligible += 1;
            }
        }
        (eligible, total)
    }

    fn local_aboard(&self, world: &World) -> bool {
        self.host
            .local_participant()
            .and_then(|l| l.character)
            .and_then(|id| world.character(id))
            .is_some_and(|c| !c.is_dead && c.vehicle == Some(self.shuttle))
    }

    // -----------------------------------------------------------------------
    // Waiting
    // -----------------------------------------------------------------------

    fn update_waiting(&mut self, world: &mut World, delta_time: f32) {
        if let Some(v) = world.vehicle_mut(self.shuttle) {
            v.velocity = Vec2::ZERO;
        }
        self.controller.set_autopilot(world, false);
        self.controller.set_maintain_position(world, false);

        let (eligible, total) = self.population(world);
        let required = (total as f32 * self.config.min_respawn_ratio).max(1.0);
        let start_countdown = eligible as f32 >= required;

        if start_countdown != self.countdown_started {
            if start_countdown {
                info!(
                    "Respawn countdown started ({}/{} eligible, {:.1}s)",
                    eligible, total, self.respawn_timer
                );
            } else {
                info!("Respawn countdown stopped ({}/{} eligible)", eligible, total);
            }
            self.countdown_started = start_countdown;
        }

        if !self.countdown_started {
            return;
        }

        self.respawn_timer = (self.respawn_timer - delta_time).max(0.0);
        if self.respawn_timer <= 0.0 {
            self.respawn_timer = self.config.respawn_interval;
            self.dispatch(world);
        }
    }

    fn dispatch(&mut self, world: &mut World) {
        self.state = RespawnState::Transporting;
        self.evacuation_warned = false;

        self.reset_shuttle(world);
        self.controller.set_target_velocity(world, Vec2::ZERO);

        self.host.broadcast_notice(ServerNotice::dispatched());

        let event = self.respawn_characters(world);

        let exit = world.level.exit_point();
        self.controller.set_target_position(world, exit);
        self.tasks.start(
            FORCE_POSITION_TASK,
            ConvergenceTask::new(self.shuttle, exit, SHUTTLE_SPEED),
        );

        self.stats.dispatches += 1;
        info!(
            "Shuttle dispatched with {} character(s)",
            event.participants.len() + usize::from(event.local_revived)
        );
        self.host.shuttle_dispatched(&event);
    }

    /// Create a character aboard the shuttle for every candidate (and the
    /// hosting participant if dead), with the configured loadout.
    fn respawn_characters(&mut self, world: &mut World) -> ShuttleDispatched {
        let clients = self.candidates(world);
        self.host.assign_jobs(&clients);

        let mut crew: Vec<CharacterInfo> = clients
            .iter()
            .filter_map(|id| self.host.participant(*id).map(|p| p.info.clone()))
            .collect();
        // Roster entries cannot vanish mid-dispatch; keep the lists aligned anyway.
        let clients: Vec<ParticipantId> = clients
            .into_iter()
            .filter(|id| self.host.participant(*id).is_some())
            .collect();

        let local_revived = match self.host.local_participant() {
            Some(local) if local.character.is_some() && Self::is_dead(world, local.character) => {
                crew.push(local.info.clone());
                true
            }
            _ => false,
        };

        let assignment = SpawnAssignment::compute(world, &crew, self.shuttle, self.base);
        let cargo = spawn::cargo_point(world, self.shuttle);

        for (i, info) in crew.into_iter().enumerate() {
            let is_local = i >= clients.len();
            let slot = &assignment.shuttle[i];
            let character =
                world.spawn_character(info, slot.position, Some(self.shuttle), !is_local);

            if is_local {
                world.controlled = Some(character);
                self.host.assign_character(SpawnTarget::Local, character);
            } else {
                self.host
                    .assign_character(SpawnTarget::Participant(clients[i]), character);
            }

            let drop_point = cargo.unwrap_or(slot.position);
            self.equip(world, drop_point);

            if let Some(c) = world.character_mut(character) {
                c.grant_tags(&assignment.base[i].id_card_tags);
            }
            self.host.add_to_crew(character);
            self.stats.characters_spawned += 1;
        }

        ShuttleDispatched {
            participants: clients,
            local_revived,
        }
    }

    /// Drop one of each loadout pair at `position`, already combined.
    fn equip(&self, world: &mut World, position: Vec2) {
        for LoadoutPair {
            container,
            contained,
        } in &self.config.loadout
        {
            let prefabs = self
                .prefabs
                .get(container)
                .and_then(|outer| self.prefabs.get(contained).map(|inner| (outer, inner)));
            match prefabs {
                Ok((outer, inner)) => {
                    let outer = world.spawn_item(outer, position, Some(self.shuttle));
                    let inner = world.spawn_item(inner, position, Some(self.shuttle));
                    world.combine_items(outer, inner);
                }
                Err(e) => warn!("Skipping loadout pair {}/{}: {}", container, contained, e),
            }
        }
    }

    // -----------------------------------------------------------------------
    // Transporting
    // -----------------------------------------------------------------------

    fn update_transporting(&mut self, world: &mut World, delta_time: f32) {
        let before = self.transport_timer;
        self.transport_timer = (self.transport_timer - delta_time).max(0.0);

        let TransportLimit::Limited(max_transport_time) = self.limit else {
            return;
        };

        // Nobody left alive aboard: head back right away.
        if !world.characters_in(self.shuttle).any(|c| !c.is_dead) {
            self.transport_timer = 0.0;
        }

        if !self.evacuation_warned
            && before > EVACUATION_WARNING_TIME
            && self.transport_timer <= EVACUATION_WARNING_TIME
            && self.local_aboard(world)
        {
            self.evacuation_warned = true;
            self.host.broadcast_notice(ServerNotice::evacuate());
        }

        if self.transport_timer <= 0.0 {
            info!("Shuttle returning");
            self.state = RespawnState::Returning;
            self.countdown_started = false;
            self.return_timer = max_transport_time;
            self.transport_timer = max_transport_time;
            self.periodic_check_timer = 0.0;
        }
    }

    // -----------------------------------------------------------------------
    // Returning
    // -----------------------------------------------------------------------

    fn update_returning(&mut self, world: &mut World, delta_time: f32) {
        self.return_timer = (self.return_timer - delta_time).max(0.0);
        self.periodic_check_timer += delta_time;

        if self.periodic_check_timer > RETURN_CHECK_INTERVAL {
            self.periodic_check_timer = 0.0;
            self.prepare_return(world);

            // Head home once the scripted path is done or the shuttle is back
            // in the shaft.
            if !self.tasks.is_running(FORCE_POSITION_TASK)
                && (self.controller.path_finished(world) || self.near_shaft(world))
            {
                let home = world.level.home_point();
                self.tasks.start(
                    FORCE_POSITION_TASK,
                    ConvergenceTask::new(self.shuttle, home, SHUTTLE_SPEED),
                );
            }
        }

        let left_level = world
            .vehicle(self.shuttle)
            .is_some_and(|v| v.position.y > world.level.bound());
        if left_level || self.return_timer <= 0.0 {
            self.tasks.stop(FORCE_POSITION_TASK);
            self.reset_shuttle(world);

            self.state = RespawnState::Waiting;
            self.respawn_timer = self.config.respawn_interval;
            self.countdown_started = false;
            self.stats.returns += 1;
            info!(
                "Shuttle back in holding ({})",
                if left_level { "left the level" } else { "return time up" }
            );
        }
    }

    /// Seal the shuttle up and put it on autopilot for the trip home.
    fn prepare_return(&mut self, world: &mut World) {
        let shaft = world.shaft_body();
        if let Some(body) = world
            .vehicle_mut(self.shuttle)
            .and_then(|v| v.body.as_mut())
        {
            body.ignore_collision_with(shaft);
        }

        self.controller.set_autopilot(world, true);
        self.controller.set_maintain_position(world, false);
        self.controller.close_all_doors(world);
        world.remove_breaches(self.shuttle);
        self.controller.undock_all(world);
    }

    fn near_shaft(&self, world: &World) -> bool {
        let level = &world.level;
        world.vehicle(self.shuttle).is_some_and(|v| {
            v.position.y + v.borders.top() > level.start_position.y - level.shaft_height
                && (level.start_position.x - v.position.x).abs() < SHAFT_ALIGNMENT_DISTANCE
        })
    }

    // -----------------------------------------------------------------------
    // Reset
    // -----------------------------------------------------------------------

    fn reset_shuttle(&mut self, world: &mut World) {
        self.transport_timer = self.limit.budget();
        self.return_timer = self.limit.budget();
        let aboard: Vec<EntityId> = world.characters_in(self.shuttle).map(|c| c.id).collect();
        sanitizer::sanitize(world, self.shuttle);
        for character in aboard {
            self.host.remove_from_crew(character);
        }
    }
}

impl<H: SessionHost> RespawnManager for RespawnAuthority<H> {
    fn update(&mut self, delta_time: f32) {
        self.stats.total_ticks += 1;

        let world = Arc::clone(&self.world);
        let mut world = world.write();

        match self.state {
            RespawnState::Waiting => self.update_waiting(&mut world, delta_time),
            RespawnState::Transporting => self.update_transporting(&mut world, delta_time),
            RespawnState::Returning => self.update_returning(&mut world, delta_time),
        }

        self.tasks.step(&mut world);
    }

    fn status(&self) -> RespawnStatus {
        RespawnStatus {
            state: self.state,
            countdown_started: self.countdown_started,
            respawn_timer: self.respawn_timer,
            transport_timer: self.transport_timer,
        }
    }
}
