//! Cooperative tasks and the convergence task that drives a vehicle to a
//! target position.
//!
//! Tasks are explicit state objects stepped once per tick by a
//! [`TaskScheduler`]. Each running task occupies a named slot; starting a
//! task under a taken name cancels the previous occupant, which is the only
//! cancellation mechanism. A cancelled task is simply dropped and never gets
//! to run its completion step.

use crate::types::{EntityId, Vec2};
use crate::world::World;
use log::debug;

/// The convergence loop stops once the vehicle is this close to its target.
pub const CONVERGENCE_DISTANCE: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Running,
    Success,
}

/// A unit of work advanced one step per tick.
pub trait Task: Send {
    /// Run until the next suspension point.
    fn step(&mut self, world: &mut World) -> TaskStatus;
}

// ---------------------------------------------------------------------------
// Convergence task
// ---------------------------------------------------------------------------

/// Pushes a vehicle toward `target` at a constant speed, passing through the
/// level's shaft while it does.
#[derive(Debug, Clone)]
pub struct ConvergenceTask {
    vehicle: EntityId,
    target: Vec2,
    speed: f32,
    started: bool,
}

impl ConvergenceTask {
    pub fn new(vehicle: EntityId, target: Vec2, speed: f32) -> Self {
        Self {
            vehicle,
            target,
            speed,
            started: false,
        }
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }
}

impl Task for ConvergenceTask {
    fn step(&mut self, world: &mut World) -> TaskStatus {
        let shaft = world.shaft_body();
        let Some(vehicle) = world.vehicle_mut(self.vehicle) else {
            return TaskStatus::Success;
        };
        let position = vehicle.position;
        // A vehicle whose body was destroyed elsewhere counts as arrived.
        let Some(body) = vehicle.body.as_mut() else {
            return TaskStatus::Success;
        };

        if !self.started {
            body.ignore_collision_with(shaft);
            self.started = true;
        }

        if position.distance(self.target) > CONVERGENCE_DISTANCE {
            vehicle.velocity = (self.target - position).normalize_or_zero() * self.speed;
            return TaskStatus::Running;
        }

        body.restore_collision_with(shaft);
        debug!("Vehicle {} converged on {}", self.vehicle, self.target);
        TaskStatus::Success
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct TaskScheduler {
    tasks: Vec<(String, Box<dyn Task>)>,
    started: usize,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `task` under `name`, cancelling any task already running under
    /// that name.
    pub fn start(&mut self, name: &str, task: impl Task + 'static) {
        self.stop(name);
        debug!("Starting task '{}'", name);
        self.tasks.push((name.to_string(), Box::new(task)));
        self.started += 1;
    }

    /// Cancel the task running under `name`, if any. Returns whether one was
    /// running.
    pub fn stop(&mut self, name: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|(n, _)| n != name);
        let stopped = self.tasks.len() != before;
        if stopped {
            debug!("Cancelled task '{}'", name);
        }
        stopped
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.tasks.iter().any(|(n, _)| n == name)
    }

    /// Number of tasks running under `name`.
    pub fn count(&self, name: &str) -> usize {
        self.tasks.iter().filter(|(n, _)| n == name).count()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Tasks started since creation, replacements included.
    pub fn started(&self) -> usize {
        self.started
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Advance every task by one step and drop the finished ones.
    pub fn step(&mut self, world: &mut World) {
        self.tasks.retain_mut(|(name, task)| match task.step(world) {
            TaskStatus::Running => true,
            TaskStatus::Success => {
                debug!("Task '{}' finished", name);
                false
            }
        });
    }
}
