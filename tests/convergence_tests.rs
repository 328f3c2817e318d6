//! Convergence task and scheduler tests

#[cfg(test)]
mod tests {
    use shuttle_respawn::{
        convergence::{ConvergenceTask, Task, TaskScheduler, TaskStatus},
        template::VehicleTemplate,
        types::{Borders, EntityId, Vec2},
        world::{Level, World},
    };

    fn make_world(at: Vec2) -> (World, EntityId) {
        let mut world = World::new(Level::new(
            Vec2::new(0.0, 1000.0),
            Vec2::new(5000.0, 2000.0),
            300.0,
        ));
        let raft = world
            .instantiate(&VehicleTemplate::new("raft", Borders::new(50.0, 50.0)), at)
            .unwrap();
        (world, raft)
    }

    fn ignores_shaft(world: &World, vehicle: EntityId) -> bool {
        world
            .vehicle(vehicle)
            .and_then(|v| v.body.as_ref())
            .is_some_and(|b| b.ignores(world.shaft_body()))
    }

    // -----------------------------------------------------------------------
    // ConvergenceTask
    // -----------------------------------------------------------------------

    #[test]
    fn pushes_toward_target_at_constant_speed() {
        let (mut world, raft) = make_world(Vec2::ZERO);
        let mut task = ConvergenceTask::new(raft, Vec2::new(300.0, 400.0), 100.0);

        assert_eq!(task.step(&mut world), TaskStatus::Running);
        let v = world.vehicle(raft).unwrap().velocity;
        assert!((v.x - 60.0).abs() < 1e-4 && (v.y - 80.0).abs() < 1e-4, "{v}");
        assert!(ignores_shaft(&world, raft));
    }

    #[test]
    fn finishes_within_distance_and_restores_collision() {
        let (mut world, raft) = make_world(Vec2::ZERO);
        let mut task = ConvergenceTask::new(raft, Vec2::new(0.0, 250.0), 100.0);

        let mut steps = 0;
        while task.step(&mut world) == TaskStatus::Running {
            world.step_physics(1.0);
            steps += 1;
            assert!(ignores_shaft(&world, raft));
            assert!(steps < 10);
        }
        assert!(world.vehicle(raft).unwrap().position.distance(task.target()) <= 100.0);
        assert!(!ignores_shaft(&world, raft));
    }

    #[test]
    fn already_there_finishes_on_first_step() {
        let (mut world, raft) = make_world(Vec2::new(10.0, 10.0));
        let mut task = ConvergenceTask::new(raft, Vec2::ZERO, 100.0);
        assert_eq!(task.step(&mut world), TaskStatus::Success);
        assert_eq!(world.vehicle(raft).unwrap().velocity, Vec2::ZERO);
        assert!(!ignores_shaft(&world, raft));
    }

    #[test]
    fn missing_body_counts_as_arrived() {
        let (mut world, raft) = make_world(Vec2::ZERO);
        world.vehicle_mut(raft).unwrap().body = None;
        let mut task = ConvergenceTask::new(raft, Vec2::new(0.0, 5000.0), 100.0);
        assert_eq!(task.step(&mut world), TaskStatus::Success);
        assert_eq!(world.vehicle(raft).unwrap().velocity, Vec2::ZERO);

        let mut gone = ConvergenceTask::new(EntityId(4242), Vec2::ZERO, 100.0);
        assert_eq!(gone.step(&mut world), TaskStatus::Success);
    }

    // -----------------------------------------------------------------------
    // Scheduler
    // -----------------------------------------------------------------------

    #[test]
    fn starting_under_same_name_replaces_previous_task() {
        let (mut world, raft) = make_world(Vec2::ZERO);
        let mut tasks = TaskScheduler::new();

        tasks.start("forcepos", ConvergenceTask::new(raft, Vec2::new(0.0, -5000.0), 100.0));
        tasks.step(&mut world);
        assert_eq!(world.vehicle(raft).unwrap().velocity, Vec2::new(0.0, -100.0));

        tasks.start("forcepos", ConvergenceTask::new(raft, Vec2::new(0.0, 5000.0), 100.0));
        assert_eq!(tasks.count("forcepos"), 1);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks.started(), 2);

        // Only the replacement runs.
        tasks.step(&mut world);
        assert_eq!(world.vehicle(raft).unwrap().velocity, Vec2::new(0.0, 100.0));
    }

    #[test]
    fn stop_cancels_without_completion_step() {
        let (mut world, raft) = make_world(Vec2::ZERO);
        let mut tasks = TaskScheduler::new();
        tasks.start("forcepos", ConvergenceTask::new(raft, Vec2::new(0.0, 5000.0), 100.0));
        tasks.step(&mut world);
        assert!(ignores_shaft(&world, raft));

        assert!(tasks.stop("forcepos"));
        assert!(!tasks.stop("forcepos"));
        assert!(tasks.is_empty());
        // The cancelled task never restored the exception.
        assert!(ignores_shaft(&world, raft));
    }

    #[test]
    fn finished_tasks_are_dropped() {
        let (mut world, raft) = make_world(Vec2::ZERO);
        let mut tasks = TaskScheduler::new();
        tasks.start("a", ConvergenceTask::new(raft, Vec2::ZERO, 100.0));
        tasks.start("b", ConvergenceTask::new(raft, Vec2::new(0.0, 1000.0), 100.0));
        assert!(tasks.is_running("a") && tasks.is_running("b"));

        tasks.step(&mut world);
        assert!(!tasks.is_running("a"));
        assert!(tasks.is_running("b"));
    }
}
