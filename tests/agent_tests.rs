//! RespawnAgent tests

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Result};
    use bytes::Bytes;
    use parking_lot::{Mutex, RwLock};
    use shuttle_respawn::{
        agent::{AgentConfig, EventSink, MemorySink, RespawnAgent},
        config::RespawnConfig,
        coordinator::RespawnAuthority,
        prefab::PrefabCatalog,
        protocol::{
            subjects, NoticeKind, RespawnEvent, RespawnStatus, ServerNotice, ShuttleDispatched,
        },
        session::{LocalSession, Participant},
        template::VehicleTemplate,
        types::{ParticipantId, RespawnState, Vec2},
        world::{Level, World},
    };
    use std::sync::Arc;

    fn make_authority(participants: u64) -> Arc<Mutex<RespawnAuthority<LocalSession>>> {
        let world = World::new(Level::new(
            Vec2::new(0.0, 1000.0),
            Vec2::new(5000.0, 2000.0),
            300.0,
        ));
        let mut session = LocalSession::new();
        for i in 0..participants {
            session.add_participant(Participant::new(ParticipantId(i), format!("diver{i}")));
        }
        let authority = RespawnAuthority::new(
            RespawnConfig::new(3.0, 10.0, 0.5),
            Arc::new(RwLock::new(world)),
            Arc::new(PrefabCatalog::with_defaults()),
            session,
            &VehicleTemplate::respawn_shuttle(),
            None,
        )
        .unwrap();
        Arc::new(Mutex::new(authority))
    }

    fn agent_config(tick_rate_hz: f32) -> AgentConfig {
        AgentConfig {
            session: "test".into(),
            tick_rate_hz,
        }
    }

    struct FailingSink;

    impl EventSink for FailingSink {
        fn publish(&self, _subject: &str, _payload: Bytes) -> Result<()> {
            Err(anyhow!("bus unavailable"))
        }
    }

    // -----------------------------------------------------------------------
    // Publishing
    // -----------------------------------------------------------------------

    #[test]
    fn status_is_published_only_on_change() {
        let sink = Arc::new(MemorySink::new());
        let mut agent = RespawnAgent::new(agent_config(1.0), make_authority(2), sink.clone());

        agent.tick();
        agent.tick();
        assert_eq!(sink.subjects(), [subjects::STATUS]);

        let events = sink.events();
        let event: RespawnEvent<RespawnStatus> = serde_json::from_slice(&events[0].1).unwrap();
        assert_eq!(event.session, "test");
        assert_eq!(event.frame, 1);
        assert!(event.payload.countdown_started);
        assert_eq!(event.payload.state, RespawnState::Waiting);
    }

    #[test]
    fn dispatch_publishes_status_event_and_notice() {
        let sink = Arc::new(MemorySink::new());
        let mut agent = RespawnAgent::new(agent_config(1.0), make_authority(2), sink.clone());

        for _ in 0..3 {
            agent.tick();
        }
        assert_eq!(
            sink.subjects(),
            [
                subjects::STATUS,
                subjects::STATUS,
                subjects::DISPATCHED,
                subjects::NOTICE
            ]
        );

        let events = sink.events();
        let status: RespawnEvent<RespawnStatus> = serde_json::from_slice(&events[1].1).unwrap();
        assert_eq!(status.payload.state, RespawnState::Transporting);

        let dispatched: RespawnEvent<ShuttleDispatched> =
            serde_json::from_slice(&events[2].1).unwrap();
        assert_eq!(dispatched.frame, 3);
        assert_eq!(
            dispatched.payload.participants,
            [ParticipantId(0), ParticipantId(1)]
        );
        assert!(!dispatched.payload.local_revived);

        let notice: RespawnEvent<ServerNotice> = serde_json::from_slice(&events[3].1).unwrap();
        assert_eq!(notice.payload.kind, NoticeKind::Dispatched);

        assert_eq!(agent.stats().dispatches, 1);
        assert_eq!(agent.stats().characters_spawned, 2);
    }

    #[test]
    fn failed_publish_does_not_stop_ticking() {
        let authority = make_authority(1);
        let mut agent =
            RespawnAgent::new(agent_config(1.0), authority.clone(), Arc::new(FailingSink));
        for _ in 0..5 {
            agent.tick();
        }
        assert_eq!(agent.frame(), 5);
        assert_eq!(authority.lock().stats().dispatches, 1);
    }

    // -----------------------------------------------------------------------
    // Async driver
    // -----------------------------------------------------------------------

    #[test]
    fn run_for_ticks_requested_number_of_frames() {
        let sink = Arc::new(MemorySink::new());
        let mut agent = RespawnAgent::new(agent_config(1000.0), make_authority(1), sink.clone());
        tokio_test::block_on(agent.run_for(5));
        assert_eq!(agent.frame(), 5);
        assert_eq!(agent.stats().total_ticks, 5);
        assert_eq!(sink.subjects(), [subjects::STATUS]);
    }
}
