//! The hosting session as seen by the respawn coordinator: the participant
//! roster, job assignment, crew registration and server notices.
//!
//! [`SessionHost`] is the seam to the game server. [`LocalSession`] is a
//! self-contained implementation that keeps everything in memory and queues
//! outbound notices and dispatch events for an agent to publish.

use crate::entity::CharacterInfo;
use crate::protocol::{ServerNotice, ShuttleDispatched};
use crate::types::{EntityId, ParticipantId};
use log::info;

/// A connected remote participant.
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: ParticipantId,
    /// Whether the participant has finished loading into the round.
    pub in_game: bool,
    pub character: Option<EntityId>,
    pub info: CharacterInfo,
}

impl Participant {
    pub fn new(id: ParticipantId, name: impl Into<String>) -> Self {
        Self {
            id,
            in_game: true,
            character: None,
            info: CharacterInfo::new(name),
        }
    }
}

/// The participant playing on the hosting machine itself.
#[derive(Debug, Clone)]
pub struct LocalParticipant {
    pub character: Option<EntityId>,
    pub info: CharacterInfo,
}

/// Who a freshly created character belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnTarget {
    Participant(ParticipantId),
    Local,
}

pub trait SessionHost {
    /// Every connected remote participant.
    fn participants(&self) -> &[Participant];

    /// The hosting participant, if the host plays too.
    fn local_participant(&self) -> Option<&LocalParticipant>;

    /// Give each of `participants` a job before they are spawned.
    fn assign_jobs(&mut self, participants: &[ParticipantId]);

    /// Hand control of `character` to `target`.
    fn assign_character(&mut self, target: SpawnTarget, character: EntityId);

    /// Register a revived character with the crew.
    fn add_to_crew(&mut self, character: EntityId);

    /// Drop a character left aboard when the shuttle is reset. Removing the
    /// corpse itself is up to the host.
    fn remove_from_crew(&mut self, _character: EntityId) {}

    /// Broadcast a server chat notice to every participant.
    fn broadcast_notice(&mut self, notice: ServerNotice);

    /// Called once per dispatch, after every character has been created.
    fn shuttle_dispatched(&mut self, _event: &ShuttleDispatched) {}

    fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants().iter().find(|p| p.id == id)
    }
}

// ---------------------------------------------------------------------------
// In-memory session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct LocalSession {
    participants: Vec<Participant>,
    local: Option<LocalParticipant>,
    /// Jobs handed out in turn to participants without one.
    job_pool: Vec<String>,
    next_job: usize,
    crew: Vec<EntityId>,
    notices: Vec<ServerNotice>,
    dispatches: Vec<ShuttleDispatched>,
}

impl LocalSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_job_pool(mut self, jobs: &[&str]) -> Self {
        self.job_pool = jobs.iter().map(|j| j.to_string()).collect();
        self
    }

    pub fn add_participant(&mut self, participant: Participant) {
        self.participants.push(participant);
    }

    pub fn remove_participant(&mut self, id: ParticipantId) -> Option<Participant> {
        let index = self.participants.iter().position(|p| p.id == id)?;
        Some(self.participants.remove(index))
    }

    pub fn participant_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.id == id)
    }

    pub fn set_local(&mut self, local: Option<LocalParticipant>) {
        self.local = local;
    }

    pub fn local_mut(&mut self) -> Option<&mut LocalParticipant> {
        self.local.as_mut()
    }

    pub fn crew(&self) -> &[EntityId] {
        &self.crew
    }

    pub fn notices(&self) -> &[ServerNotice] {
        &self.notices
    }

    pub fn drain_notices(&mut self) -> Vec<ServerNotice> {
        std::mem::take(&mut self.notices)
    }

    pub fn drain_dispatches(&mut self) -> Vec<ShuttleDispatched> {
        std::mem::take(&mut self.dispatches)
    }
}

impl SessionHost for LocalSession {
    fn participants(&self) -> &[Participant] {
        &self.participants
    }

    fn local_participant(&self) -> Option<&LocalParticipant> {
        self.local.as_ref()
    }

    fn assign_jobs(&mut self, participants: &[ParticipantId]) {
        if self.job_pool.is_empty() {
            return;
        }
        for id in participants {
            let job = self.job_pool[self.next_job % self.job_pool.len()].clone();
            if let Some(p) = self.participants.iter_mut().find(|p| p.id == *id) {
                if p.info.job.is_none() {
                    p.info.job = Some(job);
                    self.next_job += 1;
                }
            }
        }
    }

    fn assign_character(&mut self, target: SpawnTarget, character: EntityId) {
        match target {
            SpawnTarget::Participant(id) => {
                if let Some(p) = self.participant_mut(id) {
                    p.character = Some(character);
                }
            }
            SpawnTarget::Local => {
                if let Some(local) = self.local.as_mut() {
                    local.character = Some(character);
                }
            }
        }
    }

    fn add_to_crew(&mut self, character: EntityId) {
        self.crew.push(character);
    }

    fn remove_from_crew(&mut self, character: EntityId) {
        self.crew.retain(|&c| c != character);
    }

    fn broadcast_notice(&mut self, notice: ServerNotice) {
        info!("[Server] {}", notice.text);
        self.notices.push(notice);
    }

    fn shuttle_dispatched(&mut self, event: &ShuttleDispatched) {
        self.dispatches.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jobs_are_dealt_round_robin_to_jobless_participants() {
        let mut session = LocalSession::new().with_job_pool(&["captain", "engineer"]);
        for i in 0..3 {
            session.add_participant(Participant::new(ParticipantId(i), format!("p{i}")));
        }
        session
            .participant_mut(ParticipantId(1))
            .unwrap()
            .info
            .job = Some("medicaldoctor".into());

        session.assign_jobs(&[ParticipantId(0), ParticipantId(1), ParticipantId(2)]);
        let jobs: Vec<_> = session
            .participants()
            .iter()
            .map(|p| p.info.job.clone().unwrap())
            .collect();
        assert_eq!(jobs, ["captain", "medicaldoctor", "engineer"]);
    }

    #[test]
    fn assign_character_updates_roster() {
        let mut session = LocalSession::new();
        session.add_participant(Participant::new(ParticipantId(9), "nine"));
        session.set_local(Some(LocalParticipant {
            character: None,
            info: CharacterInfo::new("host"),
        }));

        session.assign_character(SpawnTarget::Participant(ParticipantId(9)), EntityId(4));
        session.assign_character(SpawnTarget::Local, EntityId(5));
        assert_eq!(
            session.participant(ParticipantId(9)).unwrap().character,
            Some(EntityId(4))
        );
        assert_eq!(
            session.local_participant().unwrap().character,
            Some(EntityId(5))
        );
    }

    #[test]
    fn crew_members_can_be_dropped() {
        let mut session = LocalSession::new();
        for id in [3, 4, 5] {
            session.add_to_crew(EntityId(id));
        }
        session.remove_from_crew(EntityId(4));
        session.remove_from_crew(EntityId(42));
        assert_eq!(session.crew(), [EntityId(3), EntityId(5)]);
    }
}
