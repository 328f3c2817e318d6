//! The role-independent respawn interface and the observer implementation.
//!
//! The hosting server runs a [`RespawnAuthority`](crate::coordinator::RespawnAuthority);
//! every other participant runs a [`RespawnObserver`], which only mirrors the
//! replicated [`RespawnStatus`] and ticks the dispatch countdown locally so a
//! UI can show it smoothly between status updates.

use crate::protocol::RespawnStatus;
use crate::types::RespawnState;

/// Anything that can be advanced per tick and queried for respawn state.
pub trait RespawnManager {
    /// Advance by `delta_time` seconds.
    fn update(&mut self, delta_time: f32);

    fn status(&self) -> RespawnStatus;

    fn current_state(&self) -> RespawnState {
        self.status().state
    }

    fn respawn_timer(&self) -> f32 {
        self.status().respawn_timer
    }

    fn transport_timer(&self) -> f32 {
        self.status().transport_timer
    }

    fn countdown_started(&self) -> bool {
        self.status().countdown_started
    }
}

// ---------------------------------------------------------------------------
// Observer
// ---------------------------------------------------------------------------

/// Read-only view of a remote authority.
///
/// Never transitions state on its own; state only changes through
/// [`RespawnObserver::apply_status`].
#[derive(Debug, Clone, Default)]
pub struct RespawnObserver {
    status: RespawnStatus,
}

impl RespawnObserver {
    pub fn new(respawn_interval: f32) -> Self {
        Self {
            status: RespawnStatus {
                respawn_timer: respawn_interval,
                ..Default::default()
            },
        }
    }

    /// Replace the mirrored state with an authoritative update.
    pub fn apply_status(&mut self, status: RespawnStatus) {
        self.status = status;
    }
}

impl RespawnManager for RespawnObserver {
    fn update(&mut self, delta_time: f32) {
        if self.status.state == RespawnState::Waiting && self.status.countdown_started {
            self.status.respawn_timer = (self.status.respawn_timer - delta_time).max(0.0);
        }
    }

    fn status(&self) -> RespawnStatus {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observer_counts_down_only_when_started() {
        let mut obs = RespawnObserver::new(60.0);
        obs.update(5.0);
        assert_eq!(obs.respawn_timer(), 60.0);

        obs.apply_status(RespawnStatus {
            countdown_started: true,
            respawn_timer: 10.0,
            ..Default::default()
        });
        obs.update(4.0);
        assert_eq!(obs.respawn_timer(), 6.0);
        obs.update(100.0);
        assert_eq!(obs.respawn_timer(), 0.0);
        // The observer never dispatches by itself.
        assert_eq!(obs.current_state(), RespawnState::Waiting);
    }

    #[test]
    fn observer_does_not_count_down_outside_waiting() {
        let mut obs = RespawnObserver::new(60.0);
        obs.apply_status(RespawnStatus {
            state: RespawnState::Transporting,
            countdown_started: true,
            respawn_timer: 30.0,
            transport_timer: 120.0,
        });
        obs.update(10.0);
        assert_eq!(obs.respawn_timer(), 30.0);
        assert_eq!(obs.transport_timer(), 120.0);
    }
}
