//! Per-session heartbeat retry state.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use txlink_core::SessionKey;

/// Liveness state of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeartbeatState {
    /// No failed probe so far
    #[default]
    Healthy,

    /// `n` failed probes, below the retry budget
    Degraded(u32),

    /// Retry budget exhausted; the session has been released
    Evicted,
}

impl HeartbeatState {
    /// Failed probes counted toward the budget; evicted sessions report 0.
    pub fn retries(self) -> u32 {
        match self {
            Self::Healthy => 0,
            Self::Degraded(n) => n,
            Self::Evicted => 0,
        }
    }
}

/// Result of recording a failed probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Still within budget; counter is now `n`
    Degraded(u32),

    /// This failure exhausted the budget; caller must release the session
    Evicted,

    /// The session was evicted by an earlier failure
    AlreadyEvicted,
}

/// Why a heartbeat could not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatRefused {
    /// The session was evicted and gets no more heartbeats
    Evicted,

    /// Another tick's heartbeat for this session has not finished yet
    InFlight,
}

#[derive(Debug, Default)]
struct TrackerState {
    retries: HashMap<SessionKey, HeartbeatState>,
    in_flight: HashSet<SessionKey>,
}

/// Tracks heartbeat retry counters keyed by session.
///
/// A session with no entry is `Healthy`. At most one heartbeat per session
/// is outstanding: [`begin_heartbeat`](Self::begin_heartbeat) reserves the
/// slot and the returned [`HeartbeatSlot`] holds it across the send and the
/// failure count. Overlapping ticks therefore never reach an evicted session
/// or overshoot the retry budget.
#[derive(Debug)]
pub struct HeartbeatTracker {
    max_retries: u32,
    state: Mutex<TrackerState>,
}

/// Exclusive right to send one heartbeat to a session, released on drop.
#[derive(Debug)]
pub struct HeartbeatSlot<'a> {
    tracker: &'a HeartbeatTracker,
    session: SessionKey,
}

impl HeartbeatSlot<'_> {
    /// Records that this heartbeat could not be sent.
    pub fn record_failure(&self) -> FailureOutcome {
        self.tracker.record_failure(&self.session)
    }
}

impl Drop for HeartbeatSlot<'_> {
    fn drop(&mut self) {
        self.tracker.state.lock().in_flight.remove(&self.session);
    }
}

impl HeartbeatTracker {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries: max_retries.max(1),
            state: Mutex::new(TrackerState::default()),
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn state(&self, session: &SessionKey) -> HeartbeatState {
        self.state
            .lock()
            .retries
            .get(session)
            .copied()
            .unwrap_or_default()
    }

    pub fn is_evicted(&self, session: &SessionKey) -> bool {
        self.state(session) == HeartbeatState::Evicted
    }

    /// Reserves the heartbeat slot for `session`.
    pub fn begin_heartbeat(
        &self,
        session: &SessionKey,
    ) -> Result<HeartbeatSlot<'_>, HeartbeatRefused> {
        let mut state = self.state.lock();
        if state.retries.get(session) == Some(&HeartbeatState::Evicted) {
            return Err(HeartbeatRefused::Evicted);
        }
        if !state.in_flight.insert(session.clone()) {
            return Err(HeartbeatRefused::InFlight);
        }
        Ok(HeartbeatSlot {
            tracker: self,
            session: session.clone(),
        })
    }

    /// Records a failed probe send.
    pub fn record_failure(&self, session: &SessionKey) -> FailureOutcome {
        let mut state = self.state.lock();
        let states = &mut state.retries;
        let current = states.get(session).copied().unwrap_or_default();

        let retries = match current {
            HeartbeatState::Evicted => return FailureOutcome::AlreadyEvicted,
            other => other.retries().saturating_add(1),
        };

        if retries >= self.max_retries {
            states.insert(session.clone(), HeartbeatState::Evicted);
            FailureOutcome::Evicted
        } else {
            states.insert(session.clone(), HeartbeatState::Degraded(retries));
            FailureOutcome::Degraded(retries)
        }
    }

    /// Drops all state for a session.
    pub fn clear(&self, session: &SessionKey) {
        self.state.lock().retries.remove(session);
    }

    /// Number of sessions with non-default state.
    pub fn tracked(&self) -> usize {
        self.state.lock().retries.len()
    }
}
