//! Timer bookkeeping for one session.
//!
//! The coordinator never sleeps. It records arm/disarm requests here and the
//! runner turns them into real sleeps that report back as
//! `GameCommand::Timeout`. A timeout only counts if [`TimerBook::claim`]
//! still finds it armed, which makes a late firing after cancellation a
//! no-op.

use std::collections::HashMap;
use std::time::Duration;

use crate::domain::seat::PlayerId;
use crate::domain::state::TimerId;

/// What a timer resolves when it fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerKind {
    Pick,
    Select(PlayerId),
    Judgment,
    NextRound,
}

/// Scheduling instruction for the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerRequest {
    Arm { id: TimerId, after: Duration },
    Disarm { id: TimerId },
}

#[derive(Debug, Default)]
pub struct TimerBook {
    next_id: u64,
    armed: HashMap<TimerId, TimerKind>,
    requests: Vec<TimerRequest>,
}

impl TimerBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, kind: TimerKind, after: Duration) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.armed.insert(id, kind);
        self.requests.push(TimerRequest::Arm { id, after });
        id
    }

    /// Cancel every armed timer of `kind`.
    pub fn disarm_kind(&mut self, kind: &TimerKind) {
        let ids: Vec<TimerId> = self
            .armed
            .iter()
            .filter(|(_, k)| *k == kind)
            .map(|(id, _)| *id)
            .collect();
        for id in ids {
            self.disarm(id);
        }
    }

    pub fn disarm(&mut self, id: TimerId) {
        if self.armed.remove(&id).is_some() {
            self.requests.push(TimerRequest::Disarm { id });
        }
    }

    pub fn disarm_all(&mut self) {
        let mut ids: Vec<TimerId> = self.armed.keys().copied().collect();
        ids.sort();
        for id in ids {
            self.disarm(id);
        }
    }

    /// Consume a fired timer. `None` when it was cancelled in the meantime.
    pub fn claim(&mut self, id: TimerId) -> Option<TimerKind> {
        self.armed.remove(&id)
    }

    /// Id of the armed timer of `kind`, if exactly that timer is pending.
    pub fn armed_id(&self, kind: &TimerKind) -> Option<TimerId> {
        self.armed
            .iter()
            .find(|(_, k)| *k == kind)
            .map(|(id, _)| *id)
    }

    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    pub fn take_requests(&mut self) -> Vec<TimerRequest> {
        std::mem::take(&mut self.requests)
    }
}
