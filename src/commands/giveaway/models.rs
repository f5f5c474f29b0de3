use std::collections::HashSet;

use rand::seq::SliceRandom;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::commands::giveaway::parser::parse_duration;
use crate::error::{Error, Result};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RunStatus {
    // The giveaway collects join/leave requests.
    Open,
    // The deadline has passed (or an administrator stopped the run) and
    // the winners have been drawn. Terminal.
    Ended,
}

// A point-in-time view of an open run, handed to the rendering layer after
// every accepted mutation.
#[readonly::make]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunSnapshot {
    pub name: String,
    pub ends_at: OffsetDateTime,
    pub winner_count: usize,
    pub joiners: usize,
    pub leavers: usize,
}

// The terminal result of a run: drawn winners and the participation numbers
// at the moment the run was closed.
#[readonly::make]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GiveawayOutcome {
    pub name: String,
    pub winners: Vec<u64>,
    pub joiners: usize,
    pub leavers: usize,
}

// One timed giveaway. The struct exclusively owns its participant sets;
// all mutation goes through the join/leave/end methods, and the registry
// serializes those calls behind a mutex.
#[derive(Debug)]
pub struct GiveawayRun {
    id: Uuid,
    name: String,
    winner_count: usize,
    started_at: OffsetDateTime,
    ends_at: OffsetDateTime,
    // Invariant: `joiners` and `leavers` are disjoint at all times.
    joiners: HashSet<u64>,
    leavers: HashSet<u64>,
    status: RunStatus,
    message_id: Option<u64>,
}

impl GiveawayRun {
    // Validates the free-text duration and the raw winner count, then builds
    // a run in the `Open` state. Returns the parsed duration alongside so the
    // caller can schedule the deadline and reminder timers.
    pub fn new(name: &str, winner_count: i64, duration_text: &str) -> Result<(Self, std::time::Duration)> {
        let duration = parse_duration(duration_text)?;
        if winner_count < 0 {
            let message = format!("{} is not a non-negative integer.", winner_count);
            return Err(Error::InvalidWinnerCount(message));
        }

        let started_at = OffsetDateTime::now_utc();
        let run = GiveawayRun {
            id: Uuid::new_v4(),
            name: name.to_string(),
            winner_count: winner_count as usize,
            started_at,
            ends_at: started_at + duration,
            joiners: HashSet::new(),
            leavers: HashSet::new(),
            status: RunStatus::Open,
            message_id: None,
        };
        Ok((run, duration))
    }

    // Returns a unique identifier of the run.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn started_at(&self) -> OffsetDateTime {
        self.started_at
    }

    pub fn ends_at(&self) -> OffsetDateTime {
        self.ends_at
    }

    // Returns a reference to the Discord message that hosts the giveaway.
    pub fn message_id(&self) -> Option<u64> {
        self.message_id
    }

    // Binds the run to the message that was sent for it.
    pub fn set_message_id(&mut self, message_id: u64) {
        self.message_id = Some(message_id);
    }

    // Registers the user as a participant. Re-joining after a leave makes
    // the user eligible again.
    pub fn join(&mut self, user_id: u64) -> Result<RunSnapshot> {
        self.ensure_open()?;

        if self.joiners.contains(&user_id) {
            return Err(Error::AlreadyJoined);
        }

        self.leavers.remove(&user_id);
        self.joiners.insert(user_id);
        Ok(self.snapshot())
    }

    // Withdraws the user from the run. Only users who actually joined
    // can leave.
    pub fn leave(&mut self, user_id: u64) -> Result<RunSnapshot> {
        self.ensure_open()?;

        if !self.joiners.remove(&user_id) {
            return Err(Error::NotJoined);
        }

        self.leavers.insert(user_id);
        Ok(self.snapshot())
    }

    // Closes the run and draws `min(winner_count, joiners)` distinct winners
    // uniformly at random without replacement. Returns None when the run has
    // already ended, which makes a late deadline timer a no-op.
    pub fn end(&mut self) -> Option<GiveawayOutcome> {
        if self.status == RunStatus::Ended {
            return None;
        }
        self.status = RunStatus::Ended;

        let eligible = self.joiners.iter().copied().collect::<Vec<u64>>();
        let amount = self.winner_count.min(eligible.len());
        let winners = eligible
            .choose_multiple(&mut rand::thread_rng(), amount)
            .copied()
            .collect::<Vec<u64>>();

        Some(GiveawayOutcome {
            name: self.name.clone(),
            winners,
            joiners: self.joiners.len(),
            leavers: self.leavers.len(),
        })
    }

    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            name: self.name.clone(),
            ends_at: self.ends_at,
            winner_count: self.winner_count,
            joiners: self.joiners.len(),
            leavers: self.leavers.len(),
        }
    }

    // Pretty-print of the giveaway in the text messages.
    pub fn pretty_print(&self) -> String {
        format!(
            "{} [ends <t:{}:R>, {} joined]",
            self.name,
            self.ends_at.unix_timestamp(),
            self.joiners.len(),
        )
    }

    fn ensure_open(&self) -> Result<()> {
        match self.status {
            RunStatus::Open => Ok(()),
            RunStatus::Ended => Err(Error::GiveawayClosed),
        }
    }
}
