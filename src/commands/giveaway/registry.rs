use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::commands::giveaway::formatters::GiveawayRenderer;
use crate::commands::giveaway::models::{GiveawayOutcome, GiveawayRun, RunSnapshot, RunStatus};
use crate::commands::giveaway::scheduler::RunTimers;
use crate::error::{Error, Result};

struct RunEntry {
    run: Arc<Mutex<GiveawayRun>>,
    renderer: Arc<dyn GiveawayRenderer>,
    timers: Option<RunTimers>,
}

// Holds every run known to the process, keyed by run id, with a secondary
// index from the hosting Discord message. Timer tasks reference runs only
// through this registry, so dropping a run never leaks timer state.
#[non_exhaustive]
pub struct GiveawayRegistry {
    runs: DashMap<Uuid, RunEntry>,
    messages: DashMap<u64, Uuid>,
}

impl GiveawayRegistry {
    pub fn new() -> Self {
        GiveawayRegistry {
            runs: DashMap::new(),
            messages: DashMap::new(),
        }
    }

    pub fn register(&self, run: GiveawayRun, renderer: Arc<dyn GiveawayRenderer>) -> Uuid {
        let run_id = run.id();
        if let Some(message_id) = run.message_id() {
            self.messages.insert(message_id, run_id);
        }

        let entry = RunEntry {
            run: Arc::new(Mutex::new(run)),
            renderer,
            timers: None,
        };
        self.runs.insert(run_id, entry);
        run_id
    }

    pub fn renderer(&self, run_id: Uuid) -> Result<Arc<dyn GiveawayRenderer>> {
        self.runs
            .get(&run_id)
            .map(|entry| entry.renderer.clone())
            .ok_or(Error::GiveawayNotFound)
    }

    // Stores the timer handles for the run once both tasks are spawned.
    pub fn set_timers(&self, run_id: Uuid, timers: RunTimers) {
        if let Some(mut entry) = self.runs.get_mut(&run_id) {
            entry.timers = Some(timers);
        }
    }

    // Takes the timer handles out of the registry, leaving the run itself
    // in place. Used to cancel whatever is still pending on an end.
    pub fn take_timers(&self, run_id: Uuid) -> Option<RunTimers> {
        self.runs
            .get_mut(&run_id)
            .and_then(|mut entry| entry.timers.take())
    }

    pub fn find_by_message(&self, message_id: u64) -> Result<Uuid> {
        self.messages
            .get(&message_id)
            .map(|pair| *pair.value())
            .ok_or(Error::GiveawayNotFound)
    }

    pub fn join(&self, run_id: Uuid, user_id: u64) -> Result<RunSnapshot> {
        let run = self.get_run(run_id)?;
        let mut guard_run = run.lock().unwrap();
        guard_run.join(user_id)
    }

    pub fn leave(&self, run_id: Uuid, user_id: u64) -> Result<RunSnapshot> {
        let run = self.get_run(run_id)?;
        let mut guard_run = run.lock().unwrap();
        guard_run.leave(user_id)
    }

    // Transitions the run to the terminal state and draws the winners.
    // Returns None when the run has already ended.
    pub fn end_run(&self, run_id: Uuid) -> Result<Option<GiveawayOutcome>> {
        let run = self.get_run(run_id)?;
        let mut guard_run = run.lock().unwrap();
        Ok(guard_run.end())
    }

    pub fn snapshot(&self, run_id: Uuid) -> Result<RunSnapshot> {
        let run = self.get_run(run_id)?;
        let guard_run = run.lock().unwrap();
        Ok(guard_run.snapshot())
    }

    pub fn is_open(&self, run_id: Uuid) -> bool {
        match self.get_run(run_id) {
            Ok(run) => run.lock().unwrap().status() == RunStatus::Open,
            Err(_) => false,
        }
    }

    // Returns pretty-printed lines for every open run, soonest deadline first.
    pub fn list_open(&self) -> Vec<String> {
        let mut open_runs = self
            .runs
            .iter()
            .filter_map(|entry| {
                let guard_run = entry.run.lock().unwrap();
                match guard_run.status() {
                    RunStatus::Open => Some((guard_run.ends_at(), guard_run.pretty_print())),
                    RunStatus::Ended => None,
                }
            })
            .collect::<Vec<(OffsetDateTime, String)>>();

        open_runs.sort_by_key(|(ends_at, _)| *ends_at);
        open_runs.into_iter().map(|(_, line)| line).collect()
    }

    fn get_run(&self, run_id: Uuid) -> Result<Arc<Mutex<GiveawayRun>>> {
        self.runs
            .get(&run_id)
            .map(|entry| entry.run.clone())
            .ok_or(Error::GiveawayNotFound)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serenity::async_trait;
    use uuid::Uuid;

    use crate::commands::giveaway::formatters::GiveawayRenderer;
    use crate::commands::giveaway::models::{GiveawayOutcome, GiveawayRun};
    use crate::commands::giveaway::registry::GiveawayRegistry;
    use crate::error::{Error, Result};

    struct NullRenderer;

    #[async_trait]
    impl GiveawayRenderer for NullRenderer {
        async fn render_reminder(&self, _name: &str) -> Result<()> {
            Ok(())
        }

        async fn render_result(&self, _outcome: &GiveawayOutcome) -> Result<()> {
            Ok(())
        }
    }

    fn register_run(registry: &GiveawayRegistry, message_id: Option<u64>) -> Uuid {
        let (mut run, _) = GiveawayRun::new("test giveaway", 2, "10m").unwrap();
        if let Some(message_id) = message_id {
            run.set_message_id(message_id);
        }
        registry.register(run, Arc::new(NullRenderer))
    }

    #[test]
    fn test_register_and_read_snapshot() {
        let registry = GiveawayRegistry::new();
        let run_id = register_run(&registry, None);

        let state = registry.snapshot(run_id).unwrap();
        assert_eq!(state.name, "test giveaway");
        assert_eq!(state.winner_count, 2);
        assert_eq!(state.joiners, 0);
        assert_eq!(registry.is_open(run_id), true);
    }

    #[test]
    fn test_join_and_leave_through_the_registry() {
        let registry = GiveawayRegistry::new();
        let run_id = register_run(&registry, None);

        let state = registry.join(run_id, 1).unwrap();
        assert_eq!(state.joiners, 1);

        let state = registry.leave(run_id, 1).unwrap();
        assert_eq!(state.joiners, 0);
        assert_eq!(state.leavers, 1);
    }

    #[test]
    fn test_find_run_by_message() {
        let registry = GiveawayRegistry::new();
        let run_id = register_run(&registry, Some(100500));

        assert_eq!(registry.find_by_message(100500).unwrap(), run_id);
    }

    #[test]
    fn test_get_error_for_unknown_message() {
        let registry = GiveawayRegistry::new();
        register_run(&registry, Some(100500));

        let result = registry.find_by_message(42);
        assert_eq!(result.unwrap_err(), Error::GiveawayNotFound);
    }

    #[test]
    fn test_get_error_for_unknown_run() {
        let registry = GiveawayRegistry::new();

        let result = registry.join(Uuid::new_v4(), 1);
        assert_eq!(result.unwrap_err(), Error::GiveawayNotFound);
    }

    #[test]
    fn test_end_run_returns_the_outcome_exactly_once() {
        let registry = GiveawayRegistry::new();
        let run_id = register_run(&registry, None);
        registry.join(run_id, 1).unwrap();

        let outcome = registry.end_run(run_id).unwrap();
        assert_eq!(outcome.is_some(), true);
        assert_eq!(registry.is_open(run_id), false);

        let outcome = registry.end_run(run_id).unwrap();
        assert_eq!(outcome.is_none(), true);
    }

    #[test]
    fn test_join_fails_after_the_run_has_ended() {
        let registry = GiveawayRegistry::new();
        let run_id = register_run(&registry, None);
        registry.end_run(run_id).unwrap();

        let result = registry.join(run_id, 1);
        assert_eq!(result.unwrap_err(), Error::GiveawayClosed);
    }

    #[test]
    fn test_list_open_skips_ended_runs() {
        let registry = GiveawayRegistry::new();
        let first = register_run(&registry, None);
        register_run(&registry, None);
        assert_eq!(registry.list_open().len(), 2);

        registry.end_run(first).unwrap();
        assert_eq!(registry.list_open().len(), 1);
    }
}
