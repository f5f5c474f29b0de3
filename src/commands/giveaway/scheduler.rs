use std::sync::Arc;
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::sleep;
use tracing::{error, info};
use uuid::Uuid;

use crate::commands::giveaway::registry::GiveawayRegistry;
use crate::error::Result;

// The reminder is sent this long before the deadline, and only when the
// run lasts longer than that.
pub const REMINDER_LEAD: Duration = Duration::from_secs(5 * 60);

// Abort handles for the two timer tasks of a run. The handles live in the
// registry so an early end can cancel whatever is still pending.
pub struct RunTimers {
    deadline: AbortHandle,
    reminder: Option<AbortHandle>,
}

impl RunTimers {
    pub fn abort_reminder(&self) {
        if let Some(handle) = &self.reminder {
            handle.abort();
        }
    }

    pub fn abort_all(&self) {
        self.abort_reminder();
        self.deadline.abort();
    }
}

// Spawns the deadline task and, for runs longer than the lead time, the
// one-shot reminder task. Both tasks hold only the run id and look the run
// up again when they fire, so they no-op if it is gone or already ended.
pub fn schedule_run(registry: Arc<GiveawayRegistry>, run_id: Uuid, duration: Duration) -> RunTimers {
    let deadline_registry = registry.clone();
    let deadline = tokio::spawn(async move {
        sleep(duration).await;
        match conclude(&deadline_registry, run_id, false).await {
            Ok(true) => info!("Giveaway {} has reached its deadline", run_id),
            Ok(false) => (),
            Err(err) => error!("Can't conclude giveaway {}: {}", run_id, err),
        }
    })
    .abort_handle();

    let reminder = match duration.checked_sub(REMINDER_LEAD) {
        Some(lead) if !lead.is_zero() => {
            let handle = tokio::spawn(async move {
                sleep(lead).await;
                remind(&registry, run_id).await;
            })
            .abort_handle();
            Some(handle)
        }
        _ => None,
    };

    RunTimers { deadline, reminder }
}

// Ends the run, cancels the timers that are still pending and announces the
// winners. Set `cancel_deadline` when the caller is not the deadline task
// itself. Returns Ok(false) when the run had already ended.
pub async fn conclude(
    registry: &GiveawayRegistry,
    run_id: Uuid,
    cancel_deadline: bool,
) -> Result<bool> {
    let outcome = match registry.end_run(run_id)? {
        Some(outcome) => outcome,
        None => return Ok(false),
    };

    if let Some(timers) = registry.take_timers(run_id) {
        match cancel_deadline {
            true => timers.abort_all(),
            false => timers.abort_reminder(),
        }
    }

    // The state transition above is already committed; the announcement
    // sits on top of it and its failure never reopens the run.
    let renderer = registry.renderer(run_id)?;
    renderer.render_result(&outcome).await?;
    Ok(true)
}

async fn remind(registry: &GiveawayRegistry, run_id: Uuid) {
    if !registry.is_open(run_id) {
        return;
    }

    let name = match registry.snapshot(run_id) {
        Ok(state) => state.name.clone(),
        Err(_) => return,
    };

    let renderer = match registry.renderer(run_id) {
        Ok(renderer) => renderer,
        Err(_) => return,
    };

    if let Err(err) = renderer.render_reminder(&name).await {
        error!("Can't send the reminder for giveaway {}: {}", run_id, err);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use serenity::async_trait;
    use tokio::time::sleep;
    use uuid::Uuid;

    use crate::commands::giveaway::formatters::GiveawayRenderer;
    use crate::commands::giveaway::models::{GiveawayOutcome, GiveawayRun};
    use crate::commands::giveaway::registry::GiveawayRegistry;
    use crate::commands::giveaway::scheduler::{conclude, schedule_run};
    use crate::error::Result;

    #[derive(Clone, Debug, Eq, PartialEq)]
    enum Rendered {
        Reminder(String),
        Result(Vec<u64>),
    }

    #[derive(Default)]
    struct RecordingRenderer {
        events: Mutex<Vec<Rendered>>,
    }

    impl RecordingRenderer {
        fn events(&self) -> Vec<Rendered> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GiveawayRenderer for RecordingRenderer {
        async fn render_reminder(&self, name: &str) -> Result<()> {
            self.events
                .lock()
                .unwrap()
                .push(Rendered::Reminder(name.to_string()));
            Ok(())
        }

        async fn render_result(&self, outcome: &GiveawayOutcome) -> Result<()> {
            self.events
                .lock()
                .unwrap()
                .push(Rendered::Result(outcome.winners.clone()));
            Ok(())
        }
    }

    fn schedule(
        registry: &Arc<GiveawayRegistry>,
        renderer: &Arc<RecordingRenderer>,
        duration_text: &str,
    ) -> Uuid {
        let (run, duration) = GiveawayRun::new("test giveaway", 1, duration_text).unwrap();
        let run_id = registry.register(run, renderer.clone());
        let timers = schedule_run(registry.clone(), run_id, duration);
        registry.set_timers(run_id, timers);
        run_id
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_ends_the_run_and_announces_winners() {
        let registry = Arc::new(GiveawayRegistry::new());
        let renderer = Arc::new(RecordingRenderer::default());
        let run_id = schedule(&registry, &renderer, "10m");
        registry.join(run_id, 1).unwrap();

        sleep(Duration::from_secs(11 * 60)).await;

        assert_eq!(registry.is_open(run_id), false);
        let events = renderer.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], Rendered::Reminder("test giveaway".to_string()));
        assert_eq!(events[1], Rendered::Result(vec![1]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reminder_fires_once_five_minutes_before_the_deadline() {
        let registry = Arc::new(GiveawayRegistry::new());
        let renderer = Arc::new(RecordingRenderer::default());
        let run_id = schedule(&registry, &renderer, "10m");

        sleep(Duration::from_secs(6 * 60)).await;

        assert_eq!(registry.is_open(run_id), true);
        assert_eq!(
            renderer.events(),
            vec![Rendered::Reminder("test giveaway".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_reminder_for_a_three_minute_run() {
        let registry = Arc::new(GiveawayRegistry::new());
        let renderer = Arc::new(RecordingRenderer::default());
        schedule(&registry, &renderer, "3m");

        sleep(Duration::from_secs(4 * 60)).await;

        assert_eq!(renderer.events(), vec![Rendered::Result(vec![])]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_reminder_for_an_exactly_five_minute_run() {
        let registry = Arc::new(GiveawayRegistry::new());
        let renderer = Arc::new(RecordingRenderer::default());
        schedule(&registry, &renderer, "5m");

        sleep(Duration::from_secs(6 * 60)).await;

        assert_eq!(renderer.events(), vec![Rendered::Result(vec![])]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_early_end_cancels_both_pending_timers() {
        let registry = Arc::new(GiveawayRegistry::new());
        let renderer = Arc::new(RecordingRenderer::default());
        let run_id = schedule(&registry, &renderer, "10m");
        registry.join(run_id, 1).unwrap();

        let ended = conclude(&registry, run_id, true).await.unwrap();
        assert_eq!(ended, true);
        assert_eq!(registry.is_open(run_id), false);

        // Neither the reminder nor a second result shows up later.
        sleep(Duration::from_secs(11 * 60)).await;
        assert_eq!(renderer.events(), vec![Rendered::Result(vec![1])]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_conclude_is_idempotent() {
        let registry = Arc::new(GiveawayRegistry::new());
        let renderer = Arc::new(RecordingRenderer::default());
        let run_id = schedule(&registry, &renderer, "10m");

        assert_eq!(conclude(&registry, run_id, true).await.unwrap(), true);
        assert_eq!(conclude(&registry, run_id, true).await.unwrap(), false);
        assert_eq!(renderer.events().len(), 1);
    }
}
