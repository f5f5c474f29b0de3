use serenity::async_trait;

use crate::commands::giveaway::models::GiveawayOutcome;
use crate::error::Result;

// The outbound boundary towards the chat platform. The timer-driven
// notifications go through this trait, which keeps the scheduling logic
// testable without a gateway connection.
#[async_trait]
pub trait GiveawayRenderer: Send + Sync {
    // Sends the one-shot reminder shortly before the deadline.
    async fn render_reminder(&self, name: &str) -> Result<()>;

    // Announces the winners and the final participation numbers once
    // the run has ended.
    async fn render_result(&self, outcome: &GiveawayOutcome) -> Result<()>;
}
