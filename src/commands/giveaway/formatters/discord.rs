use std::sync::Arc;

use serenity::async_trait;
use serenity::builder::EditMessage;
use serenity::http::Http;
use serenity::model::id::{ChannelId, MessageId};

use crate::commands::giveaway::formatters::base::GiveawayRenderer;
use crate::commands::giveaway::formatters::embed::{reminder_content, result_embed};
use crate::commands::giveaway::models::GiveawayOutcome;
use crate::error::Result;

// Renders giveaway notifications into the Discord channel hosting the run.
pub struct DiscordRenderer {
    http: Arc<Http>,
    channel_id: ChannelId,
    message_id: MessageId,
}

impl DiscordRenderer {
    pub fn new(http: Arc<Http>, channel_id: ChannelId, message_id: MessageId) -> Self {
        DiscordRenderer {
            http,
            channel_id,
            message_id,
        }
    }
}

#[async_trait]
impl GiveawayRenderer for DiscordRenderer {
    async fn render_reminder(&self, name: &str) -> Result<()> {
        self.channel_id
            .say(&self.http, reminder_content(name))
            .await?;
        Ok(())
    }

    async fn render_result(&self, outcome: &GiveawayOutcome) -> Result<()> {
        // The buttons are removed together with the final embed edit.
        let update = EditMessage::new()
            .embed(result_embed(outcome))
            .components(vec![]);
        self.channel_id
            .edit_message(&self.http, self.message_id, update)
            .await?;
        Ok(())
    }
}
