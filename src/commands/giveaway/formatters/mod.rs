pub mod base;
pub mod discord;
pub mod embed;

pub use crate::commands::giveaway::formatters::base::GiveawayRenderer;
pub use crate::commands::giveaway::formatters::discord::DiscordRenderer;
pub use crate::commands::giveaway::formatters::embed::{
    reminder_content, result_embed, running_embed,
};
