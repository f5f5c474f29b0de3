use serenity::builder::{CreateEmbed, CreateEmbedFooter};

use crate::commands::giveaway::models::{GiveawayOutcome, RunSnapshot};

pub const EMBED_COLOR: u32 = 0x361d57;

// The giveaway message while the run collects participants. Re-rendered
// after every accepted join/leave.
pub fn running_embed(state: &RunSnapshot) -> CreateEmbed {
    CreateEmbed::new()
        .title(format!("🎉 **Giveaway**: {} 🎉", state.name))
        .description("Click on the button below to enter")
        .field("Ends In", format!("<t:{}:R>", state.ends_at.unix_timestamp()), true)
        .field("Winners", state.winner_count.to_string(), true)
        .field("Joiners", state.joiners.to_string(), true)
        .field("Leavers", state.leavers.to_string(), true)
        .color(EMBED_COLOR)
        .footer(CreateEmbedFooter::new("Hurry up! The clock is ticking."))
}

// The final form of the giveaway message with winner mentions.
pub fn result_embed(outcome: &GiveawayOutcome) -> CreateEmbed {
    let winners = match outcome.winners.is_empty() {
        true => "No winners".to_string(),
        false => outcome
            .winners
            .iter()
            .map(|user_id| format!("<@{}>", user_id))
            .collect::<Vec<String>>()
            .join(", "),
    };

    CreateEmbed::new()
        .title(format!("🎉 Giveaway Ended: {} 🎉", outcome.name))
        .description(format!("**Winner(s):** {}", winners))
        .field("Winners", winners.clone(), true)
        .field("Total Participants", outcome.joiners.to_string(), true)
        .field("Total Leavers", outcome.leavers.to_string(), true)
        .color(EMBED_COLOR)
        .footer(CreateEmbedFooter::new("Thank you for participating!"))
}

pub fn reminder_content(name: &str) -> String {
    format!(
        "📢 **Reminder:** The giveaway \"{}\" is ending in 5 minutes! @everyone",
        name
    )
}
