use std::sync::Arc;

use serenity::builder::{
    CreateActionRow, CreateButton, CreateInteractionResponse, CreateInteractionResponseMessage,
};
use serenity::client::Context as SerenityContext;
use serenity::model::application::{ButtonStyle, ComponentInteraction};
use tracing::{error, info};
use uuid::Uuid;

use crate::commands::Context;
use crate::commands::giveaway::formatters::{DiscordRenderer, running_embed};
use crate::commands::giveaway::models::GiveawayRun;
use crate::commands::giveaway::scheduler;
use crate::error::{Error, Result};
use crate::storage::GiveawayStorage;

const JOIN_BUTTON_PREFIX: &str = "giveaway-join:";
const LEAVE_BUTTON_PREFIX: &str = "giveaway-leave:";

const RENDER_FAILURE_NOTICE: &str =
    "An error occurred while processing the giveaway. Please try again later or contact support.";

enum ButtonAction {
    Join,
    Leave,
}

/// Create a new giveaway in the current channel.
#[poise::command(slash_command, rename = "setup-giveaway", guild_only)]
pub async fn setup_giveaway(
    ctx: Context<'_>,
    #[description = "The duration of the giveaway (e.g. 1m, 1h, 1d)"] time: String,
    #[description = "The name of the giveaway"] name: String,
    #[description = "The number of winners"] winners: i64,
) -> Result<()> {
    // Validation failures are surfaced to the requester before any run
    // or message exists.
    let (mut run, duration) = match GiveawayRun::new(&name, winners, &time) {
        Ok(created) => created,
        Err(err @ (Error::InvalidDuration(_) | Error::InvalidWinnerCount(_))) => {
            let reply = poise::CreateReply::default()
                .content(err.to_string())
                .ephemeral(true);
            ctx.send(reply).await?;
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    let buttons = vec![
        CreateButton::new(format!("{}{}", JOIN_BUTTON_PREFIX, run.id()))
            .label("Join Giveaway!")
            .emoji('🎉')
            .style(ButtonStyle::Success),
        CreateButton::new(format!("{}{}", LEAVE_BUTTON_PREFIX, run.id()))
            .label("Leave Giveaway")
            .emoji('🟥')
            .style(ButtonStyle::Danger),
    ];
    let reply = poise::CreateReply::default()
        .embed(running_embed(&run.snapshot()))
        .components(vec![CreateActionRow::Buttons(buttons)]);
    let handle = ctx.send(reply).await?;
    let message = handle.message().await?;
    run.set_message_id(message.id.get());

    let run_id = run.id();
    let registry = ctx.data().registry.clone();
    let renderer = Arc::new(DiscordRenderer::new(
        ctx.serenity_context().http.clone(),
        message.channel_id,
        message.id,
    ));
    registry.register(run, renderer);

    let timers = scheduler::schedule_run(registry.clone(), run_id, duration);
    registry.set_timers(run_id, timers);

    info!(
        "Giveaway '{}' ({}) started by '{}' for {:?}",
        name,
        run_id,
        ctx.author().name,
        duration,
    );
    Ok(())
}

/// End a running giveaway early and draw the winners immediately.
#[poise::command(
    slash_command,
    rename = "end-giveaway",
    guild_only,
    required_permissions = "MANAGE_GUILD"
)]
pub async fn end_giveaway(
    ctx: Context<'_>,
    #[description = "The message ID of the giveaway to end"] id: String,
) -> Result<()> {
    let registry = ctx.data().registry.clone();

    let Ok(message_id) = id.trim().parse::<u64>() else {
        let reply = poise::CreateReply::default()
            .content("Please pass the message ID of the giveaway.")
            .ephemeral(true);
        ctx.send(reply).await?;
        return Ok(());
    };

    let run_id = match registry.find_by_message(message_id) {
        Ok(run_id) => run_id,
        Err(err) => {
            let reply = poise::CreateReply::default()
                .content(err.to_string())
                .ephemeral(true);
            ctx.send(reply).await?;
            return Ok(());
        }
    };

    let content = match scheduler::conclude(&registry, run_id, true).await {
        Ok(true) => "The giveaway has been ended and the winners are drawn.".to_string(),
        Ok(false) => Error::GiveawayClosed.to_string(),
        Err(err) => {
            error!("Can't end giveaway {} early: {}", run_id, err);
            RENDER_FAILURE_NOTICE.to_string()
        }
    };

    let reply = poise::CreateReply::default().content(content).ephemeral(true);
    ctx.send(reply).await?;
    Ok(())
}

/// Get a list of currently running giveaways.
#[poise::command(slash_command, rename = "giveaways", guild_only)]
pub async fn giveaways(ctx: Context<'_>) -> Result<()> {
    let lines = ctx.data().registry.list_open();

    let content = match lines.len() {
        0 => "There are no active giveaways.".to_string(),
        _ => lines
            .iter()
            .enumerate()
            .map(|(index, line)| format!("{}. {}", index + 1, line))
            .collect::<Vec<String>>()
            .join("\n"),
    };

    ctx.say(content).await?;
    Ok(())
}

// Routes a join/leave button press to the matching run. Mutations are applied
// first; the message update on top of them is best-effort and its failure
// never rolls the run back.
pub async fn handle_component(
    ctx: &SerenityContext,
    interaction: &ComponentInteraction,
) -> Result<()> {
    let custom_id = interaction.data.custom_id.as_str();
    let (action, raw_run_id) = if let Some(rest) = custom_id.strip_prefix(JOIN_BUTTON_PREFIX) {
        (ButtonAction::Join, rest)
    } else if let Some(rest) = custom_id.strip_prefix(LEAVE_BUTTON_PREFIX) {
        (ButtonAction::Leave, rest)
    } else {
        return Ok(());
    };

    if interaction.user.bot {
        return Ok(());
    }

    let run_id = Uuid::parse_str(raw_run_id).map_err(|_| Error::GiveawayNotFound)?;
    let registry = ctx
        .data
        .read()
        .await
        .get::<GiveawayStorage>()
        .cloned()
        .expect("Expected GiveawayRegistry in ShareMap.");

    let user_id = interaction.user.id.get();
    let result = match action {
        ButtonAction::Join => registry.join(run_id, user_id),
        ButtonAction::Leave => registry.leave(run_id, user_id),
    };

    match result {
        Ok(state) => {
            let response = CreateInteractionResponse::UpdateMessage(
                CreateInteractionResponseMessage::new().embed(running_embed(&state)),
            );
            if let Err(err) = interaction.create_response(&ctx.http, response).await {
                error!("Can't update the giveaway message for {}: {}", run_id, err);
                notify_user(ctx, interaction, RENDER_FAILURE_NOTICE).await;
            }
        }
        // Informational rejections go back to the pressing user only.
        Err(err @ (Error::AlreadyJoined | Error::NotJoined | Error::GiveawayClosed)) => {
            notify_user(ctx, interaction, &err.to_string()).await;
        }
        Err(err) => return Err(err),
    }

    Ok(())
}

async fn notify_user(ctx: &SerenityContext, interaction: &ComponentInteraction, content: &str) {
    let response = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(true),
    );
    if let Err(err) = interaction.create_response(&ctx.http, response).await {
        error!("Can't reply to the giveaway interaction: {}", err);
    }
}
