pub mod commands;
pub mod error;
pub mod storage;

use std::env;
use std::sync::Arc;

use poise::serenity_prelude::GatewayIntents;
use serenity::async_trait;
use serenity::client::{Client, Context, EventHandler};
use serenity::model::application::Interaction;
use serenity::model::gateway::Ready;
use tracing::{error, info};

use crate::commands::UserData;
use crate::commands::giveaway::registry::GiveawayRegistry;
use crate::commands::giveaway::{end_giveaway, giveaways, handle_component, setup_giveaway};
use crate::error::Error;
use crate::storage::GiveawayStorage;

pub struct Handler;

#[async_trait]
impl EventHandler for Handler {
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Component(component) = interaction {
            if let Err(err) = handle_component(&ctx, &component).await {
                error!("Can't process the giveaway interaction: {}", err);
            }
        }
    }

    async fn ready(&self, _: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let registry = Arc::new(GiveawayRegistry::new());
    let command_registry = registry.clone();
    let framework = poise::Framework::<UserData, Error>::builder()
        .options(poise::FrameworkOptions {
            commands: vec![setup_giveaway(), end_giveaway(), giveaways()],
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(UserData {
                    registry: command_registry,
                })
            })
        })
        .build();

    let token = env::var("DISCORD_TOKEN").expect("Expected a DISCORD_TOKEN in the environment");
    let intents = GatewayIntents::non_privileged();
    let mut client = Client::builder(&token, intents)
        .event_handler(Handler)
        .framework(framework)
        .await
        .expect("Cannot create a Discord client");

    {
        let mut data = client.data.write().await;
        data.insert::<GiveawayStorage>(registry);
    }

    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }
}
