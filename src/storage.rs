use std::sync::Arc;

use serenity::prelude::TypeMapKey;

use crate::commands::giveaway::registry::GiveawayRegistry;

pub struct GiveawayStorage;

impl TypeMapKey for GiveawayStorage {
    type Value = Arc<GiveawayRegistry>;
}
