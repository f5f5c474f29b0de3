pub mod formatters;
pub mod handlers;
pub mod models;
pub mod parser;
pub mod registry;
pub mod scheduler;

pub use crate::commands::giveaway::handlers::{
    // Slash commands
    end_giveaway,
    giveaways,
    setup_giveaway,

    // Button interactions with the giveaway
    handle_component,
};
