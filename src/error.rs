use std::result;

use serenity::prelude::SerenityError;
use thiserror::Error as ThisError;

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, Clone, Eq, PartialEq, ThisError)]
pub enum Error {
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),
    #[error("Invalid winner count: {0}")]
    InvalidWinnerCount(String),
    #[error("You have already joined the giveaway.")]
    AlreadyJoined,
    #[error("You are not currently joined in the giveaway, so you cannot leave.")]
    NotJoined,
    #[error("This giveaway has already ended.")]
    GiveawayClosed,
    #[error("The requested giveaway was not found.")]
    GiveawayNotFound,
    #[error("{0}")]
    Serenity(String),
}

impl From<SerenityError> for Error {
    fn from(err: SerenityError) -> Error {
        let description = err.to_string();
        Error::Serenity(description)
    }
}
