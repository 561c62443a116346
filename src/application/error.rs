use thiserror::Error;

use crate::domain::{Paise, ProjectionError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient wallet balance: balance {balance}, required {required}")]
    InsufficientFunds { balance: Paise, required: Paise },

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Goal not found: {0}")]
    GoalNotFound(String),

    #[error("Bank account not linked: {0}")]
    BankAccountNotFound(String),

    #[error("Investment option not found: {0}")]
    InvestmentOptionNotFound(String),

    #[error("Lesson not found: {0}")]
    LessonNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("An account already exists for {0}")]
    EmailTaken(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Storage unavailable: {0:#}")]
    StorageUnavailable(#[from] anyhow::Error),
}

impl From<ProjectionError> for AppError {
    fn from(err: ProjectionError) -> Self {
        match err {
            ProjectionError::InvalidInput(reason) => AppError::InvalidInput(reason),
        }
    }
}
