//! Error taxonomy of the assignment engine.

use crate::db::repository::RepositoryError;
use crate::models::CourierId;

pub type DispatchResult<T> = Result<T, DispatchError>;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Referenced courier or order does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: String },

    /// Malformed input to an engine operation.
    #[error("Invalid constraint: {0}")]
    InvalidConstraint(String),

    /// A claim lost a race against another courier's transaction.
    #[error("Conflict for courier {courier_id}: {details}")]
    Conflict {
        courier_id: CourierId,
        details: String,
    },

    /// Store failure, propagated unchanged.
    #[error(transparent)]
    Storage(RepositoryError),
}

impl DispatchError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConstraint(message.into())
    }

    /// Lift a repository error raised inside a courier's transaction.
    ///
    /// Conflicts only become [`DispatchError::Conflict`] here, where the
    /// courier is known; the plain `From` conversion keeps them as storage
    /// errors.
    pub fn from_transaction(courier_id: CourierId, err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict { message, context } => Self::Conflict {
                courier_id,
                details: match context.details {
                    Some(details) => format!("{} ({})", message, details),
                    None => message,
                },
            },
            other => other.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Conflict { .. } => true,
            Self::Storage(err) => err.is_retryable(),
            _ => false,
        }
    }
}

impl From<RepositoryError> for DispatchError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { message, context } => Self::NotFound {
                entity: context.entity.unwrap_or_else(|| "entity".to_string()),
                id: context.entity_id.unwrap_or(message),
            },
            other => Self::Storage(other),
        }
    }
}
