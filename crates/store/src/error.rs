//! Error types for store operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("notification {0} not found")]
    NotificationNotFound(i64),

    #[error("user not found: {0}")]
    UserNotFound(String),
}

impl StoreError {
    /// Absences are warnings for the pipeline, not transport failures.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::NotificationNotFound(_) | StoreError::UserNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(StoreError::NotificationNotFound(7).is_not_found());
        assert!(StoreError::UserNotFound("bob".into()).is_not_found());
        assert!(!StoreError::Sqlx(sqlx::Error::PoolClosed).is_not_found());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            StoreError::NotificationNotFound(7).to_string(),
            "notification 7 not found"
        );
    }
}
