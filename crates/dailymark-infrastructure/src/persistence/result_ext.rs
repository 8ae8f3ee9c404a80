use dailymark_domain::shared::DomainError;

/// Extension trait mapping sqlx failures onto the domain error taxonomy
pub trait ResultExt<T> {
    /// Usage: `query.fetch_one(pool).await.to_store_err("Load stats")?`
    fn to_store_err(self, context: &str) -> Result<T, DomainError>;
}

impl<T> ResultExt<T> for Result<T, sqlx::Error> {
    fn to_store_err(self, context: &str) -> Result<T, DomainError> {
        self.map_err(|e| map_sqlx_error(e, context))
    }
}

/// Connectivity failures become `StoreUnavailable`; everything else is a
/// plain repository error.
pub fn map_sqlx_error(err: sqlx::Error, context: &str) -> DomainError {
    let unavailable = match &err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db) => {
            let message = db.message();
            message.contains("database is locked") || message.contains("unable to open")
        }
        _ => false,
    };

    if unavailable {
        DomainError::StoreUnavailable(format!("{}: {}", context, err))
    } else {
        DomainError::Repository(format!("{}: {}", context, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_store_unavailable() {
        let result: Result<(), sqlx::Error> = Err(sqlx::Error::PoolTimedOut);
        match result.to_store_err("Insert check-in") {
            Err(DomainError::StoreUnavailable(msg)) => assert!(msg.starts_with("Insert check-in")),
            other => panic!("Expected StoreUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_row_not_found_is_repository_error() {
        let err = map_sqlx_error(sqlx::Error::RowNotFound, "Find stats");
        assert!(matches!(err, DomainError::Repository(_)));
    }
}
