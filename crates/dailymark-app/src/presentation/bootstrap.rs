use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::application::config::{AppSettings, CacheBackend};
use crate::application::services::CheckinOrchestrator;
use crate::presentation::state::{AppState, Repositories, Runtime, Services};
use dailymark_domain::bitmap::BitStore;
use dailymark_domain::shared::Clock;
use dailymark_domain::user::{OpenUserDirectory, UserDirectory};
use dailymark_infrastructure::cache::{DisabledBitStore, InMemoryBitStore, RedisBitStore};
use dailymark_infrastructure::clock::SystemClock;
use dailymark_infrastructure::config::TimeoutConfig;
use dailymark_infrastructure::persistence::repositories::{
    SqliteCheckinLogRepository, SqliteStreakRepository, SqliteUserDirectory,
};
use dailymark_infrastructure::persistence::{Database, SqliteUnitOfWork};

/// Composition root: open storage, pick collaborators, wire the orchestrator.
pub async fn build_app_state(settings: AppSettings) -> anyhow::Result<AppState> {
    let started_at = Instant::now();
    let timeouts = TimeoutConfig::default().with_cache_op(settings.cache_timeout());

    let db = if settings.is_in_memory_database() {
        Database::in_memory().await?
    } else {
        let path = settings
            .database_path
            .to_str()
            .context("Database path is not valid UTF-8")?;
        Database::new(path, &timeouts).await?
    };
    db.run_migrations().await?;
    info!(
        path = %settings.database_path.display(),
        elapsed_ms = started_at.elapsed().as_millis() as u64,
        "database ready"
    );

    let pool = Arc::new(db.pool().clone());
    let user_repo = Arc::new(SqliteUserDirectory::new(pool.clone()));
    let users: Arc<dyn UserDirectory> = if settings.require_known_users {
        user_repo.clone()
    } else {
        Arc::new(OpenUserDirectory)
    };

    let clock = SystemClock::new(settings.clock_zone());
    info!(zone = %clock.zone(), today = %clock.today(), "clock configured");

    let orchestrator = CheckinOrchestrator::new(
        Arc::new(SqliteCheckinLogRepository::new(pool.clone())),
        Arc::new(SqliteUnitOfWork::new(pool.clone())),
        build_bit_store(&settings.cache, &timeouts),
        Arc::new(SqliteStreakRepository::new(pool)),
        users,
        Arc::new(clock),
    )
    .with_max_calendar_days(settings.max_calendar_days);

    Ok(AppState {
        runtime: Runtime {
            db: Arc::new(db),
            settings,
        },
        repositories: Repositories { users: user_repo },
        services: Services {
            orchestrator: Arc::new(orchestrator),
        },
    })
}

/// Bit store for the configured backend. A Redis URL that cannot be parsed
/// leaves the cache disabled rather than failing startup.
pub fn build_bit_store(cache: &CacheBackend, timeouts: &TimeoutConfig) -> Arc<dyn BitStore> {
    match cache {
        CacheBackend::Memory => Arc::new(InMemoryBitStore::new()),
        CacheBackend::Disabled => {
            info!("bitmap cache disabled, running log-only");
            Arc::new(DisabledBitStore)
        }
        CacheBackend::Redis { url } => match RedisBitStore::new(url, timeouts.cache_op) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                warn!(error = %e, "Redis cache unusable, running log-only");
                Arc::new(DisabledBitStore)
            }
        },
    }
}
