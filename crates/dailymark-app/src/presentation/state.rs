use std::sync::Arc;

use crate::application::config::AppSettings;
use crate::application::services::CheckinOrchestrator;
use dailymark_infrastructure::persistence::repositories::SqliteUserDirectory;
use dailymark_infrastructure::persistence::Database;

pub struct Runtime {
    pub db: Arc<Database>,
    pub settings: AppSettings,
}

pub struct Repositories {
    pub users: Arc<SqliteUserDirectory>,
}

pub struct Services {
    pub orchestrator: Arc<CheckinOrchestrator>,
}

pub struct AppState {
    pub runtime: Runtime,
    pub repositories: Repositories,
    pub services: Services,
}
