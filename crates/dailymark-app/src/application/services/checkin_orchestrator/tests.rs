use async_trait::async_trait;
use chrono::NaiveDate;
use futures::future::join_all;
use mockall::mock;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

use super::CheckinOrchestrator;
use dailymark_domain::bitmap::{BitStore, CheckinBitmapCache};
use dailymark_domain::checkin::{CheckinLog, CheckinRecord, InsertOutcome};
use dailymark_domain::shared::{
    CheckinTransaction, CheckinUnitOfWork, Clock, DomainError, FixedClock, UnitOfWorkError,
    UserId,
};
use dailymark_domain::streak::StreakStats;
use dailymark_domain::user::{OpenUserDirectory, UserDirectory};
use dailymark_infrastructure::cache::{DisabledBitStore, InMemoryBitStore};
use dailymark_infrastructure::config::TimeoutConfig;
use dailymark_infrastructure::persistence::repositories::{
    SqliteCheckinLogRepository, SqliteStreakRepository, SqliteUserDirectory,
};
use dailymark_infrastructure::persistence::{Database, SqliteUnitOfWork};

mock! {
    pub Store {}

    #[async_trait]
    impl BitStore for Store {
        async fn get_bit(&self, key: &str, offset: u32) -> Result<bool, DomainError>;
        async fn set_bit(&self, key: &str, offset: u32, value: bool) -> Result<bool, DomainError>;
        async fn count_bits(&self, key: &str, start: u32, end: u32) -> Result<u32, DomainError>;
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn unreachable_store() -> MockStore {
    let mut store = MockStore::new();
    store
        .expect_get_bit()
        .returning(|_, _| Err(DomainError::CacheUnavailable("connection refused".into())));
    store
        .expect_set_bit()
        .returning(|_, _, _| Err(DomainError::CacheUnavailable("connection refused".into())));
    store
        .expect_count_bits()
        .returning(|_, _, _| Err(DomainError::CacheUnavailable("connection refused".into())));
    store
}

#[derive(Clone, Copy)]
enum FailAt {
    Begin,
    Commit,
}

/// Store that loses its transactions at a chosen step.
struct FailingUnitOfWork {
    inner: SqliteUnitOfWork,
    fail_at: FailAt,
}

#[async_trait]
impl CheckinUnitOfWork for FailingUnitOfWork {
    async fn begin(&self) -> Result<Box<dyn CheckinTransaction>, UnitOfWorkError> {
        match self.fail_at {
            FailAt::Begin => Err(UnitOfWorkError::TransactionFailed(
                "database is locked".into(),
            )),
            FailAt::Commit => Ok(Box::new(FailingCommitTransaction {
                inner: self.inner.begin().await?,
            })),
        }
    }
}

struct FailingCommitTransaction {
    inner: Box<dyn CheckinTransaction>,
}

#[async_trait]
impl CheckinTransaction for FailingCommitTransaction {
    async fn insert_checkin_if_absent(
        &mut self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<InsertOutcome, DomainError> {
        self.inner.insert_checkin_if_absent(user_id, date).await
    }

    async fn load_streak(&mut self, user_id: UserId) -> Result<Option<StreakStats>, DomainError> {
        self.inner.load_streak(user_id).await
    }

    async fn save_streak(&mut self, stats: &StreakStats) -> Result<(), DomainError> {
        self.inner.save_streak(stats).await
    }

    async fn load_history(&mut self, user_id: UserId) -> Result<Vec<NaiveDate>, DomainError> {
        self.inner.load_history(user_id).await
    }

    async fn commit(self: Box<Self>) -> Result<(), UnitOfWorkError> {
        self.inner.rollback().await?;
        Err(UnitOfWorkError::CommitFailed("disk I/O error".into()))
    }

    async fn rollback(self: Box<Self>) -> Result<(), UnitOfWorkError> {
        self.inner.rollback().await
    }
}

type PendingCheckin = Arc<Mutex<Option<JoinHandle<Result<CheckinRecord, DomainError>>>>>;

/// Starts a check-in from another orchestrator as soon as the history has
/// been read, then gives it time to reach the store before carrying on.
struct InterleavingUnitOfWork {
    inner: SqliteUnitOfWork,
    other: Arc<CheckinOrchestrator>,
    user: UserId,
    pending: PendingCheckin,
}

#[async_trait]
impl CheckinUnitOfWork for InterleavingUnitOfWork {
    async fn begin(&self) -> Result<Box<dyn CheckinTransaction>, UnitOfWorkError> {
        Ok(Box::new(InterleavingTransaction {
            inner: self.inner.begin().await?,
            other: self.other.clone(),
            user: self.user,
            pending: self.pending.clone(),
        }))
    }
}

struct InterleavingTransaction {
    inner: Box<dyn CheckinTransaction>,
    other: Arc<CheckinOrchestrator>,
    user: UserId,
    pending: PendingCheckin,
}

#[async_trait]
impl CheckinTransaction for InterleavingTransaction {
    async fn insert_checkin_if_absent(
        &mut self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<InsertOutcome, DomainError> {
        self.inner.insert_checkin_if_absent(user_id, date).await
    }

    async fn load_streak(&mut self, user_id: UserId) -> Result<Option<StreakStats>, DomainError> {
        self.inner.load_streak(user_id).await
    }

    async fn save_streak(&mut self, stats: &StreakStats) -> Result<(), DomainError> {
        self.inner.save_streak(stats).await
    }

    async fn load_history(&mut self, user_id: UserId) -> Result<Vec<NaiveDate>, DomainError> {
        let history = self.inner.load_history(user_id).await?;

        let other = self.other.clone();
        let user = self.user;
        let handle = tokio::spawn(async move { other.checkin_today(user).await });
        *self.pending.lock().unwrap() = Some(handle);
        tokio::time::sleep(Duration::from_millis(50)).await;

        Ok(history)
    }

    async fn commit(self: Box<Self>) -> Result<(), UnitOfWorkError> {
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<(), UnitOfWorkError> {
        self.inner.rollback().await
    }
}

struct Harness {
    db: Arc<Database>,
    clock: Arc<FixedClock>,
    store: Arc<InMemoryBitStore>,
}

impl Harness {
    async fn in_memory() -> Self {
        let db = Database::in_memory().await.unwrap();
        db.run_migrations().await.unwrap();
        Self::with_database(db)
    }

    fn with_database(db: Database) -> Self {
        Self {
            db: Arc::new(db),
            clock: Arc::new(FixedClock::new(date(2024, 1, 1))),
            store: Arc::new(InMemoryBitStore::new()),
        }
    }

    fn orchestrator(&self) -> CheckinOrchestrator {
        self.orchestrator_with(self.store.clone())
    }

    fn orchestrator_with(&self, store: Arc<dyn BitStore>) -> CheckinOrchestrator {
        self.build(store, Arc::new(OpenUserDirectory))
    }

    fn build(
        &self,
        store: Arc<dyn BitStore>,
        users: Arc<dyn UserDirectory>,
    ) -> CheckinOrchestrator {
        let pool = Arc::new(self.db.pool().clone());
        CheckinOrchestrator::new(
            Arc::new(SqliteCheckinLogRepository::new(pool.clone())),
            Arc::new(SqliteUnitOfWork::new(pool.clone())),
            store,
            Arc::new(SqliteStreakRepository::new(pool)),
            users,
            self.clock.clone(),
        )
    }

    fn orchestrator_with_unit_of_work(
        &self,
        unit_of_work: Arc<dyn CheckinUnitOfWork>,
    ) -> CheckinOrchestrator {
        let pool = Arc::new(self.db.pool().clone());
        CheckinOrchestrator::new(
            Arc::new(SqliteCheckinLogRepository::new(pool.clone())),
            unit_of_work,
            self.store.clone(),
            Arc::new(SqliteStreakRepository::new(pool)),
            Arc::new(OpenUserDirectory),
            self.clock.clone(),
        )
    }

    fn sqlite_unit_of_work(&self) -> SqliteUnitOfWork {
        SqliteUnitOfWork::new(Arc::new(self.db.pool().clone()))
    }

    fn log(&self) -> SqliteCheckinLogRepository {
        SqliteCheckinLogRepository::new(Arc::new(self.db.pool().clone()))
    }

    async fn check_in_on(&self, orchestrator: &CheckinOrchestrator, user: UserId, day: NaiveDate) {
        self.clock.set(day);
        orchestrator.checkin_today(user).await.unwrap();
    }

    async fn bit(&self, user: UserId, day: NaiveDate) -> bool {
        self.store
            .get_bit(
                &CheckinBitmapCache::key(user, chrono::Datelike::year(&day)),
                CheckinBitmapCache::offset(day),
            )
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn test_streak_scenario_and_calendar() {
    let h = Harness::in_memory().await;
    let orchestrator = h.orchestrator();
    let user = UserId::new(42);

    h.check_in_on(&orchestrator, user, date(2024, 1, 1)).await;
    h.check_in_on(&orchestrator, user, date(2024, 1, 2)).await;
    let stats = orchestrator.stats(user).await.unwrap();
    assert_eq!((stats.current_streak(), stats.longest_streak()), (2, 2));

    h.check_in_on(&orchestrator, user, date(2024, 1, 4)).await;
    let stats = orchestrator.stats(user).await.unwrap();
    assert_eq!((stats.current_streak(), stats.longest_streak()), (1, 2));

    h.check_in_on(&orchestrator, user, date(2024, 1, 5)).await;
    let stats = orchestrator.stats(user).await.unwrap();
    assert_eq!((stats.current_streak(), stats.longest_streak()), (2, 2));
    assert_eq!(stats.last_checkin_date(), Some(date(2024, 1, 5)));

    let days = orchestrator
        .calendar(user, date(2024, 1, 1), date(2024, 1, 5))
        .await
        .unwrap();
    assert_eq!(
        days,
        vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 4), date(2024, 1, 5)]
    );
}

#[tokio::test]
async fn test_double_checkin_is_idempotent() {
    let h = Harness::in_memory().await;
    let orchestrator = h.orchestrator();
    let user = UserId::new(1);

    let first = orchestrator.checkin_today(user).await.unwrap();
    let second = orchestrator.checkin_today(user).await.unwrap();

    assert_eq!(first.date(), second.date());
    assert_eq!(first.user_id(), second.user_id());
    let stats = orchestrator.stats(user).await.unwrap();
    assert_eq!(stats.current_streak(), 1);

    let records = h
        .log()
        .range_query(user, date(2024, 1, 1), date(2024, 1, 1))
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_calendar_independent_of_cache_warmth() {
    let h = Harness::in_memory().await;
    let user = UserId::new(42);
    let days = [
        date(2023, 12, 30),
        date(2024, 1, 1),
        date(2024, 1, 2),
        date(2024, 1, 4),
        date(2024, 2, 29),
    ];

    // Written log-only, so the shared store starts cold
    let log_only = h.orchestrator_with(Arc::new(DisabledBitStore));
    for day in days {
        h.check_in_on(&log_only, user, day).await;
    }
    let window = (date(2023, 12, 1), date(2024, 3, 1));

    let cold = h
        .orchestrator_with(Arc::new(InMemoryBitStore::new()))
        .calendar(user, window.0, window.1)
        .await
        .unwrap();

    let partial_store = Arc::new(InMemoryBitStore::new());
    let partial = h.orchestrator_with(partial_store.clone());
    partial_store
        .set_bit(
            &CheckinBitmapCache::key(user, 2024),
            CheckinBitmapCache::offset(date(2024, 1, 2)),
            true,
        )
        .await
        .unwrap();
    let partial = partial.calendar(user, window.0, window.1).await.unwrap();

    let warm_orchestrator = h.orchestrator();
    warm_orchestrator
        .calendar(user, window.0, window.1)
        .await
        .unwrap();
    let warm = warm_orchestrator
        .calendar(user, window.0, window.1)
        .await
        .unwrap();

    assert_eq!(cold, days.to_vec());
    assert_eq!(partial, cold);
    assert_eq!(warm, cold);
}

#[tokio::test]
async fn test_calendar_window_rules() {
    let h = Harness::in_memory().await;
    let orchestrator = h.orchestrator().with_max_calendar_days(31);
    let user = UserId::new(5);

    let inverted = orchestrator
        .calendar(user, date(2024, 5, 2), date(2024, 5, 1))
        .await
        .unwrap();
    assert!(inverted.is_empty());

    let month = orchestrator
        .calendar(user, date(2024, 1, 1), date(2024, 1, 31))
        .await;
    assert!(month.is_ok());

    let too_long = orchestrator
        .calendar(user, date(2024, 1, 1), date(2024, 2, 1))
        .await
        .unwrap_err();
    assert!(matches!(too_long, DomainError::InvalidInput(_)));
}

#[tokio::test]
async fn test_has_checked_in_today() {
    let h = Harness::in_memory().await;
    let orchestrator = h.orchestrator();

    assert!(!orchestrator.has_checked_in_today(UserId::new(77)).await.unwrap());

    orchestrator.checkin_today(UserId::new(77)).await.unwrap();
    assert!(orchestrator.has_checked_in_today(UserId::new(77)).await.unwrap());

    h.clock.advance_days(1);
    assert!(!orchestrator.has_checked_in_today(UserId::new(77)).await.unwrap());
}

#[tokio::test]
async fn test_negative_cache_answer_is_verified_and_repaired() {
    let h = Harness::in_memory().await;
    let user = UserId::new(9);
    let today = h.clock.today();

    h.orchestrator_with(Arc::new(DisabledBitStore))
        .checkin_today(user)
        .await
        .unwrap();
    assert!(!h.bit(user, today).await);

    let orchestrator = h.orchestrator();
    assert!(orchestrator.has_checked_in_today(user).await.unwrap());
    assert!(h.bit(user, today).await);
}

#[tokio::test]
async fn test_set_cache_bit_answers_without_log() {
    let h = Harness::in_memory().await;
    let user = UserId::new(10);
    let today = h.clock.today();

    h.store
        .set_bit(
            &CheckinBitmapCache::key(user, 2024),
            CheckinBitmapCache::offset(today),
            true,
        )
        .await
        .unwrap();

    assert!(h.orchestrator().has_checked_in_today(user).await.unwrap());
}

#[tokio::test]
async fn test_unavailable_cache_degrades_to_log_only() {
    let h = Harness::in_memory().await;
    let orchestrator = h.orchestrator_with(Arc::new(unreachable_store()));
    let user = UserId::new(3);

    h.check_in_on(&orchestrator, user, date(2024, 3, 1)).await;
    h.check_in_on(&orchestrator, user, date(2024, 3, 2)).await;

    assert!(orchestrator.has_checked_in_today(user).await.unwrap());
    assert_eq!(
        orchestrator
            .calendar(user, date(2024, 3, 1), date(2024, 3, 31))
            .await
            .unwrap(),
        vec![date(2024, 3, 1), date(2024, 3, 2)]
    );

    let summary = orchestrator.month_summary(user, 2024, 3).await.unwrap();
    assert_eq!(summary.checked_in_days, 2);

    let stats = orchestrator.stats(user).await.unwrap();
    assert_eq!(stats.current_streak(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_checkins_increment_streak_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("concurrent.db");
    let db = Database::new(path.to_str().unwrap(), &TimeoutConfig::default())
        .await
        .unwrap();
    db.run_migrations().await.unwrap();
    let h = Harness::with_database(db);
    let orchestrator = Arc::new(h.orchestrator());
    let user = UserId::new(7);

    h.check_in_on(&orchestrator, user, date(2024, 1, 1)).await;
    let before = orchestrator.stats(user).await.unwrap().current_streak();
    h.clock.set(date(2024, 1, 2));

    let attempts = (0..2).map(|_| {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.checkin_today(user).await })
    });
    let records: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    assert!(records.iter().all(|r| r.date() == date(2024, 1, 2)));
    let after = orchestrator.stats(user).await.unwrap().current_streak();
    assert_eq!(after, before + 1);

    let stored = h
        .log()
        .range_query(user, date(2024, 1, 2), date(2024, 1, 2))
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn test_unknown_user_is_rejected_except_for_stats() {
    let h = Harness::in_memory().await;
    let directory = Arc::new(SqliteUserDirectory::new(Arc::new(h.db.pool().clone())));
    directory.register(UserId::new(1)).await.unwrap();
    let orchestrator = h.build(h.store.clone(), directory);
    let stranger = UserId::new(2);

    assert!(orchestrator.checkin_today(UserId::new(1)).await.is_ok());

    assert!(matches!(
        orchestrator.checkin_today(stranger).await,
        Err(DomainError::UserNotFound(id)) if id == stranger
    ));
    assert!(matches!(
        orchestrator.has_checked_in_today(stranger).await,
        Err(DomainError::UserNotFound(_))
    ));
    assert!(matches!(
        orchestrator
            .calendar(stranger, date(2024, 1, 1), date(2024, 1, 2))
            .await,
        Err(DomainError::UserNotFound(_))
    ));
    assert!(matches!(
        orchestrator.month_summary(stranger, 2024, 1).await,
        Err(DomainError::UserNotFound(_))
    ));

    let stats = orchestrator.stats(stranger).await.unwrap();
    assert_eq!(stats.current_streak(), 0);
    assert_eq!(stats.last_checkin_date(), None);
}

#[tokio::test]
async fn test_month_views() {
    let h = Harness::in_memory().await;
    let orchestrator = h.orchestrator();
    let user = UserId::new(11);

    for day in [1, 2, 3, 15, 29] {
        h.check_in_on(&orchestrator, user, date(2024, 2, day)).await;
    }
    h.check_in_on(&orchestrator, user, date(2024, 3, 1)).await;

    let february = orchestrator.month_calendar(user, 2024, 2).await.unwrap();
    assert_eq!(february.len(), 5);
    assert_eq!(february.last(), Some(&date(2024, 2, 29)));

    let summary = orchestrator.month_summary(user, 2024, 2).await.unwrap();
    assert_eq!(summary.total_days, 29);
    assert_eq!(summary.checked_in_days, 5);
    assert!((summary.check_in_rate() - 500.0 / 29.0).abs() < 1e-9);

    let invalid = orchestrator.month_summary(user, 2024, 13).await.unwrap_err();
    assert!(matches!(invalid, DomainError::InvalidInput(_)));
}

#[tokio::test]
async fn test_recalculated_stats_match_incremental() {
    let h = Harness::in_memory().await;
    let orchestrator = h.orchestrator();
    let user = UserId::new(12);

    for day in [1, 2, 4, 5, 6, 9] {
        h.check_in_on(&orchestrator, user, date(2024, 4, day)).await;
    }
    let incremental = orchestrator.stats(user).await.unwrap();

    let replayed = orchestrator.recalculate_stats(user).await.unwrap();

    assert_eq!(replayed, incremental);
    assert_eq!(orchestrator.stats(user).await.unwrap(), incremental);
    assert_eq!((incremental.current_streak(), incremental.longest_streak()), (1, 3));
}

#[tokio::test]
async fn test_failed_begin_surfaces_store_unavailable_without_cache_bit() {
    let h = Harness::in_memory().await;
    let orchestrator = h.orchestrator_with_unit_of_work(Arc::new(FailingUnitOfWork {
        inner: h.sqlite_unit_of_work(),
        fail_at: FailAt::Begin,
    }));
    let user = UserId::new(21);

    let err = orchestrator.checkin_today(user).await.unwrap_err();

    assert!(matches!(err, DomainError::StoreUnavailable(_)));
    assert!(!h.bit(user, date(2024, 1, 1)).await);
    assert!(!h.log().exists(user, date(2024, 1, 1)).await.unwrap());
}

#[tokio::test]
async fn test_failed_commit_leaves_no_record_streak_or_cache_bit() {
    let h = Harness::in_memory().await;
    let orchestrator = h.orchestrator_with_unit_of_work(Arc::new(FailingUnitOfWork {
        inner: h.sqlite_unit_of_work(),
        fail_at: FailAt::Commit,
    }));
    let user = UserId::new(22);

    let err = orchestrator.checkin_today(user).await.unwrap_err();

    assert!(matches!(err, DomainError::StoreUnavailable(_)));
    assert!(!h.bit(user, date(2024, 1, 1)).await);
    assert!(!h.log().exists(user, date(2024, 1, 1)).await.unwrap());
    assert_eq!(orchestrator.stats(user).await.unwrap(), StreakStats::new(user));
    assert!(!orchestrator.has_checked_in_today(user).await.unwrap());
}

#[tokio::test]
async fn test_checkin_during_recalculation_keeps_its_streak_increment() {
    let h = Harness::in_memory().await;
    let user = UserId::new(13);
    h.check_in_on(&h.orchestrator(), user, date(2024, 4, 1)).await;
    h.clock.set(date(2024, 4, 2));

    let pending: PendingCheckin = Arc::new(Mutex::new(None));
    let recalculating = h.orchestrator_with_unit_of_work(Arc::new(InterleavingUnitOfWork {
        inner: h.sqlite_unit_of_work(),
        other: Arc::new(h.orchestrator()),
        user,
        pending: pending.clone(),
    }));

    let replayed = recalculating.recalculate_stats(user).await.unwrap();
    assert_eq!(replayed.current_streak(), 1);
    assert_eq!(replayed.last_checkin_date(), Some(date(2024, 4, 1)));

    let handle = pending.lock().unwrap().take().unwrap();
    let record = handle.await.unwrap().unwrap();
    assert_eq!(record.date(), date(2024, 4, 2));

    let stored = h.orchestrator().stats(user).await.unwrap();
    assert_eq!(stored.current_streak(), 2);
    assert_eq!(stored.longest_streak(), 2);
    assert_eq!(stored.last_checkin_date(), Some(date(2024, 4, 2)));
}

#[tokio::test]
async fn test_month_summary_rejects_count_beyond_month_length() {
    let h = Harness::in_memory().await;
    let user = UserId::new(14);
    h.check_in_on(&h.orchestrator(), user, date(2024, 2, 3)).await;

    let mut store = MockStore::new();
    store.expect_get_bit().returning(|_, _| Ok(true));
    store.expect_set_bit().returning(|_, _, _| Ok(true));
    store.expect_count_bits().returning(|_, _, _| Ok(40));
    let orchestrator = h.orchestrator_with(Arc::new(store));

    let err = orchestrator.month_summary(user, 2024, 2).await.unwrap_err();

    assert!(matches!(err, DomainError::DataIntegrity(_)));
}
