// ==========================================
// 批量排期集成测试
// ==========================================
// 场景: 多账号并发、单账号失败隔离、超时、fail_fast、可复现种子
// ==========================================


use async_trait::async_trait;
use content_schedule_aps::config::{BatchSettings, ConfigManager};
use content_schedule_aps::domain::PageType;
use content_schedule_aps::engine::{account_seed, AccountSnapshot, BatchScheduler, SnapshotProvider};
use content_schedule_aps::{EngineResult, ScheduleError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 内存快照来源
struct MemoryProvider {
    snapshots: HashMap<String, AccountSnapshot>,
    slow_accounts: Vec<String>,
    fetches: AtomicUsize,
}

impl MemoryProvider {
    fn new(accounts: &[(&str, u32, PageType)]) -> Self {
        Self {
            snapshots: accounts
                .iter()
                .map(|(id, size, page)| (id.to_string(), test_helpers::snapshot(id, *size, *page)))
                .collect(),
            slow_accounts: Vec::new(),
            fetches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SnapshotProvider for MemoryProvider {
    async fn fetch(&self, account_id: &str) -> EngineResult<AccountSnapshot> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.slow_accounts.iter().any(|a| a == account_id) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        self.snapshots
            .get(account_id)
            .cloned()
            .ok_or_else(|| ScheduleError::SnapshotUnavailable {
                account_id: account_id.to_string(),
                reason: "未找到账号".to_string(),
            })
    }
}

fn scheduler(config: ConfigManager, settings: BatchSettings) -> BatchScheduler<ConfigManager> {
    content_schedule_aps::logging::init_test();
    BatchScheduler::with_settings(
        Arc::new(config),
        test_helpers::catalog(),
        test_helpers::tier_table(),
        settings,
    )
}

fn ids(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_batch_runs_every_account_in_input_order() {
    let provider = MemoryProvider::new(&[
        ("acc_a", 500, PageType::Paid),
        ("acc_b", 3_000, PageType::Free),
        ("acc_c", 8_000, PageType::Paid),
    ]);
    let batch = scheduler(ConfigManager::new(), BatchSettings::default());

    let report = batch.run(&provider, &ids(&["acc_a", "acc_b", "acc_c"])).await.unwrap();

    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.failed(), 0);
    let order: Vec<&str> = report.outcomes.iter().map(|o| o.account_id.as_str()).collect();
    assert_eq!(order, vec!["acc_a", "acc_b", "acc_c"]);
    assert_eq!(provider.fetches.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_failure_is_isolated_without_fail_fast() {
    let provider = MemoryProvider::new(&[("acc_a", 500, PageType::Paid)]);
    let batch = scheduler(ConfigManager::new(), BatchSettings::default());

    let report = batch.run(&provider, &ids(&["acc_a", "acc_missing"])).await.unwrap();

    assert_eq!(report.succeeded(), 1);
    assert!(matches!(
        report.get("acc_missing").unwrap().result,
        Err(ScheduleError::SnapshotUnavailable { .. })
    ));
}

#[tokio::test]
async fn test_fail_fast_returns_first_error() {
    let provider = MemoryProvider::new(&[("acc_a", 500, PageType::Paid)]);
    let settings = BatchSettings {
        fail_fast: true,
        max_concurrency: 1,
        ..BatchSettings::default()
    };
    let batch = scheduler(ConfigManager::new(), settings);

    let result = batch.run(&provider, &ids(&["acc_missing", "acc_a"])).await;
    assert!(matches!(result, Err(ScheduleError::SnapshotUnavailable { .. })));
}

#[tokio::test]
async fn test_slow_account_times_out() {
    let mut provider = MemoryProvider::new(&[
        ("acc_fast", 500, PageType::Paid),
        ("acc_slow", 500, PageType::Paid),
    ]);
    provider.slow_accounts.push("acc_slow".to_string());
    let settings = BatchSettings {
        account_timeout: Duration::from_secs(2),
        ..BatchSettings::default()
    };
    let batch = scheduler(ConfigManager::new(), settings);

    let report = batch.run(&provider, &ids(&["acc_fast", "acc_slow"])).await.unwrap();

    assert!(report.get("acc_fast").unwrap().is_success());
    assert!(matches!(
        report.get("acc_slow").unwrap().result,
        Err(ScheduleError::Timeout { .. })
    ));
}

#[tokio::test]
async fn test_seeds_are_reproducible_across_batches() {
    let provider = MemoryProvider::new(&[("acc_a", 3_000, PageType::Paid)]);
    let settings = BatchSettings {
        base_seed: 2026,
        ..BatchSettings::default()
    };
    let batch = scheduler(ConfigManager::new(), settings);

    let first = batch.run(&provider, &ids(&["acc_a"])).await.unwrap();
    let second = batch.run(&provider, &ids(&["acc_a"])).await.unwrap();

    let a = first.outcomes[0].result.as_ref().unwrap();
    let b = second.outcomes[0].result.as_ref().unwrap();
    assert_eq!(first.outcomes[0].seed, account_seed(2026, "acc_a"));
    assert_eq!(a.items, b.items);
    assert_eq!(a.assignments, b.assignments);
}

#[tokio::test]
async fn test_account_scoped_config_applies() {
    let config = ConfigManager::from_json_str(
        r#"{"global": {"window_start": "09:00"}, "accounts": {"acc_late": {"window_start": "12:00"}}}"#,
    )
    .unwrap();
    let provider = MemoryProvider::new(&[
        ("acc_early", 500, PageType::Paid),
        ("acc_late", 500, PageType::Paid),
    ]);
    let batch = scheduler(config, BatchSettings::default());

    let report = batch.run(&provider, &ids(&["acc_early", "acc_late"])).await.unwrap();

    let earliest = |id: &str| {
        let schedule = report.get(id).unwrap().result.as_ref().unwrap();
        schedule.items.iter().map(|i| i.time()).min().unwrap()
    };
    assert!(earliest("acc_early") >= chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    assert!(earliest("acc_late") >= chrono::NaiveTime::from_hms_opt(12, 0, 0).unwrap());
}

#[tokio::test]
async fn test_invalid_account_config_fails_that_account_only() {
    let config =
        ConfigManager::from_json_str(r#"{"accounts": {"acc_bad": {"jitter_minutes": "abc"}}}"#)
            .unwrap();
    let provider = MemoryProvider::new(&[
        ("acc_ok", 500, PageType::Paid),
        ("acc_bad", 500, PageType::Paid),
    ]);
    let batch = scheduler(config, BatchSettings::default());

    let report = batch.run(&provider, &ids(&["acc_ok", "acc_bad"])).await.unwrap();

    assert!(report.get("acc_ok").unwrap().is_success());
    assert!(matches!(
        report.get("acc_bad").unwrap().result,
        Err(ScheduleError::Config(_))
    ));
}

#[tokio::test]
async fn test_batch_settings_loaded_from_config() {
    let config = ConfigManager::from_json_str(
        r#"{"global": {"max_concurrency": 32, "account_timeout_secs": 10, "fail_fast": true, "base_seed": 7}}"#,
    )
    .unwrap();
    let batch =
        BatchScheduler::new(Arc::new(config), test_helpers::catalog(), test_helpers::tier_table())
            .await
            .unwrap();
    let settings = batch.settings();
    assert_eq!(settings.effective_concurrency(), 8);
    assert_eq!(settings.account_timeout, Duration::from_secs(10));
    assert!(settings.fail_fast);
    assert_eq!(settings.base_seed, 7);
}
