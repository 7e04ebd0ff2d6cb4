// ==========================================
// 配置层集成测试
// ==========================================
// 场景: JSON 文件加载、账号级覆写、非法值、参考数据表校验
// ==========================================

use chrono::NaiveTime;
use content_schedule_aps::config::{
    config_keys, BatchSettings, ConfigManager, ConfigScope, DayAdjustment, ScheduleConfigReader,
    ScheduleSettings, TierRow, VolumeTierTable,
};
use content_schedule_aps::domain::{SendTypeCatalog, VolumeTier};
use content_schedule_aps::ConfigError;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(raw: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(raw.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_load_from_file_with_account_override() {
    let file = write_config(
        r#"{
            "global": {"window_start": "07:30", "jitter_minutes": 5, "min_performance": 50},
            "accounts": {"acc_1": {"jitter_minutes": 2, "usage_window_hours": 12}}
        }"#,
    );
    let manager = ConfigManager::from_file(file.path()).unwrap();

    let global = ScheduleSettings::load(&manager, &ConfigScope::Global).await.unwrap();
    assert_eq!(global.window_start, NaiveTime::from_hms_opt(7, 30, 0).unwrap());
    assert_eq!(global.jitter_minutes, 5);
    assert_eq!(global.min_performance, 50.0);

    let account = ScheduleSettings::load(&manager, &ConfigScope::account("acc_1")).await.unwrap();
    assert_eq!(account.jitter_minutes, 2);
    assert_eq!(account.usage_window_hours, 12);
    assert_eq!(account.window_start, global.window_start);

    // 未配置账号回落到全局
    let other = ScheduleSettings::load(&manager, &ConfigScope::account("acc_2")).await.unwrap();
    assert_eq!(other, global);
}

#[tokio::test]
async fn test_reader_trait_returns_raw_values() {
    let mut manager = ConfigManager::new();
    manager.set(&ConfigScope::Global, config_keys::BASE_SEED, "99");
    let reader: &dyn ScheduleConfigReader = &manager;
    assert_eq!(
        reader.get_raw(&ConfigScope::Global, config_keys::BASE_SEED).await.unwrap(),
        Some("99".to_string())
    );
    assert_eq!(reader.get_raw(&ConfigScope::Global, "unknown").await.unwrap(), None);
}

#[tokio::test]
async fn test_malformed_values_are_config_errors() {
    let manager = ConfigManager::from_json_str(r#"{"global": {"window_end": "25h"}}"#).unwrap();
    let err = ScheduleSettings::load(&manager, &ConfigScope::Global).await.unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "window_end"));

    let manager =
        ConfigManager::from_json_str(r#"{"global": {"account_timeout_secs": 0}}"#).unwrap();
    assert!(BatchSettings::load(&manager).await.is_err());
}

#[test]
fn test_malformed_documents_rejected() {
    assert!(matches!(ConfigManager::from_json_str("{not json"), Err(ConfigError::Parse(_))));
    assert!(ConfigManager::from_json_str(r#"{"global": [1, 2]}"#).is_err());
    assert!(ConfigManager::from_json_str(r#"{"global": {"nested": {"a": 1}}}"#).is_err());
    assert!(matches!(
        ConfigManager::from_file("/nonexistent/schedule.json"),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn test_tier_table_validation() {
    let table = VolumeTierTable::standard().unwrap();
    assert_eq!(table.lookup(0).unwrap().tier, VolumeTier::Low);
    assert_eq!(table.lookup(3_000).unwrap().tier, VolumeTier::Mid);
    assert_eq!(table.lookup(1_000_000).unwrap().tier, VolumeTier::Ultra);

    let no_adjust = [DayAdjustment::new(0, 0, 0); 7];
    assert!(matches!(
        VolumeTierTable::new(Vec::new(), no_adjust),
        Err(ConfigError::MissingTierTable)
    ));
    let unordered = vec![
        TierRow { tier: VolumeTier::Low, min_size: 0, revenue: 3, engagement: 3, retention: 1 },
        TierRow { tier: VolumeTier::Mid, min_size: 0, revenue: 4, engagement: 4, retention: 1 },
    ];
    assert!(matches!(
        VolumeTierTable::new(unordered, no_adjust),
        Err(ConfigError::MalformedTierTable(_))
    ));
}

#[test]
fn test_empty_taxonomy_is_missing() {
    assert!(matches!(SendTypeCatalog::new(Vec::new()), Err(ConfigError::MissingTaxonomy)));
}

#[test]
fn test_tier_table_file_is_validated_on_load() {
    let empty = write_config(r#"{"tiers": []}"#);
    let raw = std::fs::read_to_string(empty.path()).unwrap();
    assert!(matches!(
        VolumeTierTable::from_json_str(&raw),
        Err(ConfigError::MissingTierTable)
    ));
    // serde 入口同样拒绝
    assert!(serde_json::from_str::<VolumeTierTable>(&raw).is_err());

    let unordered = r#"{"tiers": [
        {"tier": "LOW", "min_size": 0, "revenue": 3, "engagement": 3, "retention": 1},
        {"tier": "MID", "min_size": 0, "revenue": 4, "engagement": 4, "retention": 1}
    ]}"#;
    assert!(matches!(
        VolumeTierTable::from_json_str(unordered),
        Err(ConfigError::MalformedTierTable(_))
    ));
    assert!(matches!(VolumeTierTable::from_json_str("{not json"), Err(ConfigError::Parse(_))));
}
