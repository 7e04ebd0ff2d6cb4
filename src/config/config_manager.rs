// ==========================================
// 周度内容排期引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: 内存 key-value + scope（账号级覆写全局）
// 来源: JSON 文档 {"global": {...}, "accounts": {"<id>": {...}}}
// ==========================================

use crate::config::schedule_config_trait::ScheduleConfigReader;
use crate::error::ConfigError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    global: HashMap<String, String>,
    accounts: HashMap<String, HashMap<String, String>>,
}

impl ConfigManager {
    /// 创建空配置（全部使用默认值）
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 字符串加载
    ///
    /// # 格式
    /// ```json
    /// {"global": {"jitter_minutes": 5}, "accounts": {"acc_1": {"window_start": "10:00"}}}
    /// ```
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let doc: Value = serde_json::from_str(raw)?;
        let mut manager = Self::new();

        if let Some(global) = doc.get("global") {
            for (key, value) in object_entries("global", global)? {
                manager.set(&ConfigScope::Global, &key, &value);
            }
        }

        if let Some(accounts) = doc.get("accounts") {
            let accounts = accounts
                .as_object()
                .ok_or_else(|| ConfigError::invalid("accounts", accounts, "必须为对象"))?;
            for (account_id, entries) in accounts {
                let scope = ConfigScope::Account {
                    account_id: account_id.clone(),
                };
                for (key, value) in object_entries(account_id, entries)? {
                    manager.set(&scope, &key, &value);
                }
            }
        }

        debug!(
            global_keys = manager.global.len(),
            account_scopes = manager.accounts.len(),
            "配置加载完成"
        );
        Ok(manager)
    }

    /// 从 JSON 文件加载
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// 写入配置值
    pub fn set(&mut self, scope: &ConfigScope, key: &str, value: &str) {
        let bucket = match scope {
            ConfigScope::Global => &mut self.global,
            ConfigScope::Account { account_id } => {
                self.accounts.entry(account_id.clone()).or_default()
            }
        };
        bucket.insert(key.to_string(), value.to_string());
    }

    /// 读取配置值（账号级优先，其次全局）
    pub fn get(&self, scope: &ConfigScope, key: &str) -> Option<&str> {
        if let ConfigScope::Account { account_id } = scope {
            if let Some(value) = self.accounts.get(account_id).and_then(|m| m.get(key)) {
                return Some(value.as_str());
            }
        }
        self.global.get(key).map(|s| s.as_str())
    }
}

/// 展开 JSON 对象为 (key, 字符串值) 列表
fn object_entries(scope_name: &str, value: &Value) -> Result<Vec<(String, String)>, ConfigError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ConfigError::invalid(scope_name, value, "配置作用域必须为对象"))?;

    obj.iter()
        .map(|(k, v)| {
            let raw = match v {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => return Err(ConfigError::invalid(k, other, "仅支持字符串/数字/布尔值")),
            };
            Ok((k.clone(), raw))
        })
        .collect()
}

#[async_trait]
impl ScheduleConfigReader for ConfigManager {
    async fn get_raw(&self, scope: &ConfigScope, key: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.get(scope, key).map(|s| s.to_string()))
    }
}

// ==========================================
// ConfigScope - 配置作用域
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConfigScope {
    Global,                          // 全局
    Account { account_id: String },  // 账号
}

impl ConfigScope {
    pub fn account(account_id: &str) -> Self {
        ConfigScope::Account {
            account_id: account_id.to_string(),
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 运营窗口
    pub const WINDOW_START: &str = "window_start";
    pub const WINDOW_END: &str = "window_end";
    pub const JITTER_MINUTES: &str = "jitter_minutes";

    // 文案匹配阈值
    pub const MIN_PERFORMANCE: &str = "min_performance";
    pub const MIN_FRESHNESS: &str = "min_freshness";
    pub const RELAXED_MIN_PERFORMANCE: &str = "relaxed_min_performance";
    pub const STRONG_PERFORMER_FLOOR: &str = "strong_performer_floor";
    pub const USAGE_WINDOW_HOURS: &str = "usage_window_hours";

    // 批量执行
    pub const MAX_CONCURRENCY: &str = "max_concurrency";
    pub const ACCOUNT_TIMEOUT_SECS: &str = "account_timeout_secs";
    pub const FAIL_FAST: &str = "fail_fast";
    pub const BASE_SEED: &str = "base_seed";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_scope_overrides_global() {
        let manager = ConfigManager::from_json_str(
            r#"{"global": {"jitter_minutes": 7, "window_start": "08:00"},
                "accounts": {"acc_1": {"jitter_minutes": 3}}}"#,
        )
        .unwrap();

        let scope = ConfigScope::account("acc_1");
        assert_eq!(manager.get(&scope, config_keys::JITTER_MINUTES), Some("3"));
        assert_eq!(manager.get(&scope, config_keys::WINDOW_START), Some("08:00"));
        assert_eq!(manager.get(&ConfigScope::Global, config_keys::JITTER_MINUTES), Some("7"));
        assert_eq!(
            manager.get(&ConfigScope::account("other"), config_keys::JITTER_MINUTES),
            Some("7")
        );
    }

    #[test]
    fn test_bool_values_are_stringified() {
        let manager = ConfigManager::from_json_str(r#"{"global": {"fail_fast": true}}"#).unwrap();
        assert_eq!(manager.get(&ConfigScope::Global, config_keys::FAIL_FAST), Some("true"));
    }

    #[test]
    fn test_nested_value_rejected() {
        let result = ConfigManager::from_json_str(r#"{"global": {"window_start": [1, 2]}}"#);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            ConfigManager::from_json_str("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
