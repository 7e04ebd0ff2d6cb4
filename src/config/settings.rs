// ==========================================
// 周度内容排期引擎 - 运行参数快照
// ==========================================
// 用途: 运行开始前一次性读取配置，形成不可变快照
// ==========================================

use crate::config::config_manager::{config_keys, ConfigScope};
use crate::config::schedule_config_trait::ScheduleConfigReader;
use crate::error::ConfigError;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// 批量并发上限区间
pub const MAX_CONCURRENCY_LIMIT: usize = 8;

// ==========================================
// ScheduleSettings - 单账号排期参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSettings {
    pub window_start: NaiveTime,
    pub window_end: NaiveTime,
    pub jitter_minutes: u32,
    pub min_performance: f64,
    pub min_freshness: f64,
    pub relaxed_min_performance: f64,
    pub strong_performer_floor: f64,
    pub usage_window_hours: u32,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            window_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            window_end: NaiveTime::from_hms_opt(23, 0, 0).unwrap_or_default(),
            jitter_minutes: 7,
            min_performance: 40.0,
            min_freshness: 30.0,
            relaxed_min_performance: 20.0,
            strong_performer_floor: 60.0,
            usage_window_hours: 24,
        }
    }
}

impl ScheduleSettings {
    /// 从配置读取器加载（缺省键使用默认值）
    pub async fn load<R>(reader: &R, scope: &ConfigScope) -> Result<Self, ConfigError>
    where
        R: ScheduleConfigReader + ?Sized,
    {
        let defaults = Self::default();

        let settings = Self {
            window_start: read_time(reader, scope, config_keys::WINDOW_START, defaults.window_start)
                .await?,
            window_end: read_time(reader, scope, config_keys::WINDOW_END, defaults.window_end)
                .await?,
            jitter_minutes: read_parsed(
                reader,
                scope,
                config_keys::JITTER_MINUTES,
                defaults.jitter_minutes,
            )
            .await?,
            min_performance: read_parsed(
                reader,
                scope,
                config_keys::MIN_PERFORMANCE,
                defaults.min_performance,
            )
            .await?,
            min_freshness: read_parsed(
                reader,
                scope,
                config_keys::MIN_FRESHNESS,
                defaults.min_freshness,
            )
            .await?,
            relaxed_min_performance: read_parsed(
                reader,
                scope,
                config_keys::RELAXED_MIN_PERFORMANCE,
                defaults.relaxed_min_performance,
            )
            .await?,
            strong_performer_floor: read_parsed(
                reader,
                scope,
                config_keys::STRONG_PERFORMER_FLOOR,
                defaults.strong_performer_floor,
            )
            .await?,
            usage_window_hours: read_parsed(
                reader,
                scope,
                config_keys::USAGE_WINDOW_HOURS,
                defaults.usage_window_hours,
            )
            .await?,
        };

        settings.validate()?;
        Ok(settings)
    }

    /// 校验参数一致性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_end <= self.window_start {
            return Err(ConfigError::invalid(
                config_keys::WINDOW_END,
                self.window_end,
                format!("必须晚于 window_start={}", self.window_start),
            ));
        }
        for (key, value) in [
            (config_keys::MIN_PERFORMANCE, self.min_performance),
            (config_keys::MIN_FRESHNESS, self.min_freshness),
            (config_keys::RELAXED_MIN_PERFORMANCE, self.relaxed_min_performance),
            (config_keys::STRONG_PERFORMER_FLOOR, self.strong_performer_floor),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::invalid(key, value, "必须在 [0, 100] 范围内"));
            }
        }
        if self.relaxed_min_performance > self.min_performance {
            return Err(ConfigError::invalid(
                config_keys::RELAXED_MIN_PERFORMANCE,
                self.relaxed_min_performance,
                "放宽后的阈值不得高于基础阈值",
            ));
        }
        Ok(())
    }

    /// 运营窗口时长（分钟）
    pub fn window_span_minutes(&self) -> i64 {
        (self.window_end - self.window_start).num_minutes()
    }
}

// ==========================================
// BatchSettings - 批量执行参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSettings {
    pub max_concurrency: usize,
    pub account_timeout: Duration,
    pub fail_fast: bool,
    pub base_seed: u64,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            account_timeout: Duration::from_secs(30),
            fail_fast: false,
            base_seed: 0,
        }
    }
}

impl BatchSettings {
    pub async fn load<R>(reader: &R) -> Result<Self, ConfigError>
    where
        R: ScheduleConfigReader + ?Sized,
    {
        let scope = ConfigScope::Global;
        let defaults = Self::default();

        let max_concurrency: usize = read_parsed(
            reader,
            &scope,
            config_keys::MAX_CONCURRENCY,
            defaults.max_concurrency,
        )
        .await?;
        let timeout_secs: u64 = read_parsed(
            reader,
            &scope,
            config_keys::ACCOUNT_TIMEOUT_SECS,
            defaults.account_timeout.as_secs(),
        )
        .await?;
        if timeout_secs == 0 {
            return Err(ConfigError::invalid(
                config_keys::ACCOUNT_TIMEOUT_SECS,
                timeout_secs,
                "超时必须大于 0",
            ));
        }

        Ok(Self {
            max_concurrency: max_concurrency.clamp(1, MAX_CONCURRENCY_LIMIT),
            account_timeout: Duration::from_secs(timeout_secs),
            fail_fast: read_parsed(reader, &scope, config_keys::FAIL_FAST, defaults.fail_fast)
                .await?,
            base_seed: read_parsed(reader, &scope, config_keys::BASE_SEED, defaults.base_seed)
                .await?,
        })
    }

    /// 实际生效的并发度（1..=8）
    pub fn effective_concurrency(&self) -> usize {
        self.max_concurrency.clamp(1, MAX_CONCURRENCY_LIMIT)
    }
}

// ==========================================
// 读取辅助
// ==========================================

async fn read_parsed<R, T>(
    reader: &R,
    scope: &ConfigScope,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    R: ScheduleConfigReader + ?Sized,
    T: FromStr,
{
    match reader.get_raw(scope, key).await? {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::invalid(key, &raw, "无法解析")),
        None => Ok(default),
    }
}

async fn read_time<R>(
    reader: &R,
    scope: &ConfigScope,
    key: &str,
    default: NaiveTime,
) -> Result<NaiveTime, ConfigError>
where
    R: ScheduleConfigReader + ?Sized,
{
    match reader.get_raw(scope, key).await? {
        Some(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M")
            .map_err(|_| ConfigError::invalid(key, &raw, "时间格式必须为 HH:MM")),
        None => Ok(default),
    }
}
