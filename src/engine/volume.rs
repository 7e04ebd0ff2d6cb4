// ==========================================
// 周度内容排期引擎 - 发送量解析引擎
// ==========================================
// 职责: 账号体量 + 滚动表现信号 → 每日类别配额
// 输入: AccountProfile + PerformanceSignals + 周起始日期
// 输出: VolumeConfig（每日配额、周分布、内容类型权重提示）
// 红线: 调整后每个适用类别至少 1 条
// ==========================================

use crate::config::tier_table::VolumeTierTable;
use crate::domain::types::{Category, PageType};
use crate::domain::volume::{AccountProfile, DailyVolume, PerformanceSignals, VolumeConfig};
use crate::error::ConfigError;
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

/// 饱和度高阈值（> 该值：营收 -1，互动 +1）
pub const SATURATION_HIGH: f64 = 70.0;
/// 饱和度低阈值（< 该值：营收 +1）
pub const SATURATION_LOW: f64 = 30.0;
/// 机会度阈值（>= 该值且饱和度 < 50：互动 +1）
pub const OPPORTUNITY_HIGH: f64 = 75.0;

// ==========================================
// VolumeConfigResolver
// ==========================================
pub struct VolumeConfigResolver {
    tier_table: Arc<VolumeTierTable>,
}

impl VolumeConfigResolver {
    pub fn new(tier_table: Arc<VolumeTierTable>) -> Self {
        Self { tier_table }
    }

    /// 解析一周（week_start 起 7 天）的发送量配置
    ///
    /// 规则:
    /// 1) 档位表查基础配额
    /// 2) 星期加减表
    /// 3) 饱和度/机会度调整
    /// 4) 每个适用类别下限 1；非付费页不排留存，留存配额并入营收
    pub fn resolve(
        &self,
        profile: &AccountProfile,
        signals: &PerformanceSignals,
        week_start: NaiveDate,
    ) -> Result<VolumeConfig, ConfigError> {
        validate_signals(signals)?;

        let row = self.tier_table.lookup(profile.account_size)?;
        let signal_delta = signal_adjustment(signals);

        let mut daily = Vec::with_capacity(7);
        let mut weekly_distribution = BTreeMap::new();

        for offset in 0..7 {
            let date = week_start + Duration::days(offset);
            let weekday = date.weekday();
            let day_delta = self.tier_table.day_adjustment(weekday);

            let mut counts = [0u32; 3];
            let mut folded = 0u32;
            for (i, category) in Category::ALL.iter().enumerate() {
                let raw = row.base(*category) as i32 + day_delta.get(*category) + signal_delta[i];
                let quota = raw.max(1) as u32;
                if category_applies(*category, profile.page_type) {
                    counts[i] = quota;
                } else {
                    folded += quota;
                }
            }
            // 不适用类别的配额并入营收
            counts[0] += folded;

            let volume = DailyVolume {
                date,
                weekday,
                revenue: counts[0],
                engagement: counts[1],
                retention: counts[2],
            };
            debug!(
                date = %date,
                weekday = ?weekday,
                revenue = volume.revenue,
                engagement = volume.engagement,
                retention = volume.retention,
                "单日配额"
            );
            weekly_distribution.insert(date, volume.total());
            daily.push(volume);
        }

        let content_type_weights: HashMap<String, f64> = signals
            .content_type_tiers
            .iter()
            .map(|(content_type, tier)| (content_type.clone(), tier.hint()))
            .collect();

        let config = VolumeConfig {
            tier: row.tier,
            page_type: profile.page_type,
            confidence: signals.confidence,
            daily,
            weekly_distribution,
            content_type_weights,
        };

        info!(
            account_id = %profile.account_id,
            tier = %config.tier,
            page_type = %config.page_type,
            weekly_total = config.weekly_total(),
            "发送量配置解析完成"
        );
        Ok(config)
    }
}

/// 非付费页不适用留存类别
fn category_applies(category: Category, page_type: PageType) -> bool {
    !(category == Category::Retention && page_type != PageType::Paid)
}

/// 饱和度/机会度调整（营收, 互动, 留存）
fn signal_adjustment(signals: &PerformanceSignals) -> [i32; 3] {
    let mut delta = [0i32; 3];
    if signals.saturation_score > SATURATION_HIGH {
        delta[0] -= 1;
        delta[1] += 1;
    } else if signals.saturation_score < SATURATION_LOW {
        delta[0] += 1;
    }
    if signals.opportunity_score >= OPPORTUNITY_HIGH && signals.saturation_score < 50.0 {
        delta[1] += 1;
    }
    delta
}

fn validate_signals(signals: &PerformanceSignals) -> Result<(), ConfigError> {
    for (key, value) in [
        ("saturation_score", signals.saturation_score),
        ("opportunity_score", signals.opportunity_score),
    ] {
        if !(0.0..=100.0).contains(&value) {
            return Err(ConfigError::invalid(key, value, "必须在 [0, 100] 范围内"));
        }
    }
    if !(0.0..=1.0).contains(&signals.confidence) {
        return Err(ConfigError::invalid("confidence", signals.confidence, "必须在 [0, 1] 范围内"));
    }
    Ok(())
}
