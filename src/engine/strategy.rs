// ==========================================
// 周度内容排期引擎 - 每日策略标签
// ==========================================
// 用途：
// - 为一周内每天分配一个描述性策略标签，供下游多样性报告使用；
// - 标签不参与分配逻辑，仅记录当日侧重与回避的发送类型。

use crate::domain::schedule::{ScheduledItem, WeeklyStrategyMetadata};
use crate::engine::context::RunContext;
use chrono::NaiveDate;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// 单日策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStrategy {
    Balanced,
    RevenuePush,
    EngagementBuild,
    RetentionFocus,
    SoftSell,
    HighEnergy,
    Recovery,
}

impl DayStrategy {
    pub const ALL: [DayStrategy; 7] = [
        DayStrategy::Balanced,
        DayStrategy::RevenuePush,
        DayStrategy::EngagementBuild,
        DayStrategy::RetentionFocus,
        DayStrategy::SoftSell,
        DayStrategy::HighEnergy,
        DayStrategy::Recovery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DayStrategy::Balanced => "balanced",
            DayStrategy::RevenuePush => "revenue_push",
            DayStrategy::EngagementBuild => "engagement_build",
            DayStrategy::RetentionFocus => "retention_focus",
            DayStrategy::SoftSell => "soft_sell",
            DayStrategy::HighEnergy => "high_energy",
            DayStrategy::Recovery => "recovery",
        }
    }
}

impl Default for DayStrategy {
    fn default() -> Self {
        DayStrategy::Balanced
    }
}

impl std::str::FromStr for DayStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "balanced" => Ok(DayStrategy::Balanced),
            "revenue_push" => Ok(DayStrategy::RevenuePush),
            "engagement_build" => Ok(DayStrategy::EngagementBuild),
            "retention_focus" => Ok(DayStrategy::RetentionFocus),
            "soft_sell" => Ok(DayStrategy::SoftSell),
            "high_energy" => Ok(DayStrategy::HighEnergy),
            "recovery" => Ok(DayStrategy::Recovery),
            other => Err(format!("未知策略标签: {}", other)),
        }
    }
}

/// 生成一周策略元数据
///
/// - 标签按运行随机源打乱后逐日分配
/// - emphasis = 当日出现最多的发送类型（同数取先出现者）
/// - avoid = 前一日 emphasis（与当日不同时）
pub fn build_weekly_strategy(
    dates: &[NaiveDate],
    items: &[ScheduledItem],
    ctx: &mut RunContext,
) -> Vec<WeeklyStrategyMetadata> {
    let mut labels = DayStrategy::ALL.to_vec();
    labels.shuffle(ctx.rng());

    let mut by_day: BTreeMap<NaiveDate, Vec<&str>> = BTreeMap::new();
    for item in items {
        by_day.entry(item.date()).or_default().push(item.send_type_key());
    }

    let mut previous_emphasis: Option<String> = None;
    dates
        .iter()
        .enumerate()
        .map(|(i, date)| {
            let emphasis = by_day.get(date).and_then(|keys| most_frequent(keys));
            let avoid = previous_emphasis
                .take()
                .filter(|prev| emphasis.as_deref() != Some(prev.as_str()));
            previous_emphasis = emphasis.clone();

            WeeklyStrategyMetadata {
                date: *date,
                label: labels[i % labels.len()].as_str().to_string(),
                emphasis,
                avoid,
            }
        })
        .collect()
}

fn most_frequent(keys: &[&str]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    let max = counts.values().copied().max()?;
    keys.iter()
        .find(|k| counts.get(*k).copied() == Some(max))
        .map(|k| k.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schedule::{AllocationItem, TimingMeta};
    use crate::domain::types::Category;
    use chrono::Duration;
    use std::collections::HashSet;

    fn item(date: NaiveDate, key: &str, slot: u32) -> ScheduledItem {
        let at = date.and_hms_opt(9, 7, 0).unwrap() + Duration::minutes(slot as i64 * 90);
        ScheduledItem {
            allocation: AllocationItem {
                date,
                send_type_key: key.to_string(),
                category: Category::Revenue,
                slot_index: slot,
                priority: 1,
            },
            scheduled_at: at,
            timing: TimingMeta {
                target_time: at.time(),
                computed_time: at.time(),
                jitter_minutes: 0,
                flags: Vec::new(),
            },
            followup_eligible: false,
        }
    }

    #[test]
    fn test_labels_distinct_across_week() {
        let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let dates: Vec<NaiveDate> = (0..7).map(|d| monday + Duration::days(d)).collect();
        let mut ctx = RunContext::seeded(3);
        let meta = build_weekly_strategy(&dates, &[], &mut ctx);
        let labels: HashSet<&str> = meta.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(meta.len(), 7);
        assert_eq!(labels.len(), 7);
        assert!(meta.iter().all(|m| m.emphasis.is_none() && m.avoid.is_none()));
    }

    #[test]
    fn test_emphasis_and_avoid() {
        let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let tuesday = monday + Duration::days(1);
        let items = vec![
            item(monday, "ppv_unlock", 0),
            item(monday, "link_drop", 1),
            item(monday, "ppv_unlock", 2),
            item(tuesday, "bundle", 0),
            item(tuesday, "link_drop", 1),
            item(tuesday, "bundle", 2),
        ];
        let mut ctx = RunContext::seeded(3);
        let meta = build_weekly_strategy(&[monday, tuesday], &items, &mut ctx);
        assert_eq!(meta[0].emphasis.as_deref(), Some("ppv_unlock"));
        assert_eq!(meta[0].avoid, None);
        assert_eq!(meta[1].emphasis.as_deref(), Some("bundle"));
        assert_eq!(meta[1].avoid.as_deref(), Some("ppv_unlock"));
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!("revenue-push".parse::<DayStrategy>().unwrap(), DayStrategy::RevenuePush);
        assert_eq!(" Recovery ".parse::<DayStrategy>().unwrap(), DayStrategy::Recovery);
        assert!("unknown".parse::<DayStrategy>().is_err());
    }
}
