// ==========================================
// 周度内容排期引擎 - 体量档位表
// ==========================================
// 职责: 账号体量 → 每日类别基础配额；星期加减表
// 校验: 表缺失或格式错误 → ConfigError（该账号运行终止）
// ==========================================

use crate::domain::types::{Category, VolumeTier};
use crate::error::ConfigError;
use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// 单个体量档位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierRow {
    pub tier: VolumeTier,
    pub min_size: u32, // 含下界
    pub revenue: u32,
    pub engagement: u32,
    pub retention: u32,
}

impl TierRow {
    pub fn base(&self, category: Category) -> u32 {
        match category {
            Category::Revenue => self.revenue,
            Category::Engagement => self.engagement,
            Category::Retention => self.retention,
        }
    }
}

/// 星期加减（营收, 互动, 留存）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DayAdjustment {
    pub revenue: i32,
    pub engagement: i32,
    pub retention: i32,
}

impl DayAdjustment {
    pub const fn new(revenue: i32, engagement: i32, retention: i32) -> Self {
        Self {
            revenue,
            engagement,
            retention,
        }
    }

    pub fn get(&self, category: Category) -> i32 {
        match category {
            Category::Revenue => self.revenue,
            Category::Engagement => self.engagement,
            Category::Retention => self.retention,
        }
    }
}

// ==========================================
// VolumeTierTable
// ==========================================
// 反序列化同样经过 VolumeTierTable::new 校验
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawVolumeTierTable")]
pub struct VolumeTierTable {
    tiers: Vec<TierRow>,
    /// 周一..周日
    day_adjustments: [DayAdjustment; 7],
}

/// 未校验的档位表文档
#[derive(Debug, Deserialize)]
struct RawVolumeTierTable {
    #[serde(default)]
    tiers: Vec<TierRow>,
    #[serde(default)]
    day_adjustments: [DayAdjustment; 7],
}

impl TryFrom<RawVolumeTierTable> for VolumeTierTable {
    type Error = ConfigError;

    fn try_from(raw: RawVolumeTierTable) -> Result<Self, Self::Error> {
        Self::new(raw.tiers, raw.day_adjustments)
    }
}

impl VolumeTierTable {
    /// 构建并校验档位表
    ///
    /// # 验证规则
    /// 1. 档位不能为空
    /// 2. 第一档 min_size 必须为 0（覆盖全部体量）
    /// 3. min_size 严格递增
    /// 4. 每档营收/互动基础配额 >= 1
    pub fn new(
        tiers: Vec<TierRow>,
        day_adjustments: [DayAdjustment; 7],
    ) -> Result<Self, ConfigError> {
        if tiers.is_empty() {
            return Err(ConfigError::MissingTierTable);
        }
        if tiers[0].min_size != 0 {
            return Err(ConfigError::MalformedTierTable(format!(
                "第一档 min_size 必须为 0，实际为 {}",
                tiers[0].min_size
            )));
        }
        for pair in tiers.windows(2) {
            if pair[1].min_size <= pair[0].min_size {
                return Err(ConfigError::MalformedTierTable(format!(
                    "档位阈值未严格递增: {} ({}) -> {} ({})",
                    pair[0].tier, pair[0].min_size, pair[1].tier, pair[1].min_size
                )));
            }
        }
        if let Some(row) = tiers.iter().find(|r| r.revenue == 0 || r.engagement == 0) {
            return Err(ConfigError::MalformedTierTable(format!(
                "档位 {} 的营收/互动基础配额必须 >= 1",
                row.tier
            )));
        }

        Ok(Self {
            tiers,
            day_adjustments,
        })
    }

    /// 默认档位表
    pub fn standard() -> Result<Self, ConfigError> {
        #[rustfmt::skip]
        let tiers = vec![
            TierRow { tier: VolumeTier::Low, min_size: 0, revenue: 3, engagement: 3, retention: 1 },
            TierRow { tier: VolumeTier::Mid, min_size: 1_000, revenue: 4, engagement: 4, retention: 1 },
            TierRow { tier: VolumeTier::High, min_size: 5_000, revenue: 6, engagement: 5, retention: 2 },
            TierRow { tier: VolumeTier::Ultra, min_size: 15_000, revenue: 8, engagement: 6, retention: 2 },
        ];
        let day_adjustments = [
            DayAdjustment::new(0, 1, 0),  // 周一: 互动 +1
            DayAdjustment::new(0, 0, 0),  // 周二
            DayAdjustment::new(0, 0, 0),  // 周三
            DayAdjustment::new(0, 0, 0),  // 周四
            DayAdjustment::new(1, 0, 0),  // 周五: 营收 +1
            DayAdjustment::new(1, 0, 0),  // 周六: 营收 +1
            DayAdjustment::new(0, -1, 0), // 周日: 互动 -1
        ];
        Self::new(tiers, day_adjustments)
    }

    /// 从 JSON 文档加载并校验
    ///
    /// # 格式
    /// ```json
    /// {"tiers": [{"tier": "LOW", "min_size": 0, "revenue": 3, "engagement": 3, "retention": 1}]}
    /// ```
    /// day_adjustments 缺省为全 0
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let doc: RawVolumeTierTable = serde_json::from_str(raw)?;
        Self::try_from(doc)
    }

    /// 按体量查找档位（取 min_size <= size 的最高档）
    pub fn lookup(&self, account_size: u32) -> Result<&TierRow, ConfigError> {
        self.tiers
            .iter()
            .rev()
            .find(|row| row.min_size <= account_size)
            .ok_or(ConfigError::MissingTierTable)
    }

    pub fn day_adjustment(&self, weekday: Weekday) -> DayAdjustment {
        self.day_adjustments[weekday.num_days_from_monday() as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_tiers() {
        let table = VolumeTierTable::standard().unwrap();
        assert_eq!(table.lookup(0).unwrap().tier, VolumeTier::Low);
        assert_eq!(table.lookup(999).unwrap().tier, VolumeTier::Low);
        assert_eq!(table.lookup(3_000).unwrap().tier, VolumeTier::Mid);
        assert_eq!(table.lookup(3_000).unwrap().revenue, 4);
        assert_eq!(table.lookup(5_000).unwrap().tier, VolumeTier::High);
        assert_eq!(table.lookup(100_000).unwrap().tier, VolumeTier::Ultra);
    }

    #[test]
    fn test_friday_adjustment() {
        let table = VolumeTierTable::standard().unwrap();
        assert_eq!(table.day_adjustment(Weekday::Fri).revenue, 1);
        assert_eq!(table.day_adjustment(Weekday::Tue), DayAdjustment::default());
    }

    #[test]
    fn test_empty_table_is_missing() {
        let result = VolumeTierTable::new(vec![], [DayAdjustment::default(); 7]);
        assert!(matches!(result, Err(ConfigError::MissingTierTable)));
    }

    #[test]
    fn test_non_ascending_thresholds_rejected() {
        let tiers = vec![
            TierRow { tier: VolumeTier::Low, min_size: 0, revenue: 3, engagement: 3, retention: 1 },
            TierRow { tier: VolumeTier::Mid, min_size: 0, revenue: 4, engagement: 4, retention: 1 },
        ];
        let result = VolumeTierTable::new(tiers, [DayAdjustment::default(); 7]);
        assert!(matches!(result, Err(ConfigError::MalformedTierTable(_))));
    }

    #[test]
    fn test_first_tier_must_start_at_zero() {
        let tiers = vec![TierRow {
            tier: VolumeTier::Mid,
            min_size: 100,
            revenue: 4,
            engagement: 4,
            retention: 1,
        }];
        assert!(VolumeTierTable::new(tiers, [DayAdjustment::default(); 7]).is_err());
    }

    #[test]
    fn test_empty_json_table_is_missing() {
        let result = VolumeTierTable::from_json_str(r#"{"tiers": []}"#);
        assert!(matches!(result, Err(ConfigError::MissingTierTable)));
    }

    #[test]
    fn test_serde_path_runs_validation() {
        let err = serde_json::from_str::<VolumeTierTable>(r#"{"tiers": []}"#).unwrap_err();
        assert!(err.to_string().contains("体量档位表缺失"));

        let json = r#"{"tiers": [
            {"tier": "LOW", "min_size": 0, "revenue": 3, "engagement": 3, "retention": 1},
            {"tier": "MID", "min_size": 500, "revenue": 4, "engagement": 4, "retention": 1}
        ]}"#;
        let table: VolumeTierTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.lookup(800).unwrap().tier, VolumeTier::Mid);
        assert_eq!(table.day_adjustment(Weekday::Fri), DayAdjustment::default());
    }

    #[test]
    fn test_serialized_standard_table_reloads() {
        let json = serde_json::to_string(&VolumeTierTable::standard().unwrap()).unwrap();
        let table = VolumeTierTable::from_json_str(&json).unwrap();
        assert_eq!(table.day_adjustment(Weekday::Sat).revenue, 1);
        assert_eq!(table.lookup(20_000).unwrap().tier, VolumeTier::Ultra);
    }
}
