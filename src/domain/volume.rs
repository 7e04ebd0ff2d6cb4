// ==========================================
// 周度内容排期引擎 - 发送量领域模型
// ==========================================
// 用途: 体量档位解析输入与每日类别配额输出
// ==========================================

use crate::domain::types::{Category, ContentTier, PageType, VolumeTier};
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ==========================================
// AccountProfile - 账号画像（上游提供）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountProfile {
    pub account_id: String,
    pub account_size: u32,   // 粉丝/订阅体量
    pub page_type: PageType,
}

// ==========================================
// PerformanceSignals - 滚动表现信号
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceSignals {
    pub saturation_score: f64,  // 饱和度 0-100
    pub opportunity_score: f64, // 机会度 0-100
    pub confidence: f64,        // 置信度 0-1

    /// 内容类型档位（content_type -> TOP/MID/LOW/AVOID）
    #[serde(default)]
    pub content_type_tiers: HashMap<String, ContentTier>,
}

// ==========================================
// DailyVolume - 单日类别配额
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyVolume {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub revenue: u32,
    pub engagement: u32,
    pub retention: u32,
}

impl DailyVolume {
    pub fn get(&self, category: Category) -> u32 {
        match category {
            Category::Revenue => self.revenue,
            Category::Engagement => self.engagement,
            Category::Retention => self.retention,
        }
    }

    pub fn total(&self) -> u32 {
        self.revenue + self.engagement + self.retention
    }
}

// ==========================================
// VolumeConfig - 解析后的周度发送量配置
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeConfig {
    pub tier: VolumeTier,
    pub page_type: PageType,
    pub confidence: f64,                           // 透传给文案匹配以放宽阈值
    pub daily: Vec<DailyVolume>,                   // 7 天，按日期升序
    pub weekly_distribution: BTreeMap<NaiveDate, u32>, // 日期 -> 当日总条数
    pub content_type_weights: HashMap<String, f64>,    // 内容类型权重提示 0-1
}

impl VolumeConfig {
    pub fn weekly_total(&self) -> u32 {
        self.weekly_distribution.values().sum()
    }

    pub fn for_date(&self, date: NaiveDate) -> Option<&DailyVolume> {
        self.daily.iter().find(|d| d.date == date)
    }
}
