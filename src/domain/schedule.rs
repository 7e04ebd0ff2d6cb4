// ==========================================
// 周度内容排期引擎 - 排期条目领域模型
// ==========================================
// 生命周期: AllocationItem 仅存在于单次运行内，
//          被时段落位扩展为 ScheduledItem 后交给文案匹配
// ==========================================

use crate::domain::types::Category;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

// ==========================================
// AllocationItem - 配额分配条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationItem {
    pub date: NaiveDate,
    pub send_type_key: String,
    pub category: Category,
    pub slot_index: u32, // 当日序号（从 0 开始）
    pub priority: u8,
}

// ==========================================
// 时段标记
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimingFlag {
    OverflowWindow,   // 超出运营窗口，已钳制到窗口末尾
    SpacingViolation, // 无法满足同类型最小间隔
}

// ==========================================
// TimingMeta - 落位元数据
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingMeta {
    pub target_time: NaiveTime,   // 均匀分布目标时间
    pub computed_time: NaiveTime, // 间隔约束后的时间（抖动前）
    pub jitter_minutes: i64,      // 实际抖动量
    #[serde(default)]
    pub flags: Vec<TimingFlag>,
}

// ==========================================
// ScheduledItem - 已落位条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledItem {
    pub allocation: AllocationItem,
    pub scheduled_at: NaiveDateTime,
    pub timing: TimingMeta,
    pub followup_eligible: bool,
}

impl ScheduledItem {
    pub fn date(&self) -> NaiveDate {
        self.allocation.date
    }

    pub fn send_type_key(&self) -> &str {
        &self.allocation.send_type_key
    }

    pub fn category(&self) -> Category {
        self.allocation.category
    }

    pub fn time(&self) -> NaiveTime {
        self.scheduled_at.time()
    }

    pub fn has_flag(&self, flag: TimingFlag) -> bool {
        self.timing.flags.contains(&flag)
    }

    /// 条目引用标识（日期 + 序号）
    pub fn item_ref(&self) -> String {
        format!("{}#{}", self.allocation.date, self.allocation.slot_index)
    }
}

// ==========================================
// WeeklyStrategyMetadata - 单日策略标签
// ==========================================
// 仅用于下游多样性报告，不参与分配逻辑
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyStrategyMetadata {
    pub date: NaiveDate,
    pub label: String,
    pub emphasis: Option<String>,
    pub avoid: Option<String>,
}
