// ==========================================
// 周度内容排期引擎 - 可恢复告警
// ==========================================
// 说明: 以下情况不中断运行，只记录并降级处理
// - AllocationShortfall: 宁可少排，不破硬规则
// - SpacingViolation / OverflowWindow: 推到最近有效时段或打标
// - CaptionUnavailable: 回退阶梯耗尽，转人工
// ==========================================

use crate::domain::types::Category;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleWarning {
    AllocationShortfall {
        date: NaiveDate,
        category: Category,
        requested: u32,
        filled: u32,
        reason: String,
    },
    SpacingViolation {
        item_ref: String,
        send_type_key: String,
        scheduled_at: NaiveDateTime,
        required_minutes: u32,
    },
    OverflowWindow {
        item_ref: String,
        send_type_key: String,
        scheduled_at: NaiveDateTime,
    },
    CaptionUnavailable {
        item_ref: String,
        send_type_key: String,
        reason: String,
    },
}

impl ScheduleWarning {
    pub fn code(&self) -> &'static str {
        match self {
            ScheduleWarning::AllocationShortfall { .. } => "ALLOCATION_SHORTFALL",
            ScheduleWarning::SpacingViolation { .. } => "SPACING_VIOLATION",
            ScheduleWarning::OverflowWindow { .. } => "OVERFLOW_WINDOW",
            ScheduleWarning::CaptionUnavailable { .. } => "CAPTION_UNAVAILABLE",
        }
    }
}

impl fmt::Display for ScheduleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleWarning::AllocationShortfall {
                date,
                category,
                requested,
                filled,
                reason,
            } => write!(
                f,
                "ALLOCATION_SHORTFALL: date={}, category={}, filled={}/{}, reason={}",
                date, category, filled, requested, reason
            ),
            ScheduleWarning::SpacingViolation {
                item_ref,
                send_type_key,
                scheduled_at,
                required_minutes,
            } => write!(
                f,
                "SPACING_VIOLATION: item={}, type={}, at={}, required={}min",
                item_ref, send_type_key, scheduled_at, required_minutes
            ),
            ScheduleWarning::OverflowWindow {
                item_ref,
                send_type_key,
                scheduled_at,
            } => write!(
                f,
                "OVERFLOW_WINDOW: item={}, type={}, clamped_to={}",
                item_ref, send_type_key, scheduled_at
            ),
            ScheduleWarning::CaptionUnavailable {
                item_ref,
                send_type_key,
                reason,
            } => write!(
                f,
                "CAPTION_UNAVAILABLE: item={}, type={}, reason={}",
                item_ref, send_type_key, reason
            ),
        }
    }
}
