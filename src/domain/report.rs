// ==========================================
// 周度内容排期引擎 - 校验报告
// ==========================================

use crate::domain::types::ValidationStatus;
use serde::{Deserialize, Serialize};

// ==========================================
// ViolationCode - 违规检查族
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationCode {
    // ===== 硬门槛（命中即 REJECTED） =====
    AdjacentDuplicate,
    DailyCapExceeded,
    WeeklyCapExceeded,
    SpacingViolation,
    InsufficientVariety,
    CaptionReused,
    AvoidTierAssigned,

    // ===== 软检查（仅扣分） =====
    RepeatedDaySignature,
    QuarterHourClustering,
    RepeatedExactTime,
    CategoryImbalance,
    LowStrategyDiversity,
    ExcessManualCaptions,
}

impl ViolationCode {
    pub fn is_hard(&self) -> bool {
        matches!(
            self,
            ViolationCode::AdjacentDuplicate
                | ViolationCode::DailyCapExceeded
                | ViolationCode::WeeklyCapExceeded
                | ViolationCode::SpacingViolation
                | ViolationCode::InsufficientVariety
                | ViolationCode::CaptionReused
                | ViolationCode::AvoidTierAssigned
        )
    }

    /// 该检查族失败时的扣分
    pub fn deduction(&self) -> u32 {
        if self.is_hard() {
            return 25;
        }
        match self {
            ViolationCode::RepeatedDaySignature | ViolationCode::CategoryImbalance => 15,
            _ => 10,
        }
    }
}

/// 单条违规
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub code: ViolationCode,
    pub message: String,
}

// ==========================================
// ValidationMetrics - 校验指标
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationMetrics {
    pub total_items: usize,
    pub distinct_send_types: usize,
    pub distinct_day_signatures: usize,
    pub quarter_hour_pct: f64,
    pub max_time_repeat: usize,
    pub revenue_pct: f64,
    pub engagement_pct: f64,
    pub retention_pct: f64,
    pub distinct_strategy_labels: usize,
    pub manual_required: usize,
}

// ==========================================
// ValidationReport - 校验报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub status: ValidationStatus,
    pub score: u32, // 0-100 反模式评分
    pub violations: Vec<Violation>,
    pub recommendations: Vec<String>,
    pub metrics: ValidationMetrics,
}

impl ValidationReport {
    pub fn has_violation(&self, code: ViolationCode) -> bool {
        self.violations.iter().any(|v| v.code == code)
    }

    pub fn has_hard_violation(&self) -> bool {
        self.violations.iter().any(|v| v.code.is_hard())
    }

    pub fn violation_messages(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.message.clone()).collect()
    }
}
