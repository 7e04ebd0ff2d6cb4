// ==========================================
// 周度内容排期引擎 - 文案领域模型
// ==========================================
// 红线: CaptionAssignment 永不引用 AVOID 档文案
// 红线: 同一周内同一文案只能分配一次
// ==========================================

use crate::domain::types::{Category, ContentTier, ResolutionState};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// CaptionRecord - 文案快照（外部只读）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionRecord {
    pub caption_id: String,
    pub text: String,
    pub char_length: u32,
    pub content_type: String,      // 内容类型标签
    pub category: Category,        // 文案适配的发送类别
    pub performance_score: f64,    // 0-100
    #[serde(default)]
    pub last_used_date: Option<NaiveDate>,
    pub tier: ContentTier,
}

impl CaptionRecord {
    pub fn is_avoid(&self) -> bool {
        self.tier == ContentTier::Avoid
    }
}

// ==========================================
// ScoreBreakdown - 综合评分明细
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub freshness: f64,
    pub performance: f64,
    pub length_multiplier: f64,
    pub type_priority: f64,
    pub tier_weight: f64,
    pub composite: f64,
}

// ==========================================
// CaptionAssignment - 文案分配结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionAssignment {
    pub item_ref: String,               // 对应 ScheduledItem::item_ref
    pub send_type_key: String,
    pub caption_id: Option<String>,     // MANUAL_REQUIRED 时为空
    pub resolution: ResolutionState,
    pub manual_reason: Option<String>,
    pub score: Option<ScoreBreakdown>,
}

impl CaptionAssignment {
    pub fn is_manual_required(&self) -> bool {
        self.resolution == ResolutionState::ManualRequired
    }
}
