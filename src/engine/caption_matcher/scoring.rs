use crate::domain::caption::{CaptionRecord, ScoreBreakdown};
use chrono::NaiveDate;

// 综合评分权重（合计 1.0）
pub const WEIGHT_FRESHNESS: f64 = 0.35;
pub const WEIGHT_PERFORMANCE: f64 = 0.30;
pub const WEIGHT_LENGTH: f64 = 0.20;
pub const WEIGHT_TYPE_PRIORITY: f64 = 0.10;
pub const WEIGHT_TIER: f64 = 0.05;

/// 内容类型未出现在排名表时的提示值
pub const DEFAULT_TYPE_HINT: f64 = 0.5;

/// 新鲜度: clamp(100 - 2 × 距上次使用天数, 0, 100)，从未使用为 100
pub fn freshness_score(last_used: Option<NaiveDate>, on: NaiveDate) -> f64 {
    match last_used {
        None => 100.0,
        Some(last) => {
            let days = (on - last).num_days().max(0) as f64;
            (100.0 - 2.0 * days).clamp(0.0, 100.0)
        }
    }
}

/// 长度系数（分段曲线，中等长度最高）
pub fn length_multiplier(char_length: u32) -> f64 {
    match char_length {
        0..=79 => 0.4,
        80..=149 => 0.7,
        150..=249 => 0.9,
        250..=449 => 1.0,
        450..=649 => 0.8,
        _ => 0.55,
    }
}

/// 多样性系数：滚动窗口内同内容类型已用次数越多越低
pub fn diversity_factor(recent_uses: usize) -> f64 {
    match recent_uses {
        0 | 1 => 1.0,
        2 => 0.5,
        _ => 0.25,
    }
}

/// 计算单条文案的综合评分
///
/// length_multiplier 为 0-1 系数，参与加权前放大到 0-100 刻度
pub(super) fn score_caption(
    caption: &CaptionRecord,
    on: NaiveDate,
    type_hint: f64,
    recent_uses: usize,
) -> ScoreBreakdown {
    let freshness = freshness_score(caption.last_used_date, on);
    let performance = caption.performance_score.clamp(0.0, 100.0);
    let length = length_multiplier(caption.char_length);
    let type_priority = 100.0 * type_hint.clamp(0.0, 1.0) * diversity_factor(recent_uses);
    let tier_weight = caption.tier.weight();

    let composite = freshness * WEIGHT_FRESHNESS
        + performance * WEIGHT_PERFORMANCE
        + length * 100.0 * WEIGHT_LENGTH
        + type_priority * WEIGHT_TYPE_PRIORITY
        + tier_weight * WEIGHT_TIER;

    ScoreBreakdown {
        freshness,
        performance,
        length_multiplier: length,
        type_priority,
        tier_weight,
        composite,
    }
}
