// ==========================================
// 文案匹配 - 回退阶梯
// ==========================================
// 红线: 每一级都排除 AVOID 档与本周已用文案，永不放宽
// 顺序: 主匹配 → 放宽新鲜度 → 放宽表现 → 双放宽 → 跨类别强表现
// ==========================================

use crate::config::settings::ScheduleSettings;
use crate::domain::caption::{CaptionRecord, ScoreBreakdown};
use crate::domain::schedule::ScheduledItem;
use crate::domain::types::ResolutionState;
use crate::engine::context::RunContext;
use chrono::Duration;
use std::cmp::Ordering;
use std::collections::HashMap;

use super::scoring::{freshness_score, score_caption, DEFAULT_TYPE_HINT};

/// 单个条目的匹配请求（只读）
pub struct MatchRequest<'a> {
    pub item: &'a ScheduledItem,
    pub pool: &'a [CaptionRecord],
    pub type_hints: &'a HashMap<String, f64>,
    pub usage_window: Duration,
}

/// 候选文案及其评分
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub caption: &'a CaptionRecord,
    pub score: ScoreBreakdown,
}

// ==========================================
// SelectionStrategy - 阶梯中的一级
// ==========================================
pub trait SelectionStrategy: Send + Sync {
    /// 命中时的解析状态
    fn resolution(&self) -> ResolutionState;

    /// 尝试选择；无合格候选返回 None
    fn attempt<'a>(&self, request: &MatchRequest<'a>, ctx: &RunContext) -> Option<Candidate<'a>>;
}

/// 阈值过滤 + 综合评分取最高
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdSelection {
    pub resolution: ResolutionState,
    pub min_performance: f64,
    pub min_freshness: f64,
    pub same_category: bool,
}

impl SelectionStrategy for ThresholdSelection {
    fn resolution(&self) -> ResolutionState {
        self.resolution
    }

    fn attempt<'a>(&self, request: &MatchRequest<'a>, ctx: &RunContext) -> Option<Candidate<'a>> {
        let on = request.item.date();
        let at = request.item.scheduled_at;

        request
            .pool
            .iter()
            .filter(|c| !c.is_avoid() && !ctx.is_caption_used(&c.caption_id))
            .filter(|c| !self.same_category || c.category == request.item.category())
            .filter(|c| c.performance_score >= self.min_performance)
            .filter(|c| freshness_score(c.last_used_date, on) >= self.min_freshness)
            .map(|c| {
                let hint = request
                    .type_hints
                    .get(&c.content_type)
                    .copied()
                    .unwrap_or(DEFAULT_TYPE_HINT);
                let uses = ctx.content_type_usage(&c.content_type, at, request.usage_window);
                Candidate {
                    caption: c,
                    score: score_caption(c, on, hint, uses),
                }
            })
            .max_by(compare_candidates)
    }
}

/// 排序: 综合分高者优先；同分取表现分高者；再同取 caption_id 字典序小者
pub(super) fn compare_candidates(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    a.score
        .composite
        .total_cmp(&b.score.composite)
        .then_with(|| a.caption.performance_score.total_cmp(&b.caption.performance_score))
        .then_with(|| b.caption.caption_id.cmp(&a.caption.caption_id))
}

/// 置信度对阈值的缩放系数: 0.6 + 0.4 × confidence
pub fn confidence_scale(confidence: f64) -> f64 {
    0.6 + 0.4 * confidence.clamp(0.0, 1.0)
}

/// 构造标准回退阶梯
pub fn standard_ladder(
    settings: &ScheduleSettings,
    confidence: f64,
) -> Vec<Box<dyn SelectionStrategy>> {
    let scale = confidence_scale(confidence);
    let performance = settings.min_performance * scale;
    let freshness = settings.min_freshness * scale;
    let relaxed = settings.relaxed_min_performance.min(performance);

    let step = |resolution, min_performance, min_freshness, same_category| {
        Box::new(ThresholdSelection {
            resolution,
            min_performance,
            min_freshness,
            same_category,
        }) as Box<dyn SelectionStrategy>
    };

    vec![
        step(ResolutionState::PrimaryMatch, performance, freshness, true),
        step(ResolutionState::FallbackL1, performance, 0.0, true),
        step(ResolutionState::FallbackL2, relaxed, freshness, true),
        step(ResolutionState::FallbackL3, relaxed, 0.0, true),
        step(ResolutionState::FallbackL4, settings.strong_performer_floor, 0.0, false),
    ]
}
