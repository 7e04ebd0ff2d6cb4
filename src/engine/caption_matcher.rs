// ==========================================
// 周度内容排期引擎 - 文案匹配引擎
// ==========================================
// 红线: 永不分配 AVOID 档文案（任何回退级别都不放宽）
// 红线: 同一周内同一文案只分配一次
// ==========================================
// 职责: 为每个已落位条目选择最合适的文案
// 输入: ScheduledItem 序列 + 文案池快照 + 内容类型提示
// 输出: CaptionAssignment（文案 或 MANUAL_REQUIRED + 原因）
// 状态机: UNRESOLVED → {PRIMARY_MATCH | FALLBACK_L1..L4 | MANUAL_REQUIRED}
// ==========================================

mod fallback;
mod scoring;

#[cfg(test)]
mod tests;

pub use fallback::{
    confidence_scale, standard_ladder, Candidate, MatchRequest, SelectionStrategy,
    ThresholdSelection,
};
pub use scoring::{diversity_factor, freshness_score, length_multiplier};

use crate::config::settings::ScheduleSettings;
use crate::domain::caption::{CaptionAssignment, CaptionRecord};
use crate::domain::schedule::ScheduledItem;
use crate::domain::types::ResolutionState;
use crate::domain::volume::VolumeConfig;
use crate::domain::warning::ScheduleWarning;
use crate::engine::context::RunContext;
use crate::error::{EngineResult, ScheduleError};
use chrono::Duration;
use std::collections::HashMap;
use tracing::{debug, info};

/// 解析状态前移（仅允许 UNRESOLVED → 终态）
pub fn advance_resolution(
    from: ResolutionState,
    to: ResolutionState,
) -> EngineResult<ResolutionState> {
    if from.can_transition_to(to) {
        Ok(to)
    } else {
        Err(ScheduleError::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

// ==========================================
// CaptionMatcher
// ==========================================
pub struct CaptionMatcher {
    settings: ScheduleSettings,
}

impl CaptionMatcher {
    pub fn new(settings: ScheduleSettings) -> Self {
        Self { settings }
    }

    /// 匹配一周的全部条目（按时间顺序）
    pub fn match_week(
        &self,
        items: &[ScheduledItem],
        pool: &[CaptionRecord],
        volume: &VolumeConfig,
        ctx: &mut RunContext,
    ) -> EngineResult<Vec<CaptionAssignment>> {
        let ladder = standard_ladder(&self.settings, volume.confidence);
        let assignments = items
            .iter()
            .map(|item| self.match_item(item, pool, &volume.content_type_weights, &ladder, ctx))
            .collect::<EngineResult<Vec<_>>>()?;

        let manual = assignments.iter().filter(|a| a.is_manual_required()).count();
        info!(
            items = assignments.len(),
            pool = pool.len(),
            manual_required = manual,
            confidence = volume.confidence,
            "周度文案匹配完成"
        );
        Ok(assignments)
    }

    /// 匹配单个条目：依次尝试阶梯中的每一级
    pub fn match_item(
        &self,
        item: &ScheduledItem,
        pool: &[CaptionRecord],
        type_hints: &HashMap<String, f64>,
        ladder: &[Box<dyn SelectionStrategy>],
        ctx: &mut RunContext,
    ) -> EngineResult<CaptionAssignment> {
        let usage_window = Duration::hours(self.settings.usage_window_hours as i64);
        let request = MatchRequest {
            item,
            pool,
            type_hints,
            usage_window,
        };
        let state = ResolutionState::Unresolved;

        for strategy in ladder {
            let Some(candidate) = strategy.attempt(&request, ctx) else {
                continue;
            };
            if candidate.caption.is_avoid() {
                return Err(ScheduleError::AvoidTierViolation {
                    caption_id: candidate.caption.caption_id.clone(),
                });
            }

            let state = advance_resolution(state, strategy.resolution())?;
            ctx.mark_caption_used(&candidate.caption.caption_id);
            ctx.record_content_type(
                &candidate.caption.content_type,
                item.scheduled_at,
                usage_window,
            );

            debug!(
                item_ref = %item.item_ref(),
                caption_id = %candidate.caption.caption_id,
                resolution = %state,
                composite = candidate.score.composite,
                "文案已匹配"
            );
            return Ok(CaptionAssignment {
                item_ref: item.item_ref(),
                send_type_key: item.send_type_key().to_string(),
                caption_id: Some(candidate.caption.caption_id.clone()),
                resolution: state,
                manual_reason: None,
                score: Some(candidate.score),
            });
        }

        let state = advance_resolution(state, ResolutionState::ManualRequired)?;
        let reason = format!("回退阶梯耗尽: 类别 {} 无可用文案", item.category());
        ctx.warn(ScheduleWarning::CaptionUnavailable {
            item_ref: item.item_ref(),
            send_type_key: item.send_type_key().to_string(),
            reason: reason.clone(),
        });

        Ok(CaptionAssignment {
            item_ref: item.item_ref(),
            send_type_key: item.send_type_key().to_string(),
            caption_id: None,
            resolution: state,
            manual_reason: Some(reason),
            score: None,
        })
    }
}
