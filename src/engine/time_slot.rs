// ==========================================
// 周度内容排期引擎 - 时段落位引擎
// ==========================================
// 红线: 同日同类型间隔 >= min_spacing
// 红线: 溢出运营窗口的条目打标，不静默丢弃
// ==========================================
// 职责: 为已分配条目确定具体时间
// 输入: 每日 AllocationItem 序列 + 运营窗口
// 输出: ScheduledItem（目标时间 / 约束后时间 / 抖动 / 标记）
// ==========================================

use crate::config::settings::ScheduleSettings;
use crate::domain::schedule::{AllocationItem, ScheduledItem, TimingFlag, TimingMeta};
use crate::domain::send_type::SendTypeCatalog;
use crate::domain::warning::ScheduleWarning;
use crate::engine::context::RunContext;
use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info};

/// 单日整刻钟占比上限（严格小于）
pub const QUARTER_HOUR_MAX_RATIO: f64 = 0.10;
/// 同一时刻一周内最多使用次数
pub const MAX_TIME_OF_DAY_REPEAT: u32 = 2;
/// 抖动重抽次数
pub const JITTER_ATTEMPTS: usize = 6;

/// 是否落在整刻钟（:00/:15/:30/:45）
pub fn is_quarter_hour(time: NaiveTime) -> bool {
    time.minute() % 15 == 0 && time.second() == 0
}

// ==========================================
// TimeSlotScheduler
// ==========================================
pub struct TimeSlotScheduler {
    catalog: Arc<SendTypeCatalog>,
    window_start: NaiveTime,
    window_end: NaiveTime,
    window_span: i64,
    jitter_minutes: i64,
}

/// 单日落位过程状态
struct DayCursor {
    previous: Option<NaiveDateTime>,
    quarter_hour_used: usize,
    quarter_hour_budget: usize,
}

impl TimeSlotScheduler {
    pub fn new(catalog: Arc<SendTypeCatalog>, settings: &ScheduleSettings) -> Self {
        Self {
            catalog,
            window_start: settings.window_start,
            window_end: settings.window_end,
            window_span: settings.window_span_minutes(),
            jitter_minutes: settings.jitter_minutes as i64,
        }
    }

    /// 落位一周（按日期升序）
    pub fn schedule_week(
        &self,
        week: Vec<Vec<AllocationItem>>,
        ctx: &mut RunContext,
    ) -> Vec<ScheduledItem> {
        let scheduled: Vec<ScheduledItem> = week
            .into_iter()
            .flat_map(|day| self.schedule_day(day, ctx))
            .collect();

        info!(
            scheduled = scheduled.len(),
            overflow = scheduled
                .iter()
                .filter(|s| s.has_flag(TimingFlag::OverflowWindow))
                .count(),
            "周度时段落位完成"
        );
        scheduled
    }

    /// 落位单日
    ///
    /// 规则:
    /// 1) 目标时间 = 窗口起点 + 窗口时长 × (i+1)/(N+1)
    /// 2) 最早可用 = 同类型上次落位 + 最小间隔（当日首次则为窗口起点），且晚于前一条
    /// 3) 落位 = max(目标, 最早可用)，超出窗口则钳制并打标
    /// 4) 有界随机抖动，重新校验间隔/窗口/整刻钟/时刻复用
    pub fn schedule_day(
        &self,
        items: Vec<AllocationItem>,
        ctx: &mut RunContext,
    ) -> Vec<ScheduledItem> {
        let n = items.len();
        if n == 0 {
            return Vec::new();
        }
        let date = items[0].date;
        let start = date.and_time(self.window_start);
        let last_minute = date.and_time(self.window_end) - Duration::minutes(1);
        let span = self.window_span;

        let mut cursor = DayCursor {
            previous: None,
            quarter_hour_used: 0,
            quarter_hour_budget: ((n as f64 * QUARTER_HOUR_MAX_RATIO).ceil() as usize)
                .saturating_sub(1),
        };

        let mut out = Vec::with_capacity(n);
        for (i, allocation) in items.into_iter().enumerate() {
            let target = start + Duration::minutes(span * (i as i64 + 1) / (n as i64 + 1));
            let spacing = self
                .catalog
                .get(&allocation.send_type_key)
                .map(|d| d.min_spacing_minutes)
                .unwrap_or(0);

            let earliest_spacing = match ctx.last_used_time.get(&allocation.send_type_key) {
                Some(last) if last.date() == date => *last + Duration::minutes(spacing as i64),
                _ => start,
            };
            let earliest = match cursor.previous {
                Some(prev) => earliest_spacing.max(prev + Duration::minutes(1)),
                None => earliest_spacing,
            };

            let computed = target.max(earliest);
            let mut flags = Vec::new();
            let item_ref = format!("{}#{}", allocation.date, allocation.slot_index);

            let placed = if computed > last_minute {
                flags.push(TimingFlag::OverflowWindow);
                ctx.warn(ScheduleWarning::OverflowWindow {
                    item_ref: item_ref.clone(),
                    send_type_key: allocation.send_type_key.clone(),
                    scheduled_at: last_minute,
                });
                if last_minute < earliest_spacing {
                    flags.push(TimingFlag::SpacingViolation);
                    ctx.warn(ScheduleWarning::SpacingViolation {
                        item_ref: item_ref.clone(),
                        send_type_key: allocation.send_type_key.clone(),
                        scheduled_at: last_minute,
                        required_minutes: spacing,
                    });
                }
                last_minute
            } else {
                self.apply_jitter(computed, earliest, last_minute, &cursor, ctx)
            };

            if is_quarter_hour(placed.time()) {
                cursor.quarter_hour_used += 1;
            }
            cursor.previous = Some(placed);
            ctx.record_time_of_day(placed.time());
            ctx.last_used_time
                .insert(allocation.send_type_key.clone(), placed);

            let followup_eligible = self
                .catalog
                .get(&allocation.send_type_key)
                .map(|d| d.can_have_followup)
                .unwrap_or(false);

            out.push(ScheduledItem {
                allocation,
                scheduled_at: placed,
                timing: TimingMeta {
                    target_time: target.time(),
                    computed_time: computed.min(last_minute).time(),
                    jitter_minutes: (placed - computed.min(last_minute)).num_minutes(),
                    flags,
                },
                followup_eligible,
            });
        }

        debug!(
            date = %date,
            items = out.len(),
            quarter_hour = cursor.quarter_hour_used,
            "单日时段落位完成"
        );
        out
    }

    /// 抖动并重新校验
    ///
    /// 依次尝试: 随机偏移（最多 JITTER_ATTEMPTS 次）→ 原时间 → 向后逐分钟 → 原时间兜底
    fn apply_jitter(
        &self,
        computed: NaiveDateTime,
        earliest: NaiveDateTime,
        last_minute: NaiveDateTime,
        cursor: &DayCursor,
        ctx: &mut RunContext,
    ) -> NaiveDateTime {
        let accept = |candidate: NaiveDateTime, ctx: &RunContext| -> bool {
            if candidate < earliest || candidate > last_minute {
                return false;
            }
            if is_quarter_hour(candidate.time())
                && cursor.quarter_hour_used >= cursor.quarter_hour_budget
            {
                return false;
            }
            ctx.time_of_day_count(candidate.time()) < MAX_TIME_OF_DAY_REPEAT
        };

        if self.jitter_minutes > 0 {
            for _ in 0..JITTER_ATTEMPTS {
                let offset = ctx.rng().gen_range(-self.jitter_minutes..=self.jitter_minutes);
                let candidate = computed + Duration::minutes(offset);
                if accept(candidate, ctx) {
                    return candidate;
                }
            }
        }

        if accept(computed, ctx) {
            return computed;
        }

        let reach = self.jitter_minutes.max(1) * 2;
        (1..=reach)
            .map(|m| computed + Duration::minutes(m))
            .find(|candidate| accept(*candidate, ctx))
            .unwrap_or(computed)
    }
}
