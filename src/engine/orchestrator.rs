// ==========================================
// 周度内容排期引擎 - 引擎编排器
// ==========================================
// 用途: 按固定顺序串联五个引擎，完成单账号一周排期
// 顺序: 体量解析 → 配额分配 → 时段落位 → 文案匹配 → 排期校验
// 说明: 单账号流程单线程、确定性；全部输入来自一次性快照
// ==========================================

use crate::config::settings::ScheduleSettings;
use crate::config::tier_table::VolumeTierTable;
use crate::domain::caption::{CaptionAssignment, CaptionRecord};
use crate::domain::report::{ValidationReport, ViolationCode};
use crate::domain::schedule::{ScheduledItem, WeeklyStrategyMetadata};
use crate::domain::send_type::SendTypeCatalog;
use crate::domain::types::{ContentTier, ValidationStatus};
use crate::domain::volume::{AccountProfile, PerformanceSignals, VolumeConfig};
use crate::domain::warning::ScheduleWarning;
use crate::engine::allocator::SlotAllocator;
use crate::engine::caption_matcher::CaptionMatcher;
use crate::engine::context::RunContext;
use crate::engine::strategy::build_weekly_strategy;
use crate::engine::time_slot::TimeSlotScheduler;
use crate::engine::validator::{ScheduleValidator, ValidationInput};
use crate::engine::volume::VolumeConfigResolver;
use crate::error::{EngineResult, ScheduleError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

// ==========================================
// AccountSnapshot - 单账号输入快照
// ==========================================
// 运行期间只读
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub profile: AccountProfile,
    pub signals: PerformanceSignals,
    pub week_start: NaiveDate,

    /// 发送类型历史表现（缺失则均匀加权）
    #[serde(default)]
    pub send_type_performance: HashMap<String, f64>,

    pub captions: Vec<CaptionRecord>,

    /// 有效活动对应的发送类型键
    #[serde(default)]
    pub active_campaigns: HashSet<String>,
}

impl AccountSnapshot {
    pub fn account_id(&self) -> &str {
        &self.profile.account_id
    }
}

// ==========================================
// WeeklySchedule - 单账号周度排期结果
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub run_id: Uuid,
    pub account_id: String,
    pub week_start: NaiveDate,
    pub generated_at: DateTime<Utc>,

    // 体量解析输出
    pub volume: VolumeConfig,

    // 时段落位输出（按日期、时间排序）
    pub items: Vec<ScheduledItem>,

    // 文案匹配输出（与 items 一一对应）
    pub assignments: Vec<CaptionAssignment>,

    // 每日策略标签
    pub strategy: Vec<WeeklyStrategyMetadata>,

    // 校验输出
    pub report: ValidationReport,

    // 可恢复告警
    pub warnings: Vec<ScheduleWarning>,

    /// 被引用的 AVOID 档文案（正常情况下为空）
    #[serde(default)]
    pub avoid_caption_ids: Vec<String>,
}

impl WeeklySchedule {
    pub fn is_rejected(&self) -> bool {
        self.report.status == ValidationStatus::Rejected
    }

    pub fn manual_required_count(&self) -> usize {
        self.assignments.iter().filter(|a| a.is_manual_required()).count()
    }

    /// 交给外部持久化前的闸门：REJECTED 不得转发
    pub fn into_persistable(self) -> EngineResult<Self> {
        if !self.is_rejected() {
            return Ok(self);
        }
        if self.report.has_violation(ViolationCode::AvoidTierAssigned) {
            return Err(ScheduleError::AvoidTierViolation {
                caption_id: self.avoid_caption_ids.join(","),
            });
        }
        Err(ScheduleError::ValidationRejection {
            score: self.report.score,
            violations: self.report.violation_messages(),
        })
    }
}

// ==========================================
// ScheduleOrchestrator - 引擎编排器
// ==========================================

pub struct ScheduleOrchestrator {
    resolver: VolumeConfigResolver,
    allocator: SlotAllocator,
    time_slots: TimeSlotScheduler,
    matcher: CaptionMatcher,
    validator: ScheduleValidator,
}

impl ScheduleOrchestrator {
    /// 创建编排器
    ///
    /// # 参数
    /// - catalog: 发送类型分类表（只读共享）
    /// - tier_table: 体量档位表（只读共享）
    /// - settings: 本次运行参数快照
    pub fn new(
        catalog: Arc<SendTypeCatalog>,
        tier_table: Arc<VolumeTierTable>,
        settings: ScheduleSettings,
    ) -> EngineResult<Self> {
        settings.validate()?;
        Ok(Self {
            resolver: VolumeConfigResolver::new(tier_table),
            allocator: SlotAllocator::new(catalog.clone()),
            time_slots: TimeSlotScheduler::new(catalog.clone(), &settings),
            matcher: CaptionMatcher::new(settings),
            validator: ScheduleValidator::new(catalog),
        })
    }

    /// 使用固定种子执行
    pub fn generate_seeded(
        &self,
        snapshot: &AccountSnapshot,
        seed: u64,
    ) -> EngineResult<WeeklySchedule> {
        let mut ctx = RunContext::seeded(seed);
        self.generate(snapshot, &mut ctx)
    }

    /// 执行完整排期流程（单账号一周）
    #[instrument(
        skip_all,
        fields(account_id = %snapshot.profile.account_id, week_start = %snapshot.week_start)
    )]
    pub fn generate(
        &self,
        snapshot: &AccountSnapshot,
        ctx: &mut RunContext,
    ) -> EngineResult<WeeklySchedule> {
        info!(
            account_size = snapshot.profile.account_size,
            page_type = %snapshot.profile.page_type,
            captions = snapshot.captions.len(),
            campaigns = snapshot.active_campaigns.len(),
            "开始执行周度排期"
        );

        // ==========================================
        // 步骤1: 体量解析
        // ==========================================
        let volume = self
            .resolver
            .resolve(&snapshot.profile, &snapshot.signals, snapshot.week_start)?;
        debug!(tier = %volume.tier, weekly_total = volume.weekly_total(), "步骤1: 体量解析完成");

        // ==========================================
        // 步骤2: 配额分配
        // ==========================================
        let week = self.allocator.allocate_week(
            &volume,
            &snapshot.send_type_performance,
            &snapshot.active_campaigns,
            ctx,
        );

        // ==========================================
        // 步骤3: 时段落位
        // ==========================================
        let items = self.time_slots.schedule_week(week, ctx);

        // ==========================================
        // 步骤4: 文案匹配
        // ==========================================
        let assignments = self.matcher.match_week(&items, &snapshot.captions, &volume, ctx)?;

        // ==========================================
        // 步骤5: 策略标签 + 排期校验
        // ==========================================
        let dates: Vec<NaiveDate> = volume.daily.iter().map(|d| d.date).collect();
        let strategy = build_weekly_strategy(&dates, &items, ctx);

        let report = self.validator.validate(&ValidationInput {
            items: &items,
            assignments: &assignments,
            captions: &snapshot.captions,
            strategy: &strategy,
            page_type: volume.page_type,
            confidence: volume.confidence,
        });

        let avoid_caption_ids = avoid_ids(&assignments, &snapshot.captions);
        let warnings = ctx.take_warnings();

        info!(
            items = items.len(),
            manual_required = assignments.iter().filter(|a| a.is_manual_required()).count(),
            warnings = warnings.len(),
            status = %report.status,
            score = report.score,
            "周度排期完成"
        );

        Ok(WeeklySchedule {
            run_id: Uuid::new_v4(),
            account_id: snapshot.profile.account_id.clone(),
            week_start: snapshot.week_start,
            generated_at: Utc::now(),
            volume,
            items,
            assignments,
            strategy,
            report,
            warnings,
            avoid_caption_ids,
        })
    }
}

fn avoid_ids(assignments: &[CaptionAssignment], captions: &[CaptionRecord]) -> Vec<String> {
    let avoid: HashSet<&str> = captions
        .iter()
        .filter(|c| c.tier == ContentTier::Avoid)
        .map(|c| c.caption_id.as_str())
        .collect();
    assignments
        .iter()
        .filter_map(|a| a.caption_id.as_deref())
        .filter(|id| avoid.contains(id))
        .map(str::to_string)
        .collect()
}
