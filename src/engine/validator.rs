// ==========================================
// 周度内容排期引擎 - 排期校验引擎
// ==========================================
// 红线: 任一 AVOID 档文案分配 ⇒ REJECTED（与分数无关）
// ==========================================
// 职责: 计算多样性/反模式指标，给出 0-100 评分与审批结论
// 输入: 已落位条目 + 文案分配 + 文案池 + 每日策略标签
// 输出: ValidationReport
// ==========================================

use crate::domain::caption::{CaptionAssignment, CaptionRecord};
use crate::domain::report::{ValidationMetrics, ValidationReport, Violation, ViolationCode};
use crate::domain::schedule::{ScheduledItem, WeeklyStrategyMetadata};
use crate::domain::send_type::SendTypeCatalog;
use crate::domain::types::{Category, ContentTier, PageType, ValidationStatus};
use crate::engine::time_slot::{is_quarter_hour, MAX_TIME_OF_DAY_REPEAT};
use chrono::{NaiveDate, NaiveTime};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

/// 一周最少不同发送类型数
pub const MIN_DISTINCT_SEND_TYPES: usize = 10;
/// 最少不同策略标签数
pub const MIN_STRATEGY_LABELS: usize = 3;
/// 整刻钟占比上限（百分比，严格小于）
pub const QUARTER_HOUR_LIMIT_PCT: f64 = 10.0;
/// 人工处理占比上限（百分比）
pub const MANUAL_SHARE_LIMIT_PCT: f64 = 20.0;

/// 类别占比区间（百分比，闭区间）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryBand {
    pub min_pct: f64,
    pub max_pct: f64,
}

impl CategoryBand {
    const fn new(min_pct: f64, max_pct: f64) -> Self {
        Self { min_pct, max_pct }
    }

    fn contains(&self, pct: f64) -> bool {
        pct >= self.min_pct && pct <= self.max_pct
    }

    /// 按页面类型取类别区间
    pub fn for_category(category: Category, page_type: PageType) -> Self {
        match (category, page_type) {
            (Category::Revenue, _) => Self::new(40.0, 65.0),
            (Category::Engagement, _) => Self::new(25.0, 45.0),
            (Category::Retention, PageType::Paid) => Self::new(8.0, 20.0),
            (Category::Retention, PageType::Free) => Self::new(0.0, 5.0),
        }
    }
}

/// 按置信度取审批阈值 (approve, review)
pub fn status_thresholds(confidence: f64) -> (u32, u32) {
    if confidence >= 0.8 {
        (85, 70)
    } else if confidence >= 0.5 {
        (80, 65)
    } else {
        (75, 60)
    }
}

/// 校验输入（只读视图）
pub struct ValidationInput<'a> {
    pub items: &'a [ScheduledItem],
    pub assignments: &'a [CaptionAssignment],
    pub captions: &'a [CaptionRecord],
    pub strategy: &'a [WeeklyStrategyMetadata],
    pub page_type: PageType,
    pub confidence: f64,
}

// ==========================================
// ScheduleValidator
// ==========================================
pub struct ScheduleValidator {
    catalog: Arc<SendTypeCatalog>,
}

/// 校验过程累积
#[derive(Default)]
struct Findings {
    violations: Vec<Violation>,
    recommendations: Vec<String>,
}

impl Findings {
    fn fail(&mut self, code: ViolationCode, message: String, recommendation: &str) {
        self.violations.push(Violation { code, message });
        self.recommendations.push(recommendation.to_string());
    }
}

impl ScheduleValidator {
    pub fn new(catalog: Arc<SendTypeCatalog>) -> Self {
        Self { catalog }
    }

    /// 校验一周排期
    pub fn validate(&self, input: &ValidationInput<'_>) -> ValidationReport {
        let mut findings = Findings::default();
        let days = group_by_day(input.items);

        // ===== 硬门槛 =====
        self.check_adjacency(&days, &mut findings);
        self.check_caps(&days, &mut findings);
        self.check_spacing(&days, &mut findings);
        let distinct_send_types = self.check_variety(input.items, &mut findings);
        check_caption_reuse(input.assignments, &mut findings);
        check_avoid_tier(input.assignments, input.captions, &mut findings);

        // ===== 软检查 =====
        let distinct_day_signatures = check_day_signatures(&days, &mut findings);
        let quarter_hour_pct = check_quarter_hour(input.items, &mut findings);
        let max_time_repeat = check_time_repeat(input.items, &mut findings);
        let shares = check_category_bands(input.items, input.page_type, &mut findings);
        let distinct_strategy_labels = check_strategy_labels(input.strategy, &mut findings);
        let manual_required = check_manual_share(input.assignments, &mut findings);

        let deductions: u32 = findings.violations.iter().map(|v| v.code.deduction()).sum();
        let score = 100u32.saturating_sub(deductions);

        let (approve, review) = status_thresholds(input.confidence);
        let has_hard = findings.violations.iter().any(|v| v.code.is_hard());
        let status = if has_hard || score < review {
            ValidationStatus::Rejected
        } else if score >= approve {
            ValidationStatus::Approved
        } else {
            ValidationStatus::NeedsReview
        };

        let report = ValidationReport {
            status,
            score,
            violations: findings.violations,
            recommendations: findings.recommendations,
            metrics: ValidationMetrics {
                total_items: input.items.len(),
                distinct_send_types,
                distinct_day_signatures,
                quarter_hour_pct,
                max_time_repeat,
                revenue_pct: shares.get(&Category::Revenue).copied().unwrap_or(0.0),
                engagement_pct: shares.get(&Category::Engagement).copied().unwrap_or(0.0),
                retention_pct: shares.get(&Category::Retention).copied().unwrap_or(0.0),
                distinct_strategy_labels,
                manual_required,
            },
        };

        if report.status == ValidationStatus::Rejected {
            warn!(
                score = report.score,
                violations = report.violations.len(),
                hard = has_hard,
                "排期校验未通过"
            );
        } else {
            info!(score = report.score, status = %report.status, "排期校验完成");
        }
        report
    }

    // ==========================================
    // 硬门槛
    // ==========================================

    fn check_adjacency(
        &self,
        days: &BTreeMap<NaiveDate, Vec<&ScheduledItem>>,
        findings: &mut Findings,
    ) {
        let offenders: Vec<String> = days
            .values()
            .flat_map(|day| day.windows(2))
            .filter(|pair| pair[0].send_type_key() == pair[1].send_type_key())
            .map(|pair| pair[1].item_ref())
            .collect();
        if !offenders.is_empty() {
            findings.fail(
                ViolationCode::AdjacentDuplicate,
                format!("相邻条目发送类型重复: {}", offenders.join(", ")),
                "重新分配相邻重复的条目，使同日相邻发送类型不同",
            );
        }
    }

    fn check_caps(&self, days: &BTreeMap<NaiveDate, Vec<&ScheduledItem>>, findings: &mut Findings) {
        let mut weekly: HashMap<&str, u32> = HashMap::new();
        let mut daily_offenders = Vec::new();

        for (date, day) in days {
            let mut daily: HashMap<&str, u32> = HashMap::new();
            for item in day {
                *daily.entry(item.send_type_key()).or_insert(0) += 1;
                *weekly.entry(item.send_type_key()).or_insert(0) += 1;
            }
            for (key, count) in daily {
                if let Some(def) = self.catalog.get(key) {
                    if count > def.daily_max {
                        daily_offenders
                            .push(format!("{} {}={}>{}", date, key, count, def.daily_max));
                    }
                }
            }
        }
        if !daily_offenders.is_empty() {
            daily_offenders.sort();
            findings.fail(
                ViolationCode::DailyCapExceeded,
                format!("超出单日上限: {}", daily_offenders.join(", ")),
                "减少超出单日上限的发送类型",
            );
        }

        let mut weekly_offenders: Vec<String> = weekly
            .into_iter()
            .filter_map(|(key, count)| {
                let max = self.catalog.get(key)?.weekly_max?;
                (count > max).then(|| format!("{}={}>{}", key, count, max))
            })
            .collect();
        if !weekly_offenders.is_empty() {
            weekly_offenders.sort();
            findings.fail(
                ViolationCode::WeeklyCapExceeded,
                format!("超出周上限: {}", weekly_offenders.join(", ")),
                "减少超出周上限的发送类型",
            );
        }
    }

    fn check_spacing(
        &self,
        days: &BTreeMap<NaiveDate, Vec<&ScheduledItem>>,
        findings: &mut Findings,
    ) {
        let mut offenders = Vec::new();
        for day in days.values() {
            let mut last: HashMap<&str, &ScheduledItem> = HashMap::new();
            for item in day {
                let spacing = self
                    .catalog
                    .get(item.send_type_key())
                    .map(|d| d.min_spacing_minutes as i64)
                    .unwrap_or(0);
                if let Some(prev) = last.get(item.send_type_key()) {
                    let gap = (item.scheduled_at - prev.scheduled_at).num_minutes().abs();
                    if gap < spacing {
                        offenders.push(format!("{}({}<{}min)", item.item_ref(), gap, spacing));
                    }
                }
                last.insert(item.send_type_key(), item);
            }
        }
        if !offenders.is_empty() {
            findings.fail(
                ViolationCode::SpacingViolation,
                format!("同类型间隔不足: {}", offenders.join(", ")),
                "拉开同类型条目的时间间隔或减少当日条目数",
            );
        }
    }

    fn check_variety(&self, items: &[ScheduledItem], findings: &mut Findings) -> usize {
        let distinct = items
            .iter()
            .map(|i| i.send_type_key())
            .collect::<HashSet<_>>()
            .len();
        if distinct < MIN_DISTINCT_SEND_TYPES {
            findings.fail(
                ViolationCode::InsufficientVariety,
                format!("不同发送类型数 {} < {}", distinct, MIN_DISTINCT_SEND_TYPES),
                "引入更多不同的发送类型",
            );
        }
        distinct
    }
}

// ==========================================
// 文案相关硬门槛
// ==========================================

fn check_caption_reuse(assignments: &[CaptionAssignment], findings: &mut Findings) {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for id in assignments.iter().filter_map(|a| a.caption_id.as_deref()) {
        *seen.entry(id).or_insert(0) += 1;
    }
    let mut reused: Vec<&str> = seen
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(id, _)| id)
        .collect();
    if !reused.is_empty() {
        reused.sort_unstable();
        findings.fail(
            ViolationCode::CaptionReused,
            format!("文案在同一周内重复使用: {}", reused.join(", ")),
            "为重复文案的条目重新匹配",
        );
    }
}

fn check_avoid_tier(
    assignments: &[CaptionAssignment],
    captions: &[CaptionRecord],
    findings: &mut Findings,
) {
    let tiers: HashMap<&str, ContentTier> = captions
        .iter()
        .map(|c| (c.caption_id.as_str(), c.tier))
        .collect();
    let avoid: Vec<&str> = assignments
        .iter()
        .filter_map(|a| a.caption_id.as_deref())
        .filter(|id| tiers.get(id) == Some(&ContentTier::Avoid))
        .collect();
    if !avoid.is_empty() {
        findings.fail(
            ViolationCode::AvoidTierAssigned,
            format!("引用了 AVOID 档文案: {}", avoid.join(", ")),
            "移除全部 AVOID 档文案分配",
        );
    }
}

// ==========================================
// 软检查
// ==========================================

fn check_day_signatures(
    days: &BTreeMap<NaiveDate, Vec<&ScheduledItem>>,
    findings: &mut Findings,
) -> usize {
    let signatures: HashSet<String> = days
        .values()
        .map(|day| {
            day.iter()
                .map(|i| i.send_type_key())
                .collect::<Vec<_>>()
                .join(">")
        })
        .collect();
    if signatures.len() < days.len() {
        findings.fail(
            ViolationCode::RepeatedDaySignature,
            format!("每日类型序列重复: {} 天仅 {} 种", days.len(), signatures.len()),
            "调整重复日的发送类型顺序",
        );
    }
    signatures.len()
}

fn check_quarter_hour(items: &[ScheduledItem], findings: &mut Findings) -> f64 {
    let pct = percentage(items.iter().filter(|i| is_quarter_hour(i.time())).count(), items.len());
    if pct >= QUARTER_HOUR_LIMIT_PCT {
        findings.fail(
            ViolationCode::QuarterHourClustering,
            format!("整刻钟时间占比 {:.1}% >= {}%", pct, QUARTER_HOUR_LIMIT_PCT),
            "为整刻钟条目增加随机偏移",
        );
    }
    pct
}

fn check_time_repeat(items: &[ScheduledItem], findings: &mut Findings) -> usize {
    let mut counts: HashMap<NaiveTime, usize> = HashMap::new();
    for item in items {
        *counts.entry(item.time()).or_insert(0) += 1;
    }
    let max = counts.values().copied().max().unwrap_or(0);
    if max > MAX_TIME_OF_DAY_REPEAT as usize {
        findings.fail(
            ViolationCode::RepeatedExactTime,
            format!("同一时刻重复 {} 次 > {}", max, MAX_TIME_OF_DAY_REPEAT),
            "错开重复使用的发送时刻",
        );
    }
    max
}

fn check_category_bands(
    items: &[ScheduledItem],
    page_type: PageType,
    findings: &mut Findings,
) -> HashMap<Category, f64> {
    let shares: HashMap<Category, f64> = Category::ALL
        .iter()
        .map(|&c| {
            let n = items.iter().filter(|i| i.category() == c).count();
            (c, percentage(n, items.len()))
        })
        .collect();

    let out_of_band: Vec<String> = Category::ALL
        .iter()
        .filter_map(|&c| {
            let band = CategoryBand::for_category(c, page_type);
            let pct = shares.get(&c).copied().unwrap_or(0.0);
            (!band.contains(pct)).then(|| {
                format!("{} {:.1}% 不在 [{}, {}]", c, pct, band.min_pct, band.max_pct)
            })
        })
        .collect();
    if !out_of_band.is_empty() {
        findings.fail(
            ViolationCode::CategoryImbalance,
            format!("类别占比越界: {}", out_of_band.join("; ")),
            "调整各类别每日配额以回到目标区间",
        );
    }
    shares
}

fn check_strategy_labels(strategy: &[WeeklyStrategyMetadata], findings: &mut Findings) -> usize {
    let distinct = strategy.iter().map(|s| s.label.as_str()).collect::<HashSet<_>>().len();
    if distinct < MIN_STRATEGY_LABELS {
        findings.fail(
            ViolationCode::LowStrategyDiversity,
            format!("每日策略标签仅 {} 种 < {}", distinct, MIN_STRATEGY_LABELS),
            "为一周内的各天分配更多样的策略",
        );
    }
    distinct
}

fn check_manual_share(assignments: &[CaptionAssignment], findings: &mut Findings) -> usize {
    let manual = assignments.iter().filter(|a| a.is_manual_required()).count();
    let pct = percentage(manual, assignments.len());
    if pct > MANUAL_SHARE_LIMIT_PCT {
        findings.fail(
            ViolationCode::ExcessManualCaptions,
            format!("待人工处理文案占比 {:.1}% > {}%", pct, MANUAL_SHARE_LIMIT_PCT),
            "补充文案池以减少人工处理条目",
        );
    }
    manual
}

// ==========================================
// 工具函数
// ==========================================

/// 按日期分组，组内保持时间顺序
fn group_by_day(items: &[ScheduledItem]) -> BTreeMap<NaiveDate, Vec<&ScheduledItem>> {
    let mut days: BTreeMap<NaiveDate, Vec<&ScheduledItem>> = BTreeMap::new();
    for item in items {
        days.entry(item.date()).or_default().push(item);
    }
    for day in days.values_mut() {
        day.sort_by_key(|i| (i.scheduled_at, i.allocation.slot_index));
    }
    days
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}
