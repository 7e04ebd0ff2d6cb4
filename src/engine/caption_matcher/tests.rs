use super::fallback::compare_candidates;
use super::*;
use crate::domain::caption::ScoreBreakdown;
use crate::domain::schedule::{AllocationItem, TimingMeta};
use crate::domain::types::{Category, ContentTier, PageType, VolumeTier};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

// ==========================================
// 测试辅助函数
// ==========================================

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 4).unwrap()
}

fn at(hour: u32, minute: u32) -> NaiveDateTime {
    day().and_hms_opt(hour, minute, 0).unwrap()
}

fn item(key: &str, category: Category, slot: u32, when: NaiveDateTime) -> ScheduledItem {
    ScheduledItem {
        allocation: AllocationItem {
            date: when.date(),
            send_type_key: key.to_string(),
            category,
            slot_index: slot,
            priority: 1,
        },
        scheduled_at: when,
        timing: TimingMeta {
            target_time: when.time(),
            computed_time: when.time(),
            jitter_minutes: 0,
            flags: Vec::new(),
        },
        followup_eligible: false,
    }
}

fn caption(
    id: &str,
    category: Category,
    performance: f64,
    days_ago: Option<i64>,
    tier: ContentTier,
) -> CaptionRecord {
    CaptionRecord {
        caption_id: id.to_string(),
        text: format!("caption {}", id),
        char_length: 300,
        content_type: "solo".to_string(),
        category,
        performance_score: performance,
        last_used_date: days_ago.map(|d| day() - Duration::days(d)),
        tier,
    }
}

fn volume(confidence: f64) -> VolumeConfig {
    VolumeConfig {
        tier: VolumeTier::Mid,
        page_type: PageType::Paid,
        confidence,
        daily: Vec::new(),
        weekly_distribution: BTreeMap::new(),
        content_type_weights: HashMap::new(),
    }
}

fn match_one(pool: &[CaptionRecord], confidence: f64) -> CaptionAssignment {
    let matcher = CaptionMatcher::new(ScheduleSettings::default());
    let mut ctx = RunContext::seeded(1);
    let items = vec![item("ppv_unlock", Category::Revenue, 0, at(10, 7))];
    matcher
        .match_week(&items, pool, &volume(confidence), &mut ctx)
        .unwrap()
        .remove(0)
}

// ==========================================
// 评分
// ==========================================

#[test]
fn test_freshness_examples() {
    assert_eq!(freshness_score(Some(day()), day()), 100.0);
    assert_eq!(freshness_score(Some(day() - Duration::days(60)), day()), 0.0);
    assert_eq!(freshness_score(Some(day() - Duration::days(10)), day()), 80.0);
    assert_eq!(freshness_score(None, day()), 100.0);
}

#[test]
fn test_length_multiplier_curve() {
    let max = [40, 100, 200, 320, 500, 900]
        .iter()
        .map(|&l| length_multiplier(l))
        .fold(f64::MIN, f64::max);
    let min = [40, 100, 200, 320, 500, 900]
        .iter()
        .map(|&l| length_multiplier(l))
        .fold(f64::MAX, f64::min);
    assert_eq!(length_multiplier(320), max);
    assert_eq!(length_multiplier(50), min);
    assert!(length_multiplier(900) < length_multiplier(320));
}

#[test]
fn test_diversity_factor_decays() {
    assert_eq!(diversity_factor(0), 1.0);
    assert_eq!(diversity_factor(1), 1.0);
    assert_eq!(diversity_factor(2), 0.5);
    assert_eq!(diversity_factor(5), 0.25);
}

#[test]
fn test_confidence_scales_thresholds() {
    assert!((confidence_scale(1.0) - 1.0).abs() < 1e-9);
    assert!((confidence_scale(0.0) - 0.6).abs() < 1e-9);

    // 低置信度: 40 × 0.6 = 24，表现 30 可主匹配
    let pool = vec![caption("c1", Category::Revenue, 30.0, None, ContentTier::Mid)];
    assert_eq!(match_one(&pool, 0.0).resolution, ResolutionState::PrimaryMatch);
    assert_eq!(match_one(&pool, 1.0).resolution, ResolutionState::FallbackL2);
}

// ==========================================
// 回退阶梯
// ==========================================

#[test]
fn test_primary_match_picks_highest_composite() {
    let pool = vec![
        caption("low", Category::Revenue, 50.0, Some(5), ContentTier::Low),
        caption("top", Category::Revenue, 90.0, None, ContentTier::Top),
        caption("other", Category::Engagement, 99.0, None, ContentTier::Top),
    ];
    let a = match_one(&pool, 0.9);
    assert_eq!(a.caption_id.as_deref(), Some("top"));
    assert_eq!(a.resolution, ResolutionState::PrimaryMatch);
    assert!(a.score.is_some());
}

#[test]
fn test_fallback_levels_in_order() {
    // 新鲜度不足 → L1
    let stale = vec![caption("c", Category::Revenue, 80.0, Some(40), ContentTier::Mid)];
    assert_eq!(match_one(&stale, 1.0).resolution, ResolutionState::FallbackL1);

    // 表现不足 → L2
    let weak = vec![caption("c", Category::Revenue, 25.0, None, ContentTier::Mid)];
    assert_eq!(match_one(&weak, 1.0).resolution, ResolutionState::FallbackL2);

    // 双不足 → L3
    let both = vec![caption("c", Category::Revenue, 25.0, Some(40), ContentTier::Mid)];
    assert_eq!(match_one(&both, 1.0).resolution, ResolutionState::FallbackL3);

    // 跨类别强表现 → L4
    let cross = vec![caption("c", Category::Engagement, 70.0, Some(45), ContentTier::Low)];
    assert_eq!(match_one(&cross, 1.0).resolution, ResolutionState::FallbackL4);
}

#[test]
fn test_manual_required_when_ladder_exhausted() {
    let pool = vec![caption("c", Category::Engagement, 50.0, None, ContentTier::Mid)];
    let matcher = CaptionMatcher::new(ScheduleSettings::default());
    let mut ctx = RunContext::seeded(1);
    let items = vec![item("ppv_unlock", Category::Revenue, 0, at(10, 7))];
    let a = matcher
        .match_week(&items, &pool, &volume(1.0), &mut ctx)
        .unwrap()
        .remove(0);
    assert!(a.is_manual_required());
    assert!(a.caption_id.is_none());
    assert!(a.manual_reason.is_some());
    assert_eq!(ctx.warnings()[0].code(), "CAPTION_UNAVAILABLE");
}

#[test]
fn test_avoid_tier_never_selected() {
    let pool = vec![
        caption("avoid", Category::Revenue, 100.0, None, ContentTier::Avoid),
        caption("avoid2", Category::Engagement, 100.0, None, ContentTier::Avoid),
    ];
    let a = match_one(&pool, 1.0);
    assert!(a.is_manual_required());
}

#[test]
fn test_caption_not_reused_within_week() {
    let pool = vec![
        caption("a", Category::Revenue, 90.0, None, ContentTier::Top),
        caption("b", Category::Revenue, 70.0, None, ContentTier::Mid),
    ];
    let matcher = CaptionMatcher::new(ScheduleSettings::default());
    let mut ctx = RunContext::seeded(1);
    let items = vec![
        item("ppv_unlock", Category::Revenue, 0, at(9, 3)),
        item("bundle", Category::Revenue, 2, at(13, 41)),
        item("ppv_unlock", Category::Revenue, 4, at(18, 22)),
    ];
    let out = matcher.match_week(&items, &pool, &volume(1.0), &mut ctx).unwrap();
    assert_eq!(out[0].caption_id.as_deref(), Some("a"));
    assert_eq!(out[1].caption_id.as_deref(), Some("b"));
    assert!(out[2].is_manual_required());
}

#[test]
fn test_recent_content_type_use_lowers_priority() {
    let mut solo = caption("solo_1", Category::Revenue, 80.0, None, ContentTier::Mid);
    solo.content_type = "solo".to_string();
    let mut duo = caption("duo_1", Category::Revenue, 80.0, None, ContentTier::Mid);
    duo.content_type = "duo".to_string();
    let pool = vec![solo, duo];

    let mut ctx = RunContext::seeded(1);
    let window = Duration::hours(24);
    ctx.record_content_type("solo", at(8, 1), window);
    ctx.record_content_type("solo", at(8, 31), window);

    let item = item("ppv_unlock", Category::Revenue, 0, at(10, 7));
    let request = MatchRequest {
        item: &item,
        pool: &pool,
        type_hints: &HashMap::new(),
        usage_window: window,
    };
    let ladder = standard_ladder(&ScheduleSettings::default(), 1.0);
    let picked = ladder[0].attempt(&request, &ctx).unwrap();
    assert_eq!(picked.caption.caption_id, "duo_1");
    assert_eq!(picked.score.type_priority, 100.0 * 0.5);
}

#[test]
fn test_tie_break_performance_then_id() {
    let a = caption("b_id", Category::Revenue, 70.0, None, ContentTier::Mid);
    let b = caption("a_id", Category::Revenue, 70.0, None, ContentTier::Mid);
    let c = caption("z_id", Category::Revenue, 75.0, None, ContentTier::Mid);
    let score = ScoreBreakdown {
        composite: 50.0,
        ..ScoreBreakdown::default()
    };
    let ca = Candidate { caption: &a, score };
    let cb = Candidate { caption: &b, score };
    let cc = Candidate { caption: &c, score };

    let best = [ca, cb, cc].into_iter().max_by(compare_candidates).unwrap();
    assert_eq!(best.caption.caption_id, "z_id");
    let best = [ca, cb].into_iter().max_by(compare_candidates).unwrap();
    assert_eq!(best.caption.caption_id, "a_id");
}

#[test]
fn test_resolution_transition_checked() {
    assert_eq!(
        advance_resolution(ResolutionState::Unresolved, ResolutionState::FallbackL3).unwrap(),
        ResolutionState::FallbackL3
    );
    let err = advance_resolution(ResolutionState::PrimaryMatch, ResolutionState::ManualRequired)
        .unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidStateTransition { .. }));
}
