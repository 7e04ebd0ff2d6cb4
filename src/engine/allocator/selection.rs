// ==========================================
// 配额分配 - 发送类型选择
// ==========================================

use crate::domain::schedule::AllocationItem;
use crate::domain::send_type::{SendTypeCatalog, SendTypeDefinition};
use crate::domain::types::{Category, PageType};
use crate::domain::volume::{DailyVolume, VolumeConfig};
use crate::domain::warning::ScheduleWarning;
use crate::engine::context::RunContext;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::balance::trim_engagement;
use super::interleave::{drop_adjacent_duplicates, interleave, repair_adjacent};

/// 缺少历史表现时的默认权重
pub const DEFAULT_PERFORMANCE_WEIGHT: f64 = 50.0;

/// 营收类需先排满的 Primary 条数
pub const REQUIRED_PRIMARY_PICKS: u32 = 2;

// ==========================================
// 不足原因
// ==========================================
pub(super) const REASON_CONSECUTIVE: &str = "CONSECUTIVE_TYPE_RULE";
pub(super) const REASON_WEEKLY_CAP: &str = "WEEKLY_CAP_REACHED";
pub(super) const REASON_NO_ELIGIBLE: &str = "DAILY_CAP_OR_NO_ELIGIBLE_TYPE";
pub(super) const REASON_REPAIR_DROP: &str = "ADJACENT_DUPLICATE_DROPPED";
pub(super) const REASON_PAGE_MIX: &str = "ENGAGEMENT_SHARE_LIMIT";

// ==========================================
// SlotAllocator
// ==========================================
pub struct SlotAllocator {
    catalog: Arc<SendTypeCatalog>,
}

/// 单日分配过程中的计数
#[derive(Default)]
struct DayState {
    counts: HashMap<String, u32>,
    special_used: bool,
}

/// 候选筛选结果
struct Eligibility<'a> {
    eligible: Vec<&'a SendTypeDefinition>,
    weekly_blocked: bool,
}

impl SlotAllocator {
    pub fn new(catalog: Arc<SendTypeCatalog>) -> Self {
        Self { catalog }
    }

    /// 分配一周
    ///
    /// # 参数
    /// - `volume`: 每日类别配额
    /// - `performance`: 发送类型历史表现（缺失则均匀）
    /// - `active_campaigns`: 有效活动对应的发送类型键
    ///
    /// # 返回
    /// 按日期升序的每日条目序列
    #[instrument(skip_all, fields(days = volume.daily.len(), page_type = %volume.page_type))]
    pub fn allocate_week(
        &self,
        volume: &VolumeConfig,
        performance: &HashMap<String, f64>,
        active_campaigns: &HashSet<String>,
        ctx: &mut RunContext,
    ) -> Vec<Vec<AllocationItem>> {
        let mut week: Vec<Vec<AllocationItem>> = volume
            .daily
            .iter()
            .map(|day| self.allocate_day(day, volume.page_type, performance, active_campaigns, ctx))
            .collect();

        if volume.page_type != PageType::Paid {
            self.rebalance_engagement(volume, &mut week, ctx);
        }

        info!(
            total_items = week.iter().map(|d| d.len()).sum::<usize>(),
            distinct_types = ctx.weekly_counts.values().filter(|&&c| c > 0).count(),
            "周度配额分配完成"
        );
        week
    }

    /// 分配单日
    pub fn allocate_day(
        &self,
        day: &DailyVolume,
        page_type: PageType,
        performance: &HashMap<String, f64>,
        active_campaigns: &HashSet<String>,
        ctx: &mut RunContext,
    ) -> Vec<AllocationItem> {
        let mut state = DayState::default();
        let mut lists: [Vec<String>; 3] = Default::default();

        for (i, category) in Category::ALL.iter().copied().enumerate() {
            let requested = day.get(category);
            let (picks, reason) = self.fill_category(
                category,
                requested,
                page_type,
                performance,
                active_campaigns,
                &mut state,
                ctx,
            );

            if (picks.len() as u32) < requested {
                ctx.warn(ScheduleWarning::AllocationShortfall {
                    date: day.date,
                    category,
                    requested,
                    filled: picks.len() as u32,
                    reason: reason.unwrap_or(REASON_NO_ELIGIBLE).to_string(),
                });
            }
            lists[i] = picks;
        }

        let [revenue, engagement, retention] = lists;
        let mut sequence = interleave(revenue, engagement, retention);
        let swaps = repair_adjacent(&mut sequence);

        for key in drop_adjacent_duplicates(&mut sequence) {
            ctx.decrement_weekly(&key);
            if let Some(def) = self.catalog.get(&key) {
                let requested = day.get(def.category);
                let filled = sequence
                    .iter()
                    .filter(|k| self.catalog.get(k).map(|d| d.category) == Some(def.category))
                    .count() as u32;
                ctx.warn(ScheduleWarning::AllocationShortfall {
                    date: day.date,
                    category: def.category,
                    requested,
                    filled,
                    reason: REASON_REPAIR_DROP.to_string(),
                });
            }
        }

        debug!(date = %day.date, items = sequence.len(), swaps, "单日分配完成");

        sequence
            .into_iter()
            .enumerate()
            .filter_map(|(slot, key)| {
                self.catalog.get(&key).map(|def| AllocationItem {
                    date: day.date,
                    send_type_key: key.clone(),
                    category: def.category,
                    slot_index: slot as u32,
                    priority: def.priority,
                })
            })
            .collect()
    }

    /// 非付费页: 营收少排时回收超额互动，并记录 AllocationShortfall
    fn rebalance_engagement(
        &self,
        volume: &VolumeConfig,
        week: &mut [Vec<AllocationItem>],
        ctx: &mut RunContext,
    ) {
        let removed = trim_engagement(week);
        if removed.is_empty() {
            return;
        }
        debug!(removed = removed.len(), "互动占比超限，回收互动条目");

        for item in removed {
            ctx.decrement_weekly(&item.send_type_key);
            let filled = week
                .iter()
                .flatten()
                .filter(|i| i.date == item.date && i.category == Category::Engagement)
                .count() as u32;
            ctx.warn(ScheduleWarning::AllocationShortfall {
                date: item.date,
                category: Category::Engagement,
                requested: volume.for_date(item.date).map(|d| d.engagement).unwrap_or(filled),
                filled,
                reason: REASON_PAGE_MIX.to_string(),
            });
        }
    }

    // ==========================================
    // 类别填充
    // ==========================================

    /// 填充单个类别
    ///
    /// # 返回
    /// (选中的类型键序列, 未填满时的原因)
    #[allow(clippy::too_many_arguments)]
    fn fill_category(
        &self,
        category: Category,
        requested: u32,
        page_type: PageType,
        performance: &HashMap<String, f64>,
        active_campaigns: &HashSet<String>,
        state: &mut DayState,
        ctx: &mut RunContext,
    ) -> (Vec<String>, Option<&'static str>) {
        let mut picks: Vec<String> = Vec::with_capacity(requested as usize);
        let mut primary_picks = 0u32;

        while (picks.len() as u32) < requested {
            let Eligibility {
                eligible,
                weekly_blocked,
            } = self.eligible(category, page_type, active_campaigns, state, ctx);

            let previous = picks.last();
            let non_repeat: Vec<&SendTypeDefinition> = eligible
                .iter()
                .copied()
                .filter(|d| Some(&d.key) != previous)
                .collect();

            let pool: Vec<&SendTypeDefinition> =
                if category == Category::Revenue && primary_picks < REQUIRED_PRIMARY_PICKS {
                    let primaries: Vec<_> =
                        non_repeat.iter().copied().filter(|d| d.is_primary()).collect();
                    if primaries.is_empty() {
                        non_repeat
                    } else {
                        primaries
                    }
                } else {
                    non_repeat
                };

            if pool.is_empty() {
                let reason = if !eligible.is_empty() {
                    REASON_CONSECUTIVE
                } else if weekly_blocked {
                    REASON_WEEKLY_CAP
                } else {
                    REASON_NO_ELIGIBLE
                };
                debug!(
                    category = %category,
                    filled = picks.len(),
                    requested,
                    reason,
                    "类别无法继续填充"
                );
                return (picks, Some(reason));
            }

            let chosen = weighted_pick(&pool, performance, ctx.rng());
            *state.counts.entry(chosen.key.clone()).or_insert(0) += 1;
            ctx.increment_weekly(&chosen.key);
            if chosen.is_special() {
                state.special_used = true;
            }
            if chosen.is_primary() {
                primary_picks += 1;
            }
            picks.push(chosen.key.clone());
        }

        (picks, None)
    }

    /// 候选筛选（不含连续类型规则）
    ///
    /// 顺序: 类别 → 页面类型 → 活动门控 → 单日上限 → Special 组 → 周上限
    fn eligible(
        &self,
        category: Category,
        page_type: PageType,
        active_campaigns: &HashSet<String>,
        state: &DayState,
        ctx: &RunContext,
    ) -> Eligibility<'_> {
        let mut eligible = Vec::new();
        let mut weekly_blocked = false;

        for def in self.catalog.by_category(category) {
            if !def.allows_page(page_type) {
                continue;
            }
            if def.requires_campaign && !active_campaigns.contains(&def.key) {
                continue;
            }
            if state.counts.get(&def.key).copied().unwrap_or(0) >= def.daily_max {
                continue;
            }
            if def.is_special() && state.special_used {
                continue;
            }
            if let Some(weekly_max) = def.weekly_max {
                if ctx.weekly_count(&def.key) >= weekly_max {
                    weekly_blocked = true;
                    continue;
                }
            }
            eligible.push(def);
        }

        Eligibility {
            eligible,
            weekly_blocked,
        }
    }
}

/// 按历史表现加权随机选择
///
/// 全部缺失则均匀；单项缺失取默认权重；非正值按 1.0
pub(super) fn weighted_pick<'a, R>(
    pool: &[&'a SendTypeDefinition],
    performance: &HashMap<String, f64>,
    rng: &mut R,
) -> &'a SendTypeDefinition
where
    R: Rng + ?Sized,
{
    let weights: Vec<f64> = pool
        .iter()
        .map(|d| {
            if performance.is_empty() {
                return 1.0;
            }
            match performance.get(&d.key).copied() {
                Some(w) if w.is_finite() && w > 0.0 => w,
                Some(_) => 1.0,
                None => DEFAULT_PERFORMANCE_WEIGHT,
            }
        })
        .collect();

    let index = match WeightedIndex::new(&weights) {
        Ok(dist) => dist.sample(rng),
        Err(_) => rng.gen_range(0..pool.len()),
    };
    pool[index]
}
