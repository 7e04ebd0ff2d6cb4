// ==========================================
// 配额分配 - 非付费页类别占比收敛
// ==========================================
// 非付费页可用营收类型较少，营收可能少排；
// 此时按实际营收条数回收互动条目，使互动周占比 <= 45%
// 红线: 回收不得产生相邻同类型；每日至少保留 1 条互动
// ==========================================

use crate::domain::schedule::AllocationItem;
use crate::domain::types::Category;

/// 互动类周占比上限（百分比）
pub const ENGAGEMENT_MAX_PCT: usize = 45;

/// 互动条目允许上限: engagement × 100 <= 45 × total
pub(super) fn engagement_allowance(others: usize) -> usize {
    others * ENGAGEMENT_MAX_PCT / (100 - ENGAGEMENT_MAX_PCT)
}

/// 回收超额互动条目
///
/// 每次从互动条数最多的日期（同数取较晚日期）移除最靠后的可移除条目，
/// 移除后重排当日 slot_index
///
/// # 返回
/// 被移除的条目（按移除顺序）
pub(super) fn trim_engagement(week: &mut [Vec<AllocationItem>]) -> Vec<AllocationItem> {
    let engagement = category_count(week, Category::Engagement);
    let others =
        category_count(week, Category::Revenue) + category_count(week, Category::Retention);
    let mut excess = engagement.saturating_sub(engagement_allowance(others));

    let mut removed = Vec::new();
    while excess > 0 {
        let target = week
            .iter()
            .enumerate()
            .filter_map(|(d, day)| {
                let day_engagement =
                    day.iter().filter(|i| i.category == Category::Engagement).count();
                if day_engagement <= 1 {
                    return None;
                }
                removable_position(day).map(|pos| (day_engagement, d, pos))
            })
            .max_by_key(|(day_engagement, d, _)| (*day_engagement, *d));

        let Some((_, d, pos)) = target else {
            break;
        };
        let day = &mut week[d];
        removed.push(day.remove(pos));
        for (slot, item) in day.iter_mut().enumerate() {
            item.slot_index = slot as u32;
        }
        excess -= 1;
    }
    removed
}

fn category_count(week: &[Vec<AllocationItem>], category: Category) -> usize {
    week.iter()
        .flatten()
        .filter(|item| item.category == category)
        .count()
}

/// 最靠后的、移除后左右邻居不同的互动条目位置
fn removable_position(day: &[AllocationItem]) -> Option<usize> {
    (0..day.len()).rev().find(|&pos| {
        if day[pos].category != Category::Engagement {
            return false;
        }
        match (pos.checked_sub(1), day.get(pos + 1)) {
            (Some(left), Some(right)) => day[left].send_type_key != right.send_type_key,
            _ => true,
        }
    })
}
