// ==========================================
// 类别交错与相邻修复
// ==========================================

use std::collections::VecDeque;

/// 交错三类序列
///
/// 规则: 营收/互动轮转，每到第 4 个位置插入一条留存；
///       营收与互动都耗尽后，剩余留存依次追加
pub(super) fn interleave(
    revenue: Vec<String>,
    engagement: Vec<String>,
    retention: Vec<String>,
) -> Vec<String> {
    let total = revenue.len() + engagement.len() + retention.len();
    let mut revenue: VecDeque<String> = revenue.into();
    let mut engagement: VecDeque<String> = engagement.into();
    let mut retention: VecDeque<String> = retention.into();

    let mut out = Vec::with_capacity(total);
    let mut revenue_turn = true;

    while out.len() < total {
        let position = out.len() + 1;
        let others_empty = revenue.is_empty() && engagement.is_empty();
        if !retention.is_empty() && (position % 4 == 0 || others_empty) {
            if let Some(key) = retention.pop_front() {
                out.push(key);
            }
            continue;
        }

        let (first, second) = if revenue_turn {
            (&mut revenue, &mut engagement)
        } else {
            (&mut engagement, &mut revenue)
        };
        if let Some(key) = first.pop_front().or_else(|| second.pop_front()) {
            out.push(key);
        }
        revenue_turn = !revenue_turn;
    }

    out
}

/// 单遍相邻修复：遇到相邻重复，寻找一个交换后不产生新重复的位置
///
/// # 返回
/// 成功交换次数
pub(super) fn repair_adjacent(seq: &mut [String]) -> usize {
    let mut swaps = 0;
    for i in 1..seq.len() {
        if seq[i] != seq[i - 1] {
            continue;
        }
        let candidates = (i + 1..seq.len()).chain((0..i.saturating_sub(1)).rev());
        for j in candidates {
            if seq[j] == seq[i] {
                continue;
            }
            seq.swap(i, j);
            if is_clean_at(seq, i) && is_clean_at(seq, j) {
                swaps += 1;
                break;
            }
            seq.swap(i, j);
        }
    }
    swaps
}

/// 删除修复后仍残留的相邻重复
///
/// # 返回
/// 被删除的类型键（按出现顺序）
pub(super) fn drop_adjacent_duplicates(seq: &mut Vec<String>) -> Vec<String> {
    let mut kept: Vec<String> = Vec::with_capacity(seq.len());
    let mut dropped = Vec::new();
    for key in seq.drain(..) {
        if kept.last() == Some(&key) {
            dropped.push(key);
        } else {
            kept.push(key);
        }
    }
    *seq = kept;
    dropped
}

/// 位置 pos 与左右邻居均不同
fn is_clean_at(seq: &[String], pos: usize) -> bool {
    let left_ok = pos == 0 || seq[pos - 1] != seq[pos];
    let right_ok = pos + 1 >= seq.len() || seq[pos + 1] != seq[pos];
    left_ok && right_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_interleave_places_retention_every_fourth() {
        let out = interleave(
            keys(&["r1", "r2", "r3", "r4"]),
            keys(&["e1", "e2", "e3"]),
            keys(&["t1", "t2"]),
        );
        assert_eq!(out, keys(&["r1", "e1", "r2", "t1", "e2", "r3", "e3", "t2", "r4"]));
    }

    #[test]
    fn test_interleave_appends_leftover_retention() {
        let out = interleave(keys(&["r1"]), keys(&[]), keys(&["t1", "t2"]));
        assert_eq!(out, keys(&["r1", "t1", "t2"]));
    }

    #[test]
    fn test_repair_swaps_duplicate_away() {
        let mut seq = keys(&["a", "a", "b", "c"]);
        let swaps = repair_adjacent(&mut seq);
        assert_eq!(swaps, 1);
        assert!(seq.windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn test_repair_cannot_fix_all_same() {
        let mut seq = keys(&["a", "a", "a"]);
        assert_eq!(repair_adjacent(&mut seq), 0);
        let dropped = drop_adjacent_duplicates(&mut seq);
        assert_eq!(seq, keys(&["a"]));
        assert_eq!(dropped.len(), 2);
    }
}
