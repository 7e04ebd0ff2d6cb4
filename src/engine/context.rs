// ==========================================
// 周度内容排期引擎 - 单次运行上下文
// ==========================================
// 职责: 承载一次账号排期中全部可变状态，贯穿五个阶段
// - 随机源（可注入、可复现）
// - 周度计数 / 同类型最近落位时间 / 时刻复用计数
// - 内容类型滚动使用窗口 / 本周已用文案集合
// - 可恢复告警
// 说明: 每个账号独占一个上下文，账号之间无需加锁
// ==========================================

use crate::domain::warning::ScheduleWarning;
use chrono::{Duration, NaiveDateTime, NaiveTime};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

pub struct RunContext {
    rng: Box<dyn RngCore + Send>,

    /// 本周各发送类型已分配条数
    pub weekly_counts: HashMap<String, u32>,

    /// 同类型最近一次落位时间（跨天保留，使用方按日期判断）
    pub last_used_time: HashMap<String, NaiveDateTime>,

    /// 时刻（HH:MM）在本周被使用的次数
    pub time_of_day_counts: HashMap<NaiveTime, u32>,

    /// 内容类型使用记录（按时间升序）
    content_type_window: VecDeque<(NaiveDateTime, String)>,

    /// 本周已分配文案
    used_captions: HashSet<String>,

    warnings: Vec<ScheduleWarning>,
}

impl RunContext {
    /// 使用固定种子创建（ChaCha8，可复现）
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(Box::new(ChaCha8Rng::seed_from_u64(seed)))
    }

    /// 注入任意随机源
    pub fn with_rng(rng: Box<dyn RngCore + Send>) -> Self {
        Self {
            rng,
            weekly_counts: HashMap::new(),
            last_used_time: HashMap::new(),
            time_of_day_counts: HashMap::new(),
            content_type_window: VecDeque::new(),
            used_captions: HashSet::new(),
            warnings: Vec::new(),
        }
    }

    pub fn rng(&mut self) -> &mut (dyn RngCore + Send) {
        self.rng.as_mut()
    }

    // ==========================================
    // 周度计数
    // ==========================================

    pub fn weekly_count(&self, key: &str) -> u32 {
        self.weekly_counts.get(key).copied().unwrap_or(0)
    }

    pub fn increment_weekly(&mut self, key: &str) {
        *self.weekly_counts.entry(key.to_string()).or_insert(0) += 1;
    }

    pub fn decrement_weekly(&mut self, key: &str) {
        if let Some(count) = self.weekly_counts.get_mut(key) {
            *count = count.saturating_sub(1);
        }
    }

    // ==========================================
    // 时段
    // ==========================================

    pub fn time_of_day_count(&self, time: NaiveTime) -> u32 {
        self.time_of_day_counts.get(&time).copied().unwrap_or(0)
    }

    pub fn record_time_of_day(&mut self, time: NaiveTime) {
        *self.time_of_day_counts.entry(time).or_insert(0) += 1;
    }

    // ==========================================
    // 内容类型滚动窗口
    // ==========================================

    /// 统计 (at - window, at] 区间内某内容类型的使用次数
    pub fn content_type_usage(
        &self,
        content_type: &str,
        at: NaiveDateTime,
        window: Duration,
    ) -> usize {
        let from = at - window;
        self.content_type_window
            .iter()
            .filter(|(ts, ct)| *ts > from && *ts <= at && ct == content_type)
            .count()
    }

    /// 记录使用，并丢弃早于 at - window 的记录
    pub fn record_content_type(&mut self, content_type: &str, at: NaiveDateTime, window: Duration) {
        let from = at - window;
        while matches!(self.content_type_window.front(), Some((ts, _)) if *ts <= from) {
            self.content_type_window.pop_front();
        }
        self.content_type_window.push_back((at, content_type.to_string()));
    }

    // ==========================================
    // 本周文案占用
    // ==========================================

    pub fn is_caption_used(&self, caption_id: &str) -> bool {
        self.used_captions.contains(caption_id)
    }

    /// 标记文案已用；已占用则返回 false
    pub fn mark_caption_used(&mut self, caption_id: &str) -> bool {
        self.used_captions.insert(caption_id.to_string())
    }

    // ==========================================
    // 告警
    // ==========================================

    pub fn warn(&mut self, warning: ScheduleWarning) {
        tracing::warn!(code = warning.code(), "{}", warning);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[ScheduleWarning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<ScheduleWarning> {
        std::mem::take(&mut self.warnings)
    }
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("weekly_counts", &self.weekly_counts)
            .field("used_captions", &self.used_captions.len())
            .field("warnings", &self.warnings.len())
            .finish()
    }
}
