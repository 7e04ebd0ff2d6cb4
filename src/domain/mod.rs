// ==========================================
// 周度内容排期引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型与参考数据
// 红线: 不含引擎逻辑
// ==========================================

pub mod caption;
pub mod report;
pub mod schedule;
pub mod send_type;
pub mod types;
pub mod volume;
pub mod warning;

// 重导出核心类型
pub use caption::{CaptionAssignment, CaptionRecord, ScoreBreakdown};
pub use report::{ValidationMetrics, ValidationReport, Violation, ViolationCode};
pub use schedule::{AllocationItem, ScheduledItem, TimingFlag, TimingMeta, WeeklyStrategyMetadata};
pub use send_type::{SendTypeCatalog, SendTypeDefinition};
pub use types::{
    Category, ContentTier, PageType, PageTypeRestriction, ResolutionState, RevenueRole,
    ValidationStatus, VolumeTier,
};
pub use volume::{AccountProfile, DailyVolume, PerformanceSignals, VolumeConfig};
pub use warning::ScheduleWarning;
