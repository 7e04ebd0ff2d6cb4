// ==========================================
// 周度内容排期引擎 - 引擎层
// ==========================================
// 职责: 实现排期规则引擎，不做任何外部 I/O
// 红线: 硬规则宁可少排/转人工，也不破坏；所有降级都输出告警
// ==========================================

pub mod allocator;
pub mod batch;
pub mod caption_matcher;
pub mod context;
pub mod orchestrator;
pub mod strategy;
pub mod time_slot;
pub mod validator;
pub mod volume;

// 重导出核心引擎
pub use allocator::SlotAllocator;
pub use batch::{account_seed, AccountOutcome, BatchReport, BatchScheduler, SnapshotProvider};
pub use caption_matcher::{CaptionMatcher, SelectionStrategy};
pub use context::RunContext;
pub use orchestrator::{AccountSnapshot, ScheduleOrchestrator, WeeklySchedule};
pub use strategy::{build_weekly_strategy, DayStrategy};
pub use time_slot::TimeSlotScheduler;
pub use validator::{ScheduleValidator, ValidationInput};
pub use volume::VolumeConfigResolver;
