// ==========================================
// 周度内容排期引擎 - 核心库
// ==========================================
// 流水线: 体量解析 → 配额分配 → 时段落位 → 文案匹配 → 排期校验
// 系统定位: 排期决策核心，输入/持久化/展示均由外部协作方负责
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 排期规则
pub mod engine;

// 配置层 - 运行参数与参考数据
pub mod config;

// 错误类型
pub mod error;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    Category, ContentTier, PageType, PageTypeRestriction, ResolutionState, RevenueRole,
    ValidationStatus, VolumeTier,
};

// 领域实体
pub use domain::{
    AccountProfile, AllocationItem, CaptionAssignment, CaptionRecord, PerformanceSignals,
    ScheduleWarning, ScheduledItem, SendTypeCatalog, SendTypeDefinition, ValidationReport,
    VolumeConfig, WeeklyStrategyMetadata,
};

// 引擎
pub use engine::{
    AccountSnapshot, BatchReport, BatchScheduler, CaptionMatcher, RunContext,
    ScheduleOrchestrator, ScheduleValidator, SlotAllocator, SnapshotProvider, TimeSlotScheduler,
    VolumeConfigResolver, WeeklySchedule,
};

// 配置
pub use config::{
    ConfigManager, ConfigScope, ScheduleConfigReader, ScheduleSettings, VolumeTierTable,
};

// 错误
pub use error::{ConfigError, EngineResult, ScheduleError};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "周度内容排期引擎";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_reference_data_loads() {
        assert_eq!(SendTypeCatalog::standard().unwrap().len(), 22);
        assert!(VolumeTierTable::standard().is_ok());
    }
}
