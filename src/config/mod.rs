// ==========================================
// 周度内容排期引擎 - 配置层
// ==========================================
// 职责: 运行参数管理（账号级覆写全局）与参考数据表
// ==========================================

pub mod config_manager;
pub mod schedule_config_trait;
pub mod settings;
pub mod tier_table;

// 重导出
pub use config_manager::{config_keys, ConfigManager, ConfigScope};
pub use schedule_config_trait::ScheduleConfigReader;
pub use settings::{BatchSettings, ScheduleSettings, MAX_CONCURRENCY_LIMIT};
pub use tier_table::{DayAdjustment, TierRow, VolumeTierTable};
