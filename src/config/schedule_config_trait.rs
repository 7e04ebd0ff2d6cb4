// ==========================================
// 周度内容排期引擎 - 配置读取 Trait
// ==========================================
// 职责: 定义排期所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::config_manager::ConfigScope;
use crate::error::ConfigError;
use async_trait::async_trait;

// ==========================================
// ScheduleConfigReader Trait
// ==========================================
// 实现者: ConfigManager（内存 key-value）
// 说明: 读取只发生在运行开始前，引擎各阶段不做 I/O
#[async_trait]
pub trait ScheduleConfigReader: Send + Sync {
    /// 读取原始配置值
    ///
    /// # 返回
    /// - Some(String): 配置值（账号级优先）
    /// - None: 未配置，调用方使用默认值
    async fn get_raw(&self, scope: &ConfigScope, key: &str) -> Result<Option<String>, ConfigError>;
}
