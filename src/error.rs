// ==========================================
// 周度内容排期引擎 - 错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 仅 ConfigError 与 AVOID 档违规在单次运行内不可恢复
//       配额不足/间隔冲突/窗口溢出/无可用文案属于告警，见 domain::warning
// ==========================================

use thiserror::Error;

/// 配置错误（对该账号的本次运行是致命的）
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("体量档位表缺失")]
    MissingTierTable,

    #[error("体量档位表格式错误: {0}")]
    MalformedTierTable(String),

    #[error("发送类型分类表缺失")]
    MissingTaxonomy,

    #[error("发送类型分类表格式错误: {0}")]
    MalformedTaxonomy(String),

    #[error("配置值无效: key={key}, value={value}, reason={reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("配置解析失败: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("配置文件读取失败: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub fn invalid(key: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// 排期引擎错误
#[derive(Error, Debug)]
pub enum ScheduleError {
    // ===== 配置错误 =====
    #[error(transparent)]
    Config(#[from] ConfigError),

    // ===== 红线违反 =====
    #[error("AVOID 档文案被引用: caption_id={caption_id}")]
    AvoidTierViolation { caption_id: String },

    #[error("排期校验未通过: score={score}, violations={violations:?}")]
    ValidationRejection { score: u32, violations: Vec<String> },

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ===== 批量执行错误 =====
    #[error("账号输入快照获取失败: account_id={account_id}, reason={reason}")]
    SnapshotUnavailable { account_id: String, reason: String },

    #[error("账号排期超时: account_id={account_id}, timeout={timeout_secs}s")]
    Timeout { account_id: String, timeout_secs: u64 },

    #[error("排期任务异常退出: {0}")]
    TaskFailed(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, ScheduleError>;
