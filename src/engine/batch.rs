// ==========================================
// 周度内容排期引擎 - 批量调度
// ==========================================
// 职责: 多账号并发排期
// - 有界并发（信号量 + buffer_unordered，1..=8）
// - 单账号超时（超时仅丢弃结果，不中断计算）
// - 单账号失败不影响其他账号（fail_fast 除外）
// 说明: 账号之间只共享只读参考数据，各自持有 RunContext
// ==========================================

use crate::config::config_manager::ConfigScope;
use crate::config::schedule_config_trait::ScheduleConfigReader;
use crate::config::settings::{BatchSettings, ScheduleSettings};
use crate::config::tier_table::VolumeTierTable;
use crate::domain::send_type::SendTypeCatalog;
use crate::engine::orchestrator::{AccountSnapshot, ScheduleOrchestrator, WeeklySchedule};
use crate::error::{EngineResult, ScheduleError};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

// ==========================================
// SnapshotProvider - 账号输入快照来源
// ==========================================
// 每个账号在运行开始前只获取一次
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    async fn fetch(&self, account_id: &str) -> EngineResult<AccountSnapshot>;
}

/// 账号种子: base_seed XOR FNV-1a(account_id)
pub fn account_seed(base_seed: u64, account_id: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
    let hash = account_id
        .bytes()
        .fold(FNV_OFFSET, |h, b| (h ^ b as u64).wrapping_mul(FNV_PRIME));
    base_seed ^ hash
}

// ==========================================
// 批量结果
// ==========================================

#[derive(Debug)]
pub struct AccountOutcome {
    pub account_id: String,
    pub seed: u64,
    pub result: EngineResult<WeeklySchedule>,
}

impl AccountOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    /// 与输入账号顺序一致
    pub outcomes: Vec<AccountOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn get(&self, account_id: &str) -> Option<&AccountOutcome> {
        self.outcomes.iter().find(|o| o.account_id == account_id)
    }
}

// ==========================================
// BatchScheduler
// ==========================================

pub struct BatchScheduler<R>
where
    R: ScheduleConfigReader,
{
    config: Arc<R>,
    catalog: Arc<SendTypeCatalog>,
    tier_table: Arc<VolumeTierTable>,
    settings: BatchSettings,
}

impl<R> BatchScheduler<R>
where
    R: ScheduleConfigReader,
{
    /// 从配置读取批量参数并创建
    pub async fn new(
        config: Arc<R>,
        catalog: Arc<SendTypeCatalog>,
        tier_table: Arc<VolumeTierTable>,
    ) -> EngineResult<Self> {
        let settings = BatchSettings::load(config.as_ref()).await?;
        Ok(Self::with_settings(config, catalog, tier_table, settings))
    }

    pub fn with_settings(
        config: Arc<R>,
        catalog: Arc<SendTypeCatalog>,
        tier_table: Arc<VolumeTierTable>,
        settings: BatchSettings,
    ) -> Self {
        Self {
            config,
            catalog,
            tier_table,
            settings,
        }
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// 批量执行
    ///
    /// # 返回
    /// - 非 fail_fast: 每个账号一条结果
    /// - fail_fast: 首个失败直接返回该错误，其余任务被丢弃
    pub async fn run<P>(&self, provider: &P, account_ids: &[String]) -> EngineResult<BatchReport>
    where
        P: SnapshotProvider + ?Sized,
    {
        let concurrency = self.settings.effective_concurrency();
        let semaphore = Arc::new(Semaphore::new(concurrency));

        info!(
            accounts = account_ids.len(),
            concurrency,
            timeout_secs = self.settings.account_timeout.as_secs(),
            fail_fast = self.settings.fail_fast,
            "开始批量排期"
        );

        let mut pending = stream::iter(account_ids.iter().enumerate())
            .map(|(index, account_id)| {
                let sem = semaphore.clone();
                async move {
                    let seed = account_seed(self.settings.base_seed, account_id);
                    let result = match sem.acquire().await {
                        Ok(_permit) => self.run_with_timeout(provider, account_id, seed).await,
                        Err(_) => Err(ScheduleError::TaskFailed("信号量已关闭".to_string())),
                    };
                    (
                        index,
                        AccountOutcome {
                            account_id: account_id.clone(),
                            seed,
                            result,
                        },
                    )
                }
            })
            .buffer_unordered(concurrency);

        let mut collected = Vec::with_capacity(account_ids.len());
        while let Some((index, outcome)) = pending.next().await {
            if let Err(e) = &outcome.result {
                error!(account_id = %outcome.account_id, error = %e, "账号排期失败");
                if self.settings.fail_fast {
                    warn!(completed = collected.len(), "fail_fast 已开启，终止批量排期");
                    return outcome.result.map(|_| BatchReport::default());
                }
            }
            collected.push((index, outcome));
        }

        collected.sort_by_key(|(index, _)| *index);
        let report = BatchReport {
            outcomes: collected.into_iter().map(|(_, o)| o).collect(),
        };
        info!(succeeded = report.succeeded(), failed = report.failed(), "批量排期完成");
        Ok(report)
    }

    async fn run_with_timeout<P>(
        &self,
        provider: &P,
        account_id: &str,
        seed: u64,
    ) -> EngineResult<WeeklySchedule>
    where
        P: SnapshotProvider + ?Sized,
    {
        let timeout = self.settings.account_timeout;
        match tokio::time::timeout(timeout, self.run_account(provider, account_id, seed)).await {
            Ok(result) => result,
            Err(_) => Err(ScheduleError::Timeout {
                account_id: account_id.to_string(),
                timeout_secs: timeout.as_secs(),
            }),
        }
    }

    /// 单账号: 读参数 → 取快照 → 阻塞线程上执行流水线
    async fn run_account<P>(
        &self,
        provider: &P,
        account_id: &str,
        seed: u64,
    ) -> EngineResult<WeeklySchedule>
    where
        P: SnapshotProvider + ?Sized,
    {
        let scope = ConfigScope::account(account_id);
        let settings = ScheduleSettings::load(self.config.as_ref(), &scope).await?;
        let orchestrator =
            ScheduleOrchestrator::new(self.catalog.clone(), self.tier_table.clone(), settings)?;
        let snapshot = provider.fetch(account_id).await?;

        tokio::task::spawn_blocking(move || orchestrator.generate_seeded(&snapshot, seed))
            .await
            .map_err(|e| ScheduleError::TaskFailed(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_seed_is_stable_and_distinct() {
        assert_eq!(account_seed(0, ""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(account_seed(42, "acc_a"), account_seed(42, "acc_a"));
        assert_ne!(account_seed(42, "acc_a"), account_seed(42, "acc_b"));
        assert_ne!(account_seed(1, "acc_a"), account_seed(2, "acc_a"));
    }
}
