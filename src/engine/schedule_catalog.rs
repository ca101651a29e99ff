// ==========================================
// 制造运营管理系统 - 主生产计划目录
// ==========================================
// 职责: 拉取并持有只读的主生产计划列表
// 规则: 每次激活整体替换；不取消在途请求，以"最后完成"为准
// 标记: 每次拉取分配代号，旧请求晚到覆盖新结果时记 warn
// ==========================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use crate::domain::credentials::Credentials;
use crate::domain::schedule::ScheduleItem;
use crate::engine::error::FailureReason;
use crate::remote::WorkOrderRemote;

#[derive(Debug, Default)]
pub struct ScheduleCatalog {
    items: RwLock<Vec<ScheduleItem>>,
    issued: AtomicU64,
    applied: AtomicU64,
    stale_overwrites: AtomicU64,
}

impl ScheduleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 拉取完整目录并替换当前列表
    ///
    /// # 返回
    /// - Ok(usize): 新列表条目数
    /// - Err(FailureReason): 拉取失败，原列表保持不变
    pub async fn refresh(
        &self,
        remote: &dyn WorkOrderRemote,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<usize, FailureReason> {
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(generation, "开始拉取主生产计划目录");

        let response = match tokio::time::timeout(timeout, remote.fetch_schedule_catalog(credentials)).await {
            Err(_) => {
                return Err(FailureReason::timeout(timeout))
            }
            Ok(Err(e)) => return Err(FailureReason::Transport(e.to_string())),
            Ok(Ok(response)) => response,
        };

        let items = response.result.ok_or(FailureReason::EmptyResult {
            message: response.message,
        })?;

        Ok(self.apply(generation, items))
    }

    fn apply(&self, generation: u64, items: Vec<ScheduleItem>) -> usize {
        let mut guard = self.items.write().unwrap_or_else(PoisonError::into_inner);

        let latest = self.issued.load(Ordering::SeqCst);
        if generation < latest {
            self.stale_overwrites.fetch_add(1, Ordering::SeqCst);
            tracing::warn!(
                generation,
                latest,
                "旧的目录请求晚于新请求完成，仍以最后完成的结果为准"
            );
        }

        let count = items.len();
        *guard = items;
        self.applied.store(generation, Ordering::SeqCst);

        tracing::info!(generation, count, "主生产计划目录已更新");
        count
    }

    /// 当前目录快照
    pub fn items(&self) -> Vec<ScheduleItem> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn find(&self, mps_id: &str) -> Option<ScheduleItem> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|item| item.mps_id == mps_id)
            .cloned()
    }

    pub fn contains(&self, mps_id: &str) -> bool {
        self.find(mps_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 当前列表来自第几次拉取（0 表示从未成功）
    pub fn applied_generation(&self) -> u64 {
        self.applied.load(Ordering::SeqCst)
    }

    /// 旧请求覆盖新结果的次数
    pub fn stale_overwrites(&self) -> u64 {
        self.stale_overwrites.load(Ordering::SeqCst)
    }
}
