// ==========================================
// 制造运营管理系统 - 孤儿工单对账任务
// ==========================================
// 背景: 两阶段保存不保证原子性，阶段2失败会留下明细未提交的父工单
// 职责: 定期清理创建时间超过宽限期、且明细从未提交的工单
// 说明: 宽限期内的工单可能仍在保存流程中，不处理；
//       阶段2成功提交的空明细工单带有提交标记，不会被清理
// ==========================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;

use crate::api::{ApiResult, WorkOrderApi};

/// 单次对账结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationReport {
    pub cutoff: NaiveDateTime,
    pub orphans_found: usize,
    pub deleted: usize,
}

pub struct ReconciliationJob {
    api: Arc<WorkOrderApi>,
    grace: chrono::Duration,
    periodic_runs: AtomicU64,
}

impl ReconciliationJob {
    pub fn new(api: Arc<WorkOrderApi>, grace: chrono::Duration) -> Self {
        Self {
            api,
            grace,
            periodic_runs: AtomicU64::new(0),
        }
    }

    pub fn grace(&self) -> chrono::Duration {
        self.grace
    }

    /// 循环对账已完成的轮数（含失败的轮次）
    pub fn periodic_runs(&self) -> u64 {
        self.periodic_runs.load(Ordering::SeqCst)
    }

    /// 执行一次对账
    ///
    /// # 参数
    /// - now: 当前时刻（与工单 created_at 同一时钟）
    pub fn run_once(&self, now: NaiveDateTime) -> ApiResult<ReconciliationReport> {
        let cutoff = now - self.grace;

        let orphans = self.api.find_orphaned_work_orders(cutoff)?;
        for orphan in &orphans {
            tracing::info!(
                work_order_id = ?orphan.work_order_id,
                product_manager_id = %orphan.product_manager_id(),
                created_at = ?orphan.created_at,
                "发现孤儿工单"
            );
        }

        let deleted = if orphans.is_empty() {
            0
        } else {
            self.api.cleanup_orphaned_work_orders(cutoff)?
        };

        tracing::info!(
            cutoff = %cutoff,
            orphans_found = orphans.len(),
            deleted,
            "孤儿工单对账完成"
        );

        Ok(ReconciliationReport {
            cutoff,
            orphans_found: orphans.len(),
            deleted,
        })
    }

    /// 按固定间隔循环对账（直到所在任务被取消）
    ///
    /// 首轮立即执行；单轮失败只记日志，不中断循环
    pub async fn run_periodically(self: Arc<Self>, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let job = self.clone();
            let result = tokio::task::spawn_blocking(move || {
                job.run_once(chrono::Local::now().naive_local())
            })
            .await;

            match result {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => tracing::error!(code = e.code(), error = %e, "孤儿工单对账失败"),
                Err(e) => tracing::error!(error = %e, "孤儿工单对账任务异常退出"),
            }
            self.periodic_runs.fetch_add(1, Ordering::SeqCst);
        }
    }
}
