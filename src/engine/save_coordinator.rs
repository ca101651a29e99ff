// ==========================================
// 制造运营管理系统 - 两阶段保存协调器
// ==========================================
// 阶段1: create_work_order → 父工单ID
// 阶段2: 为全部明细盖章父工单ID → create_work_order_details（一次批量）
// 状态: Idle → Saving(phase1) → Saving(phase2) → Succeeded | FailedPhase1 | FailedPhase2
// ==========================================
// 红线:
// - 阶段1未确认成功前绝不发起阶段2
// - 同一时刻只允许一次保存
// - 跨记录不保证原子性：阶段2失败时父工单保留、明细未提交（由对账任务清理）
// - 不自动重试
// ==========================================

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::domain::credentials::Credentials;
use crate::engine::draft::WorkOrderDraft;
use crate::engine::error::{FailureReason, SaveOutcome, SavePhase, SaveRejected, SaveState};
use crate::engine::notification::{LoadingGate, Notification, NotificationSink};
use crate::remote::{RemoteResult, WorkOrderRemote};

/// 保存参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveConfig {
    /// 单次远程调用超时
    pub remote_timeout: Duration,
    /// 是否携带 client_ref（服务端据此去重）
    pub idempotent_create: bool,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            remote_timeout: Duration::from_millis(15_000),
            idempotent_create: true,
        }
    }
}

// ==========================================
// BusyGuard - 忙碌标记守卫
// ==========================================
// 离开作用域时（含 panic 展开）清除保存标记并关闭加载门控
struct BusyGuard<'a> {
    saving: &'a AtomicBool,
    loading: &'a dyn LoadingGate,
}

impl<'a> BusyGuard<'a> {
    fn engage(saving: &'a AtomicBool, loading: &'a dyn LoadingGate) -> Self {
        loading.set_busy(true);
        Self { saving, loading }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.saving.store(false, Ordering::SeqCst);
        self.loading.set_busy(false);
    }
}

// ==========================================
// SaveTransactionCoordinator
// ==========================================
pub struct SaveTransactionCoordinator {
    remote: Arc<dyn WorkOrderRemote>,
    notifier: Arc<dyn NotificationSink>,
    loading: Arc<dyn LoadingGate>,
    config: SaveConfig,
    state: Mutex<SaveState>,
    saving: AtomicBool,
}

impl SaveTransactionCoordinator {
    pub fn new(
        remote: Arc<dyn WorkOrderRemote>,
        notifier: Arc<dyn NotificationSink>,
        loading: Arc<dyn LoadingGate>,
        config: SaveConfig,
    ) -> Self {
        Self {
            remote,
            notifier,
            loading,
            config,
            state: Mutex::new(SaveState::Idle),
            saving: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> SaveState {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> SaveConfig {
        self.config
    }

    fn set_state(&self, state: SaveState) {
        tracing::debug!(state = ?state, "保存状态变更");
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// 执行两阶段保存
    ///
    /// # 返回
    /// - Ok(SaveOutcome): 本次保存的结果（失败也在此，已通知并复位忙碌标记）
    /// - Err(SaveRejected): 保存进行中或已成功保存，未发出任何远程调用
    #[tracing::instrument(skip_all, fields(user_id = %credentials.user_id))]
    pub async fn save(
        &self,
        credentials: &Credentials,
        draft: &WorkOrderDraft,
    ) -> Result<SaveOutcome, SaveRejected> {
        if self
            .saving
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("保存进行中，忽略重复提交");
            return Err(SaveRejected::InProgress);
        }
        if self.state().is_succeeded() {
            self.saving.store(false, Ordering::SeqCst);
            return Err(SaveRejected::AlreadySaved);
        }

        let busy = BusyGuard::engage(&self.saving, self.loading.as_ref());
        let outcome = self.run(credentials, draft).await;
        drop(busy);

        self.report(&outcome);
        Ok(outcome)
    }

    async fn run(&self, credentials: &Credentials, draft: &WorkOrderDraft) -> SaveOutcome {
        // ===== 阶段1: 创建父工单 =====
        self.set_state(SaveState::Saving {
            phase: SavePhase::CreateWorkOrder,
        });

        let mut payload = draft.work_order_snapshot();
        if !self.config.idempotent_create {
            payload.client_ref = None;
        }

        let phase1 = self
            .call(
                SavePhase::CreateWorkOrder,
                self.remote.create_work_order(credentials, &payload),
            )
            .await
            .and_then(|id| {
                if id.trim().is_empty() {
                    Err(FailureReason::EmptyResult {
                        message: Some("empty work order id".to_string()),
                    })
                } else {
                    Ok(id)
                }
            });

        let work_order_id = match phase1 {
            Ok(id) => id,
            Err(reason) => {
                self.set_state(SaveState::FailedPhase1 {
                    reason: reason.clone(),
                });
                return SaveOutcome::FailedPhase1 { reason };
            }
        };

        draft.work_order().mark_persisted(work_order_id.clone());
        tracing::info!(work_order_id = %work_order_id, "阶段1完成，父工单已创建");

        // ===== 阶段2: 盖章并批量创建明细 =====
        self.set_state(SaveState::Saving {
            phase: SavePhase::CreateDetails,
        });

        let details = draft.editor().stamp_parent(&work_order_id);
        let phase2 = self
            .call(
                SavePhase::CreateDetails,
                self.remote
                    .create_work_order_details(credentials, &work_order_id, &details),
            )
            .await;

        match phase2 {
            Ok(_) => {
                self.set_state(SaveState::Succeeded {
                    work_order_id: work_order_id.clone(),
                    detail_count: details.len(),
                });
                SaveOutcome::Succeeded {
                    work_order_id,
                    details,
                }
            }
            Err(reason) => {
                tracing::warn!(
                    work_order_id = %work_order_id,
                    "明细保存失败，父工单已持久化且无明细"
                );
                self.set_state(SaveState::FailedPhase2 {
                    work_order_id: work_order_id.clone(),
                    reason: reason.clone(),
                });
                SaveOutcome::FailedPhase2 {
                    work_order_id,
                    details,
                    reason,
                }
            }
        }
    }

    /// 带超时的远程调用；result 缺失视为失败
    async fn call<T, F>(&self, phase: SavePhase, request: F) -> Result<T, FailureReason>
    where
        F: Future<Output = RemoteResult<T>>,
    {
        let timeout = self.config.remote_timeout;
        let reason = match tokio::time::timeout(timeout, request).await {
            Err(_) => FailureReason::timeout(timeout),
            Ok(Err(e)) => FailureReason::Transport(e.to_string()),
            Ok(Ok(response)) => match response.result {
                Some(value) => return Ok(value),
                None => FailureReason::EmptyResult {
                    message: response.message,
                },
            },
        };

        tracing::error!(phase = %phase, reason = %reason, "远程调用失败");
        Err(reason)
    }

    fn report(&self, outcome: &SaveOutcome) {
        let notification = match outcome {
            SaveOutcome::Succeeded {
                work_order_id,
                details,
            } => {
                let count = details.len().to_string();
                Notification::success_with(
                    "work_order.notify.save_success",
                    &[
                        ("work_order_id", work_order_id.as_str()),
                        ("count", count.as_str()),
                    ],
                )
            }
            SaveOutcome::FailedPhase1 { reason } => {
                let reason = reason.to_string();
                Notification::danger_with(
                    "work_order.notify.phase1_failed",
                    &[("reason", reason.as_str())],
                )
            }
            SaveOutcome::FailedPhase2 {
                work_order_id,
                reason,
                ..
            } => {
                let reason = reason.to_string();
                Notification::danger_with(
                    "work_order.notify.phase2_failed",
                    &[
                        ("work_order_id", work_order_id.as_str()),
                        ("reason", reason.as_str()),
                    ],
                )
            }
        };
        self.notifier.show(notification);
    }
}
