// ==========================================
// 制造运营管理系统 - 新建工单会话
// ==========================================
// 职责: 组合目录、明细编辑器、日期校验与保存协调器
// 流程:
// 1. activate: 拉取主生产计划目录
// 2. 编辑: 新增明细 / 关联计划 / 修改字段 / 调整日期
// 3. save: 两阶段保存；成功后延时交还控制权（完成回调）
// 冻结: 保存进行中拒绝编辑；保存成功后不可再编辑
// ==========================================

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

use crate::domain::credentials::Credentials;
use crate::domain::schedule::ScheduleItem;
use crate::domain::types::DetailField;
use crate::domain::work_order::{DetailKey, WorkOrder, WorkOrderDetail};
use crate::engine::date_range::{to_plant_day, DateRangeValidator};
use crate::engine::draft::WorkOrderDraft;
use crate::engine::error::{SaveOutcome, SaveState, SessionError};
use crate::engine::notification::{
    LoadingGate, Notification, NotificationSink, SharedLoadingGate,
};
use crate::engine::save_coordinator::{SaveConfig, SaveTransactionCoordinator};
use crate::engine::schedule_catalog::ScheduleCatalog;
use crate::remote::WorkOrderRemote;

/// 会话参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub save: SaveConfig,
    /// 保存成功后到执行完成回调的延时
    pub success_delay: Duration,
    /// 工厂所在时区的固定偏移
    pub plant_offset: FixedOffset,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            save: SaveConfig::default(),
            success_delay: Duration::from_millis(4_000),
            plant_offset: Utc.fix(),
        }
    }
}

pub struct CreateWorkOrderSession {
    credentials: Credentials,
    remote: Arc<dyn WorkOrderRemote>,
    notifier: Arc<dyn NotificationSink>,
    loading: Arc<dyn LoadingGate>,
    catalog: ScheduleCatalog,
    validator: DateRangeValidator,
    coordinator: SaveTransactionCoordinator,
    draft: WorkOrderDraft,
    config: SessionConfig,
}

impl CreateWorkOrderSession {
    /// 创建会话
    ///
    /// # 参数
    /// - credentials: 当前登录用户（user_id 即生产经理ID）
    /// - today: 工厂日历的当天，作为默认开始/结束日期
    pub fn new(
        credentials: Credentials,
        remote: Arc<dyn WorkOrderRemote>,
        notifier: Arc<dyn NotificationSink>,
        loading: Arc<dyn LoadingGate>,
        config: SessionConfig,
        today: NaiveDate,
    ) -> Self {
        let work_order = WorkOrder::new_draft(credentials.user_id.clone(), today);
        // 目录加载与保存可能重叠，共用计数门控
        let loading: Arc<dyn LoadingGate> = Arc::new(SharedLoadingGate::new(loading));
        let coordinator = SaveTransactionCoordinator::new(
            remote.clone(),
            notifier.clone(),
            loading.clone(),
            config.save,
        );

        Self {
            credentials,
            remote,
            validator: DateRangeValidator::new(notifier.clone()),
            notifier,
            loading,
            catalog: ScheduleCatalog::new(),
            coordinator,
            draft: WorkOrderDraft::new(work_order),
            config,
        }
    }

    /// 以当前时刻折算的工厂日期创建会话
    pub fn starting_now(
        credentials: Credentials,
        remote: Arc<dyn WorkOrderRemote>,
        notifier: Arc<dyn NotificationSink>,
        loading: Arc<dyn LoadingGate>,
        config: SessionConfig,
    ) -> Self {
        let today = to_plant_day(Utc::now(), config.plant_offset);
        Self::new(credentials, remote, notifier, loading, config, today)
    }

    // ==========================================
    // 激活: 刷新目录
    // ==========================================

    /// 页面激活时拉取主生产计划目录
    ///
    /// 失败时保留原列表并发出 danger 通知
    pub async fn activate(&self) -> Result<usize, SessionError> {
        self.loading.set_busy(true);
        let result = self
            .catalog
            .refresh(
                self.remote.as_ref(),
                &self.credentials,
                self.config.save.remote_timeout,
            )
            .await;
        self.loading.set_busy(false);

        result.map_err(|reason| {
            tracing::error!(reason = %reason, "主生产计划目录加载失败");
            let text = reason.to_string();
            self.notifier.show(Notification::danger_with(
                "work_order.notify.catalog_failed",
                &[("reason", text.as_str())],
            ));
            SessionError::Catalog(reason)
        })
    }

    // ==========================================
    // 编辑操作
    // ==========================================

    fn ensure_editable(&self) -> Result<(), SessionError> {
        if self.coordinator.is_saving() {
            return Err(SessionError::SaveInProgress);
        }
        if self.coordinator.state().is_succeeded() {
            return Err(SessionError::AlreadySaved);
        }
        Ok(())
    }

    fn ensure_in_catalog(&self, mps_id: &str) -> Result<(), SessionError> {
        if self.catalog.contains(mps_id) {
            Ok(())
        } else {
            Err(SessionError::UnknownScheduleItem(mps_id.to_string()))
        }
    }

    pub fn add_detail(&self) -> Result<DetailKey, SessionError> {
        self.ensure_editable()?;
        Ok(self.draft.editor().add_draft())
    }

    /// 选中主生产计划：关联到最后一行明细
    pub fn select_schedule_item(&self, mps_id: &str) -> Result<DetailKey, SessionError> {
        self.ensure_editable()?;
        self.ensure_in_catalog(mps_id)?;
        Ok(self.draft.editor().assign_schedule_reference(mps_id)?)
    }

    /// 选中主生产计划：关联到指定行
    pub fn select_schedule_item_for(&self, key: DetailKey, mps_id: &str) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.ensure_in_catalog(mps_id)?;
        Ok(self.draft.editor().assign_schedule_reference_to(key, mps_id)?)
    }

    pub fn edit_detail(
        &self,
        index: usize,
        field: DetailField,
        value: &str,
    ) -> Result<(), SessionError> {
        self.ensure_editable()?;
        Ok(self.draft.editor().edit_field(index, field, value)?)
    }

    pub fn edit_detail_by_name(
        &self,
        index: usize,
        field_name: &str,
        value: &str,
    ) -> Result<(), SessionError> {
        self.ensure_editable()?;
        Ok(self.draft.editor().edit_field_by_name(index, field_name, value)?)
    }

    pub fn edit_detail_by_key(
        &self,
        key: DetailKey,
        field: DetailField,
        value: &str,
    ) -> Result<(), SessionError> {
        self.ensure_editable()?;
        Ok(self.draft.editor().edit_field_by_key(key, field, value)?)
    }

    pub fn propose_date_start(&self, proposed: NaiveDate) -> Result<(), SessionError> {
        self.ensure_editable()?;
        let mut work_order = self.draft.work_order();
        Ok(self.validator.apply_start(&mut work_order, proposed)?)
    }

    pub fn propose_date_end(&self, proposed: NaiveDate) -> Result<(), SessionError> {
        self.ensure_editable()?;
        let mut work_order = self.draft.work_order();
        Ok(self.validator.apply_end(&mut work_order, proposed)?)
    }

    /// 日期选择器给出的是时刻，按工厂时区折算为日历日
    pub fn propose_date_start_at(&self, instant: DateTime<Utc>) -> Result<(), SessionError> {
        self.propose_date_start(to_plant_day(instant, self.config.plant_offset))
    }

    pub fn propose_date_end_at(&self, instant: DateTime<Utc>) -> Result<(), SessionError> {
        self.propose_date_end(to_plant_day(instant, self.config.plant_offset))
    }

    // ==========================================
    // 保存
    // ==========================================

    pub async fn save(&self) -> Result<SaveOutcome, SessionError> {
        Ok(self.coordinator.save(&self.credentials, &self.draft).await?)
    }

    /// 保存；成功时等待 success_delay 后以工单ID调用完成回调
    ///
    /// 失败时不调用回调，直接返回结果
    pub async fn save_and_continue<F>(&self, continuation: F) -> Result<SaveOutcome, SessionError>
    where
        F: FnOnce(&str) + Send,
    {
        let outcome = self.save().await?;

        if let SaveOutcome::Succeeded { work_order_id, .. } = &outcome {
            tokio::time::sleep(self.config.success_delay).await;
            tracing::debug!(work_order_id = %work_order_id, "执行保存完成回调");
            continuation(work_order_id);
        }

        Ok(outcome)
    }

    // ==========================================
    // 快照
    // ==========================================

    pub fn work_order(&self) -> WorkOrder {
        self.draft.work_order_snapshot()
    }

    pub fn details(&self) -> Vec<WorkOrderDetail> {
        self.draft.details_snapshot()
    }

    pub fn save_state(&self) -> SaveState {
        self.coordinator.state()
    }

    pub fn is_saving(&self) -> bool {
        self.coordinator.is_saving()
    }

    pub fn catalog(&self) -> &ScheduleCatalog {
        &self.catalog
    }

    pub fn schedule_items(&self) -> Vec<ScheduleItem> {
        self.catalog.items()
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// 结束会话，交出明细草稿
    pub fn into_details(self) -> Vec<WorkOrderDetail> {
        self.draft.into_details()
    }
}
