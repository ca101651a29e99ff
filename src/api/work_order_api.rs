// ==========================================
// 制造运营管理系统 - 工单 API（存储端）
// ==========================================
// 职责: 远程存储的三个接口语义 + 孤儿工单对账
// - create_work_order: 创建父工单（支持 client_ref 幂等）
// - create_work_order_details: 单事务批量写入明细并标记父工单明细已提交
// - list_schedule_items: 主生产计划目录
// ==========================================

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::credentials::Credentials;
use crate::domain::schedule::ScheduleItem;
use crate::domain::types::WorkOrderStatus;
use crate::domain::work_order::{WorkOrder, WorkOrderDetail};
use crate::repository::{
    RepositoryError, ScheduleItemRepository, WorkOrderDetailRepository, WorkOrderRepository,
};

/// 工单API
pub struct WorkOrderApi {
    work_order_repo: Arc<WorkOrderRepository>,
    detail_repo: Arc<WorkOrderDetailRepository>,
    schedule_repo: Arc<ScheduleItemRepository>,
}

impl WorkOrderApi {
    /// 创建新的WorkOrderApi实例
    pub fn new(
        work_order_repo: Arc<WorkOrderRepository>,
        detail_repo: Arc<WorkOrderDetailRepository>,
        schedule_repo: Arc<ScheduleItemRepository>,
    ) -> Self {
        Self {
            work_order_repo,
            detail_repo,
            schedule_repo,
        }
    }

    fn authorize(credentials: &Credentials) -> ApiResult<()> {
        if credentials.is_blank() {
            return Err(ApiError::Unauthorized("缺少访问令牌".to_string()));
        }
        Ok(())
    }

    // ==========================================
    // 工单接口
    // ==========================================

    /// 创建工单（两阶段保存的第一阶段）
    ///
    /// # 返回
    /// - Ok(String): 工单ID
    /// - Err(ApiError): 校验失败或数据库错误
    ///
    /// # 幂等
    /// 载荷带 client_ref 且该键已落库时，直接返回已有工单ID，不新建记录
    pub fn create_work_order(
        &self,
        credentials: &Credentials,
        work_order: &WorkOrder,
    ) -> ApiResult<String> {
        Self::authorize(credentials)?;

        if work_order.product_manager_id().trim().is_empty() {
            return Err(ApiError::InvalidInput("生产经理ID不能为空".to_string()));
        }
        work_order.check_date_range()?;

        if let Some(client_ref) = work_order.client_ref.as_deref() {
            if let Some(existing) = self.work_order_repo.find_by_client_ref(client_ref)? {
                let existing_id = existing
                    .work_order_id
                    .ok_or_else(|| ApiError::InternalError("已有工单缺少ID".to_string()))?;
                tracing::info!(
                    work_order_id = %existing_id,
                    client_ref = %client_ref,
                    "重复提交，返回已有工单"
                );
                return Ok(existing_id);
            }
        }

        // 新建工单一律 pending，不信任客户端状态
        let mut record = work_order.clone();
        record.status = WorkOrderStatus::Pending;

        let work_order_id = uuid::Uuid::new_v4().to_string();
        let created_at = chrono::Local::now().naive_local();
        match self.work_order_repo.insert(&work_order_id, &record, created_at) {
            Ok(_) => {}
            // 并发重复提交：另一请求先写入了同一 client_ref
            Err(RepositoryError::DuplicateClientRef(msg)) => {
                let client_ref = record.client_ref.as_deref().unwrap_or_default();
                return self
                    .work_order_repo
                    .find_by_client_ref(client_ref)?
                    .and_then(|existing| existing.work_order_id)
                    .ok_or(ApiError::Conflict(msg));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            work_order_id = %work_order_id,
            product_manager_id = %record.product_manager_id(),
            date_start = %record.date_start(),
            date_end = %record.date_end(),
            "工单已创建"
        );

        Ok(work_order_id)
    }

    /// 批量创建工单明细（两阶段保存的第二阶段）
    ///
    /// # 校验
    /// - 父工单必须存在，且每行明细都已盖章为该工单
    /// - 主生产计划引用（若有）必须存在于目录中
    ///
    /// # 提交标记
    /// 与明细同一事务写入父工单的 details_committed_at；空批量同样标记。
    /// 对账任务只清理未标记的工单
    ///
    /// # 返回
    /// - Ok(usize): 写入行数
    pub fn create_work_order_details(
        &self,
        credentials: &Credentials,
        work_order_id: &str,
        details: &[WorkOrderDetail],
    ) -> ApiResult<usize> {
        Self::authorize(credentials)?;

        if work_order_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("父工单ID不能为空".to_string()));
        }
        if self.work_order_repo.find_by_id(work_order_id)?.is_none() {
            return Err(ApiError::NotFound(format!("工单{}不存在", work_order_id)));
        }

        let mut references = BTreeSet::new();
        for (idx, detail) in details.iter().enumerate() {
            match detail.work_order_id.as_deref() {
                Some(id) if id == work_order_id => {}
                Some(id) if !id.trim().is_empty() => {
                    return Err(ApiError::InvalidInput(format!(
                        "第{}行明细属于工单{}，与请求的工单{}不一致",
                        idx + 1,
                        id,
                        work_order_id
                    )))
                }
                _ => {
                    return Err(ApiError::InvalidInput(format!(
                        "第{}行明细缺少父工单ID",
                        idx + 1
                    )))
                }
            }
            if let Some(mps_id) = detail.master_production_schedule_id.as_deref() {
                references.insert(mps_id.to_string());
            }
        }

        for mps_id in &references {
            if self.schedule_repo.find_by_id(mps_id)?.is_none() {
                return Err(ApiError::NotFound(format!("主生产计划{}不存在", mps_id)));
            }
        }

        let committed_at = chrono::Local::now().naive_local();
        let ids = self
            .detail_repo
            .insert_batch(work_order_id, details, committed_at)?;

        tracing::info!(
            work_order_id = %work_order_id,
            count = ids.len(),
            "工单明细已批量写入"
        );

        Ok(ids.len())
    }

    /// 查询生产经理的工单列表
    pub fn list_work_orders_of_manager(
        &self,
        credentials: &Credentials,
        product_manager_id: &str,
    ) -> ApiResult<Vec<WorkOrder>> {
        Self::authorize(credentials)?;

        if product_manager_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("生产经理ID不能为空".to_string()));
        }

        Ok(self.work_order_repo.list_by_manager(product_manager_id)?)
    }

    /// 查询工单明细
    pub fn get_work_order_details(
        &self,
        credentials: &Credentials,
        work_order_id: &str,
    ) -> ApiResult<Vec<WorkOrderDetail>> {
        Self::authorize(credentials)?;

        if self.work_order_repo.find_by_id(work_order_id)?.is_none() {
            return Err(ApiError::NotFound(format!("工单{}不存在", work_order_id)));
        }

        Ok(self.detail_repo.find_by_work_order(work_order_id)?)
    }

    // ==========================================
    // 主生产计划接口
    // ==========================================

    /// 查询全部主生产计划
    pub fn list_schedule_items(&self, credentials: &Credentials) -> ApiResult<Vec<ScheduleItem>> {
        Self::authorize(credentials)?;
        Ok(self.schedule_repo.list_all()?)
    }

    /// 维护主生产计划目录（初始化/导入用）
    pub fn upsert_schedule_item(&self, item: &ScheduleItem) -> ApiResult<()> {
        Self::validate_schedule_item(item)?;
        Ok(self.schedule_repo.upsert(item)?)
    }

    /// 批量维护主生产计划目录
    ///
    /// 先校验全部条目再单事务写入；任一条目无效或写入失败则整批不落库
    pub fn upsert_schedule_items(&self, items: &[ScheduleItem]) -> ApiResult<usize> {
        for item in items {
            Self::validate_schedule_item(item)?;
        }

        let count = self.schedule_repo.upsert_batch(items)?;
        tracing::info!(count, "主生产计划目录批量写入完成");
        Ok(count)
    }

    fn validate_schedule_item(item: &ScheduleItem) -> ApiResult<()> {
        if item.mps_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("主生产计划ID不能为空".to_string()));
        }
        if let (Some(start), Some(end)) = (item.date_start, item.date_end) {
            if start > end {
                return Err(ApiError::InvalidInput(format!(
                    "主生产计划{}的日期窗口无效: {} > {}",
                    item.mps_id, start, end
                )));
            }
        }
        Ok(())
    }

    // ==========================================
    // 孤儿工单对账
    // ==========================================

    /// 查询创建时间早于 `created_before` 且明细从未提交的工单
    pub fn find_orphaned_work_orders(
        &self,
        created_before: NaiveDateTime,
    ) -> ApiResult<Vec<WorkOrder>> {
        Ok(self.work_order_repo.find_orphans(created_before)?)
    }

    /// 清理孤儿工单
    ///
    /// # 返回
    /// - Ok(usize): 删除数量
    pub fn cleanup_orphaned_work_orders(&self, created_before: NaiveDateTime) -> ApiResult<usize> {
        let deleted = self.work_order_repo.delete_orphans(created_before)?;
        if deleted > 0 {
            tracing::warn!(
                deleted,
                created_before = %created_before,
                "已清理明细未提交的孤儿工单"
            );
        }
        Ok(deleted)
    }
}
