// ==========================================
// 制造运营管理系统 - 工单领域模型
// ==========================================
// 职责: WorkOrder（父记录）与 WorkOrderDetail（明细行）
// 约束: date_start <= date_end 对外始终成立，违规修改被拒绝而非应用
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::types::WorkOrderStatus;

// ==========================================
// DateRangeError - 日期范围违规
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateRangeError {
    #[error("开始日期不能晚于结束日期: proposed_start={proposed}, current_end={current_end}")]
    StartAfterEnd {
        proposed: NaiveDate,
        current_end: NaiveDate,
    },

    #[error("结束日期不能早于开始日期: proposed_end={proposed}, current_start={current_start}")]
    EndBeforeStart {
        proposed: NaiveDate,
        current_start: NaiveDate,
    },

    #[error("日期范围无效: start={start}, end={end}")]
    Inverted { start: NaiveDate, end: NaiveDate },
}

// ==========================================
// WorkOrder - 工单
// ==========================================
// 生命周期: 草稿（无ID）→ 一阶段创建成功后获得 work_order_id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    #[serde(rename = "workOrderID", default, skip_serializing_if = "Option::is_none")]
    pub work_order_id: Option<String>,

    #[serde(rename = "productManagerID")]
    product_manager_id: String,

    date_start: NaiveDate,
    date_end: NaiveDate,

    #[serde(rename = "workOrderStatus", default)]
    pub status: WorkOrderStatus,

    /// 客户端幂等键（重复提交同一草稿时服务端返回同一工单）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ref: Option<String>,

    /// 服务端落库时间
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
}

impl WorkOrder {
    /// 创建工单草稿：开始/结束日期均为当天，状态 pending
    pub fn new_draft(product_manager_id: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            work_order_id: None,
            product_manager_id: product_manager_id.into(),
            date_start: today,
            date_end: today,
            status: WorkOrderStatus::Pending,
            client_ref: Some(uuid::Uuid::new_v4().to_string()),
            created_at: None,
        }
    }

    /// 由完整字段构造（用于仓储映射与服务端校验）
    pub fn from_parts(
        product_manager_id: impl Into<String>,
        date_start: NaiveDate,
        date_end: NaiveDate,
        status: WorkOrderStatus,
    ) -> Result<Self, DateRangeError> {
        if date_start > date_end {
            return Err(DateRangeError::Inverted {
                start: date_start,
                end: date_end,
            });
        }

        Ok(Self {
            work_order_id: None,
            product_manager_id: product_manager_id.into(),
            date_start,
            date_end,
            status,
            client_ref: None,
            created_at: None,
        })
    }

    pub fn product_manager_id(&self) -> &str {
        &self.product_manager_id
    }

    pub fn date_start(&self) -> NaiveDate {
        self.date_start
    }

    pub fn date_end(&self) -> NaiveDate {
        self.date_end
    }

    /// 反序列化得到的载荷可能绕过构造校验，服务端需再次确认
    pub fn check_date_range(&self) -> Result<(), DateRangeError> {
        if self.date_start > self.date_end {
            return Err(DateRangeError::Inverted {
                start: self.date_start,
                end: self.date_end,
            });
        }
        Ok(())
    }

    /// 设置开始日期（必须 <= 当前结束日期）
    pub fn try_set_date_start(&mut self, proposed: NaiveDate) -> Result<(), DateRangeError> {
        if proposed > self.date_end {
            return Err(DateRangeError::StartAfterEnd {
                proposed,
                current_end: self.date_end,
            });
        }
        self.date_start = proposed;
        Ok(())
    }

    /// 设置结束日期（必须 >= 当前开始日期）
    pub fn try_set_date_end(&mut self, proposed: NaiveDate) -> Result<(), DateRangeError> {
        if proposed < self.date_start {
            return Err(DateRangeError::EndBeforeStart {
                proposed,
                current_start: self.date_start,
            });
        }
        self.date_end = proposed;
        Ok(())
    }

    pub fn is_persisted(&self) -> bool {
        self.work_order_id.is_some()
    }

    pub fn mark_persisted(&mut self, work_order_id: impl Into<String>) {
        self.work_order_id = Some(work_order_id.into());
    }
}

// ==========================================
// DetailKey - 明细行稳定标识
// ==========================================
// 仅在客户端草稿中有意义，不参与序列化
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct DetailKey(pub u64);

impl fmt::Display for DetailKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D{}", self.0)
    }
}

// ==========================================
// WorkOrderDetail - 工单明细
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderDetail {
    #[serde(skip)]
    pub key: DetailKey,

    #[serde(rename = "workOrderDetailID", default, skip_serializing_if = "Option::is_none")]
    pub work_order_detail_id: Option<String>,

    #[serde(default)]
    pub work_order_id: Option<String>,              // 父工单ID（草稿期为空）
    #[serde(default)]
    pub master_production_schedule_id: Option<String>, // 主生产计划引用（未关联时为空）

    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub projected_production: i64,   // 计划产量
    #[serde(default)]
    pub actual_production: i64,      // 实际产量
    #[serde(default)]
    pub faulty_products: i64,        // 次品数
    #[serde(default)]
    pub actual_production_price: f64, // 实际产值
    #[serde(default)]
    pub faulty_product_price: f64,    // 次品损失
}

impl WorkOrderDetail {
    /// 新建空白明细草稿
    pub fn draft(key: DetailKey) -> Self {
        Self {
            key,
            work_order_detail_id: None,
            work_order_id: None,
            master_production_schedule_id: None,
            note: String::new(),
            projected_production: 0,
            actual_production: 0,
            faulty_products: 0,
            actual_production_price: 0.0,
            faulty_product_price: 0.0,
        }
    }

    /// 是否已关联主生产计划
    pub fn has_schedule_reference(&self) -> bool {
        self.master_production_schedule_id.is_some()
    }

    /// 盖上父工单ID
    pub fn stamp(&mut self, work_order_id: &str) {
        self.work_order_id = Some(work_order_id.to_string());
    }
}
