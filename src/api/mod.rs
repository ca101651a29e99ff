// ==========================================
// 制造运营管理系统 - API 层
// ==========================================
// 职责: 工单存储端接口，组合仓储并做参数/权限校验
// ==========================================

pub mod error;
pub mod work_order_api;

pub use error::{ApiError, ApiResult};
pub use work_order_api::WorkOrderApi;
