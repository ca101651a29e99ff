// ==========================================
// 制造运营管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含流程编排逻辑
// ==========================================

pub mod credentials;
pub mod schedule;
pub mod types;
pub mod work_order;

// 重导出核心类型
pub use credentials::Credentials;
pub use schedule::ScheduleItem;
pub use types::{DetailField, NotificationKind, WorkOrderStatus};
pub use work_order::{DateRangeError, DetailKey, WorkOrder, WorkOrderDetail};
