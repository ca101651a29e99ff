// ==========================================
// 制造运营管理系统 - 引擎层
// ==========================================
// 职责: 新建工单工作流（目录 / 明细编辑 / 日期校验 / 两阶段保存）
// 红线: Engine 不拼 SQL，只经由 WorkOrderRemote 访问存储
// ==========================================

pub mod date_range;
pub mod detail_editor;
pub mod draft;
pub mod error;
pub mod notification;
pub mod reconciliation;
pub mod save_coordinator;
pub mod schedule_catalog;
pub mod session;

// 重导出核心组件
pub use date_range::{to_plant_day, DateRangeValidator};
pub use detail_editor::DetailListEditor;
pub use draft::WorkOrderDraft;
pub use error::{
    EditorError, FailureReason, SaveOutcome, SavePhase, SaveRejected, SaveState, SessionError,
};
pub use notification::{
    LoadingGate, NoOpLoadingGate, NoOpNotificationSink, Notification, NotificationSink,
    SharedLoadingGate, TracingNotificationSink,
};
pub use reconciliation::{ReconciliationJob, ReconciliationReport};
pub use save_coordinator::{SaveConfig, SaveTransactionCoordinator};
pub use schedule_catalog::ScheduleCatalog;
pub use session::{CreateWorkOrderSession, SessionConfig};
