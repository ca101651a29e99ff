// ==========================================
// 制造运营管理系统 - 导入层
// ==========================================
// 职责: 主生产计划目录的外部数据导入（CSV）
// ==========================================

pub mod error;
pub mod schedule_csv;

pub use error::{ImportError, ImportResult};
pub use schedule_csv::{ImportSummary, ScheduleCsvImporter};
