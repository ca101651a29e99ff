// ==========================================
// 制造运营管理系统 - 应用层
// ==========================================
// 职责: 组装存储、配置与远程适配器，供二进制入口使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
