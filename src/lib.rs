// ==========================================
// 制造运营管理系统 - 工单核心库
// ==========================================
// 范围: 新建工单工作流（工单 + 明细 + 主生产计划目录）
// 技术栈: Rust + SQLite + tokio
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 工单工作流
pub mod engine;

// 远程存储适配层
pub mod remote;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 存储端接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    Credentials, DateRangeError, DetailField, DetailKey, NotificationKind, ScheduleItem,
    WorkOrder, WorkOrderDetail, WorkOrderStatus,
};

// 引擎
pub use engine::{
    CreateWorkOrderSession, DateRangeValidator, DetailListEditor, LoadingGate, Notification,
    NotificationSink, SaveOutcome, SaveState, SaveTransactionCoordinator, ScheduleCatalog,
};

// 远程存储
pub use remote::{HttpRemote, LocalRemote, RemoteResponse, WorkOrderRemote};

// API
pub use api::WorkOrderApi;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "制造运营管理系统 - 工单";
