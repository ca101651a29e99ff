// ==========================================
// 制造运营管理系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::WorkOrderApi;
use crate::config::{ConfigManager, WorkflowConfig};
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::credentials::Credentials;
use crate::engine::{
    CreateWorkOrderSession, LoadingGate, NotificationSink, ReconciliationJob,
};
use crate::remote::{HttpRemote, LocalRemote, WorkOrderRemote};
use crate::repository::{ScheduleItemRepository, WorkOrderDetailRepository, WorkOrderRepository};

/// 应用状态
///
/// 包含存储端API、配置和远程适配器
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 工单API（存储端）
    pub work_order_api: Arc<WorkOrderApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 启动时读取的工作流配置
    pub workflow_config: WorkflowConfig,

    /// 进程内远程适配器
    pub local_remote: Arc<LocalRemote>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        ensure_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let work_order_repo = Arc::new(WorkOrderRepository::new(conn.clone()));
        let detail_repo = Arc::new(WorkOrderDetailRepository::new(conn.clone()));
        let schedule_repo = Arc::new(ScheduleItemRepository::new(conn.clone()));

        // ==========================================
        // 配置
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let workflow_config = config_manager
            .load_workflow_config()
            .map_err(|e| format!("读取工作流配置失败: {}", e))?;

        // ==========================================
        // API 与远程适配器
        // ==========================================
        let work_order_api = Arc::new(WorkOrderApi::new(
            work_order_repo,
            detail_repo,
            schedule_repo,
        ));
        let local_remote = Arc::new(LocalRemote::new(work_order_api.clone()));

        tracing::info!(
            remote_timeout_ms = workflow_config.remote_timeout_ms,
            idempotent_create = workflow_config.idempotent_create,
            "AppState初始化完成"
        );

        Ok(Self {
            db_path,
            work_order_api,
            config_manager,
            workflow_config,
            local_remote,
        })
    }

    /// 基于进程内存储创建新建工单会话
    pub fn new_session(
        &self,
        credentials: Credentials,
        notifier: Arc<dyn NotificationSink>,
        loading: Arc<dyn LoadingGate>,
    ) -> CreateWorkOrderSession {
        self.new_session_with_remote(credentials, self.local_remote.clone(), notifier, loading)
    }

    /// 基于指定远程存储创建新建工单会话
    pub fn new_session_with_remote(
        &self,
        credentials: Credentials,
        remote: Arc<dyn WorkOrderRemote>,
        notifier: Arc<dyn NotificationSink>,
        loading: Arc<dyn LoadingGate>,
    ) -> CreateWorkOrderSession {
        CreateWorkOrderSession::starting_now(
            credentials,
            remote,
            notifier,
            loading,
            self.workflow_config.session_config(),
        )
    }

    /// 按配置的根地址创建 HTTP 远程适配器
    pub fn http_remote(&self) -> HttpRemote {
        HttpRemote::new(self.workflow_config.remote_base_url.clone())
    }

    /// 孤儿工单对账任务
    pub fn reconciliation_job(&self) -> ReconciliationJob {
        ReconciliationJob::new(self.work_order_api.clone(), self.workflow_config.orphan_grace())
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 MES_WORK_ORDER_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("MES_WORK_ORDER_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./mes_work_order.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("mes-work-order-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("mes-work-order");
        }

        // 确保目录存在
        std::fs::create_dir_all(&path).ok();
        path = path.join("mes_work_order.db");
    }

    path.to_string_lossy().to_string()
}
