// ==========================================
// 制造运营管理系统 - 工单命令行入口
// ==========================================
// 用法:
//   mes-work-order [--http] [--reconcile] [--reconcile-every <秒>]
// 环境变量:
//   MES_WORK_ORDER_DB_PATH  数据库路径
//   MES_TOKEN / MES_USER_ID 调用凭据
//   MES_LOCALE              通知语言（zh-CN / en）
// ==========================================
// 无界面运行：通知写日志，加载门控为空操作
// ==========================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use mes_work_order::app::{get_default_db_path, AppState};
use mes_work_order::engine::{NoOpLoadingGate, TracingNotificationSink};
use mes_work_order::{i18n, logging};
use mes_work_order::remote::WorkOrderRemote;
use mes_work_order::Credentials;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    i18n::init_from_env();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", mes_work_order::APP_NAME, mes_work_order::VERSION);
    tracing::info!("==================================================");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let use_http = args.iter().any(|a| a == "--http");
    let reconcile = args.iter().any(|a| a == "--reconcile");
    let reconcile_every = match args.iter().position(|a| a == "--reconcile-every") {
        Some(idx) => {
            let secs: u64 = args
                .get(idx + 1)
                .context("--reconcile-every 需要间隔秒数")?
                .parse()
                .context("--reconcile-every 间隔秒数无效")?;
            anyhow::ensure!(secs > 0, "--reconcile-every 间隔必须大于 0");
            Some(Duration::from_secs(secs))
        }
        None => None,
    };

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path)
        .map_err(anyhow::Error::msg)
        .context("无法初始化AppState")?;

    let credentials = Credentials::new(
        std::env::var("MES_TOKEN").unwrap_or_else(|_| "local-dev-token".to_string()),
        std::env::var("MES_USER_ID").unwrap_or_else(|_| "PM-LOCAL".to_string()),
    );

    let remote: Arc<dyn WorkOrderRemote> = if use_http {
        let remote = state.http_remote();
        tracing::info!(base_url = %remote.base_url(), "使用 HTTP 远程存储");
        Arc::new(remote)
    } else {
        state.local_remote.clone()
    };

    let session = state.new_session_with_remote(
        credentials,
        remote,
        Arc::new(TracingNotificationSink),
        Arc::new(NoOpLoadingGate),
    );

    match session.activate().await {
        Ok(count) => {
            println!("主生产计划目录: {} 条", count);
            for item in session.schedule_items() {
                println!(
                    "  {:<12} {:<24} {:>10} {:>10} {:>8}",
                    item.mps_id,
                    item.product_name,
                    item.date_start.map(|d| d.to_string()).unwrap_or_default(),
                    item.date_end.map(|d| d.to_string()).unwrap_or_default(),
                    item.quantity
                );
            }
        }
        Err(e) => println!("目录加载失败: {}", e),
    }

    let work_order = session.work_order();
    println!(
        "新建工单草稿: 生产经理={} 日期={}~{} 状态={}",
        work_order.product_manager_id(),
        work_order.date_start(),
        work_order.date_end(),
        work_order.status
    );

    if reconcile {
        let report = state
            .reconciliation_job()
            .run_once(chrono::Local::now().naive_local())
            .context("孤儿工单对账失败")?;
        println!(
            "孤儿工单对账: 截止 {}，发现 {}，删除 {}",
            report.cutoff, report.orphans_found, report.deleted
        );
    }

    if let Some(interval) = reconcile_every {
        tracing::info!(interval_secs = interval.as_secs(), "启动循环对账，Ctrl-C 退出");
        let job = Arc::new(state.reconciliation_job());
        tokio::select! {
            _ = job.clone().run_periodically(interval) => {}
            signal = tokio::signal::ctrl_c() => {
                signal.context("无法监听退出信号")?;
                tracing::info!(runs = job.periodic_runs(), "循环对账已停止");
            }
        }
    }

    Ok(())
}
