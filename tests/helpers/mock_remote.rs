// ==========================================
// 脚本化远程存储 - 用于集成测试
// ==========================================
// 每个操作一条应答队列；未编排的调用返回失败信封
// 可选阶段1闸门：进入 create_work_order 后等待放行
// ==========================================
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mes_work_order::domain::{Credentials, ScheduleItem, WorkOrder, WorkOrderDetail};
use mes_work_order::engine::{LoadingGate, Notification, NotificationSink};
use mes_work_order::remote::{RemoteError, RemoteResponse, RemoteResult, WorkOrderRemote};
use mes_work_order::NotificationKind;
use tokio::sync::Notify;

/// 单次应答
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Ok(T),
    /// 无 result 且无说明
    Empty,
    /// 无 result，带说明
    Failed(String),
    /// 传输层错误
    Transport(String),
}

struct Step<T> {
    reply: Reply<T>,
    delay: Duration,
}

/// 调用记录
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateWorkOrder(WorkOrder),
    CreateDetails(Vec<WorkOrderDetail>),
    FetchCatalog,
}

/// 阶段1闸门
#[derive(Clone, Default)]
pub struct Phase1Gate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

#[derive(Default)]
pub struct ScriptedRemote {
    work_orders: Mutex<VecDeque<Step<String>>>,
    details: Mutex<VecDeque<Step<serde_json::Value>>>,
    catalogs: Mutex<VecDeque<Step<Vec<ScheduleItem>>>>,
    calls: Mutex<Vec<Call>>,
    detail_parents: Mutex<Vec<String>>,
    phase1_gate: Option<Phase1Gate>,
}

impl ScriptedRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建带阶段1闸门的远程存储
    pub fn gated() -> (Self, Phase1Gate) {
        let gate = Phase1Gate::default();
        let remote = Self {
            phase1_gate: Some(gate.clone()),
            ..Self::default()
        };
        (remote, gate)
    }

    pub fn push_work_order(&self, reply: Reply<String>) {
        self.push_work_order_after(reply, Duration::ZERO);
    }

    pub fn push_work_order_after(&self, reply: Reply<String>, delay: Duration) {
        self.work_orders.lock().unwrap().push_back(Step { reply, delay });
    }

    pub fn push_details(&self, reply: Reply<serde_json::Value>) {
        self.push_details_after(reply, Duration::ZERO);
    }

    pub fn push_details_after(&self, reply: Reply<serde_json::Value>, delay: Duration) {
        self.details.lock().unwrap().push_back(Step { reply, delay });
    }

    pub fn push_catalog(&self, reply: Reply<Vec<ScheduleItem>>) {
        self.push_catalog_after(reply, Duration::ZERO);
    }

    pub fn push_catalog_after(&self, reply: Reply<Vec<ScheduleItem>>, delay: Duration) {
        self.catalogs.lock().unwrap().push_back(Step { reply, delay });
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn work_order_calls(&self) -> Vec<WorkOrder> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::CreateWorkOrder(w) => Some(w),
                _ => None,
            })
            .collect()
    }

    pub fn detail_calls(&self) -> Vec<Vec<WorkOrderDetail>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::CreateDetails(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    /// 每次明细调用携带的父工单ID
    pub fn detail_parent_ids(&self) -> Vec<String> {
        self.detail_parents.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

async fn play<T>(step: Option<Step<T>>, operation: &str) -> RemoteResult<T> {
    let Some(step) = step else {
        return Ok(RemoteResponse::failed(format!("unscripted call: {}", operation)));
    };
    if !step.delay.is_zero() {
        tokio::time::sleep(step.delay).await;
    }
    match step.reply {
        Reply::Ok(value) => Ok(RemoteResponse::ok(value)),
        Reply::Empty => Ok(RemoteResponse::empty()),
        Reply::Failed(message) => Ok(RemoteResponse::failed(message)),
        Reply::Transport(message) => Err(RemoteError::Transport(message)),
    }
}

#[async_trait]
impl WorkOrderRemote for ScriptedRemote {
    async fn create_work_order(
        &self,
        _credentials: &Credentials,
        work_order: &WorkOrder,
    ) -> RemoteResult<String> {
        self.record(Call::CreateWorkOrder(work_order.clone()));
        if let Some(gate) = &self.phase1_gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        let step = self.work_orders.lock().unwrap().pop_front();
        play(step, "create_work_order").await
    }

    async fn create_work_order_details(
        &self,
        _credentials: &Credentials,
        work_order_id: &str,
        details: &[WorkOrderDetail],
    ) -> RemoteResult<serde_json::Value> {
        self.detail_parents.lock().unwrap().push(work_order_id.to_string());
        self.record(Call::CreateDetails(details.to_vec()));
        let step = self.details.lock().unwrap().pop_front();
        play(step, "create_work_order_details").await
    }

    async fn fetch_schedule_catalog(
        &self,
        _credentials: &Credentials,
    ) -> RemoteResult<Vec<ScheduleItem>> {
        self.record(Call::FetchCatalog);
        let step = self.catalogs.lock().unwrap().pop_front();
        play(step, "fetch_schedule_catalog").await
    }
}

// ==========================================
// Recorder - 记录通知与忙碌状态（按发生顺序）
// ==========================================

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Busy(bool),
    Notify(Notification),
}

#[derive(Debug, Default)]
pub struct Recorder {
    events: Mutex<Vec<UiEvent>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn busy_transitions(&self) -> Vec<bool> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Busy(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Notify(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    pub fn count_of(&self, kind: NotificationKind) -> usize {
        self.notifications()
            .iter()
            .filter(|n| n.kind == kind)
            .count()
    }
}

impl NotificationSink for Recorder {
    fn show(&self, notification: Notification) {
        self.events.lock().unwrap().push(UiEvent::Notify(notification));
    }
}

impl LoadingGate for Recorder {
    fn set_busy(&self, busy: bool) {
        self.events.lock().unwrap().push(UiEvent::Busy(busy));
    }
}
