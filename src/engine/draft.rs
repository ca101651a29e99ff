// ==========================================
// 制造运营管理系统 - 工单聚合草稿
// ==========================================
// WorkOrder + 明细编辑器，由会话持有，保存时由协调器读取/盖章
// 锁不跨 await 持有
// ==========================================

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::work_order::{WorkOrder, WorkOrderDetail};
use crate::engine::detail_editor::DetailListEditor;

#[derive(Debug)]
pub struct WorkOrderDraft {
    work_order: Mutex<WorkOrder>,
    editor: Mutex<DetailListEditor>,
}

impl WorkOrderDraft {
    pub fn new(work_order: WorkOrder) -> Self {
        Self {
            work_order: Mutex::new(work_order),
            editor: Mutex::new(DetailListEditor::new()),
        }
    }

    pub fn work_order(&self) -> MutexGuard<'_, WorkOrder> {
        self.work_order.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn editor(&self) -> MutexGuard<'_, DetailListEditor> {
        self.editor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn work_order_snapshot(&self) -> WorkOrder {
        self.work_order().clone()
    }

    pub fn details_snapshot(&self) -> Vec<WorkOrderDetail> {
        self.editor().rows().to_vec()
    }

    /// 交出明细草稿
    pub fn into_details(self) -> Vec<WorkOrderDetail> {
        self.editor
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .into_rows()
    }
}
