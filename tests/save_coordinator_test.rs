// ==========================================
// 两阶段保存协调器集成测试
// ==========================================
// 覆盖: 调用顺序与盖章 / 阶段1失败不发阶段2 / 阶段2失败留孤儿
//       超时 / 重入拒绝 / 已保存拒绝 / 幂等键
// ==========================================


#[path = "helpers/mock_remote.rs"]
mod mock_remote;

#[cfg(test)]
mod save_coordinator_test {
    use crate::mock_remote::{Call, Recorder, Reply, ScriptedRemote, UiEvent};
    use crate::test_helpers::{credentials, d};
    use mes_work_order::domain::{DetailField, NotificationKind, WorkOrder};
    use mes_work_order::engine::{
        FailureReason, SaveConfig, SaveOutcome, SaveRejected, SaveState,
        SaveTransactionCoordinator, WorkOrderDraft,
    };
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn draft_with_rows(rows: usize) -> WorkOrderDraft {
        let draft = WorkOrderDraft::new(WorkOrder::new_draft("PM001", d(2024, 1, 10)));
        {
            let mut editor = draft.editor();
            for i in 0..rows {
                editor.add_draft();
                editor
                    .assign_schedule_reference(&format!("MPS-{}", i))
                    .unwrap();
                editor
                    .edit_field(i, DetailField::ProjectedProduction, &(100 * (i + 1)).to_string())
                    .unwrap();
            }
        }
        draft
    }

    fn coordinator(
        remote: &Arc<ScriptedRemote>,
        recorder: &Arc<Recorder>,
        config: SaveConfig,
    ) -> SaveTransactionCoordinator {
        SaveTransactionCoordinator::new(remote.clone(), recorder.clone(), recorder.clone(), config)
    }

    // ==========================================
    // 成功路径
    // ==========================================

    #[tokio::test]
    async fn test_success_issues_one_parent_call_then_one_bulk_call() {
        let remote = Arc::new(ScriptedRemote::new());
        remote.push_work_order(Reply::Ok("WO-1".to_string()));
        remote.push_details(Reply::Ok(json!({ "created": 3 })));
        let recorder = Arc::new(Recorder::new());
        let coordinator = coordinator(&remote, &recorder, SaveConfig::default());
        let draft = draft_with_rows(3);

        let outcome = coordinator.save(&credentials(), &draft).await.unwrap();

        // 调用顺序: 父工单 → 明细批量（仅一次）
        let calls = remote.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[0], Call::CreateWorkOrder(_)));
        let sent = match &calls[1] {
            Call::CreateDetails(rows) => rows.clone(),
            other => panic!("unexpected call: {:?}", other),
        };
        assert_eq!(sent.len(), 3);
        assert_eq!(remote.detail_parent_ids(), vec!["WO-1".to_string()]);
        for (i, row) in sent.iter().enumerate() {
            assert_eq!(row.work_order_id.as_deref(), Some("WO-1"));
            assert_eq!(row.master_production_schedule_id, Some(format!("MPS-{}", i)));
            assert_eq!(row.projected_production, 100 * (i as i64 + 1));
        }

        match &outcome {
            SaveOutcome::Succeeded {
                work_order_id,
                details,
            } => {
                assert_eq!(work_order_id, "WO-1");
                assert_eq!(details, &sent);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(
            coordinator.state(),
            SaveState::Succeeded {
                work_order_id: "WO-1".to_string(),
                detail_count: 3
            }
        );
        assert_eq!(
            draft.work_order_snapshot().work_order_id.as_deref(),
            Some("WO-1")
        );
        assert!(!coordinator.is_saving());
    }

    #[tokio::test]
    async fn test_busy_cleared_before_success_notification() {
        let remote = Arc::new(ScriptedRemote::new());
        remote.push_work_order(Reply::Ok("WO-2".to_string()));
        remote.push_details(Reply::Ok(json!(true)));
        let recorder = Arc::new(Recorder::new());
        let coordinator = coordinator(&remote, &recorder, SaveConfig::default());

        coordinator.save(&credentials(), &draft_with_rows(1)).await.unwrap();

        let events = recorder.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], UiEvent::Busy(true));
        assert_eq!(events[1], UiEvent::Busy(false));
        match &events[2] {
            UiEvent::Notify(n) => {
                assert_eq!(n.kind, NotificationKind::Success);
                assert!(n.description.contains("WO-2"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_rows_still_sends_empty_bulk_call() {
        let remote = Arc::new(ScriptedRemote::new());
        remote.push_work_order(Reply::Ok("WO-0".to_string()));
        remote.push_details(Reply::Ok(json!({ "created": 0 })));
        let recorder = Arc::new(Recorder::new());
        let coordinator = coordinator(&remote, &recorder, SaveConfig::default());

        let outcome = coordinator.save(&credentials(), &draft_with_rows(0)).await.unwrap();

        assert!(outcome.is_success());
        assert_eq!(remote.detail_calls(), vec![Vec::new()]);
        // 空批量同样携带父工单ID，存储端据此登记明细已提交
        assert_eq!(remote.detail_parent_ids(), vec!["WO-0".to_string()]);
    }

    // ==========================================
    // 阶段1失败
    // ==========================================

    #[tokio::test]
    async fn test_phase1_empty_result_never_issues_bulk_call() {
        let remote = Arc::new(ScriptedRemote::new());
        remote.push_work_order(Reply::Empty);
        let recorder = Arc::new(Recorder::new());
        let coordinator = coordinator(&remote, &recorder, SaveConfig::default());
        let draft = draft_with_rows(2);

        let outcome = coordinator.save(&credentials(), &draft).await.unwrap();

        assert_eq!(
            outcome,
            SaveOutcome::FailedPhase1 {
                reason: FailureReason::EmptyResult { message: None }
            }
        );
        assert!(remote.detail_calls().is_empty());
        assert_eq!(remote.calls().len(), 1);
        assert_eq!(recorder.busy_transitions(), vec![true, false]);
        assert_eq!(recorder.count_of(NotificationKind::Danger), 1);
        assert_eq!(recorder.count_of(NotificationKind::Success), 0);

        // 草稿不变: 未盖章、无工单ID
        assert!(draft.work_order_snapshot().work_order_id.is_none());
        assert!(draft
            .details_snapshot()
            .iter()
            .all(|row| row.work_order_id.is_none()));
        assert!(matches!(coordinator.state(), SaveState::FailedPhase1 { .. }));
    }

    #[tokio::test]
    async fn test_phase1_blank_id_counts_as_empty_result() {
        let remote = Arc::new(ScriptedRemote::new());
        remote.push_work_order(Reply::Ok("  ".to_string()));
        let recorder = Arc::new(Recorder::new());
        let coordinator = coordinator(&remote, &recorder, SaveConfig::default());

        let outcome = coordinator.save(&credentials(), &draft_with_rows(1)).await.unwrap();

        match outcome {
            SaveOutcome::FailedPhase1 {
                reason: FailureReason::EmptyResult { message },
            } => assert!(message.is_some()),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(remote.detail_calls().is_empty());
    }

    #[tokio::test]
    async fn test_phase1_failed_message_is_kept() {
        let remote = Arc::new(ScriptedRemote::new());
        remote.push_work_order(Reply::Failed("[UNAUTHORIZED] 凭据为空".to_string()));
        let recorder = Arc::new(Recorder::new());
        let coordinator = coordinator(&remote, &recorder, SaveConfig::default());

        let outcome = coordinator.save(&credentials(), &draft_with_rows(1)).await.unwrap();

        assert_eq!(
            outcome,
            SaveOutcome::FailedPhase1 {
                reason: FailureReason::EmptyResult {
                    message: Some("[UNAUTHORIZED] 凭据为空".to_string())
                }
            }
        );
    }

    #[tokio::test]
    async fn test_phase1_transport_error() {
        let remote = Arc::new(ScriptedRemote::new());
        remote.push_work_order(Reply::Transport("connection refused".to_string()));
        let recorder = Arc::new(Recorder::new());
        let coordinator = coordinator(&remote, &recorder, SaveConfig::default());

        let outcome = coordinator.save(&credentials(), &draft_with_rows(1)).await.unwrap();

        match outcome {
            SaveOutcome::FailedPhase1 {
                reason: FailureReason::Transport(text),
            } => assert!(text.contains("connection refused")),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(remote.detail_calls().is_empty());
        assert_eq!(recorder.busy_transitions(), vec![true, false]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_phase1_timeout() {
        let remote = Arc::new(ScriptedRemote::new());
        remote.push_work_order_after(Reply::Ok("WO-LATE".to_string()), Duration::from_secs(60));
        let recorder = Arc::new(Recorder::new());
        let config = SaveConfig {
            remote_timeout: Duration::from_secs(15),
            ..SaveConfig::default()
        };
        let coordinator = coordinator(&remote, &recorder, config);

        let outcome = coordinator.save(&credentials(), &draft_with_rows(1)).await.unwrap();

        assert_eq!(
            outcome,
            SaveOutcome::FailedPhase1 {
                reason: FailureReason::Timeout { timeout_ms: 15_000 }
            }
        );
        assert!(remote.detail_calls().is_empty());
        assert!(!coordinator.is_saving());
        assert_eq!(recorder.busy_transitions(), vec![true, false]);
    }

    // ==========================================
    // 阶段2失败
    // ==========================================

    #[tokio::test]
    async fn test_phase2_failure_leaves_parent_persisted() {
        let remote = Arc::new(ScriptedRemote::new());
        remote.push_work_order(Reply::Ok("WO-9".to_string()));
        remote.push_details(Reply::Failed("detail insert failed".to_string()));
        let recorder = Arc::new(Recorder::new());
        let coordinator = coordinator(&remote, &recorder, SaveConfig::default());
        let draft = draft_with_rows(2);

        let outcome = coordinator.save(&credentials(), &draft).await.unwrap();

        assert_eq!(outcome.work_order_id(), Some("WO-9"));
        match &outcome {
            SaveOutcome::FailedPhase2 { details, reason, .. } => {
                assert_eq!(details.len(), 2);
                assert_eq!(
                    reason,
                    &FailureReason::EmptyResult {
                        message: Some("detail insert failed".to_string())
                    }
                );
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(matches!(
            coordinator.state(),
            SaveState::FailedPhase2 { ref work_order_id, .. } if work_order_id == "WO-9"
        ));
        assert_eq!(
            draft.work_order_snapshot().work_order_id.as_deref(),
            Some("WO-9")
        );
        assert_eq!(recorder.count_of(NotificationKind::Danger), 1);
        let danger = &recorder.notifications()[0];
        assert!(danger.description.contains("WO-9"));
    }

    #[tokio::test]
    async fn test_retry_after_phase2_failure_reuses_client_ref() {
        let remote = Arc::new(ScriptedRemote::new());
        remote.push_work_order(Reply::Ok("WO-9".to_string()));
        remote.push_details(Reply::Transport("reset by peer".to_string()));
        remote.push_work_order(Reply::Ok("WO-9".to_string()));
        remote.push_details(Reply::Ok(json!({ "created": 1 })));
        let recorder = Arc::new(Recorder::new());
        let coordinator = coordinator(&remote, &recorder, SaveConfig::default());
        let draft = draft_with_rows(1);

        let first = coordinator.save(&credentials(), &draft).await.unwrap();
        assert!(matches!(first, SaveOutcome::FailedPhase2 { .. }));

        let second = coordinator.save(&credentials(), &draft).await.unwrap();
        assert!(second.is_success());

        let parents = remote.work_order_calls();
        assert_eq!(parents.len(), 2);
        assert!(parents[0].client_ref.is_some());
        assert_eq!(parents[0].client_ref, parents[1].client_ref);
    }

    #[tokio::test]
    async fn test_client_ref_stripped_when_not_idempotent() {
        let remote = Arc::new(ScriptedRemote::new());
        remote.push_work_order(Reply::Ok("WO-3".to_string()));
        remote.push_details(Reply::Ok(json!(1)));
        let recorder = Arc::new(Recorder::new());
        let config = SaveConfig {
            idempotent_create: false,
            ..SaveConfig::default()
        };
        let coordinator = coordinator(&remote, &recorder, config);

        coordinator.save(&credentials(), &draft_with_rows(1)).await.unwrap();

        assert!(remote.work_order_calls()[0].client_ref.is_none());
    }

    // ==========================================
    // 重入与已保存
    // ==========================================

    #[tokio::test]
    async fn test_second_save_while_in_flight_is_rejected() {
        let (remote, gate) = ScriptedRemote::gated();
        let remote = Arc::new(remote);
        remote.push_work_order(Reply::Ok("WO-7".to_string()));
        remote.push_details(Reply::Ok(json!({ "created": 1 })));
        let recorder = Arc::new(Recorder::new());
        let coordinator = Arc::new(coordinator(&remote, &recorder, SaveConfig::default()));
        let draft = Arc::new(draft_with_rows(1));

        let first = {
            let coordinator = coordinator.clone();
            let draft = draft.clone();
            tokio::spawn(async move { coordinator.save(&credentials(), &draft).await })
        };

        gate.entered.notified().await;
        assert!(coordinator.is_saving());
        assert!(matches!(coordinator.state(), SaveState::Saving { .. }));

        let second = coordinator.save(&credentials(), &draft).await;
        assert_eq!(second, Err(SaveRejected::InProgress));
        assert_eq!(remote.work_order_calls().len(), 1);

        gate.release.notify_one();
        let outcome = first.await.unwrap().unwrap();
        assert!(outcome.is_success());
        assert_eq!(remote.calls().len(), 2);
        assert_eq!(recorder.busy_transitions(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_save_after_success_is_rejected() {
        let remote = Arc::new(ScriptedRemote::new());
        remote.push_work_order(Reply::Ok("WO-5".to_string()));
        remote.push_details(Reply::Ok(json!({ "created": 1 })));
        let recorder = Arc::new(Recorder::new());
        let coordinator = coordinator(&remote, &recorder, SaveConfig::default());
        let draft = draft_with_rows(1);

        coordinator.save(&credentials(), &draft).await.unwrap();
        let again = coordinator.save(&credentials(), &draft).await;

        assert_eq!(again, Err(SaveRejected::AlreadySaved));
        assert_eq!(remote.calls().len(), 2);
        assert!(!coordinator.is_saving());
        assert_eq!(recorder.busy_transitions(), vec![true, false]);
    }
}
