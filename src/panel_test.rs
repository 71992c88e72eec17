use super::*;

use crate::state::test_helpers::{dummy_record, dummy_template, seed_records, seed_templates, test_session};
use crate::state::ProcessingStatus;

const MIB: u64 = 1024 * 1024;

async fn seeded_panel() -> (SessionState, AdminPanel, Vec<Uuid>, Vec<Uuid>) {
    let state = test_session();
    let template_ids = seed_templates(
        &state,
        vec![
            dummy_template(LifecycleStatus::Online, MIB),
            dummy_template(LifecycleStatus::Offline, MIB),
        ],
    )
    .await;
    let record_ids = seed_records(
        &state,
        vec![
            dummy_record(ProcessingStatus::Completed, Some(PublishStatus::Online)),
            dummy_record(ProcessingStatus::Processing, Some(PublishStatus::Offline)),
            dummy_record(ProcessingStatus::Failed, None),
        ],
    )
    .await;
    let panel = AdminPanel::new(state.clone());
    (state, panel, template_ids, record_ids)
}

#[tokio::test]
async fn toggle_select_requires_manage_mode() {
    let (_state, mut panel, template_ids, _) = seeded_panel().await;

    panel.toggle_select(template_ids[0]);
    assert_eq!(panel.selected_count(), 0);

    panel.toggle_manage_mode();
    panel.toggle_select(template_ids[0]);
    assert_eq!(panel.selected_count(), 1);
}

#[tokio::test]
async fn switch_tab_ends_manage_session() {
    let (_state, mut panel, template_ids, _) = seeded_panel().await;

    panel.toggle_manage_mode();
    panel.toggle_select(template_ids[0]);
    panel.switch_tab(AdminTab::Generations);

    assert!(!panel.is_managing());
    panel.switch_tab(AdminTab::Templates);
    assert_eq!(panel.selected_count(), 0);
}

#[tokio::test]
async fn manage_toggle_clears_selection() {
    let (_state, mut panel, template_ids, _) = seeded_panel().await;

    panel.toggle_manage_mode();
    panel.toggle_select(template_ids[0]);
    panel.toggle_manage_mode(); // exit
    panel.toggle_manage_mode(); // re-enter
    assert_eq!(panel.selected_count(), 0);
}

#[tokio::test]
async fn select_all_generations_uses_filtered_list() {
    let (_state, mut panel, _, record_ids) = seeded_panel().await;

    panel.switch_tab(AdminTab::Generations);
    panel.toggle_manage_mode();
    panel.set_generation_filter(StatusFilter::Only(ProcessingStatus::Completed));
    panel.select_all().await;

    // Only the one completed record is visible, so only it is selected.
    assert_eq!(panel.selected_count(), 1);
    panel.toggle_select(record_ids[0]);
    assert_eq!(panel.selected_count(), 0);
}

#[tokio::test]
async fn select_all_twice_restores_empty() {
    let (_state, mut panel, _, _) = seeded_panel().await;

    panel.toggle_manage_mode();
    panel.select_all().await;
    assert_eq!(panel.selected_count(), 2);
    panel.select_all().await;
    assert_eq!(panel.selected_count(), 0);
}

#[tokio::test]
async fn refused_delete_keeps_selection() {
    let (_state, mut panel, _, _) = seeded_panel().await;

    panel.toggle_manage_mode();
    panel.select_all().await;

    // One online + one offline selected: delete is refused, selection stays.
    let result = panel.request_bulk(BulkAction::DeleteTemplates).await;
    assert!(matches!(result, Err(BulkError::ActionRefused)));
    assert_eq!(panel.selected_count(), 2);
    assert!(panel.is_managing());
    assert!(panel.pending_summary().is_none());
}

#[tokio::test]
async fn confirm_clears_selection_and_ends_manage() {
    let (state, mut panel, _, _) = seeded_panel().await;

    panel.toggle_manage_mode();
    panel.select_all().await;

    let outcome = panel
        .request_bulk(BulkAction::SetTemplateStatus(LifecycleStatus::Offline))
        .await
        .unwrap();
    assert!(matches!(outcome, RequestOutcome::AwaitingConfirmation { affected: 1, .. }));
    assert!(panel.pending_summary().is_some());

    let affected = panel.confirm_pending().await.unwrap();
    assert_eq!(affected, 1);
    assert_eq!(panel.selected_count(), 0);
    assert!(!panel.is_managing());

    let catalog = state.templates.read().await;
    assert!(catalog.iter().all(|t| t.status != LifecycleStatus::Online));
}

#[tokio::test]
async fn cancel_keeps_selection_and_state() {
    let (state, mut panel, _, _) = seeded_panel().await;

    panel.toggle_manage_mode();
    panel.select_all().await;
    panel
        .request_bulk(BulkAction::SetTemplateStatus(LifecycleStatus::Offline))
        .await
        .unwrap();
    panel.cancel_pending();

    assert_eq!(panel.selected_count(), 2);
    assert!(panel.pending_summary().is_none());
    let catalog = state.templates.read().await;
    assert!(catalog.iter().any(|t| t.status == LifecycleStatus::Online));
}

#[tokio::test]
async fn generation_flags_use_publish_status() {
    let (_state, mut panel, _, record_ids) = seeded_panel().await;

    panel.switch_tab(AdminTab::Generations);
    panel.toggle_manage_mode();
    panel.toggle_select(record_ids[0]); // published
    panel.toggle_select(record_ids[1]); // unpublished

    let flags = panel.selection_flags().await;
    assert_eq!(flags.count, 2);
    assert!(flags.has_online);
    assert!(flags.has_offline);
}

#[tokio::test]
async fn generation_delete_is_never_gated() {
    let (state, mut panel, _, _) = seeded_panel().await;

    panel.switch_tab(AdminTab::Generations);
    panel.toggle_manage_mode();
    panel.select_all().await;

    let outcome = panel.request_bulk(BulkAction::DeleteGenerations).await.unwrap();
    assert!(matches!(outcome, RequestOutcome::AwaitingConfirmation { affected: 3, .. }));
    panel.confirm_pending().await.unwrap();
    assert!(state.generations.read().await.is_empty());
}

#[tokio::test]
async fn upload_gate_publishes_blocking_notice_when_full() {
    let state = test_session();
    let templates: Vec<_> = (0..crate::services::ledger::MAX_TEMPLATE_COUNT)
        .map(|_| dummy_template(LifecycleStatus::Online, MIB))
        .collect();
    seed_templates(&state, templates).await;
    let (_key, mut rx) = state.notices.subscribe();

    let panel = AdminPanel::new(state.clone());
    assert!(panel.request_upload().await.is_err());

    let notice = rx.try_recv().unwrap();
    assert_eq!(notice.code.as_deref(), Some("E_QUOTA_COUNT"));
    assert!(notice.blocking);
}

#[tokio::test]
async fn admit_upload_inserts_and_errors_notify() {
    let state = test_session();
    let (_key, mut rx) = state.notices.subscribe();
    let panel = AdminPanel::new(state.clone());

    let upload = TemplateUpload {
        name: "New Year Fireworks".into(),
        size_bytes: 15 * MIB,
        tags: vec!["general".into()],
        duration: "10s".into(),
        resolution: "1080P".into(),
        thumbnail_url: "mock://thumb/new".into(),
        creator: None,
        supports_voice_sync: true,
        voice_sync_mode: Some(crate::state::VoiceSyncMode::Original),
        default_script: None,
    };
    let template = panel.admit_upload(upload.clone()).await.unwrap();
    assert_eq!(template.name, "New Year Fireworks");
    assert!(rx.try_recv().is_err());

    let mut oversized = upload;
    oversized.size_bytes = crate::services::ledger::MAX_UPLOAD_BYTES + 1;
    assert!(panel.admit_upload(oversized).await.is_err());
    assert_eq!(rx.try_recv().unwrap().code.as_deref(), Some("E_FILE_TOO_LARGE"));
}
