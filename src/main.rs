//! Demo driver — walks one session through the three role tiers.
//!
//! Seeds a catalog as the admin, exercises the bulk-management rules, runs a
//! consumer generation end to end, then flips a template as the platform
//! operator. Everything is narrated through tracing; run with
//! `RUST_LOG=info`.

use std::time::Duration;

use tokio::time::timeout;
use uuid::Uuid;

use swapstudio::naming::suggest_display_name;
use swapstudio::notice::NoticeKind;
use swapstudio::panel::{AdminPanel, AdminTab};
use swapstudio::services::bulk::{BulkAction, BulkCoordinator, RequestOutcome, Tier};
use swapstudio::services::generation::GenerationFlow;
use swapstudio::services::ledger::{self, TemplateUpload};
use swapstudio::services::records;
use swapstudio::state::{LifecycleStatus, SessionState};

const MIB: u64 = 1024 * 1024;

fn upload(name: &str, size_bytes: u64) -> TemplateUpload {
    TemplateUpload {
        name: name.to_string(),
        size_bytes,
        tags: vec!["general".into()],
        duration: "10s".into(),
        resolution: "1080P".into(),
        thumbnail_url: format!("mock://thumb/{}", name.to_lowercase().replace(' ', "-")),
        creator: Some("Admin".into()),
        supports_voice_sync: false,
        voice_sync_mode: None,
        default_script: None,
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    // No suggestion backend in the demo: uploads fall back to the default
    // label unless named explicitly.
    let state = SessionState::new(None);
    tracing::info!("name suggestion not configured — uploads use the default label");

    let (_key, mut notices) = state.notices.subscribe();

    // --- Admin: seed the catalog and run the bulk-management rules. ---
    let mut panel = AdminPanel::new(state.clone());

    let suggested = suggest_display_name(state.naming.as_ref(), "christmas_fireworks_final.mp4").await;
    panel.request_upload().await.expect("empty catalog has capacity");
    for (name, size) in [(suggested.as_str(), 15 * MIB), ("Christmas Theme", 22 * MIB), ("New Year Party", 18 * MIB)] {
        panel.admit_upload(upload(name, size)).await.expect("seed admission");
    }

    let stats = ledger::storage_stats(&state).await;
    tracing::info!(count = stats.count, used_bytes = stats.used_bytes, remaining_bytes = stats.remaining_bytes, "catalog seeded");

    panel.toggle_manage_mode();
    panel.select_all().await;

    // Deleting published templates is refused; unpublish first.
    if panel.request_bulk(BulkAction::DeleteTemplates).await.is_err() {
        tracing::info!("delete refused while templates are published — unpublishing first");
    }
    if let Ok(RequestOutcome::AwaitingConfirmation { summary, .. }) =
        panel.request_bulk(BulkAction::SetTemplateStatus(LifecycleStatus::Offline)).await
    {
        tracing::info!(%summary, "confirming");
        panel.confirm_pending().await.expect("pending unpublish");
    }

    panel.toggle_manage_mode();
    panel.select_all().await;
    if let Ok(RequestOutcome::AwaitingConfirmation { summary, .. }) =
        panel.request_bulk(BulkAction::DeleteTemplates).await
    {
        tracing::info!(%summary, "confirming");
        panel.confirm_pending().await.expect("pending delete");
    }
    panel.switch_tab(AdminTab::Templates);

    // --- Consumer: one generation, start to finish. ---
    panel.admit_upload(upload("Holiday Fireworks", 20 * MIB)).await.expect("re-seed admission");
    let catalog = ledger::consumer_catalog(&state).await;
    let template = catalog.first().expect("one online template");

    let mut flow = GenerationFlow::new(state.clone(), Uuid::new_v4(), "Me");
    tracing::info!(remaining = flow.remaining_uses(), "consumer entering creation flow");
    flow.begin(template).expect("usage available");
    flow.pick_image("mock://subject/me").expect("picker follows begin");
    let record_id = flow.submit().await.expect("crop step reached");

    // Wait for the clickable completion notice for this record.
    loop {
        let notice = timeout(Duration::from_secs(30), notices.recv())
            .await
            .expect("completion within the configured delay")
            .expect("notice hub open");
        tracing::info!(kind = ?notice.kind, message = %notice.message, "notice");
        if notice.kind == NoticeKind::Success && notice.record_id == Some(record_id) {
            break;
        }
    }
    let record = records::get(&state, record_id).await.expect("record retained");
    tracing::info!(record_id = %record.id, status = ?record.status, "consumer result ready");

    // --- Operator: status change with no confirmation step. ---
    let mut desk = BulkCoordinator::new();
    let outcome = desk
        .request(&state, BulkAction::SetTemplateStatus(LifecycleStatus::Offline), &[template.id], Tier::Operator)
        .await
        .expect("operator path is never refused");
    tracing::info!(?outcome, "operator unpublished the template directly");

    let stats = records::dashboard_stats(&state).await;
    tracing::info!(total = stats.total, completed = stats.completed, processing = stats.processing, failed = stats.failed, "dashboard");
}
