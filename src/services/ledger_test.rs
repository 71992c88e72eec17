use super::*;

use crate::state::test_helpers::{dummy_template, seed_templates, test_session};

const MIB: u64 = 1024 * 1024;

fn upload(size_bytes: u64) -> TemplateUpload {
    TemplateUpload {
        name: "Christmas Theme".into(),
        size_bytes,
        tags: vec!["person".into()],
        duration: "10s".into(),
        resolution: "1080P".into(),
        thumbnail_url: "mock://thumb/upload".into(),
        creator: None,
        supports_voice_sync: false,
        voice_sync_mode: None,
        default_script: None,
    }
}

/// Seed `count` templates totalling `total_bytes`, spread evenly.
async fn seed_catalog(state: &crate::state::SessionState, count: usize, total_bytes: u64) {
    let each = total_bytes / count as u64;
    let mut templates: Vec<_> = (0..count)
        .map(|_| dummy_template(crate::state::LifecycleStatus::Online, each))
        .collect();
    // Put any rounding remainder on the first template so the sum is exact.
    templates[0].size_bytes += total_bytes - each * count as u64;
    seed_templates(state, templates).await;
}

#[tokio::test]
async fn admit_inserts_at_head() {
    let state = test_session();
    let first = admit(&state, upload(MIB)).await.unwrap();
    let second = admit(&state, upload(MIB)).await.unwrap();

    let catalog = state.templates.read().await;
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog[0].id, second.id);
    assert_eq!(catalog[1].id, first.id);
    assert_eq!(catalog[0].status, crate::state::LifecycleStatus::Online);
}

#[tokio::test]
async fn admit_rejects_oversized_file_regardless_of_quota() {
    let state = test_session();
    let result = admit(&state, upload(MAX_UPLOAD_BYTES + 1)).await;
    assert!(matches!(result, Err(LedgerError::FileTooLarge { .. })));
    assert!(state.templates.read().await.is_empty());
}

#[tokio::test]
async fn storage_overflow_leaves_ledger_unchanged() {
    let state = test_session();
    seed_catalog(&state, 19, 480 * MIB).await;

    // 480 MiB + 25 MiB > 500 MiB: refused on the storage ceiling.
    let result = admit(&state, upload(25 * MIB)).await;
    assert!(matches!(
        result,
        Err(LedgerError::QuotaExceeded { kind: QuotaKind::Storage, .. })
    ));
    let stats = storage_stats(&state).await;
    assert_eq!(stats.count, 19);
    assert_eq!(stats.used_bytes, 480 * MIB);
}

#[tokio::test]
async fn fitting_admission_then_count_ceiling() {
    let state = test_session();
    seed_catalog(&state, 19, 480 * MIB).await;

    // 15 MiB fits: 20 templates at 495 MiB.
    admit(&state, upload(15 * MIB)).await.unwrap();
    let stats = storage_stats(&state).await;
    assert_eq!(stats.count, 20);
    assert_eq!(stats.used_bytes, 495 * MIB);

    // Any further admission fails on the count ceiling.
    let result = admit(&state, upload(1)).await;
    assert!(matches!(
        result,
        Err(LedgerError::QuotaExceeded { kind: QuotaKind::Count, .. })
    ));
}

#[tokio::test]
async fn running_totals_never_exceed_ceilings() {
    let state = test_session();

    // Admissions of arbitrary sizes: the ledger must uphold both ceilings
    // after every step, refusing what does not fit.
    let sizes = [40 * MIB, 50 * MIB, 50 * MIB, 50 * MIB, 50 * MIB, 50 * MIB, 50 * MIB, 50 * MIB, 50 * MIB, 50 * MIB, 50 * MIB, 10 * MIB];
    for size in sizes {
        let _ = admit(&state, upload(size)).await;
        let stats = storage_stats(&state).await;
        assert!(stats.used_bytes <= MAX_STORAGE_BYTES);
        assert!(stats.count <= MAX_TEMPLATE_COUNT);
    }
}

#[tokio::test]
async fn check_capacity_gates_on_full_ceilings() {
    let state = test_session();
    assert!(check_capacity(&state).await.is_ok());

    seed_catalog(&state, MAX_TEMPLATE_COUNT, 100 * MIB).await;
    assert!(matches!(
        check_capacity(&state).await,
        Err(LedgerError::QuotaExceeded { kind: QuotaKind::Count, .. })
    ));
}

#[tokio::test]
async fn check_capacity_gates_on_full_storage() {
    let state = test_session();
    seed_catalog(&state, 10, MAX_STORAGE_BYTES).await;
    assert!(matches!(
        check_capacity(&state).await,
        Err(LedgerError::QuotaExceeded { kind: QuotaKind::Storage, .. })
    ));
}

#[tokio::test]
async fn validate_candidate_distinguishes_errors() {
    let state = test_session();
    seed_catalog(&state, 10, 490 * MIB).await;

    // Over the per-file ceiling: FileTooLarge even though quota also fails.
    assert!(matches!(
        validate_candidate(&state, MAX_UPLOAD_BYTES + 1).await,
        Err(LedgerError::FileTooLarge { .. })
    ));

    // Fits the per-file ceiling but not the 10 MiB of remaining space.
    assert!(matches!(
        validate_candidate(&state, 20 * MIB).await,
        Err(LedgerError::InsufficientQuota { .. })
    ));

    assert!(validate_candidate(&state, 5 * MIB).await.is_ok());
}

#[tokio::test]
async fn remaining_bytes_clamps_at_zero() {
    let state = test_session();
    // Seeded fixtures may overshoot the ceiling; remaining must not wrap.
    seed_catalog(&state, 11, 550 * MIB).await;
    assert_eq!(remaining_bytes(&state).await, 0);
}

#[tokio::test]
async fn consumer_catalog_filters_to_online() {
    let state = test_session();
    let online = dummy_template(crate::state::LifecycleStatus::Online, MIB);
    let offline = dummy_template(crate::state::LifecycleStatus::Offline, MIB);
    let draft = dummy_template(crate::state::LifecycleStatus::Draft, MIB);
    let online_id = online.id;
    seed_templates(&state, vec![online, offline, draft]).await;

    let catalog = consumer_catalog(&state).await;
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[0].id, online_id);
}

#[tokio::test]
async fn set_status_and_remove_are_unconditional() {
    let state = test_session();
    let online = dummy_template(crate::state::LifecycleStatus::Online, MIB);
    let ids = seed_templates(&state, vec![online]).await;

    // No gating here: an online template can be removed directly. Policy
    // lives in the bulk coordinator.
    let touched = set_status(&state, &ids, crate::state::LifecycleStatus::Offline).await;
    assert_eq!(touched, 1);
    let removed = remove(&state, &ids).await;
    assert_eq!(removed, 1);
    assert!(state.templates.read().await.is_empty());
}
