mod common;

use assert_matches::assert_matches;
use tymelyne_app::{preferences, AppError};
use tymelyne_core::error::CoreError;
use tymelyne_db::models::preference::UpdatePreferences;
use tymelyne_remote::memory::Op;
use tymelyne_remote::schema::USER_PREFERENCES;

use common::Harness;

#[tokio::test]
async fn first_load_creates_defaults_exactly_once() {
    let h = Harness::new();
    let user_id = h.signed_in().await;

    let first = preferences::load_or_create(&h.ctx, user_id).await.unwrap();
    let second = preferences::load_or_create(&h.ctx, user_id).await.unwrap();
    assert_eq!(first, second);
    assert!(!first.dark_mode);
    assert!(first.email_notifications);
    assert_eq!(first.timezone, "UTC");
    assert_eq!(first.language, "en");

    assert_eq!(h.store.rows(USER_PREFERENCES).await.len(), 1);
    assert_eq!(h.store.calls(USER_PREFERENCES, Op::Upsert).await, 1);
}

#[tokio::test]
async fn concurrent_first_loads_share_one_row() {
    let h = Harness::new();
    let user_id = h.signed_in().await;

    let (a, b) = tokio::join!(
        preferences::load_or_create(&h.ctx, user_id),
        preferences::load_or_create(&h.ctx, user_id),
    );
    assert_eq!(a.unwrap().user_id, b.unwrap().user_id);
    assert_eq!(h.store.rows(USER_PREFERENCES).await.len(), 1);
}

#[tokio::test]
async fn save_applies_patch() {
    let h = Harness::new();
    let user_id = h.signed_in().await;
    let patch = UpdatePreferences {
        dark_mode: Some(true),
        timezone: Some("Europe/Berlin".into()),
        ..UpdatePreferences::default()
    };

    let saved = preferences::save(&h.ctx, user_id, &patch).await.unwrap();
    assert!(saved.dark_mode);
    assert_eq!(saved.timezone, "Europe/Berlin");
    assert!(saved.weekly_report);

    let reloaded = preferences::load_or_create(&h.ctx, user_id).await.unwrap();
    assert_eq!(reloaded.timezone, "Europe/Berlin");
    assert_eq!(h.store.rows(USER_PREFERENCES).await.len(), 1);
}

#[tokio::test]
async fn save_rejects_unsupported_language() {
    let h = Harness::new();
    let user_id = h.signed_in().await;
    let patch = UpdatePreferences {
        language: Some("xx".into()),
        ..UpdatePreferences::default()
    };

    assert_matches!(
        preferences::save(&h.ctx, user_id, &patch).await,
        Err(AppError::Core(CoreError::Validation(_)))
    );
    assert!(h.store.rows(USER_PREFERENCES).await.is_empty());
}
