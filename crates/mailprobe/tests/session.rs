//! Session bootstrap, persistence and restore.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use mailprobe::session::{bootstrap, capture, capture_origin, restore};
use mailprobe::sim::{SIM_ACCOUNT_URL, SIM_BASE_URL};
use mailprobe::{
    Credentials, Driver, FoldersLabelsPage, Page, PageObject, ProbeError, SessionStore, SimDriver,
    SimState, WaitOptions,
};
use std::sync::Arc;

fn account() -> SimState {
    SimState::default().with_account("tester@example.test", "correct horse")
}

fn page_on(driver: &Arc<SimDriver>) -> Page {
    let options = WaitOptions::new()
        .with_timeout(300)
        .with_network_timeout(300)
        .with_poll_interval(5);
    Page::new(driver.clone(), SIM_BASE_URL, options)
}

#[tokio::test]
async fn bootstrap_then_restore_into_a_fresh_browser() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("storageState.json"));

    let first = Arc::new(SimDriver::new(account()));
    let credentials = Credentials::new("tester@example.test", "correct horse");
    let state = bootstrap(&page_on(&first), SIM_ACCOUNT_URL, &credentials)
        .await
        .unwrap();
    assert_eq!(state.origin.as_deref(), Some(SIM_BASE_URL));
    assert!(state.local_storage.contains_key(SIM_BASE_URL));
    assert!(state.local_storage[SIM_ACCOUNT_URL].contains_key("fp-0"));
    assert!(first.current_url().await.unwrap().starts_with(SIM_BASE_URL));
    store.save(&state).unwrap();

    let second = Arc::new(SimDriver::new(account()));
    let page = page_on(&second);
    restore(&page, &store.load().unwrap()).await.unwrap();

    let settings = FoldersLabelsPage::new(page, 0);
    settings.goto().await.unwrap();
    assert!(second.current_url().await.unwrap().ends_with("/u/0/mail/folders-labels"));
    assert!(second.local_storage().await.unwrap().contains_key("ps-0"));
    second.navigate(SIM_ACCOUNT_URL).await.unwrap();
    assert!(second.local_storage().await.unwrap().contains_key("fp-0"));
}

#[tokio::test]
async fn capture_alone_sees_only_the_current_origin() {
    let driver = Arc::new(SimDriver::new(account()));
    let page = page_on(&driver);
    bootstrap(
        &page,
        SIM_ACCOUNT_URL,
        &Credentials::new("tester@example.test", "correct horse"),
    )
    .await
    .unwrap();

    let mut state = capture(&page).await.unwrap();
    assert_eq!(state.local_storage.len(), 1);
    capture_origin(&page, &format!("{SIM_ACCOUNT_URL}/login"), &mut state)
        .await
        .unwrap();
    assert!(state.local_storage.contains_key(SIM_ACCOUNT_URL));
    assert!(driver.current_url().await.unwrap().starts_with(SIM_BASE_URL));
}

#[tokio::test]
async fn without_a_session_the_app_redirects_to_login() {
    let driver = Arc::new(SimDriver::new(account()));
    let settings = FoldersLabelsPage::new(page_on(&driver), 0);
    assert!(settings.goto().await.is_err());
    assert_eq!(
        driver.current_url().await.unwrap(),
        format!("{SIM_ACCOUNT_URL}/login")
    );
}

#[tokio::test]
async fn wrong_password_is_a_session_error() {
    let driver = Arc::new(SimDriver::new(account()));
    let err = bootstrap(
        &page_on(&driver),
        SIM_ACCOUNT_URL,
        &Credentials::new("tester@example.test", "wrong"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ProbeError::Session { .. }));
    assert!(!err.to_string().contains("wrong"));
}
