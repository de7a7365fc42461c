//! Sorting holds for arbitrary folder and label sets.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use mailprobe::sim::SIM_BASE_URL;
use mailprobe::{
    Folder, FoldersLabelsPage, LabelColor, Page, PageObject, SimDriver, SimState, WaitOptions,
};
use proptest::prelude::*;
use std::sync::Arc;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

async fn settings(state: SimState) -> FoldersLabelsPage {
    let driver = Arc::new(SimDriver::authenticated(state));
    let options = WaitOptions::new()
        .with_timeout(300)
        .with_network_timeout(300)
        .with_poll_interval(5);
    let page = FoldersLabelsPage::new(Page::new(driver, SIM_BASE_URL, options), 0);
    page.goto().await.unwrap();
    page
}

fn is_ascending(names: &[String]) -> bool {
    names.windows(2).all(|pair| pair[0] <= pair[1])
}

fn names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[A-Za-z][a-z0-9 ]{0,7}[a-z0-9]", 1..6)
        .prop_map(|set| set.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_sorted_labels_are_ascending_and_stable(names in names()) {
        let state = names
            .iter()
            .fold(SimState::default(), |state, name| state.with_label(name.as_str(), LabelColor::Reef));
        let (first, second) = runtime().block_on(async {
            let page = settings(state).await;
            page.sort_labels().await.unwrap();
            let first = page.get_all_label_names().await.unwrap();
            page.sort_labels().await.unwrap();
            (first, page.get_all_label_names().await.unwrap())
        });
        prop_assert_eq!(first.len(), names.len());
        prop_assert!(is_ascending(&first));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_sorted_folders_are_ascending_and_stable(names in names()) {
        let state = names
            .iter()
            .fold(SimState::default(), |state, name| state.with_folder(Folder::new(name.as_str())));
        let (first, second) = runtime().block_on(async {
            let page = settings(state).await;
            page.sort_folders().await.unwrap();
            let first = page.get_all_parent_folder_names().await.unwrap();
            page.sort_folders().await.unwrap();
            (first, page.get_all_parent_folder_names().await.unwrap())
        });
        prop_assert_eq!(first.len(), names.len());
        prop_assert!(is_ascending(&first));
        prop_assert_eq!(first, second);
    }
}
