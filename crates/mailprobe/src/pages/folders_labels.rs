//! Folders and labels settings screen
//!
//! Every mutating operation follows the same shape: drive the modal through
//! [`CommonControls`], then submit with [`Page::click_synchronized`] so the
//! call returns only after the backend round trip the UI depends on.

use super::common::CommonControls;
use crate::locator::Locator;
use crate::model::{FolderEdit, LabelColor, LabelEdit};
use crate::network::SyncPlan;
use crate::page::Page;
use crate::page_object::PageObject;
use crate::result::{ProbeError, ProbeResult};
use tracing::{debug, info};

/// Locators for the folder half of the screen
#[derive(Debug, Clone)]
pub struct FolderLocators {
    /// "Add folder" button
    pub add_button: Locator,
    /// Name input of the folder form
    pub name_input: Locator,
    /// Every folder row, nested ones included
    pub items: Locator,
    /// Top-level folder rows only
    pub top_level_items: Locator,
    /// Parent dropdown opener in the folder form
    pub location_button: Locator,
    /// Entries of the open parent dropdown
    pub location_item: Locator,
    /// Notification checkbox in the folder form
    pub notification_toggle: Locator,
    /// Sort button
    pub sort_button: Locator,
    /// "Use folder colors" toggle
    pub use_colors_toggle: Locator,
}

impl FolderLocators {
    fn new() -> Self {
        Self {
            add_button: Locator::css("button").with_exact_text("Add folder"),
            name_input: Locator::css("input#folder"),
            items: Locator::test_id("folders/labels:item-type:folder"),
            top_level_items: Locator::css("#folderlist > div > ul > li"),
            location_button: Locator::css("button#parentID"),
            location_item: Locator::css("ul.dropdown > li.dropdown-item"),
            notification_toggle: Locator::css("input#notification"),
            sort_button: Locator::title("Sort folders alphabetically"),
            use_colors_toggle: Locator::css("input#folder-colors"),
        }
    }
}

/// Locators for the label half of the screen
#[derive(Debug, Clone)]
pub struct LabelLocators {
    /// "Add label" button
    pub add_button: Locator,
    /// Name input of the label form
    pub name_input: Locator,
    /// Every label row
    pub items: Locator,
    /// Color dropdown opener in the label form
    pub color_button: Locator,
    /// Swatches of the open color dropdown
    pub color_option: Locator,
    /// Sort button
    pub sort_button: Locator,
}

impl LabelLocators {
    fn new() -> Self {
        Self {
            add_button: Locator::css("button").with_exact_text("Add label"),
            name_input: Locator::placeholder("Label name"),
            items: Locator::test_id("folders/labels:item-type:label"),
            color_button: Locator::css("button#color-button"),
            color_option: Locator::css("li.color-selector-item"),
            sort_button: Locator::title("Sort labels alphabetically"),
        }
    }
}

/// The folders and labels settings screen
#[derive(Debug, Clone)]
pub struct FoldersLabelsPage {
    page: Page,
    user_index: u32,
    max_bulk_deletions: usize,
    /// Shared modal and row controls
    pub common: CommonControls,
    /// Folder locators
    pub folders: FolderLocators,
    /// Label locators
    pub labels: LabelLocators,
}

impl FoldersLabelsPage {
    /// Page object for account slot `user_index`
    #[must_use]
    pub fn new(page: Page, user_index: u32) -> Self {
        Self {
            page,
            user_index,
            max_bulk_deletions: crate::config::DEFAULT_MAX_BULK_DELETIONS,
            common: CommonControls::new(),
            folders: FolderLocators::new(),
            labels: LabelLocators::new(),
        }
    }

    /// Override the iteration bound of the delete-all loops
    #[must_use]
    pub const fn with_max_bulk_deletions(mut self, bound: usize) -> Self {
        self.max_bulk_deletions = bound;
        self
    }

    /// Screen path relative to the base URL
    #[must_use]
    pub fn path(&self) -> String {
        format!("/u/{}/mail/folders-labels", self.user_index)
    }

    /// Name cell of the folder whose display path is `display_name`
    #[must_use]
    pub fn folder_named(&self, display_name: &str) -> Locator {
        Self::name_cell(&self.folders.items, display_name)
    }

    /// Name cell of the label `name`
    #[must_use]
    pub fn label_named(&self, name: &str) -> Locator {
        Self::name_cell(&self.labels.items, name)
    }

    // Nested folder rows repeat their title on the `li`, so match the span
    fn name_cell(items: &Locator, title: &str) -> Locator {
        items
            .get_by_test_id("folders/labels:item-name")
            .with_attribute("title", title)
    }

    // The name span sits in `div.name-cell` (folders) or
    // `div.name-cell > div.label-name` (labels); rows are their parents.
    fn folder_row(&self, display_name: &str) -> Locator {
        self.folder_named(display_name).parent().parent()
    }

    fn label_row(&self, name: &str) -> Locator {
        self.label_named(name).parent().parent().parent()
    }

    fn row_edit(row: &Locator) -> Locator {
        row.locator("button").with_exact_text("Edit")
    }

    async fn submit(&self, name: &str, plan: &SyncPlan) -> ProbeResult<()> {
        if name.trim().is_empty() {
            // Client-side validation: no request is sent
            self.page.click(&self.common.save).await?;
            return self.page.expect(&self.common.required_field_message).to_be_visible().await;
        }
        self.page.click_synchronized(&self.common.save, plan).await
    }

    async fn pick_location(&self, parent: &str) -> ProbeResult<()> {
        self.page.click(&self.folders.location_button).await?;
        let option = self
            .folders
            .location_item
            .locator("span")
            .with_exact_text(parent);
        self.page.click(&option).await
    }

    async fn pick_color(&self, color: LabelColor) -> ProbeResult<String> {
        self.page.click(&self.labels.color_button).await?;
        let option = self
            .labels
            .color_option
            .with_attribute("title", color.title());
        let computed = self.page.computed_style(&option, "color").await?;
        self.page.click(&option).await?;
        Ok(computed)
    }

    /// Create a folder, optionally under `parent`. An empty name leaves the
    /// form open with the required-field message showing.
    pub async fn add_folder(&self, name: &str, parent: Option<&str>) -> ProbeResult<()> {
        info!(name, ?parent, "add folder");
        self.page.click(&self.folders.add_button).await?;
        self.page.fill(&self.folders.name_input, name).await?;
        if let Some(parent) = parent {
            self.pick_location(parent).await?;
        }
        self.submit(name, &SyncPlan::save_create()).await
    }

    /// Create a label with a preset color. Empty names behave as in
    /// [`Self::add_folder`].
    pub async fn add_label(&self, name: &str, color: LabelColor) -> ProbeResult<()> {
        info!(name, %color, "add label");
        self.page.click(&self.labels.add_button).await?;
        self.page.fill(&self.labels.name_input, name).await?;
        self.pick_color(color).await?;
        self.submit(name, &SyncPlan::save_create()).await
    }

    /// Apply the supplied fields of `edit` to the folder titled `current`
    pub async fn edit_folder(&self, current: &str, edit: &FolderEdit) -> ProbeResult<()> {
        info!(current, ?edit, "edit folder");
        self.page.click(&Self::row_edit(&self.folder_row(current))).await?;
        if let Some(name) = &edit.name {
            self.page.fill(&self.folders.name_input, name).await?;
        }
        if let Some(parent) = &edit.parent {
            self.pick_location(parent).await?;
        }
        if let Some(notify) = edit.notify {
            if self.page.is_checked(&self.folders.notification_toggle).await? != notify {
                self.page.click(&self.folders.notification_toggle).await?;
            }
        }
        let name = edit.name.as_deref().unwrap_or(current);
        self.submit(name, &SyncPlan::save_edit()).await
    }

    /// Apply the supplied fields of `edit` to the label named `current`.
    ///
    /// Returns the computed color of the chosen swatch when a color was
    /// supplied.
    pub async fn edit_label(&self, current: &str, edit: &LabelEdit) -> ProbeResult<Option<String>> {
        info!(current, ?edit, "edit label");
        self.page.click(&Self::row_edit(&self.label_row(current))).await?;
        if let Some(name) = &edit.name {
            self.page.fill(&self.labels.name_input, name).await?;
        }
        let color = match edit.color {
            Some(color) => Some(self.pick_color(color).await?),
            None => None,
        };
        let name = edit.name.as_deref().unwrap_or(current);
        self.submit(name, &SyncPlan::save_edit()).await?;
        Ok(color)
    }

    async fn delete_via_menu(&self, opener: &Locator) -> ProbeResult<()> {
        self.page.click(opener).await?;
        self.page.click(&self.common.delete_item).await?;
        self.page
            .click_synchronized(&self.common.delete_button, &SyncPlan::delete())
            .await
    }

    /// Delete the folder titled `name` (and its subfolders)
    pub async fn delete_folder(&self, name: &str) -> ProbeResult<()> {
        info!(name, "delete folder");
        let opener = self.folder_row(name).get_by_test_id("dropdown:open");
        self.delete_via_menu(&opener).await
    }

    /// Delete the label named `name`
    pub async fn delete_label(&self, name: &str) -> ProbeResult<()> {
        info!(name, "delete label");
        let opener = self.label_row(name).get_by_test_id("dropdown:open");
        self.delete_via_menu(&opener).await
    }

    async fn delete_all(&self, items: &Locator, collection: &str) -> ProbeResult<usize> {
        let mut removed = 0;
        let mut iterations = 0;
        loop {
            let remaining = self.page.count(items).await?;
            if remaining == 0 {
                info!(collection, removed, "collection empty");
                return Ok(removed);
            }
            if iterations >= self.max_bulk_deletions {
                return Err(ProbeError::BulkDeleteBound {
                    collection: collection.to_string(),
                    bound: self.max_bulk_deletions,
                    remaining,
                });
            }
            iterations += 1;

            let opener = items.first().get_by_test_id("dropdown:open").first();
            self.delete_via_menu(&opener).await?;
            let after = self
                .page
                .wait_for_count(items, &format!("< {remaining}"), |n| n < remaining)
                .await
                .map_err(|err| match err {
                    ProbeError::Timeout { .. } => ProbeError::DeletionStalled {
                        collection: collection.to_string(),
                        count: remaining,
                    },
                    other => other,
                })?;
            debug!(collection, before = remaining, after, "row deleted");
            removed += remaining - after;
        }
    }

    /// Delete folders until none remain; returns how many rows went away
    pub async fn delete_all_folders(&self) -> ProbeResult<usize> {
        self.delete_all(&self.folders.items, "folders").await
    }

    /// Delete labels until none remain; returns how many rows went away
    pub async fn delete_all_labels(&self) -> ProbeResult<usize> {
        self.delete_all(&self.labels.items, "labels").await
    }

    /// Sort folders alphabetically
    pub async fn sort_folders(&self) -> ProbeResult<()> {
        info!("sort folders");
        self.page
            .click_synchronized(&self.folders.sort_button, &SyncPlan::sort())
            .await
    }

    /// Sort labels alphabetically
    pub async fn sort_labels(&self) -> ProbeResult<()> {
        info!("sort labels");
        self.page
            .click_synchronized(&self.labels.sort_button, &SyncPlan::sort())
            .await
    }

    /// Switch "Use folder colors" to `enabled`; a no-op when already there
    pub async fn set_use_folder_colors(&self, enabled: bool) -> ProbeResult<()> {
        let toggle = &self.folders.use_colors_toggle;
        if self.page.is_checked(toggle).await? == enabled {
            return Ok(());
        }
        info!(enabled, "toggle folder colors");
        self.page
            .click_synchronized(toggle, &SyncPlan::folder_colors())
            .await
    }

    /// Titles of top-level folders in screen order
    pub async fn get_all_parent_folder_names(&self) -> ProbeResult<Vec<String>> {
        self.page
            .all_attributes(&self.folders.top_level_items, "title")
            .await
    }

    /// Label names in screen order
    pub async fn get_all_label_names(&self) -> ProbeResult<Vec<String>> {
        let names = self.labels.items.get_by_test_id("folders/labels:item-name");
        self.page.all_attributes(&names, "title").await
    }

    /// Computed `fill` of the icon next to the label `name`
    pub async fn label_icon_color(&self, name: &str) -> ProbeResult<String> {
        let icon = self.label_named(name).parent().locator("svg");
        self.page.computed_style(&icon, "fill").await
    }

    /// Close an open form without saving
    pub async fn cancel(&self) -> ProbeResult<()> {
        self.page.click(&self.common.cancel).await
    }
}

impl PageObject for FoldersLabelsPage {
    fn page(&self) -> &Page {
        &self.page
    }

    fn url(&self) -> String {
        self.page.url_for(&self.path())
    }

    fn ready_marker(&self) -> Locator {
        self.folders.add_button.clone()
    }

    fn page_name(&self) -> &str {
        "folders-labels"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::model::Folder;
    use crate::network::{HttpMethod, UrlPattern, LABELS_API};
    use crate::sim::{SimDriver, SimState, SIM_BASE_URL};
    use crate::wait::WaitOptions;
    use std::sync::Arc;

    async fn open(state: SimState) -> (Arc<SimDriver>, FoldersLabelsPage) {
        let driver = Arc::new(SimDriver::authenticated(state));
        let options = WaitOptions::new()
            .with_timeout(300)
            .with_network_timeout(300)
            .with_poll_interval(5);
        let page = FoldersLabelsPage::new(Page::new(driver.clone(), SIM_BASE_URL, options), 0);
        page.goto().await.unwrap();
        (driver, page)
    }

    mod folder_tests {
        use super::*;

        #[tokio::test]
        async fn test_add_folder_creates_row() {
            let (driver, page) = open(SimState::default()).await;
            page.add_folder("folder 1", None).await.unwrap();
            assert_eq!(driver.folder_names().unwrap(), vec!["folder 1"]);
            page.page()
                .expect(&page.folder_named("folder 1"))
                .to_be_visible()
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_add_child_folder() {
            let (driver, page) = open(SimState::default().with_folder(Folder::new("Important"))).await;
            page.add_folder("Child Folder", Some("Important")).await.unwrap();
            assert!(driver
                .folder_names()
                .unwrap()
                .contains(&"Important/Child Folder".to_string()));
            assert_eq!(page.get_all_parent_folder_names().await.unwrap(), vec!["Important"]);
        }

        #[tokio::test]
        async fn test_empty_name_sends_nothing() {
            let (driver, page) = open(SimState::default()).await;
            let mut log = page.page().network_log();
            page.add_folder("", None).await.unwrap();
            assert!(driver.folder_names().unwrap().is_empty());
            assert_eq!(log.count_requests(&UrlPattern::contains(LABELS_API), HttpMethod::Any), 0);
            page.cancel().await.unwrap();
            page.page()
                .expect(&page.common.required_field_message)
                .to_be_hidden()
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_edit_folder_rename_and_notify() {
            let (driver, page) = open(SimState::default().with_folder(Folder::new("Important"))).await;
            page.edit_folder("Important", &FolderEdit::new().rename("edited").notify(false))
                .await
                .unwrap();
            assert_eq!(driver.folder_names().unwrap(), vec!["edited"]);
            assert_eq!(page.page().count(&page.folder_named("Important")).await.unwrap(), 0);
        }

        #[tokio::test]
        async fn test_edit_folder_move() {
            let (driver, page) = open(
                SimState::default()
                    .with_folder(Folder::new("Work"))
                    .with_folder(Folder::new("Reports")),
            )
            .await;
            page.edit_folder("Reports", &FolderEdit::new().move_to("Work"))
                .await
                .unwrap();
            assert_eq!(driver.folder_names().unwrap(), vec!["Work", "Work/Reports"]);
        }

        #[tokio::test]
        async fn test_delete_folder_removes_subtree() {
            let (driver, page) = open(
                SimState::default()
                    .with_folder(Folder::new("Important"))
                    .with_folder(Folder::new("Child").with_parent("Important")),
            )
            .await;
            page.delete_folder("Important").await.unwrap();
            assert!(driver.folder_names().unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_sort_folders() {
            let (_, page) = open(
                SimState::default()
                    .with_folder(Folder::new("Junk"))
                    .with_folder(Folder::new("Important")),
            )
            .await;
            page.sort_folders().await.unwrap();
            assert_eq!(
                page.get_all_parent_folder_names().await.unwrap(),
                vec!["Important", "Junk"]
            );
        }

        #[tokio::test]
        async fn test_folder_colors_toggle_is_idempotent() {
            let (_, page) = open(SimState::default()).await;
            page.set_use_folder_colors(true).await.unwrap();
            page.set_use_folder_colors(true).await.unwrap();
            assert!(page
                .page()
                .is_checked(&page.folders.use_colors_toggle)
                .await
                .unwrap());
        }
    }

    mod label_tests {
        use super::*;

        #[tokio::test]
        async fn test_add_label() {
            let (driver, page) = open(SimState::default()).await;
            page.add_label("label 1", LabelColor::Reef).await.unwrap();
            assert_eq!(driver.label_names().unwrap(), vec!["label 1"]);
            assert_eq!(
                page.label_icon_color("label 1").await.unwrap(),
                LabelColor::Reef.css_rgb()
            );
        }

        #[tokio::test]
        async fn test_recolor_returns_swatch_color() {
            let (_, page) = open(SimState::default().with_label("Label", LabelColor::Pacific)).await;
            let color = page
                .edit_label("Label", &LabelEdit::new().recolor(LabelColor::Reef))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(color, page.label_icon_color("Label").await.unwrap());
        }

        #[tokio::test]
        async fn test_rename_label_returns_no_color() {
            let (driver, page) = open(SimState::default().with_label("Label", LabelColor::Pacific)).await;
            let color = page
                .edit_label("Label", &LabelEdit::new().rename("New label name"))
                .await
                .unwrap();
            assert!(color.is_none());
            assert_eq!(driver.label_names().unwrap(), vec!["New label name"]);
        }

        #[tokio::test]
        async fn test_delete_label() {
            let (driver, page) = open(
                SimState::default()
                    .with_label("Purple", LabelColor::Purple)
                    .with_label("Copper", LabelColor::Copper),
            )
            .await;
            page.delete_label("Purple").await.unwrap();
            assert_eq!(driver.label_names().unwrap(), vec!["Copper"]);
        }
    }

    mod bulk_delete_tests {
        use super::*;

        #[tokio::test]
        async fn test_empty_is_fixed_point() {
            let (_, page) = open(SimState::default()).await;
            assert_eq!(page.delete_all_folders().await.unwrap(), 0);
            assert_eq!(page.delete_all_labels().await.unwrap(), 0);
        }

        #[tokio::test]
        async fn test_counts_nested_rows() {
            let (driver, page) = open(
                SimState::default()
                    .with_folder(Folder::new("A"))
                    .with_folder(Folder::new("B").with_parent("A"))
                    .with_folder(Folder::new("C")),
            )
            .await;
            assert_eq!(page.delete_all_folders().await.unwrap(), 3);
            assert!(driver.folder_names().unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_bound_reports_remaining() {
            let (_, page) = open(
                SimState::default()
                    .with_label("one", LabelColor::Reef)
                    .with_label("two", LabelColor::Reef)
                    .with_label("three", LabelColor::Reef),
            )
            .await;
            let page = page.with_max_bulk_deletions(2);
            match page.delete_all_labels().await.unwrap_err() {
                ProbeError::BulkDeleteBound { bound, remaining, .. } => {
                    assert_eq!(bound, 2);
                    assert_eq!(remaining, 1);
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_path_uses_user_index() {
        let driver = Arc::new(SimDriver::new(SimState::default()));
        let page = FoldersLabelsPage::new(Page::new(driver, SIM_BASE_URL, WaitOptions::new()), 2);
        assert_eq!(page.path(), "/u/2/mail/folders-labels");
        assert_eq!(page.url(), format!("{SIM_BASE_URL}/u/2/mail/folders-labels"));
    }
}
