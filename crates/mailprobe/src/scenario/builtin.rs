//! The built-in regression set for the folders and labels screen

use super::{ensure, Scenario};
use crate::model::{FolderEdit, LabelColor, LabelEdit};
use crate::page_object::PageObject;
use crate::pages::FoldersLabelsPage;
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;

/// Every built-in scenario, in suite order
#[must_use]
pub fn builtin_scenarios() -> Vec<Box<dyn Scenario>> {
    vec![
        Box::new(FolderNameRequired),
        Box::new(LabelNameRequired),
        Box::new(AddFolder),
        Box::new(AddLabel),
        Box::new(EditFolder),
        Box::new(AddChildFolder),
        Box::new(DeleteFolder),
        Box::new(EditLabel),
        Box::new(RecolorLabel),
        Box::new(SortFolders),
        Box::new(SortLabels),
    ]
}

#[derive(Debug)]
struct FolderNameRequired;

#[async_trait]
impl Scenario for FolderNameRequired {
    fn name(&self) -> &str {
        "folder without a name is rejected"
    }

    async fn run(&self, page: &FoldersLabelsPage) -> ProbeResult<()> {
        page.add_folder("", None).await?;
        page.page()
            .expect(&page.common.required_field_message)
            .to_be_visible()
            .await?;
        page.cancel().await
    }
}

#[derive(Debug)]
struct LabelNameRequired;

#[async_trait]
impl Scenario for LabelNameRequired {
    fn name(&self) -> &str {
        "label without a name is rejected"
    }

    async fn run(&self, page: &FoldersLabelsPage) -> ProbeResult<()> {
        page.add_label("", LabelColor::Reef).await?;
        page.page()
            .expect(&page.common.required_field_message)
            .to_be_visible()
            .await?;
        page.cancel().await
    }
}

#[derive(Debug)]
struct AddFolder;

#[async_trait]
impl Scenario for AddFolder {
    fn name(&self) -> &str {
        "add folder"
    }

    async fn run(&self, page: &FoldersLabelsPage) -> ProbeResult<()> {
        page.add_folder("folder 1", None).await?;
        page.page().expect(&page.common.alerts).to_be_visible().await?;
        page.page()
            .expect(&page.folders.items)
            .to_have_count_at_least(1)
            .await
    }
}

#[derive(Debug)]
struct AddLabel;

#[async_trait]
impl Scenario for AddLabel {
    fn name(&self) -> &str {
        "add label"
    }

    async fn run(&self, page: &FoldersLabelsPage) -> ProbeResult<()> {
        page.add_label("label 1", LabelColor::Reef).await?;
        page.page().expect(&page.common.alerts).to_be_visible().await?;
        page.page()
            .expect(&page.labels.items)
            .to_have_count_at_least(1)
            .await
    }
}

#[derive(Debug)]
struct EditFolder;

#[async_trait]
impl Scenario for EditFolder {
    fn name(&self) -> &str {
        "edit folder"
    }

    async fn setup(&self, page: &FoldersLabelsPage) -> ProbeResult<()> {
        page.add_folder("Important", None).await
    }

    async fn run(&self, page: &FoldersLabelsPage) -> ProbeResult<()> {
        page.edit_folder("Important", &FolderEdit::new().rename("edited"))
            .await?;
        page.page()
            .expect(&page.folder_named("edited"))
            .to_be_visible()
            .await
    }
}

#[derive(Debug)]
struct AddChildFolder;

#[async_trait]
impl Scenario for AddChildFolder {
    fn name(&self) -> &str {
        "add child folder"
    }

    async fn setup(&self, page: &FoldersLabelsPage) -> ProbeResult<()> {
        page.add_folder("Important", None).await
    }

    async fn run(&self, page: &FoldersLabelsPage) -> ProbeResult<()> {
        page.add_folder("Child Folder", Some("Important")).await?;
        page.page()
            .expect(&page.folder_named("Important/Child Folder"))
            .to_be_visible()
            .await
    }
}

#[derive(Debug)]
struct DeleteFolder;

#[async_trait]
impl Scenario for DeleteFolder {
    fn name(&self) -> &str {
        "delete folder"
    }

    async fn setup(&self, page: &FoldersLabelsPage) -> ProbeResult<()> {
        page.add_folder("Important", None).await
    }

    async fn run(&self, page: &FoldersLabelsPage) -> ProbeResult<()> {
        page.delete_folder("Important").await?;
        let alerts = page.page().expect(&page.common.alerts);
        alerts.to_be_visible().await?;
        alerts.to_be_hidden().await?;
        page.page().expect(&page.folders.items).to_have_count(0).await
    }
}

#[derive(Debug)]
struct EditLabel;

#[async_trait]
impl Scenario for EditLabel {
    fn name(&self) -> &str {
        "edit label"
    }

    async fn setup(&self, page: &FoldersLabelsPage) -> ProbeResult<()> {
        page.add_label("Label", LabelColor::Pacific).await
    }

    async fn run(&self, page: &FoldersLabelsPage) -> ProbeResult<()> {
        page.edit_label("Label", &LabelEdit::new().rename("New label name"))
            .await?;
        page.page()
            .expect(&page.label_named("New label name"))
            .to_be_visible()
            .await
    }
}

#[derive(Debug)]
struct RecolorLabel;

#[async_trait]
impl Scenario for RecolorLabel {
    fn name(&self) -> &str {
        "recolor label"
    }

    async fn setup(&self, page: &FoldersLabelsPage) -> ProbeResult<()> {
        page.add_label("Label", LabelColor::Pacific).await
    }

    async fn run(&self, page: &FoldersLabelsPage) -> ProbeResult<()> {
        let chosen = page
            .edit_label("Label", &LabelEdit::new().recolor(LabelColor::Reef))
            .await?
            .ok_or_else(|| ProbeError::assertion("recolor returned no swatch color"))?;
        let icon = page.label_icon_color("Label").await?;
        ensure(chosen == icon, || {
            format!("label icon fill {icon:?} does not match chosen swatch {chosen:?}")
        })
    }
}

#[derive(Debug)]
struct SortFolders;

#[async_trait]
impl Scenario for SortFolders {
    fn name(&self) -> &str {
        "sort folders"
    }

    async fn setup(&self, page: &FoldersLabelsPage) -> ProbeResult<()> {
        page.add_folder("Junk", None).await?;
        page.add_folder("Important", None).await
    }

    async fn run(&self, page: &FoldersLabelsPage) -> ProbeResult<()> {
        let mut expected = page.get_all_parent_folder_names().await?;
        expected.sort();
        page.sort_folders().await?;
        let names = page.get_all_parent_folder_names().await?;
        ensure(names == expected, || {
            format!("folders not sorted: got {names:?}, expected {expected:?}")
        })
    }
}

#[derive(Debug)]
struct SortLabels;

#[async_trait]
impl Scenario for SortLabels {
    fn name(&self) -> &str {
        "sort labels"
    }

    async fn setup(&self, page: &FoldersLabelsPage) -> ProbeResult<()> {
        page.add_label("Purple", LabelColor::Purple).await?;
        page.add_label("Copper", LabelColor::Copper).await
    }

    async fn run(&self, page: &FoldersLabelsPage) -> ProbeResult<()> {
        let mut expected = page.get_all_label_names().await?;
        expected.sort();
        page.sort_labels().await?;
        let names = page.get_all_label_names().await?;
        ensure(names == expected, || {
            format!("labels not sorted: got {names:?}, expected {expected:?}")
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::model::Folder;
    use crate::page::Page;
    use crate::sim::{SimDriver, SimState, SIM_BASE_URL};
    use crate::wait::WaitOptions;
    use std::collections::HashSet;
    use std::sync::Arc;

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

    #[test]
    fn test_names_unique() {
        let scenarios = builtin_scenarios();
        assert_eq!(scenarios.len(), 11);
        let names: HashSet<&str> = scenarios.iter().map(|s| s.name()).collect();
        assert_eq!(names.len(), scenarios.len());
    }

    mod sort_tests {
        use super::*;

        #[tokio::test]
        async fn test_junk_and_important_sort_to_important_first() {
            let page = settings(SimState::default()).await;
            SortFolders.setup(&page).await.unwrap();
            SortFolders.run(&page).await.unwrap();
            assert_eq!(
                page.get_all_parent_folder_names().await.unwrap(),
                vec!["Important", "Junk"]
            );
        }

        #[tokio::test]
        async fn test_purple_and_copper_sort_to_copper_first() {
            let page = settings(SimState::default()).await;
            SortLabels.setup(&page).await.unwrap();
            SortLabels.run(&page).await.unwrap();
            assert_eq!(page.get_all_label_names().await.unwrap(), vec!["Copper", "Purple"]);
        }

        #[tokio::test]
        async fn test_existing_rows_are_part_of_the_expected_order() {
            let page = settings(SimState::default().with_folder(Folder::new("Zeta"))).await;
            SortFolders.setup(&page).await.unwrap();
            SortFolders.run(&page).await.unwrap();
            assert_eq!(
                page.get_all_parent_folder_names().await.unwrap(),
                vec!["Important", "Junk", "Zeta"]
            );
        }
    }
}
