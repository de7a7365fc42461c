//! Controls shared by every settings modal and row

use crate::locator::Locator;

/// Locators for modal buttons, row menus and notifications
#[derive(Debug, Clone)]
pub struct CommonControls {
    /// Form submit
    pub save: Locator,
    /// Form cancel
    pub cancel: Locator,
    /// Delete button of the confirmation modal
    pub delete_button: Locator,
    /// Row menu "Delete" entry
    pub delete_item: Locator,
    /// Row menu "Edit" entry
    pub edit_button: Locator,
    /// Row menu opener
    pub row_menu: Locator,
    /// Toast notifications
    pub alerts: Locator,
    /// Validation message under an empty name input
    pub required_field_message: Locator,
}

impl Default for CommonControls {
    fn default() -> Self {
        Self::new()
    }
}

impl CommonControls {
    /// Locators for the current UI
    #[must_use]
    pub fn new() -> Self {
        Self {
            save: Locator::css(".modal-footer button").with_exact_text("Save"),
            cancel: Locator::css(".modal-footer button").with_exact_text("Cancel"),
            delete_button: Locator::css(".alert-modal-footer button").with_exact_text("Delete"),
            delete_item: Locator::test_id("folders/labels:item-delete"),
            edit_button: Locator::test_id("folders/labels:item-edit"),
            row_menu: Locator::test_id("dropdown:open"),
            alerts: Locator::css("[role=\"alert\"]"),
            required_field_message: Locator::text("This field is required"),
        }
    }
}
