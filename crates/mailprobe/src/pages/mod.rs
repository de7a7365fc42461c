//! Page objects for the login page and the folders/labels settings screen.

mod common;
mod folders_labels;
mod login;

pub use common::CommonControls;
pub use folders_labels::{FolderLocators, FoldersLabelsPage, LabelLocators};
pub use login::LoginPage;
