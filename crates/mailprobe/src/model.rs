//! Domain values for the folders and labels settings screen.
//!
//! None of these types cache UI state; page objects always re-read the DOM.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A mail folder, optionally nested one level under a parent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Folder name
    pub name: String,
    /// Parent folder name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Whether new mail in the folder triggers a notification
    #[serde(default = "default_notify")]
    pub notify: bool,
}

const fn default_notify() -> bool {
    true
}

impl Folder {
    /// Create a top-level folder
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            notify: true,
        }
    }

    /// Nest under a parent
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Name shown in the folder list (`parent/child` when nested)
    #[must_use]
    pub fn display_name(&self) -> String {
        display_path(self.parent.as_deref(), &self.name)
    }
}

/// Display identity of a folder row
#[must_use]
pub fn display_path(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(parent) => format!("{parent}/{name}"),
        None => name.to_string(),
    }
}

/// Named label color presets offered by the color picker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabelColor {
    /// Purple
    Purple,
    /// Enzian
    Enzian,
    /// Pink
    Pink,
    /// Plum
    Plum,
    /// Strawberry
    Strawberry,
    /// Cerise
    Cerise,
    /// Carrot
    Carrot,
    /// Copper
    Copper,
    /// Sahara
    Sahara,
    /// Soil
    Soil,
    /// Slate blue
    SlateBlue,
    /// Cobalt
    Cobalt,
    /// Pacific
    Pacific,
    /// Ocean blue
    OceanBlue,
    /// Reef
    Reef,
    /// Pine
    Pine,
    /// Fern
    Fern,
    /// Forest
    Forest,
    /// Olive
    Olive,
    /// Pickle
    Pickle,
}

impl LabelColor {
    /// All presets in picker order
    pub const ALL: [Self; 20] = [
        Self::Purple,
        Self::Enzian,
        Self::Pink,
        Self::Plum,
        Self::Strawberry,
        Self::Cerise,
        Self::Carrot,
        Self::Copper,
        Self::Sahara,
        Self::Soil,
        Self::SlateBlue,
        Self::Cobalt,
        Self::Pacific,
        Self::OceanBlue,
        Self::Reef,
        Self::Pine,
        Self::Fern,
        Self::Forest,
        Self::Olive,
        Self::Pickle,
    ];

    /// Title attribute of the picker swatch
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Purple => "Purple",
            Self::Enzian => "Enzian",
            Self::Pink => "Pink",
            Self::Plum => "Plum",
            Self::Strawberry => "Strawberry",
            Self::Cerise => "Cerise",
            Self::Carrot => "Carrot",
            Self::Copper => "Copper",
            Self::Sahara => "Sahara",
            Self::Soil => "Soil",
            Self::SlateBlue => "Slate blue",
            Self::Cobalt => "Cobalt",
            Self::Pacific => "Pacific",
            Self::OceanBlue => "Ocean blue",
            Self::Reef => "Reef",
            Self::Pine => "Pine",
            Self::Fern => "Fern",
            Self::Forest => "Forest",
            Self::Olive => "Olive",
            Self::Pickle => "Pickle",
        }
    }

    /// Swatch hex value
    #[must_use]
    pub const fn hex(&self) -> &'static str {
        match self {
            Self::Purple => "#8080FF",
            Self::Enzian => "#5252CC",
            Self::Pink => "#DB60D6",
            Self::Plum => "#A839A4",
            Self::Strawberry => "#EC3E7C",
            Self::Cerise => "#BA1E55",
            Self::Carrot => "#F78400",
            Self::Copper => "#C44800",
            Self::Sahara => "#936D58",
            Self::Soil => "#54473F",
            Self::SlateBlue => "#415DF0",
            Self::Cobalt => "#273EB2",
            Self::Pacific => "#179FD9",
            Self::OceanBlue => "#0A77A6",
            Self::Reef => "#1DA583",
            Self::Pine => "#0F735A",
            Self::Fern => "#3CBB3A",
            Self::Forest => "#258723",
            Self::Olive => "#B4A40E",
            Self::Pickle => "#807304",
        }
    }

    /// Swatch value the way a browser reports a computed color
    #[must_use]
    pub fn css_rgb(&self) -> String {
        let hex = self.hex().trim_start_matches('#');
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
        format!("rgb({}, {}, {})", channel(0), channel(2), channel(4))
    }

    /// Look up a preset by its swatch title
    #[must_use]
    pub fn from_title(title: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.title() == title)
    }
}

impl fmt::Display for LabelColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// A label with its color preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Label name
    pub name: String,
    /// Color preset
    pub color: LabelColor,
}

impl Label {
    /// Create a label
    #[must_use]
    pub fn new(name: impl Into<String>, color: LabelColor) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }
}

/// Partial update for a folder; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderEdit {
    /// New name
    pub name: Option<String>,
    /// New parent folder
    pub parent: Option<String>,
    /// Requested notification state
    pub notify: Option<bool>,
}

impl FolderEdit {
    /// Empty edit
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rename
    #[must_use]
    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Move under a parent
    #[must_use]
    pub fn move_to(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set notifications on or off
    #[must_use]
    pub const fn notify(mut self, notify: bool) -> Self {
        self.notify = Some(notify);
        self
    }

    /// Whether any field is set
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.parent.is_none() && self.notify.is_none()
    }
}

/// Partial update for a label; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEdit {
    /// New name
    pub name: Option<String>,
    /// New color
    pub color: Option<LabelColor>,
}

impl LabelEdit {
    /// Empty edit
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rename
    #[must_use]
    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Recolor
    #[must_use]
    pub const fn recolor(mut self, color: LabelColor) -> Self {
        self.color = Some(color);
        self
    }

    /// Whether any field is set
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.color.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod folder_tests {
        use super::*;

        #[test]
        fn test_display_name() {
            assert_eq!(Folder::new("Important").display_name(), "Important");
            assert_eq!(
                Folder::new("Child Folder")
                    .with_parent("Important")
                    .display_name(),
                "Important/Child Folder"
            );
        }

        #[test]
        fn test_notify_defaults_on() {
            let folder: Folder = serde_json::from_str(r#"{"name":"a"}"#).unwrap();
            assert!(folder.notify);
            assert!(folder.parent.is_none());
        }
    }

    mod color_tests {
        use super::*;

        #[test]
        fn test_titles_unique() {
            let mut titles: Vec<_> = LabelColor::ALL.iter().map(LabelColor::title).collect();
            titles.sort_unstable();
            titles.dedup();
            assert_eq!(titles.len(), LabelColor::ALL.len());
        }

        #[test]
        fn test_css_rgb() {
            assert_eq!(LabelColor::Reef.css_rgb(), "rgb(29, 165, 131)");
            assert_eq!(LabelColor::Purple.css_rgb(), "rgb(128, 128, 255)");
        }

        #[test]
        fn test_from_title() {
            assert_eq!(LabelColor::from_title("Slate blue"), Some(LabelColor::SlateBlue));
            assert_eq!(LabelColor::from_title("Mauve"), None);
        }

        #[test]
        fn test_serde_kebab() {
            let json = serde_json::to_string(&LabelColor::OceanBlue).unwrap();
            assert_eq!(json, "\"ocean-blue\"");
        }
    }

    mod edit_tests {
        use super::*;

        #[test]
        fn test_folder_edit_builder() {
            let edit = FolderEdit::new().rename("edited").notify(false);
            assert_eq!(edit.name.as_deref(), Some("edited"));
            assert_eq!(edit.notify, Some(false));
            assert!(edit.parent.is_none());
            assert!(!edit.is_empty());
            assert!(FolderEdit::new().is_empty());
        }

        #[test]
        fn test_label_edit_builder() {
            let edit = LabelEdit::new().recolor(LabelColor::Reef);
            assert_eq!(edit.color, Some(LabelColor::Reef));
            assert!(edit.name.is_none());
            assert!(LabelEdit::new().is_empty());
        }
    }
}
