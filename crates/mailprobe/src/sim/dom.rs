//! Tiny element tree with locator resolution.
//!
//! Node ids are assigned depth-first while building, so id order is document
//! order.

use super::app::{Action, Field};
use super::selector::CssSelector;
use crate::locator::{normalize_text, Locator, Selector, Step};
use crate::result::{ProbeError, ProbeResult};
use std::collections::{BTreeMap, BTreeSet};

/// Index of a node in its [`Dom`]
pub type NodeId = usize;

/// A rendered element
#[derive(Debug, Clone, Default)]
pub struct Element {
    /// Tag name
    pub tag: String,
    /// Attributes (`id` and `class` included)
    pub attrs: BTreeMap<String, String>,
    /// Own text, placed before the children's text
    pub text: String,
    /// Computed style properties
    pub styles: BTreeMap<String, String>,
    /// Hidden elements hide their whole subtree
    pub hidden: bool,
    /// Checkbox state
    pub checked: bool,
    /// What a click on this element (or a descendant) does
    pub action: Option<Action>,
    /// Input binding for `fill`
    pub field: Option<Field>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    /// Attribute value
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Class list
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }
}

/// Element builder
#[derive(Debug, Clone)]
pub struct El {
    element: Element,
    children: Vec<El>,
}

impl El {
    /// Start an element
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            element: Element {
                tag: tag.to_string(),
                ..Element::default()
            },
            children: Vec::new(),
        }
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.element.attrs.insert(name.to_string(), value.into());
        self
    }

    /// Set `id`
    #[must_use]
    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    /// Set `class`
    #[must_use]
    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    /// Set `title`
    #[must_use]
    pub fn title(self, title: impl Into<String>) -> Self {
        self.attr("title", title)
    }

    /// Set `data-testid`
    #[must_use]
    pub fn test_id(self, id: &str) -> Self {
        self.attr("data-testid", id)
    }

    /// Set own text
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.element.text = text.into();
        self
    }

    /// Set a computed style property
    #[must_use]
    pub fn style(mut self, property: &str, value: impl Into<String>) -> Self {
        self.element.styles.insert(property.to_string(), value.into());
        self
    }

    /// Hide the subtree
    #[must_use]
    pub const fn hidden(mut self, hidden: bool) -> Self {
        self.element.hidden = hidden;
        self
    }

    /// Set checkbox state
    #[must_use]
    pub const fn checked(mut self, checked: bool) -> Self {
        self.element.checked = checked;
        self
    }

    /// Bind a click action
    #[must_use]
    pub fn on_click(mut self, action: Action) -> Self {
        self.element.action = Some(action);
        self
    }

    /// Bind an input field
    #[must_use]
    pub fn field(mut self, field: Field, value: &str) -> Self {
        self.element.field = Some(field);
        self.attr("value", value)
    }

    /// Append a child
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Append children
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }
}

/// A built element tree
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Element>,
}

impl Dom {
    /// Build a tree from its root element
    #[must_use]
    pub fn build(root: El) -> Self {
        let mut dom = Self { nodes: Vec::new() };
        dom.insert(root, None);
        dom
    }

    fn insert(&mut self, el: El, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        let mut element = el.element;
        element.parent = parent;
        self.nodes.push(element);
        for child in el.children {
            let child_id = self.insert(child, Some(id));
            self.nodes[id].children.push(child_id);
        }
        id
    }

    /// All node ids in document order
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        0..self.nodes.len()
    }

    /// Node by id
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Element {
        &self.nodes[id]
    }

    /// Parent of a node
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    /// Ancestors, nearest first
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |&n| self.parent(n))
    }

    fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    fn descendants(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &child in &self.nodes[id].children {
            out.push(child);
            self.descendants(child, out);
        }
    }

    /// Whitespace-normalized text of the subtree
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut raw = String::new();
        self.collect_text(id, &mut raw);
        normalize_text(&raw)
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id];
        out.push_str(&node.text);
        for &child in &node.children {
            self.collect_text(child, out);
        }
    }

    /// Whether the node and all its ancestors are shown
    #[must_use]
    pub fn is_visible(&self, id: NodeId) -> bool {
        !self.nodes[id].hidden && self.ancestors(id).all(|a| !self.nodes[a].hidden)
    }

    /// Nearest action on the node or its ancestors, as a click would bubble
    #[must_use]
    pub fn action_for(&self, id: NodeId) -> Option<Action> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|n| self.nodes[n].action.clone())
    }

    fn find(&self, scope: Option<NodeId>, selector: &Selector) -> ProbeResult<Vec<NodeId>> {
        let candidates: Vec<NodeId> = match scope {
            None => self.ids().collect(),
            Some(scope) => {
                let mut out = Vec::new();
                self.descendants(scope, &mut out);
                out
            }
        };
        let attr_eq = |name: &str, value: &str| -> Vec<NodeId> {
            candidates
                .iter()
                .copied()
                .filter(|&n| self.nodes[n].attr(name) == Some(value))
                .collect()
        };
        Ok(match selector {
            Selector::Css(css) => {
                let parsed = CssSelector::parse(css)?;
                candidates
                    .iter()
                    .copied()
                    .filter(|&n| parsed.matches(self, n))
                    .collect()
            }
            Selector::TestId(id) => attr_eq("data-testid", id),
            Selector::Title(title) => attr_eq("title", title),
            Selector::Placeholder(placeholder) => attr_eq("placeholder", placeholder),
            Selector::Text(needle) => {
                let hits: Vec<NodeId> = candidates
                    .iter()
                    .copied()
                    .filter(|&n| self.text_content(n).contains(needle.as_str()))
                    .collect();
                hits.iter()
                    .copied()
                    .filter(|&n| !hits.iter().any(|&o| o != n && self.is_descendant_of(o, n)))
                    .collect()
            }
        })
    }

    /// Resolve a locator to its matches in document order
    ///
    /// # Errors
    ///
    /// Returns a page error when a CSS selector is malformed.
    pub fn resolve(&self, locator: &Locator) -> ProbeResult<Vec<NodeId>> {
        let mut matches = self.find(None, locator.root())?;
        for step in locator.steps() {
            matches = match step {
                Step::Descendant(selector) => {
                    let mut set = BTreeSet::new();
                    for &scope in &matches {
                        set.extend(self.find(Some(scope), selector)?);
                    }
                    set.into_iter().collect()
                }
                Step::Parent => matches
                    .iter()
                    .filter_map(|&n| self.parent(n))
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect(),
                Step::Nth(index) => matches.get(*index).copied().into_iter().collect(),
                Step::HasText(text) => matches
                    .into_iter()
                    .filter(|&n| self.text_content(n).contains(text.as_str()))
                    .collect(),
                Step::ExactText(text) => matches
                    .into_iter()
                    .filter(|&n| self.text_content(n) == *text)
                    .collect(),
                Step::Attribute { name, value } => matches
                    .into_iter()
                    .filter(|&n| self.nodes[n].attr(name) == Some(value.as_str()))
                    .collect(),
            };
        }
        Ok(matches)
    }

    /// Resolve to exactly one match
    ///
    /// # Errors
    ///
    /// `ElementNotFound` for no match, `StrictModeViolation` for several.
    pub fn single(&self, locator: &Locator) -> ProbeResult<NodeId> {
        let matches = self.resolve(locator)?;
        match matches.as_slice() {
            [] => Err(ProbeError::ElementNotFound {
                locator: locator.to_string(),
            }),
            [one] => Ok(*one),
            many => Err(ProbeError::StrictModeViolation {
                locator: locator.to_string(),
                count: many.len(),
            }),
        }
    }

    /// Resolve to exactly one visible match
    ///
    /// # Errors
    ///
    /// As [`Dom::single`], plus `NotActionable` when the match is hidden.
    pub fn actionable(&self, locator: &Locator) -> ProbeResult<NodeId> {
        let id = self.single(locator)?;
        if self.is_visible(id) {
            Ok(id)
        } else {
            Err(ProbeError::NotActionable {
                locator: locator.to_string(),
                reason: "element is hidden".to_string(),
            })
        }
    }
}
