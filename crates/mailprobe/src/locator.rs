//! Locator abstraction for element selection.
//!
//! A [`Locator`] is a lazy query descriptor: building one never touches the DOM,
//! and every action re-resolves it against the live page. That keeps page
//! objects valid across re-renders and lets locator sets be built once per
//! page object.
//!
//! Resolution semantics (shared by the CDP driver and the simulated DOM):
//!
//! - the root selector is evaluated against the whole document;
//! - descendant steps search strictly inside each current match;
//! - results are de-duplicated and kept in document order;
//! - absence is only an error for actions that need exactly one element.

use std::fmt;
use std::time::Duration;

/// How a single query step finds elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// CSS selector (e.g. `#folderlist ul li`)
    Css(String),
    /// `data-testid` attribute equality
    TestId(String),
    /// `title` attribute equality
    Title(String),
    /// Innermost elements whose normalized text contains the needle
    Text(String),
    /// `placeholder` attribute equality
    Placeholder(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Create an exact title selector
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self::Title(title.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a placeholder selector
    #[must_use]
    pub fn placeholder(placeholder: impl Into<String>) -> Self {
        Self::Placeholder(placeholder.into())
    }

    /// JS expression finding all matches below `scope`
    fn to_find_js(&self, scope: &str) -> String {
        match self {
            Self::Css(css) => format!("Array.from({scope}.querySelectorAll({}))", js_str(css)),
            Self::TestId(id) => format!(
                "Array.from({scope}.querySelectorAll({}))",
                js_str(&format!("[data-testid={}]", js_str(id)))
            ),
            Self::Title(title) => format!(
                "Array.from({scope}.querySelectorAll('[title]')).filter(e => e.getAttribute('title') === {})",
                js_str(title)
            ),
            Self::Placeholder(placeholder) => format!(
                "Array.from({scope}.querySelectorAll('[placeholder]')).filter(e => e.getAttribute('placeholder') === {})",
                js_str(placeholder)
            ),
            Self::Text(text) => format!("__innermost({scope}, {})", js_str(text)),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::TestId(s) => write!(f, "testid={s}"),
            Self::Title(s) => write!(f, "title={s}"),
            Self::Text(s) => write!(f, "text={s}"),
            Self::Placeholder(s) => write!(f, "placeholder={s}"),
        }
    }
}

/// A refinement applied to the current match set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Search inside each match
    Descendant(Selector),
    /// Move to each match's parent element (`..`)
    Parent,
    /// Keep only the n-th match (zero-based)
    Nth(usize),
    /// Keep matches whose normalized text contains the needle
    HasText(String),
    /// Keep matches whose normalized text equals the needle
    ExactText(String),
    /// Keep matches whose attribute equals the value
    Attribute {
        /// Attribute name
        name: String,
        /// Expected value
        value: String,
    },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Descendant(selector) => write!(f, "{selector}"),
            Self::Parent => write!(f, ".."),
            Self::Nth(n) => write!(f, "nth={n}"),
            Self::HasText(t) => write!(f, "has-text={t}"),
            Self::ExactText(t) => write!(f, "exact-text={t}"),
            Self::Attribute { name, value } => write!(f, "[{name}={value}]"),
        }
    }
}

/// A lazy, re-evaluated query for zero or more elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    root: Selector,
    steps: Vec<Step>,
    timeout: Option<Duration>,
}

impl Locator {
    /// Create a locator from a selector
    #[must_use]
    pub const fn from_selector(root: Selector) -> Self {
        Self {
            root,
            steps: Vec::new(),
            timeout: None,
        }
    }

    /// Create a locator with a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::from_selector(Selector::css(selector))
    }

    /// Create a locator matching `data-testid`
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::from_selector(Selector::test_id(id))
    }

    /// Create a locator matching an exact `title`
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self::from_selector(Selector::title(title))
    }

    /// Create a locator matching visible text
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::from_selector(Selector::text(text))
    }

    /// Create a locator matching an exact `placeholder`
    #[must_use]
    pub fn placeholder(placeholder: impl Into<String>) -> Self {
        Self::from_selector(Selector::placeholder(placeholder))
    }

    fn push(&self, step: Step) -> Self {
        let mut next = self.clone();
        next.steps.push(step);
        next
    }

    /// Search for a CSS selector inside each match
    #[must_use]
    pub fn locator(&self, css: impl Into<String>) -> Self {
        self.push(Step::Descendant(Selector::css(css)))
    }

    /// Search for a `data-testid` inside each match
    #[must_use]
    pub fn get_by_test_id(&self, id: impl Into<String>) -> Self {
        self.push(Step::Descendant(Selector::test_id(id)))
    }

    /// Search for an exact `title` inside each match
    #[must_use]
    pub fn get_by_title(&self, title: impl Into<String>) -> Self {
        self.push(Step::Descendant(Selector::title(title)))
    }

    /// Search for text inside each match
    #[must_use]
    pub fn get_by_text(&self, text: impl Into<String>) -> Self {
        self.push(Step::Descendant(Selector::text(text)))
    }

    /// Move to the parent of each match
    #[must_use]
    pub fn parent(&self) -> Self {
        self.push(Step::Parent)
    }

    /// Keep only the n-th match
    #[must_use]
    pub fn nth(&self, index: usize) -> Self {
        self.push(Step::Nth(index))
    }

    /// Keep only the first match
    #[must_use]
    pub fn first(&self) -> Self {
        self.nth(0)
    }

    /// Keep matches containing the text
    #[must_use]
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        self.push(Step::HasText(text.into()))
    }

    /// Keep matches whose whole text equals the given text
    #[must_use]
    pub fn with_exact_text(&self, text: impl Into<String>) -> Self {
        self.push(Step::ExactText(text.into()))
    }

    /// Keep matches whose attribute equals the value
    #[must_use]
    pub fn with_attribute(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(Step::Attribute {
            name: name.into(),
            value: value.into(),
        })
    }

    /// Override the auto-wait timeout for this locator
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The root selector
    #[must_use]
    pub const fn root(&self) -> &Selector {
        &self.root
    }

    /// The refinement steps, in application order
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Per-locator timeout override
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Compile into a JS expression evaluating to the matched element array.
    #[must_use]
    pub fn to_js(&self) -> String {
        let mut js = String::from("(() => {\n");
        js.push_str(JS_PRELUDE);
        js.push_str(&format!(
            "  let els = __order({});\n",
            self.root.to_find_js("document")
        ));
        for step in &self.steps {
            let line = match step {
                Step::Descendant(selector) => format!(
                    "  els = __order(els.flatMap(s => {}));\n",
                    selector.to_find_js("s")
                ),
                Step::Parent => {
                    "  els = __order(els.map(e => e.parentElement).filter(Boolean));\n".to_string()
                }
                Step::Nth(n) => format!("  els = els.length > {n} ? [els[{n}]] : [];\n"),
                Step::HasText(t) => {
                    format!("  els = els.filter(e => __text(e).includes({}));\n", js_str(t))
                }
                Step::ExactText(t) => {
                    format!("  els = els.filter(e => __text(e) === {});\n", js_str(t))
                }
                Step::Attribute { name, value } => format!(
                    "  els = els.filter(e => e.getAttribute({}) === {});\n",
                    js_str(name),
                    js_str(value)
                ),
            };
            js.push_str(&line);
        }
        js.push_str("  return els;\n})()");
        js
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        for step in &self.steps {
            write!(f, " >> {step}")?;
        }
        Ok(())
    }
}

const JS_PRELUDE: &str = r"  const __text = e => (e.textContent || '').replace(/\s+/g, ' ').trim();
  const __order = els => Array.from(new Set(els)).sort((a, b) =>
    a === b ? 0 : (a.compareDocumentPosition(b) & Node.DOCUMENT_POSITION_FOLLOWING ? -1 : 1));
  const __innermost = (scope, needle) => {
    const hits = Array.from(scope.querySelectorAll('*:not(script):not(style)'))
      .filter(e => __text(e).includes(needle));
    return hits.filter(e => !hits.some(o => o !== e && e.contains(o)));
  };
";

/// Quote a string as a JS/JSON string literal
pub(crate) fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_owned()).to_string()
}

/// Collapse runs of whitespace and trim, matching the JS `__text` helper
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
