//! Minimal CSS selector engine for the simulated DOM.
//!
//! Supported: type selectors, `*`, `#id`, `.class`, `[attr]`, `[attr=value]`
//! (quoted or bare), compounds of those, the descendant combinator and `>`.

use super::dom::{Dom, NodeId};
use crate::result::{ProbeError, ProbeResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.attrs.is_empty()
    }

    fn matches(&self, dom: &Dom, node: NodeId) -> bool {
        let el = dom.node(node);
        if let Some(tag) = &self.tag {
            if tag != "*" && !tag.eq_ignore_ascii_case(&el.tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self
            .classes
            .iter()
            .all(|c| el.classes().any(|have| have == c))
        {
            return false;
        }
        self.attrs.iter().all(|(name, value)| match value {
            Some(value) => el.attr(name) == Some(value.as_str()),
            None => el.attr(name).is_some(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// A parsed selector: compounds joined by combinators, left to right
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssSelector {
    parts: Vec<(Combinator, Compound)>,
}

fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn invalid(input: &str, why: &str) -> ProbeError {
    ProbeError::page(format!("invalid selector {input:?}: {why}"))
}

impl CssSelector {
    /// Parse a selector string
    ///
    /// # Errors
    ///
    /// Returns a page error for unsupported or malformed syntax.
    pub fn parse(input: &str) -> ProbeResult<Self> {
        let chars: Vec<char> = input.chars().collect();
        let mut parts = Vec::new();
        let mut pending: Option<Combinator> = None;
        let mut current = Compound::default();
        let mut i = 0;

        let read_ident = |i: &mut usize| -> String {
            let start = *i;
            while *i < chars.len() && is_ident(chars[*i]) {
                *i += 1;
            }
            chars[start..*i].iter().collect()
        };

        while i < chars.len() {
            let c = chars[i];
            match c {
                ' ' | '\t' | '\n' | '>' => {
                    if !current.is_empty() {
                        parts.push((pending.take().unwrap_or(Combinator::Descendant), current));
                        current = Compound::default();
                        pending = Some(Combinator::Descendant);
                    }
                    if c == '>' {
                        if parts.is_empty() {
                            return Err(invalid(input, "leading combinator"));
                        }
                        pending = Some(Combinator::Child);
                    }
                    i += 1;
                }
                '#' => {
                    i += 1;
                    let id = read_ident(&mut i);
                    if id.is_empty() {
                        return Err(invalid(input, "empty id"));
                    }
                    current.id = Some(id);
                }
                '.' => {
                    i += 1;
                    let class = read_ident(&mut i);
                    if class.is_empty() {
                        return Err(invalid(input, "empty class"));
                    }
                    current.classes.push(class);
                }
                '[' => {
                    i += 1;
                    let name = read_ident(&mut i);
                    if name.is_empty() {
                        return Err(invalid(input, "empty attribute name"));
                    }
                    let value = match chars.get(i) {
                        Some(']') => None,
                        Some('=') => {
                            i += 1;
                            match chars.get(i) {
                                Some(&quote) if quote == '"' || quote == '\'' => {
                                    i += 1;
                                    let start = i;
                                    while i < chars.len() && chars[i] != quote {
                                        i += 1;
                                    }
                                    if i >= chars.len() {
                                        return Err(invalid(input, "unterminated string"));
                                    }
                                    let value: String = chars[start..i].iter().collect();
                                    i += 1;
                                    Some(value)
                                }
                                _ => {
                                    let start = i;
                                    while i < chars.len() && chars[i] != ']' {
                                        i += 1;
                                    }
                                    Some(chars[start..i].iter().collect())
                                }
                            }
                        }
                        _ => return Err(invalid(input, "unsupported attribute operator")),
                    };
                    if chars.get(i) != Some(&']') {
                        return Err(invalid(input, "missing ]"));
                    }
                    i += 1;
                    current.attrs.push((name, value));
                }
                '*' => {
                    current.tag = Some("*".to_string());
                    i += 1;
                }
                c if is_ident(c) => {
                    if current.tag.is_some() {
                        return Err(invalid(input, "two type selectors in one compound"));
                    }
                    current.tag = Some(read_ident(&mut i));
                }
                other => return Err(invalid(input, &format!("unsupported character {other:?}"))),
            }
        }

        if current.is_empty() {
            if pending == Some(Combinator::Child) || parts.is_empty() {
                return Err(invalid(input, "empty selector"));
            }
        } else {
            parts.push((pending.unwrap_or(Combinator::Descendant), current));
        }
        Ok(Self { parts })
    }

    /// Whether `node` matches, with ancestors evaluated against the whole tree
    #[must_use]
    pub fn matches(&self, dom: &Dom, node: NodeId) -> bool {
        self.matches_at(dom, node, self.parts.len() - 1)
    }

    fn matches_at(&self, dom: &Dom, node: NodeId, index: usize) -> bool {
        let (combinator, compound) = &self.parts[index];
        if !compound.matches(dom, node) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match combinator {
            Combinator::Child => dom
                .parent(node)
                .is_some_and(|parent| self.matches_at(dom, parent, index - 1)),
            Combinator::Descendant => dom
                .ancestors(node)
                .any(|ancestor| self.matches_at(dom, ancestor, index - 1)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::sim::dom::El;

    fn tree() -> Dom {
        Dom::build(
            El::new("body").child(
                El::new("div").id("folderlist").child(
                    El::new("div").child(
                        El::new("ul").child(
                            El::new("li").title("Important").child(
                                El::new("ul").child(El::new("li").title("Important/Child")),
                            ),
                        ),
                    ),
                ),
            ),
        )
    }

    fn matching(dom: &Dom, css: &str) -> Vec<String> {
        let selector = CssSelector::parse(css).unwrap();
        dom.ids()
            .filter(|&id| selector.matches(dom, id))
            .filter_map(|id| dom.node(id).attr("title").map(ToString::to_string))
            .collect()
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn test_parse_compound_and_combinators() {
            assert!(CssSelector::parse("#folderlist > div > ul > li").is_ok());
            assert!(CssSelector::parse(".alert-modal-footer button").is_ok());
            assert!(CssSelector::parse("button[data-testid=\"heading:userdropdown\"]").is_ok());
            assert!(CssSelector::parse("[role='alert']").is_ok());
            assert!(CssSelector::parse("input#folder").is_ok());
        }

        #[test]
        fn test_parse_errors() {
            assert!(CssSelector::parse("").is_err());
            assert!(CssSelector::parse("> li").is_err());
            assert!(CssSelector::parse("li >").is_err());
            assert!(CssSelector::parse("li:first-child").is_err());
            assert!(CssSelector::parse("[title=\"x]").is_err());
        }
    }

    mod match_tests {
        use super::*;

        #[test]
        fn test_descendant_matches_all_depths() {
            let dom = tree();
            assert_eq!(
                matching(&dom, "#folderlist ul li"),
                vec!["Important", "Important/Child"]
            );
        }

        #[test]
        fn test_child_combinator_only_top_level() {
            let dom = tree();
            assert_eq!(matching(&dom, "#folderlist > div > ul > li"), vec!["Important"]);
        }

        #[test]
        fn test_attribute_presence_and_value() {
            let dom = tree();
            assert_eq!(matching(&dom, "li[title]").len(), 2);
            assert_eq!(matching(&dom, "[title=\"Important/Child\"]"), vec!["Important/Child"]);
        }
    }
}
