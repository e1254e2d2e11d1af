//! Tag lookup over parsed HTML.
//!
//! A [`TagQuery`] names a tag and any number of attribute constraints. Each
//! constraint is either an exact string or a regular expression, and both are
//! checked through [`AttrMatcher::matches`]. Lookups only consider descendants
//! of the node they start from, never the node itself.

use crate::error::{Result, ScanError};
use regex::Regex;
use scraper::ElementRef;
use std::backtrace::Backtrace;
use std::fmt;
use tracing::error;

/// Attributes whose value is a whitespace separated list of tokens.
const MULTI_VALUED_ATTRS: &[&str] = &["class", "rel", "rev", "headers", "accesskey"];

#[derive(Debug, Clone)]
pub enum AttrMatcher {
    Exact(String),
    Pattern(Regex),
}

impl AttrMatcher {
    /// Exact matchers compare the whole value; patterns search anywhere in it.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            AttrMatcher::Exact(expected) => value == expected,
            AttrMatcher::Pattern(pattern) => pattern.is_match(value),
        }
    }
}

impl From<&str> for AttrMatcher {
    fn from(value: &str) -> Self {
        AttrMatcher::Exact(value.to_string())
    }
}

impl From<Regex> for AttrMatcher {
    fn from(pattern: Regex) -> Self {
        AttrMatcher::Pattern(pattern)
    }
}

impl fmt::Display for AttrMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrMatcher::Exact(value) => write!(f, "{:?}", value),
            AttrMatcher::Pattern(pattern) => write!(f, "/{}/", pattern.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TagQuery {
    tag: String,
    attrs: Vec<(String, AttrMatcher)>,
}

impl TagQuery {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &str, matcher: impl Into<AttrMatcher>) -> Self {
        self.attrs.push((name.to_string(), matcher.into()));
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The attribute constraints rendered for diagnostics, e.g. `{id="main"}`.
    pub fn describe_attrs(&self) -> String {
        let parts: Vec<String> = self
            .attrs
            .iter()
            .map(|(name, matcher)| format!("{}={}", name, matcher))
            .collect();
        format!("{{{}}}", parts.join(", "))
    }

    pub fn matches(&self, element: &ElementRef) -> bool {
        let value = element.value();
        if value.name() != self.tag {
            return false;
        }

        self.attrs.iter().all(|(name, matcher)| {
            let Some(attr_value) = value.attr(name) else {
                return false;
            };
            if matcher.matches(attr_value) {
                return true;
            }
            MULTI_VALUED_ATTRS.contains(&name.as_str())
                && attr_value.split_whitespace().any(|token| matcher.matches(token))
        })
    }
}

impl fmt::Display for TagQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> {}", self.tag, self.describe_attrs())
    }
}

/// First descendant of `node` matching `query`.
///
/// A miss is logged with a backtrace and returned as [`ScanError::TagNotFound`].
pub fn find_tag<'a>(node: ElementRef<'a>, query: &TagQuery) -> Result<ElementRef<'a>> {
    match descendant_elements(node).find(|element| query.matches(element)) {
        Some(element) => Ok(element),
        None => {
            error!(
                tag = %query.tag(),
                attrs = %query.describe_attrs(),
                backtrace = %Backtrace::force_capture(),
                "Tag not found"
            );
            Err(ScanError::TagNotFound {
                tag: query.tag().to_string(),
                attrs: query.describe_attrs(),
            })
        }
    }
}

/// Every descendant of `node` matching `query`, in document order.
pub fn find_all<'a>(node: ElementRef<'a>, query: &TagQuery) -> Vec<ElementRef<'a>> {
    descendant_elements(node)
        .filter(|element| query.matches(element))
        .collect()
}

/// Concatenated text of an element and all its descendants.
pub fn text_of(element: &ElementRef) -> String {
    element.text().collect()
}

/// Text of an element with runs of whitespace collapsed to single spaces.
pub fn normalized_text(element: &ElementRef) -> String {
    text_of(element).split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parent element of the first text node under `node` whose trimmed content
/// equals `text`.
pub fn find_text_parent<'a>(node: ElementRef<'a>, text: &str) -> Option<ElementRef<'a>> {
    node.descendants()
        .find(|n| {
            n.value()
                .as_text()
                .is_some_and(|t| t.trim() == text)
        })
        .and_then(|n| n.parent())
        .and_then(ElementRef::wrap)
}

/// First following sibling of `element` with the given tag name.
pub fn next_sibling_tag<'a>(element: &ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    element
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sibling| sibling.value().name() == tag)
}

fn descendant_elements<'a>(node: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    node.descendants().skip(1).filter_map(ElementRef::wrap)
}
