//! Element matcher: resolves an [`ElementSelector`] against a view hierarchy.

use regex::{Regex, RegexBuilder};
use trailblaze_core_types::{ElementSelector, ViewHierarchyTreeNode};

use crate::errors::ActionError;

/// Result of resolving a selector against one hierarchy snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementMatches {
    NoMatches,
    SingleMatch(ViewHierarchyTreeNode),
    MultipleMatches(Vec<ViewHierarchyTreeNode>),
}

impl ElementMatches {
    fn from_nodes(mut nodes: Vec<ViewHierarchyTreeNode>) -> Self {
        match nodes.len() {
            0 => ElementMatches::NoMatches,
            1 => nodes
                .pop()
                .map_or(ElementMatches::NoMatches, ElementMatches::SingleMatch),
            _ => ElementMatches::MultipleMatches(nodes),
        }
    }

    /// Deterministic pick: the single match, or the first of several.
    pub fn first(&self) -> Option<&ViewHierarchyTreeNode> {
        match self {
            ElementMatches::NoMatches => None,
            ElementMatches::SingleMatch(node) => Some(node),
            ElementMatches::MultipleMatches(nodes) => nodes.first(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ElementMatches::NoMatches => 0,
            ElementMatches::SingleMatch(_) => 1,
            ElementMatches::MultipleMatches(nodes) => nodes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Selector with its regexes compiled once.
///
/// Patterns must match the whole value (case-insensitive, `.` matches newlines).
/// A value that equals the raw pattern also matches, so literal texts
/// containing regex metacharacters still resolve.
#[derive(Debug, Clone)]
pub struct CompiledSelector {
    text: Option<(String, Regex)>,
    id: Option<(String, Regex)>,
    index: Option<usize>,
}

impl CompiledSelector {
    pub fn compile(selector: &ElementSelector) -> Result<Self, ActionError> {
        if selector.is_empty() {
            return Err(ActionError::InvalidSelector(
                "selector needs a text or id regex".to_string(),
            ));
        }

        Ok(Self {
            text: selector.text_regex.as_deref().map(compile_full).transpose()?,
            id: selector.id_regex.as_deref().map(compile_full).transpose()?,
            index: selector.index,
        })
    }

    fn matches_node(&self, node: &ViewHierarchyTreeNode) -> bool {
        if node.bounds.is_none() {
            return false;
        }

        if let Some((raw, regex)) = &self.text {
            if !node
                .text_candidates()
                .any(|value| value == raw || regex.is_match(value))
            {
                return false;
            }
        }

        if let Some((raw, regex)) = &self.id {
            match node.resource_id.as_deref() {
                Some(id) if id == raw || regex.is_match(id) => {}
                _ => return false,
            }
        }

        true
    }

    pub fn find_matches(&self, root: &ViewHierarchyTreeNode) -> ElementMatches {
        let mut nodes: Vec<ViewHierarchyTreeNode> = root
            .iter()
            .filter(|node| self.matches_node(node))
            .map(strip_children)
            .collect();

        match self.index {
            None => ElementMatches::from_nodes(nodes),
            Some(index) => {
                nodes.sort_by_key(|node| node.bounds.map(|b| (b.y1, b.x1)));
                if index < nodes.len() {
                    ElementMatches::SingleMatch(nodes.swap_remove(index))
                } else {
                    ElementMatches::NoMatches
                }
            }
        }
    }
}

fn compile_full(pattern: &str) -> Result<(String, Regex), ActionError> {
    RegexBuilder::new(&format!("^(?:{})$", pattern))
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .map(|regex| (pattern.to_string(), regex))
        .map_err(|err| ActionError::InvalidSelector(format!("{}: {}", pattern, err)))
}

fn strip_children(node: &ViewHierarchyTreeNode) -> ViewHierarchyTreeNode {
    ViewHierarchyTreeNode {
        children: Vec::new(),
        ..node.clone()
    }
}

/// Resolves selectors against hierarchy snapshots.
pub trait ElementMatcher: Send + Sync {
    fn find_matches(
        &self,
        root: &ViewHierarchyTreeNode,
        selector: &ElementSelector,
    ) -> Result<ElementMatches, ActionError>;
}

/// Default matcher backed by [`CompiledSelector`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexElementMatcher;

impl ElementMatcher for RegexElementMatcher {
    fn find_matches(
        &self,
        root: &ViewHierarchyTreeNode,
        selector: &ElementSelector,
    ) -> Result<ElementMatches, ActionError> {
        Ok(CompiledSelector::compile(selector)?.find_matches(root))
    }
}
