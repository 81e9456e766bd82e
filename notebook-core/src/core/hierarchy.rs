//! Linearizes a Note File's subset links into an indented display order.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One row of the display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyEntry {
    pub note_id: String,
    /// Nesting level; top-level notes are 0.
    pub depth: usize,
    /// 1-based row number in display order.
    pub sequence: usize,
}

/// Builds the depth-first display order of a Note File.
///
/// `order` is the file's id list. `parents` maps every loadable note to its
/// `parent_id`; ids in `order` with no entry in `parents` could not be loaded
/// and are left out.
///
/// A note is top-level when it has no parent or its parent is not among the
/// loaded notes. Each top-level note is followed by its descendants, children
/// in `order` order, one level deeper per generation. Every id is emitted at
/// most once: a node is marked when it is emitted, and marked nodes are
/// skipped wherever else they turn up. Notes caught in a parent cycle have no
/// top-level ancestor; they are appended afterwards as top-level rows so that
/// every loaded note still appears exactly once.
#[must_use]
pub fn build_hierarchy(
    order: &[String],
    parents: &HashMap<String, Option<String>>,
) -> Vec<HierarchyEntry> {
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut seen_in_order: HashSet<&str> = HashSet::new();
    for id in order {
        if !seen_in_order.insert(id.as_str()) {
            continue;
        }
        if let Some(Some(parent)) = parents.get(id) {
            children.entry(parent.as_str()).or_default().push(id.as_str());
        }
    }

    let is_top_level = |id: &str| match parents.get(id) {
        Some(Some(parent)) => !parents.contains_key(parent),
        Some(None) => true,
        None => false,
    };

    let mut visited: HashSet<&str> = HashSet::new();
    let mut out: Vec<HierarchyEntry> = Vec::new();

    let roots = order
        .iter()
        .map(String::as_str)
        .filter(|id| is_top_level(*id))
        .collect::<Vec<_>>();
    for root in roots {
        emit_subtree(root, &children, &mut visited, &mut out);
    }

    // Whatever is left is only reachable through a cycle.
    for id in order {
        if parents.contains_key(id) && !visited.contains(id.as_str()) {
            log::warn!("Note {id} is part of a parent cycle; showing it at top level");
            emit_subtree(id, &children, &mut visited, &mut out);
        }
    }

    out
}

fn emit_subtree<'a>(
    root: &'a str,
    children: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    out: &mut Vec<HierarchyEntry>,
) {
    let mut stack: Vec<(&str, usize)> = vec![(root, 0)];
    while let Some((id, depth)) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        out.push(HierarchyEntry {
            note_id: id.to_string(),
            depth,
            sequence: out.len() + 1,
        });
        if let Some(kids) = children.get(id) {
            stack.extend(kids.iter().rev().map(|kid| (*kid, depth + 1)));
        }
    }
}
