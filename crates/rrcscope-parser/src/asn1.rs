//! Indentation-driven parser for ASN.1 value notation.
//!
//! The modem renders decoded RRC messages as value notation with two-space
//! indentation, e.g.
//!
//! ```text
//! value DL-DCCH-Message ::=
//! {
//!   message c1 : rrcConnectionReconfiguration :
//!       {
//!         rrc-TransactionIdentifier 1,
//!         ...
//! ```
//!
//! There is no schema. Every line is flattened into a chain of keys (the
//! `key value` pair and CHOICE selections `a : b :` alike), nesting comes from
//! indentation alone, and a post-pass decides which mappings were really
//! lists.
//!
//! Nodes live in a flat arena and the open-scope stack holds arena indices,
//! so the tree is built top-down without shared ownership.

use rrcscope_core::prelude::*;
use rrcscope_core::TreeValue;

use crate::classify::ASSIGNMENT;

/// Result of parsing one value-notation block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTree {
    /// `Mapping` with the root key as its sole entry
    pub value: TreeValue,

    /// Lines consumed from the starting offset, including the root line and
    /// anything skipped before it
    pub consumed: usize,
}

impl ParsedTree {
    /// Name of the root (the type name on the `::=` line)
    pub fn root_key(&self) -> Option<&str> {
        self.value.first_key()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Line-level helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Indentation level of a line, `None` for blank lines
///
/// Two whitespace characters per level, rounded down.
pub fn indent_level(line: &str) -> Option<usize> {
    if line.trim().is_empty() {
        return None;
    }
    Some(line.chars().take_while(|c| c.is_whitespace()).count() / 2)
}

/// Split a line into the chain of keys it contributes
///
/// Braces are dropped along with one trailing comma, then the line is split
/// on `:` and each segment on its first space, so
/// `criticalExtensions c1 : rrcConnectionReconfiguration-r8 :` yields
/// `["criticalExtensions", "c1", "rrcConnectionReconfiguration-r8"]`.
pub fn tokenize_line(line: &str) -> Vec<String> {
    let cleaned: String = line.chars().filter(|c| !matches!(c, '{' | '}')).collect();
    let trimmed = cleaned.trim();
    let trimmed = trimmed.strip_suffix(',').unwrap_or(trimmed);

    let mut tokens = Vec::new();
    for segment in trimmed.split(':').map(str::trim).filter(|s| !s.is_empty()) {
        match segment.split_once(' ') {
            Some((head, rest)) => {
                tokens.push(head.to_string());
                tokens.push(rest.trim_start().to_string());
            }
            None => tokens.push(segment.to_string()),
        }
    }
    tokens
}

fn is_closing_brace_line(line: &str) -> bool {
    line.trim_start().starts_with('}')
}

// ─────────────────────────────────────────────────────────────────────────────
// Arena
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Node {
    children: Vec<(String, usize)>,

    /// Positional filler inserted for an anonymous list element
    synthetic: bool,
}

#[derive(Debug, Default)]
struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    fn alloc(&mut self, synthetic: bool) -> usize {
        self.nodes.push(Node {
            children: Vec::new(),
            synthetic,
        });
        self.nodes.len() - 1
    }

    /// Attach a fresh node under `parent`; an existing key is replaced in
    /// place, dropping its previous subtree
    fn insert_child(&mut self, parent: usize, key: String, synthetic: bool) -> usize {
        let child = self.alloc(synthetic);
        let children = &mut self.nodes[parent].children;
        match children.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = child,
            None => children.push((key, child)),
        }
        child
    }

    fn child_count(&self, node: usize) -> usize {
        self.nodes[node].children.len()
    }

    /// Convert a subtree before reclassification
    ///
    /// A node whose children are all positional fillers is a list already.
    fn to_raw(&self, node: usize) -> TreeValue {
        let children = &self.nodes[node].children;
        let all_synthetic =
            !children.is_empty() && children.iter().all(|(_, c)| self.nodes[*c].synthetic);

        if all_synthetic {
            TreeValue::List(children.iter().map(|(_, c)| self.to_raw(*c)).collect())
        } else {
            TreeValue::Mapping(
                children
                    .iter()
                    .map(|(k, c)| (k.clone(), self.to_raw(*c)))
                    .collect(),
            )
        }
    }
}

/// An open scope on the assembly stack
#[derive(Debug, Clone, Copy)]
struct Scope {
    level: usize,
    node: usize,
    synthetic: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Parser
// ─────────────────────────────────────────────────────────────────────────────

/// Parse one value-notation block starting at `offset`
///
/// Parsing stops at the first content line indented at or above the root
/// line's level; that line is not consumed, so callers resume from
/// `offset + consumed`.
///
/// # Errors
/// [`Error::StructuralParse`] if the root line does not split into exactly
/// two tokens (`value <TypeName> ::=`) or no root line exists.
pub fn parse_tree<S: AsRef<str>>(lines: &[S], offset: usize) -> Result<ParsedTree> {
    let mut i = offset;

    let (root_key, root_level) = loop {
        let Some(line) = lines.get(i) else {
            return Err(Error::structural("", "no value-notation root line"));
        };
        i += 1;

        let normalized = line.as_ref().replace(ASSIGNMENT, " ");
        let mut tokens = tokenize_line(&normalized);
        if tokens.is_empty() {
            continue;
        }
        if tokens.len() != 2 {
            return Err(Error::structural(
                line.as_ref().trim(),
                format!("root line has {} token(s), expected 2", tokens.len()),
            ));
        }
        let key = tokens.swap_remove(1);
        break (key, indent_level(&normalized).unwrap_or(0));
    };

    let mut arena = Arena::default();
    let root = arena.alloc(false);
    let mut stack = vec![Scope {
        level: root_level,
        node: root,
        synthetic: false,
    }];

    while let Some(line) = lines.get(i) {
        let line = line.as_ref();
        let Some(mut level) = indent_level(line) else {
            i += 1;
            continue;
        };

        let tokens = tokenize_line(line);
        if tokens.is_empty() {
            if is_closing_brace_line(line) {
                close_list_elements(&mut stack, level);
            }
            i += 1;
            continue;
        }

        while stack.last().is_some_and(|s| s.level >= level) {
            stack.pop();
        }
        if stack.is_empty() {
            // Remaining lines belong to the enclosing block
            break;
        }

        // Anonymous elements sit more than one level below their list
        while let Some(top) = stack.last().copied() {
            if level <= top.level + 1 {
                break;
            }
            let key = arena.child_count(top.node).to_string();
            let filler = arena.insert_child(top.node, key, true);
            stack.push(Scope {
                level: top.level + 1,
                node: filler,
                synthetic: true,
            });
        }

        for token in tokens {
            let Some(parent) = stack.last().map(|s| s.node) else {
                break;
            };
            let child = arena.insert_child(parent, token, false);
            stack.push(Scope {
                level,
                node: child,
                synthetic: false,
            });
            level += 1;
        }
        i += 1;
    }

    let root_value = reclassify(arena.to_raw(root));
    trace!("parsed value-notation block {} ({} lines)", root_key, i - offset);

    Ok(ParsedTree {
        value: TreeValue::Mapping(vec![(root_key, root_value)]),
        consumed: i - offset,
    })
}

/// Parse a standalone value-notation text
pub fn parse_value_notation(text: &str) -> Result<TreeValue> {
    let lines: Vec<&str> = text.lines().collect();
    parse_tree(&lines, 0).map(|parsed| parsed.value)
}

/// Close anonymous list elements ended by a `}` line at `level`
fn close_list_elements(stack: &mut Vec<Scope>, level: usize) {
    while stack.iter().any(|s| s.synthetic && s.level >= level) {
        stack.pop();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reclassification
// ─────────────────────────────────────────────────────────────────────────────

/// Decide which mappings are really lists, bottom-up
///
/// Every key is created with an empty mapping as its value, so an empty
/// mapping child marks a bare scalar. A mapping with at least one such child
/// becomes a list: bare keys turn into leaves, the other keys into
/// single-entry mappings. Any list left with one element collapses into that
/// element.
///
/// Idempotent: `reclassify(reclassify(v)) == reclassify(v)`.
pub fn reclassify(value: TreeValue) -> TreeValue {
    match value {
        TreeValue::Leaf(_) => value,
        TreeValue::List(items) => collapse(items.into_iter().map(reclassify).collect()),
        TreeValue::Mapping(entries) => {
            let entries: Vec<(String, TreeValue)> = entries
                .into_iter()
                .map(|(k, v)| (k, reclassify(v)))
                .collect();

            if entries.iter().any(|(_, v)| v.is_empty_mapping()) {
                collapse(
                    entries
                        .into_iter()
                        .map(|(k, v)| {
                            if v.is_empty_mapping() {
                                TreeValue::Leaf(k)
                            } else {
                                TreeValue::Mapping(vec![(k, v)])
                            }
                        })
                        .collect(),
                )
            } else {
                TreeValue::Mapping(entries)
            }
        }
    }
}

fn collapse(items: Vec<TreeValue>) -> TreeValue {
    match <[TreeValue; 1]>::try_from(items) {
        Ok([only]) => only,
        Err(items) => TreeValue::List(items),
    }
}
