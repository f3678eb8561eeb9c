//! Slot resolution.
//!
//! Matches content supplied by the caller of a component (the
//! *slottables*) to the `<slot>` placeholders in the component's own
//! markup (the *receivers*). Matching is purely structural:
//!
//! - a slottable with a `slot="x"` attribute goes to `<slot name="x">`;
//! - everything else goes to the unnamed `<slot>`, followed by named
//!   content whose receiver does not exist;
//! - without an unnamed receiver that remainder is dropped.
//!
//! Slots nested inside a slot, or inside an already expanded component,
//! are not receivers.

use std::convert::Infallible;

use indexmap::IndexMap;

use crate::tree::{walk_all, Node, Tag, Visit};

/// Name of the placeholder element.
pub const SLOT_TAG: &str = "slot";

/// Receivers found in a component's markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotReceivers {
    /// Names of the named receivers, in document order.
    pub named: Vec<String>,
    /// Whether an unnamed receiver exists.
    pub unnamed: bool,
}

impl SlotReceivers {
    /// Returns true if a named receiver exists.
    pub fn has_named(&self, name: &str) -> bool {
        self.named.iter().any(|n| n == name)
    }
}

/// Result of [`resolve_slots`].
#[derive(Debug, Clone, PartialEq)]
pub struct SlotResolution {
    /// The receivers with slot content filled in.
    pub nodes: Vec<Node>,
    /// Caller content that had nowhere to go.
    pub dropped: Vec<Node>,
}

fn slot_name(tag: &Tag) -> Option<&str> {
    tag.attribute("name").filter(|name| !name.is_empty())
}

fn is_receiver(tag: &Tag) -> bool {
    tag.name().eq_ignore_ascii_case(SLOT_TAG)
}

fn into_ok<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

/// Locates the slot receivers in `nodes`.
pub fn find_receivers(nodes: &[Node]) -> SlotReceivers {
    let mut receivers = SlotReceivers::default();
    let mut handler = |node: &Node| -> Result<Visit, Infallible> {
        Ok(match node {
            Node::Element(tag) if is_receiver(tag) => {
                match slot_name(tag) {
                    Some(name) => {
                        if !receivers.has_named(name) {
                            receivers.named.push(name.to_string());
                        }
                    }
                    None => receivers.unnamed = true,
                }
                Visit::Stop(node.clone())
            }
            Node::Element(tag) if tag.is_expanded() => Visit::Stop(node.clone()),
            other => Visit::Continue(other.clone()),
        })
    };
    into_ok(walk_all(nodes, &mut handler));
    receivers
}

/// Distributes `slottables` into the slot receivers of `receivers`.
///
/// Each named receiver gets every slottable addressed to it, in order:
/// caller content naming the same slot twice is placed twice, not dropped.
/// The first unnamed receiver gets the unnamed slottables followed by the
/// named ones without a matching receiver. Receivers that get no content
/// keep their fallback children.
pub fn resolve_slots(receivers: &[Node], slottables: &[Node]) -> SlotResolution {
    let found = find_receivers(receivers);

    let mut named: IndexMap<String, Vec<Node>> = IndexMap::new();
    let mut unnamed = Vec::new();
    let mut unmatched = Vec::new();
    for node in slottables {
        let target = node
            .as_element()
            .and_then(|tag| tag.attribute("slot"))
            .filter(|name| !name.is_empty());
        match target {
            Some(name) if found.has_named(name) => {
                named.entry(name.to_string()).or_default().push(node.clone())
            }
            Some(_) => unmatched.push(node.clone()),
            None => unnamed.push(node.clone()),
        }
    }
    unnamed.extend(unmatched);

    let dropped = if found.unnamed {
        Vec::new()
    } else {
        std::mem::take(&mut unnamed)
    };
    if !dropped.is_empty() {
        tracing::warn!(
            count = dropped.len(),
            "caller content dropped: no unnamed slot to receive it"
        );
    }

    let mut unnamed = Some(unnamed);
    let mut handler = |node: &Node| -> Result<Visit, Infallible> {
        Ok(match node {
            Node::Element(tag) if is_receiver(tag) => {
                let content = match slot_name(tag) {
                    Some(name) => named.shift_remove(name),
                    None => unnamed.take(),
                };
                match content {
                    Some(children) if !children.is_empty() => {
                        Visit::Stop(Node::Element(tag.with_children(children)))
                    }
                    _ => Visit::Stop(node.clone()),
                }
            }
            Node::Element(tag) if tag.is_expanded() => Visit::Stop(node.clone()),
            other => Visit::Continue(other.clone()),
        })
    };
    let nodes = into_ok(walk_all(receivers, &mut handler));

    SlotResolution { nodes, dropped }
}
