//! Expands a submitted order tree into primitive orders.
//!
//! Pure functions only: nothing here touches an account.

use log::warn;
use trading::Order;

/// A zero-volume order that only exists to group legs.
pub fn is_container(order: &Order) -> bool {
    order.volume() == 0.0 && !order.orders().is_empty()
}

/// Orders in `node`'s subtree that become independently active: `node` itself
/// when it carries volume, plus every non-bracket leg, recursively.
pub fn primaries(node: &Order) -> Vec<&Order> {
    let mut found = Vec::new();
    if node.volume() != 0.0 {
        found.push(node);
    }
    for leg in node.orders().iter().filter(|leg| !leg.is_brace()) {
        found.extend(primaries(leg));
    }
    found
}

/// Index of the candidate a bracket leg attaches to.
///
/// The parent must trade the same instrument. A candidate on the opposite side
/// is preferred since a bracket normally closes the position its parent opens.
pub fn find_parent<'a, I>(candidates: I, leg: &Order) -> Option<usize>
where
    I: IntoIterator<Item = &'a Order>,
{
    let mut fallback = None;
    for (i, candidate) in candidates.into_iter().enumerate() {
        if candidate.instrument() != leg.instrument() {
            continue;
        }
        if candidate.side() == leg.side().opposite() {
            return Some(i);
        }
        fallback.get_or_insert(i);
    }
    fallback
}

/// Flattens `root` into primitive orders, each still carrying its brackets.
///
/// The result is in submission order: the root first (when it has volume),
/// then its legs depth first.
pub fn compose(root: &Order) -> Vec<Order> {
    let mut node = root.clone();
    let legs = node.take_orders();

    let mut composed = Vec::new();
    if node.volume() != 0.0 {
        composed.push(node);
    }

    let mut braces = Vec::new();
    for leg in legs {
        if leg.is_brace() {
            braces.push(leg);
        } else {
            composed.extend(compose(&leg));
        }
    }

    for brace in braces {
        match find_parent(composed.iter(), &brace) {
            Some(i) => composed[i].push_order(brace),
            None => warn!(
                "Dropping bracket {} on {}: no parent order",
                brace.id(),
                brace.instrument()
            ),
        }
    }

    composed
}
