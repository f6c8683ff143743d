//! Order validation.
//!
//! A `Validator` runs every registered `Rule` over a root order and all of its
//! nested legs and collects every violation before answering. Submissions are
//! never failed on the first problem found.

use crate::composer;
use log::warn;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use trading::{Instrument, Order, OrderType};
use uuid::Uuid;

pub mod bracket;
pub mod instrument;
pub mod prices;
pub mod volume;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViolationKind {
    #[error("volume must be a positive number, got {0}")]
    NonPositiveVolume(f64),

    #[error("{0:?} order requires an activation price")]
    MissingActivationPrice(OrderType),

    #[error("{0:?} order requires a price")]
    MissingPrice(OrderType),

    #[error("price must be a positive finite number, got {0}")]
    InvalidPrice(f64),

    #[error("unknown instrument '{0}'")]
    UnknownInstrument(String),

    #[error("bracket has no parent order on instrument '{0}'")]
    OrphanBracket(String),

    #[error("bracket orders cannot be market orders")]
    MarketBracket,
}

/// A single problem with a single order.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub order_id: Uuid,
    pub rule: String,
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order {} ({}): {}", self.order_id, self.rule, self.kind)
    }
}

/// The complete list of violations found in one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    violations: Vec<Violation>,
}

impl Rejection {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} violation(s)", self.violations.len())?;
        for (i, violation) in self.violations.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}", sep, violation)?;
        }
        Ok(())
    }
}

/// Context passed to rules.
pub struct ValidationContext<'a> {
    pub instruments: &'a HashMap<String, Instrument>,
}

/// Visits `order` and every nested leg, depth first.
pub fn walk(order: &Order, visit: &mut dyn FnMut(&Order)) {
    visit(order);
    for leg in order.orders() {
        walk(leg, visit);
    }
}

pub trait Rule: Send + Sync {
    fn name(&self) -> &str;

    fn check(&self, order: &Order, ctx: &ValidationContext) -> Vec<ViolationKind>;

    /// Checks the root order and every nested leg.
    /// Zero-volume orders that only group legs are not checked themselves.
    /// Rules that need to see the whole tree at once should override this.
    fn check_tree(&self, root: &Order, ctx: &ValidationContext) -> Vec<Violation> {
        let mut violations = Vec::new();
        walk(root, &mut |order| {
            if composer::is_container(order) {
                return;
            }
            for kind in self.check(order, ctx) {
                violations.push(Violation {
                    order_id: order.id(),
                    rule: self.name().to_string(),
                    kind,
                });
            }
        });
        violations
    }
}

pub struct Validator {
    rules: Vec<Box<dyn Rule>>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::standard()
    }
}

impl Validator {
    /// A validator with no rules. Everything passes.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Volume, price, instrument and bracket checks.
    pub fn standard() -> Self {
        let mut validator = Self::new();
        validator.add_rule(Box::new(volume::VolumeRule));
        validator.add_rule(Box::new(prices::PriceRule));
        validator.add_rule(Box::new(instrument::InstrumentRule));
        validator.add_rule(Box::new(bracket::BracketRule));
        validator
    }

    pub fn add_rule(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn validate(&self, root: &Order, ctx: &ValidationContext) -> Result<(), Rejection> {
        let violations: Vec<Violation> = self
            .rules
            .iter()
            .flat_map(|rule| rule.check_tree(root, ctx))
            .collect();

        if violations.is_empty() {
            return Ok(());
        }

        for violation in &violations {
            warn!("Submission {} rejected: {}", root.id(), violation);
        }
        Err(Rejection::new(violations))
    }
}
