use super::{walk, Rule, ValidationContext, Violation, ViolationKind};
use crate::composer;
use trading::{Order, OrderType};

/// Bracket legs need a parent to attach to and must be conditional orders.
pub struct BracketRule;

impl BracketRule {
    /// Every bracket leg must find a parent among the primaries of the order
    /// it is nested under.
    fn check_parents(&self, node: &Order, violations: &mut Vec<Violation>) {
        let parents = composer::primaries(node);
        for leg in node.orders() {
            if !leg.is_brace() {
                self.check_parents(leg, violations);
            } else if composer::find_parent(parents.iter().copied(), leg).is_none() {
                violations.push(self.violation(
                    leg,
                    ViolationKind::OrphanBracket(leg.instrument().to_string()),
                ));
            }
        }
    }

    fn violation(&self, order: &Order, kind: ViolationKind) -> Violation {
        Violation {
            order_id: order.id(),
            rule: self.name().to_string(),
            kind,
        }
    }
}

impl Rule for BracketRule {
    fn name(&self) -> &str {
        "Bracket"
    }

    fn check(&self, order: &Order, _ctx: &ValidationContext) -> Vec<ViolationKind> {
        if order.is_brace() && order.order_type() == OrderType::Market {
            vec![ViolationKind::MarketBracket]
        } else {
            Vec::new()
        }
    }

    fn check_tree(&self, root: &Order, ctx: &ValidationContext) -> Vec<Violation> {
        let mut violations = Vec::new();
        walk(root, &mut |order| {
            for kind in self.check(order, ctx) {
                violations.push(self.violation(order, kind));
            }
        });

        self.check_parents(root, &mut violations);
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use trading::{Instruction, Side};

    #[test]
    fn test_orphan_bracket() {
        let instruments = HashMap::new();
        let ctx = ValidationContext {
            instruments: &instruments,
        };
        let brace = Order::stop("Y", Side::Sell, 1.0, 90.0).with_instruction(Instruction::Brace);
        let root = Order::market("X", Side::Buy, 1.0).with_order(brace.clone());

        let violations = BracketRule.check_tree(&root, &ctx);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].order_id, brace.id());
        assert_eq!(violations[0].kind, ViolationKind::OrphanBracket("Y".into()));
    }

    #[test]
    fn test_market_bracket() {
        let instruments = HashMap::new();
        let ctx = ValidationContext {
            instruments: &instruments,
        };
        let brace = Order::market("X", Side::Sell, 1.0).with_instruction(Instruction::Brace);
        let root = Order::market("X", Side::Buy, 1.0).with_order(brace);

        let violations = BracketRule.check_tree(&root, &ctx);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::MarketBracket);
    }
}
