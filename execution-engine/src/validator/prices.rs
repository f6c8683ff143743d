use super::{Rule, ValidationContext, ViolationKind};
use trading::{Order, OrderType};

/// Conditional orders must carry the prices they trigger and fill at.
///
/// - Stop: an activation price, or a plain price used as the stop level.
/// - Limit: a price.
/// - StopLimit: both.
pub struct PriceRule;

fn check_value(price: Option<f64>, violations: &mut Vec<ViolationKind>) {
    if let Some(price) = price {
        if !price.is_finite() || price <= 0.0 {
            violations.push(ViolationKind::InvalidPrice(price));
        }
    }
}

impl Rule for PriceRule {
    fn name(&self) -> &str {
        "Price"
    }

    fn check(&self, order: &Order, _ctx: &ValidationContext) -> Vec<ViolationKind> {
        let mut violations = Vec::new();
        let kind = order.order_type();

        match kind {
            OrderType::Market => {}
            OrderType::Stop => {
                if order.activation_price().is_none() && order.price().is_none() {
                    violations.push(ViolationKind::MissingActivationPrice(kind));
                }
            }
            OrderType::Limit => {
                if order.price().is_none() {
                    violations.push(ViolationKind::MissingPrice(kind));
                }
            }
            OrderType::StopLimit => {
                if order.activation_price().is_none() {
                    violations.push(ViolationKind::MissingActivationPrice(kind));
                }
                if order.price().is_none() {
                    violations.push(ViolationKind::MissingPrice(kind));
                }
            }
        }

        check_value(order.price(), &mut violations);
        check_value(order.activation_price(), &mut violations);
        violations
    }
}
