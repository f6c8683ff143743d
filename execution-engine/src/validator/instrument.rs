use super::{Rule, ValidationContext, ViolationKind};
use trading::Order;

/// The referenced instrument must be registered with the account.
pub struct InstrumentRule;

impl Rule for InstrumentRule {
    fn name(&self) -> &str {
        "Instrument"
    }

    fn check(&self, order: &Order, ctx: &ValidationContext) -> Vec<ViolationKind> {
        if ctx.instruments.contains_key(order.instrument()) {
            Vec::new()
        } else {
            vec![ViolationKind::UnknownInstrument(order.instrument().to_string())]
        }
    }
}
