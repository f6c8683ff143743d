use super::{Rule, ValidationContext, ViolationKind};
use trading::Order;

/// Volume must be a positive finite number.
pub struct VolumeRule;

impl Rule for VolumeRule {
    fn name(&self) -> &str {
        "Volume"
    }

    fn check(&self, order: &Order, _ctx: &ValidationContext) -> Vec<ViolationKind> {
        let volume = order.volume();
        if volume.is_finite() && volume > 0.0 {
            Vec::new()
        } else {
            vec![ViolationKind::NonPositiveVolume(volume)]
        }
    }
}
