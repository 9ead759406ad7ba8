//! Per-frame easing and the decaying manual-scroll offset.

/// Move `current` a fixed fraction of the way to `target`. Lands exactly on
/// the target once within `epsilon`.
pub fn lerp_step(current: f64, target: f64, factor: f64, epsilon: f64) -> f64 {
    let next = current + (target - current) * factor.clamp(0.0, 1.0);
    if (target - next).abs() <= epsilon {
        target
    } else {
        next
    }
}

/// An offset that decays exponentially from the moment it was recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayingOffset {
    initial: f64,
    started_ms: f64,
    tau_ms: f64,
    discard_ratio: f64,
}

impl DecayingOffset {
    pub fn new(initial: f64, started_ms: f64, tau_ms: f64, discard_ratio: f64) -> Self {
        Self {
            initial,
            started_ms,
            tau_ms,
            discard_ratio,
        }
    }

    pub fn initial(&self) -> f64 {
        self.initial
    }

    /// Value at `now_ms`, or `None` once it has decayed below the discard
    /// fraction of its starting value.
    pub fn value_at(&self, now_ms: f64) -> Option<f64> {
        if self.initial == 0.0 || self.tau_ms <= 0.0 {
            return None;
        }
        let elapsed = (now_ms - self.started_ms).max(0.0);
        let value = self.initial * (-elapsed / self.tau_ms).exp();
        (value.abs() >= self.initial.abs() * self.discard_ratio).then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ============ Lerp ============

    #[test]
    fn test_lerp_covers_a_quarter_per_step() {
        assert_eq!(lerp_step(0.0, 100.0, 0.25, 1.0), 25.0);
        assert_eq!(lerp_step(25.0, 100.0, 0.25, 1.0), 43.75);
    }

    #[test]
    fn test_lerp_snaps_within_epsilon() {
        assert_eq!(lerp_step(99.0, 100.0, 0.25, 1.0), 100.0);
    }

    #[test]
    fn test_lerp_converges() {
        let mut position = 0.0;
        for _ in 0..40 {
            position = lerp_step(position, 500.0, 0.25, 1.0);
        }
        assert_eq!(position, 500.0);
    }

    // ============ Offset decay ============

    #[test]
    fn test_offset_decays_by_time_constant() {
        let offset = DecayingOffset::new(100.0, 0.0, 150.0, 0.01);

        assert_eq!(offset.value_at(0.0), Some(100.0));
        let after_tau = offset.value_at(150.0).unwrap();
        assert!((after_tau - 100.0 / std::f64::consts::E).abs() < 1e-9);
    }

    #[test]
    fn test_offset_discarded_once_negligible() {
        let offset = DecayingOffset::new(-40.0, 1000.0, 150.0, 0.01);

        // ln(100) * 150 is roughly 691ms.
        assert!(offset.value_at(1600.0).is_some());
        assert_eq!(offset.value_at(1700.0), None);
    }

    #[test]
    fn test_zero_offset_is_nothing() {
        assert_eq!(DecayingOffset::new(0.0, 0.0, 150.0, 0.01).value_at(0.0), None);
    }
}
