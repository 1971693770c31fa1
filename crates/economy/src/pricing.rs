//! Purchase-cost curve.

/// Current price of the next unit of an item.
///
/// `floor(base_cost × 1.15^owned)`, clamped to a minimum of 1 so an item can
/// never become free. Monotonic non-decreasing in `owned`. Negative inputs
/// are unrepresentable; there are no error conditions.
pub fn price(base_cost: u64, owned: u32) -> u64 {
    let raw = base_cost as f64 * 1.15f64.powi(owned as i32);
    (raw.floor() as u64).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_price_at_zero_owned() {
        assert_eq!(price(10, 0), 10);
        assert_eq!(price(500, 0), 500);
    }

    #[test]
    fn one_owned_applies_growth_factor() {
        // floor(10 * 1.15) = 11
        assert_eq!(price(10, 1), 11);
    }

    #[test]
    fn never_below_one() {
        assert_eq!(price(0, 0), 1);
        assert_eq!(price(0, 40), 1);
    }

    #[test]
    fn monotonic_in_owned() {
        for base in [1u64, 10, 15, 500, 20_000] {
            let mut previous = 0;
            for owned in 0..60 {
                let current = price(base, owned);
                assert!(current >= 1);
                assert!(
                    current >= previous,
                    "price({base}, {owned}) = {current} < {previous}"
                );
                previous = current;
            }
        }
    }

    #[test]
    fn known_curve_points() {
        // floor(15 * 1.15^n) for the first few n, the classic clicker curve.
        assert_eq!(price(15, 0), 15);
        assert_eq!(price(15, 1), 17);
        assert_eq!(price(15, 2), 19);
        assert_eq!(price(15, 3), 22);
    }
}
