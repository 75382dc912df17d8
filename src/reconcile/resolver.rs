//! Difference resolver
//!
//! Compares a computed balance with the balance the statement says the
//! account should have. Amounts are integer cents, so "balanced" is exact
//! equality.

use serde::{Deserialize, Serialize};

use crate::models::Money;

/// Outcome of comparing computed and actual balances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Actual minus computed
    pub difference: Money,
    pub is_balanced: bool,
}

impl Resolution {
    /// Amount that must be posted to the account to force a match
    pub fn adjustment(&self) -> Option<Money> {
        if self.is_balanced {
            None
        } else {
            Some(self.difference)
        }
    }
}

/// Resolve the difference between a computed and an actual balance
pub fn resolve(computed: Money, actual: Money) -> Resolution {
    let difference = actual - computed;
    Resolution {
        difference,
        is_balanced: difference.is_zero(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced() {
        let r = resolve(Money::from_cents(46500), Money::from_cents(46500));
        assert!(r.is_balanced);
        assert!(r.difference.is_zero());
        assert_eq!(r.adjustment(), None);
    }

    #[test]
    fn test_actual_above_computed_is_positive() {
        let r = resolve(Money::from_cents(46500), Money::from_cents(47000));
        assert!(!r.is_balanced);
        assert_eq!(r.difference.cents(), 500);
        assert_eq!(r.adjustment(), Some(Money::from_cents(500)));
    }

    #[test]
    fn test_actual_below_computed_is_negative() {
        let r = resolve(Money::from_cents(100000), Money::from_cents(99000));
        assert_eq!(r.difference.cents(), -1000);
    }

    #[test]
    fn test_one_cent_is_not_balanced() {
        let r = resolve(Money::from_cents(1), Money::zero());
        assert!(!r.is_balanced);
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let computed = Money::from_cents(-12345);
        let actual = Money::from_cents(6789);
        assert_eq!(resolve(computed, actual), resolve(computed, actual));
    }
}
