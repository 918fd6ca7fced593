//! Unit tests for the Money module
//!
//! Tests cover construction, minor-unit precision, arithmetic and the
//! zero-tolerance checks the ledger relies on.

use core_kernel::{Money, MoneyError, MINOR_UNIT_SCALE};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_new_keeps_two_decimal_amounts() {
        let m = Money::new(dec!(5000000.00));
        assert_eq!(m.amount(), dec!(5000000));
    }

    #[test]
    fn test_from_minor_converts_cents_correctly() {
        assert_eq!(Money::from_minor(60000).amount(), dec!(600.00));
    }

    #[test]
    fn test_zero_is_default() {
        assert_eq!(Money::default(), Money::zero());
        assert!(Money::zero().is_zero());
    }

    #[test]
    fn test_try_new_error_message_mentions_scale() {
        let err = Money::try_new(dec!(0.125)).unwrap_err();
        assert!(matches!(err, MoneyError::InvalidAmount(_)));
        assert!(err.to_string().contains(&MINOR_UNIT_SCALE.to_string()));
    }
}

mod predicates {
    use super::*;

    #[test]
    fn test_sign_predicates() {
        assert!(Money::new(dec!(0.01)).is_positive());
        assert!(Money::new(dec!(-0.01)).is_negative());
        assert!(!Money::zero().is_positive());
        assert!(!Money::zero().is_negative());
    }

    #[test]
    fn test_negative_zero_is_not_negative() {
        let neg_zero = -Money::zero();
        assert!(neg_zero.is_zero());
        assert!(!neg_zero.is_negative());
    }

    #[test]
    fn test_abs() {
        assert_eq!(Money::new(dec!(-12.34)).abs(), Money::new(dec!(12.34)));
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_sum_of_references() {
        let lines = vec![Money::new(dec!(1000)), Money::new(dec!(-400))];
        let total: Money = lines.iter().sum();
        assert_eq!(total, Money::new(dec!(600)));
    }

    #[test]
    fn test_checked_sum_reports_overflow() {
        let huge = Money::new(Decimal::MAX);
        let result = Money::checked_sum(&[huge, huge]);
        assert_eq!(result, Err(MoneyError::Overflow));
    }

    #[test]
    fn test_checked_sub() {
        let a = Money::new(dec!(10));
        let b = Money::new(dec!(2.50));
        assert_eq!(a.checked_sub(&b).unwrap(), Money::new(dec!(7.50)));
    }
}

mod serialization {
    use super::*;

    #[test]
    fn test_money_serializes_transparently() {
        let m = Money::new(dec!(42.10));
        let json = serde_json::to_string(&m).unwrap();
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
        assert!(!json.contains('{'));
    }

    #[test]
    fn test_deserializing_sub_minor_amount_is_rejected() {
        let result = serde_json::from_str::<Money>("\"0.004\"");
        assert!(result.is_err());

        let result = serde_json::from_str::<Money>("\"10.005\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_deserializing_trailing_zeros_is_accepted() {
        let m: Money = serde_json::from_str("\"12.5000\"").unwrap();
        assert_eq!(m, Money::new(dec!(12.50)));
    }
}
