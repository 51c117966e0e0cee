//! Proportional integer arithmetic.
//!
//! Every pro-rata split in the engine (power by weight, fees and bribes by
//! power) goes through [`mul_div_floor`]. Operands are `u64`; the product is
//! taken in `u128`, so it cannot overflow, and only the narrowing back to
//! `u64` can fail.

use crate::error::VotingError;

/// `floor(value * numerator / denominator)`.
///
/// A zero denominator yields zero: there is nothing to proportion against.
pub fn mul_div_floor(value: u64, numerator: u64, denominator: u64) -> Result<u64, VotingError> {
    if denominator == 0 {
        return Ok(0);
    }
    let wide = (value as u128) * (numerator as u128) / (denominator as u128);
    u64::try_from(wide).map_err(|_| VotingError::CastFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_split() {
        assert_eq!(mul_div_floor(1_000_000, 50, 100).unwrap(), 500_000);
        assert_eq!(mul_div_floor(1_000_000, 50, 50).unwrap(), 1_000_000);
    }

    #[test]
    fn rounds_toward_zero() {
        assert_eq!(mul_div_floor(10, 1, 3).unwrap(), 3);
        assert_eq!(mul_div_floor(2, 1, 3).unwrap(), 0);
    }

    #[test]
    fn zero_denominator_is_zero() {
        assert_eq!(mul_div_floor(u64::MAX, u64::MAX, 0).unwrap(), 0);
    }

    #[test]
    fn wide_intermediate_does_not_overflow() {
        // u64::MAX * u64::MAX overflows u64 but not u128.
        assert_eq!(mul_div_floor(u64::MAX, u64::MAX, u64::MAX).unwrap(), u64::MAX);
    }

    #[test]
    fn narrowing_failure_is_cast_failed() {
        let result = mul_div_floor(u64::MAX, 2, 1);
        assert!(matches!(result, Err(VotingError::CastFailed)));
    }
}
