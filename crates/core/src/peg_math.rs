//! Integer arithmetic helpers for peg-denominated amounts.
//!
//! Loan and holdings figures are fixed-point integers in the peg
//! token's smallest unit. All decisions compare raw integers against
//! thresholds scaled to the same unit; division by `10^decimals`
//! happens only when formatting for logs.

use alloy::primitives::U256;

/// Pre-computed powers of 10 for fast decimal scaling.
const POW10: [u128; 19] = [
    1,
    10,
    100,
    1_000,
    10_000,
    100_000,
    1_000_000,
    10_000_000,
    100_000_000,
    1_000_000_000,
    10_000_000_000,
    100_000_000_000,
    1_000_000_000_000,
    10_000_000_000_000,
    100_000_000_000_000,
    1_000_000_000_000_000,
    10_000_000_000_000_000,
    100_000_000_000_000_000,
    1_000_000_000_000_000_000,
];

/// 10^exp as U256.
#[inline(always)]
pub fn pow10(exp: u8) -> U256 {
    if (exp as usize) < POW10.len() {
        U256::from(POW10[exp as usize])
    } else {
        U256::from(10u64).pow(U256::from(exp))
    }
}

/// Scale a whole-unit amount (e.g. "5 USDT") to the peg's smallest unit.
#[inline(always)]
pub fn to_peg_units(whole: u64, peg_decimals: u8) -> U256 {
    U256::from(whole) * pow10(peg_decimals)
}

/// Whole peg units of a raw amount, truncated. Display only.
#[inline(always)]
pub fn whole_units(raw: U256, peg_decimals: u8) -> U256 {
    raw / pow10(peg_decimals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pow10() {
        assert_eq!(pow10(0), U256::from(1u64));
        assert_eq!(pow10(6), U256::from(1_000_000u64));
        assert_eq!(pow10(18), U256::from(1_000_000_000_000_000_000u64));
        // Beyond the lookup table
        assert_eq!(pow10(20), pow10(18) * U256::from(100u64));
    }

    #[test]
    fn test_to_peg_units() {
        // 5 USDT at 6 decimals
        assert_eq!(to_peg_units(5, 6), U256::from(5_000_000u64));
        // 5 units at 18 decimals (BSC peg)
        assert_eq!(to_peg_units(5, 18), U256::from(5u64) * pow10(18));
    }

    #[test]
    fn test_whole_units_truncates() {
        let raw = U256::from(12_345_678u64); // 12.345678 at 6 decimals
        assert_eq!(whole_units(raw, 6), U256::from(12u64));
    }
}
