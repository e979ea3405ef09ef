//! Week-to-week state transitions, stated as plain functions.
//!
//! The model builder linearizes these rules; the functions here are the
//! reference the linearization is checked against (unit and property tests)
//! and what the extractor uses to audit a solved plan.

use crate::domain::Chip;

/// Lowest stored free-transfer balance after the first planned week.
pub const MIN_FREE_TRANSFERS: u8 = 1;
/// Banking cap on free transfers.
pub const MAX_FREE_TRANSFERS: u8 = 5;
/// Big-M for the clamp rows. Must exceed the widest raw range (-15..=6).
pub const FT_BIG_M: f64 = 20.0;

/// Transfers counted against the free-transfer balance. Wildcard and Free
/// Hit weeks charge nothing.
pub fn charged_transfers(transfers: u32, chip: Option<Chip>) -> u32 {
    match chip {
        Some(c) if c.resets_transfers() => 0,
        _ => transfers,
    }
}

/// Transfers beyond the available free count; each costs a hit.
pub fn penalized_transfers(charged: u32, free_transfers: u8) -> u32 {
    charged.saturating_sub(u32::from(free_transfers))
}

/// Unclamped entitlement for the following week.
pub fn raw_free_transfers(prev: u8, charged: u32, chip: Option<Chip>) -> i64 {
    let reset = i64::from(chip.is_some_and(Chip::resets_transfers));
    i64::from(prev) - i64::from(charged) + 1 - reset
}

/// Free transfers entering the next week: `clamp(prev - charged + 1 - reset, 1, 5)`.
pub fn next_free_transfers(prev: u8, charged: u32, chip: Option<Chip>) -> u8 {
    let raw = raw_free_transfers(prev, charged, chip);
    raw.clamp(i64::from(MIN_FREE_TRANSFERS), i64::from(MAX_FREE_TRANSFERS)) as u8
}

/// As [`next_free_transfers`], but a special gameweek overrides the result.
pub fn next_free_transfers_with_override(
    prev: u8,
    charged: u32,
    chip: Option<Chip>,
    special: Option<u8>,
) -> u8 {
    special.unwrap_or_else(|| next_free_transfers(prev, charged, chip))
}

/// Whether `(prev, charged, reset) -> next` satisfies the big-M clamp rows
/// for the given indicator pair. Mirrors the rows the builder emits.
pub fn clamp_rows_hold(prev: u8, charged: u32, reset: bool, next: u8, below: bool, above: bool) -> bool {
    let ft = f64::from(prev);
    let ch = f64::from(charged);
    let r = if reset { 1.0 } else { 0.0 };
    let nx = f64::from(next);
    let b = if below { 1.0 } else { 0.0 };
    let a = if above { 1.0 } else { 0.0 };
    let m = FT_BIG_M;

    nx >= f64::from(MIN_FREE_TRANSFERS)
        && nx <= f64::from(MAX_FREE_TRANSFERS)
        && nx - ft + ch + r - m * b <= 1.0
        && nx - ft + ch + r + m * a >= 1.0
        && nx + m * b <= m + 1.0
        && nx - m * a >= f64::from(MAX_FREE_TRANSFERS) - m
        && ft - ch - r + m * b <= m
        && ft - ch - r - m * a >= f64::from(MAX_FREE_TRANSFERS) - 1.0 - m
        && (b + a) <= 1.0
}

/// Persistent bank after one week of transfers.
///
/// `fee_per_transfer` applies only when `charge_fee` is set (weeks after the
/// first planned week).
pub fn bank_after(
    prev_bank: f64,
    proceeds: f64,
    cost: f64,
    transfers: u32,
    fee_per_transfer: f64,
    charge_fee: bool,
) -> f64 {
    let fee = if charge_fee {
        fee_per_transfer * f64::from(transfers)
    } else {
        0.0
    };
    prev_bank + proceeds - cost - fee
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rolling_one_transfer() {
        assert_eq!(next_free_transfers(1, 0, None), 2);
        assert_eq!(next_free_transfers(1, 1, None), 1);
        assert_eq!(next_free_transfers(2, 1, None), 2);
    }

    #[test]
    fn balance_caps_at_five() {
        assert_eq!(next_free_transfers(5, 0, None), 5);
        assert_eq!(next_free_transfers(4, 0, None), 5);
    }

    #[test]
    fn hits_floor_at_one() {
        assert_eq!(next_free_transfers(1, 4, None), 1);
        assert_eq!(next_free_transfers(0, 0, None), 1);
    }

    #[test]
    fn wildcard_keeps_balance() {
        let charged = charged_transfers(9, Some(Chip::Wildcard));
        assert_eq!(charged, 0);
        assert_eq!(next_free_transfers(3, charged, Some(Chip::Wildcard)), 3);
        assert_eq!(next_free_transfers(0, 0, Some(Chip::FreeHit)), 1);
    }

    #[test]
    fn bench_boost_does_not_reset() {
        assert_eq!(charged_transfers(2, Some(Chip::BenchBoost)), 2);
        assert_eq!(next_free_transfers(2, 2, Some(Chip::BenchBoost)), 1);
    }

    #[test]
    fn special_week_overrides() {
        assert_eq!(next_free_transfers_with_override(1, 3, None, Some(5)), 5);
        assert_eq!(next_free_transfers_with_override(1, 0, None, None), 2);
    }

    #[test]
    fn penalized_counts_excess_only() {
        assert_eq!(penalized_transfers(3, 1), 2);
        assert_eq!(penalized_transfers(1, 2), 0);
    }

    #[test]
    fn fee_skipped_in_first_week() {
        assert_eq!(bank_after(10.0, 50.0, 45.0, 1, 2.0, false), 15.0);
        assert_eq!(bank_after(10.0, 50.0, 45.0, 1, 2.0, true), 13.0);
    }

    fn arb_chip() -> impl Strategy<Value = Option<Chip>> {
        prop_oneof![
            Just(None),
            Just(Some(Chip::Wildcard)),
            Just(Some(Chip::FreeHit)),
            Just(Some(Chip::BenchBoost)),
            Just(Some(Chip::TripleCaptain)),
        ]
    }

    proptest! {
        /// The transition equals the closed-form clamp for every input.
        #[test]
        fn transition_is_clamped_formula(prev in 0u8..=5, transfers in 0u32..=15, chip in arb_chip()) {
            let charged = charged_transfers(transfers, chip);
            let next = next_free_transfers(prev, charged, chip);
            let reset = i64::from(chip.is_some_and(Chip::resets_transfers));
            let expected = (i64::from(prev) - i64::from(charged) + 1 - reset).clamp(1, 5);
            prop_assert_eq!(i64::from(next), expected);
            prop_assert!((MIN_FREE_TRANSFERS..=MAX_FREE_TRANSFERS).contains(&next));
        }

        /// The big-M rows admit exactly the clamped successor.
        #[test]
        fn clamp_rows_admit_only_clamp(prev in 0u8..=5, charged in 0u32..=15, reset in any::<bool>()) {
            let charged = if reset { 0 } else { charged };
            let chip = reset.then_some(Chip::Wildcard);
            let expected = next_free_transfers(prev, charged, chip);
            for next in MIN_FREE_TRANSFERS..=MAX_FREE_TRANSFERS {
                let feasible = [(false, false), (true, false), (false, true)]
                    .iter()
                    .any(|&(b, a)| clamp_rows_hold(prev, charged, reset, next, b, a));
                prop_assert_eq!(feasible, next == expected, "next = {}", next);
            }
        }
    }
}
