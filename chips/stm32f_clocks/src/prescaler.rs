// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! APB bus prescalers.

use crate::error::ClockError;

/// Prescaler codes of the `PPRE1` and `PPRE2` fields.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum APBPrescaler {
    DivideBy1 = 0b000, // No division
    DivideBy2 = 0b100,
    DivideBy4 = 0b101,
    DivideBy8 = 0b110,
    DivideBy16 = 0b111,
}

impl APBPrescaler {
    const MAX_EXPONENT: u32 = 4;

    /// Prescaler dividing by `2^exponent`.
    pub fn from_exponent(exponent: u32) -> Option<Self> {
        match exponent {
            0 => Some(APBPrescaler::DivideBy1),
            1 => Some(APBPrescaler::DivideBy2),
            2 => Some(APBPrescaler::DivideBy4),
            3 => Some(APBPrescaler::DivideBy8),
            4 => Some(APBPrescaler::DivideBy16),
            _ => None,
        }
    }

    /// Smallest prescaler bringing `sysclk` down to `ceiling` or below.
    ///
    /// # Errors:
    ///
    /// + [Err]\([ClockError::InvalidConfiguration]\) if even dividing by 16
    /// exceeds the ceiling.
    pub fn derive(sysclk: u32, ceiling: u32) -> Result<Self, ClockError> {
        (0..=Self::MAX_EXPONENT)
            .find(|exponent| sysclk >> exponent <= ceiling)
            .and_then(Self::from_exponent)
            .ok_or(ClockError::InvalidConfiguration)
    }

    /// Code written into the register field.
    pub fn code(self) -> u32 {
        self as u32
    }
}

impl From<APBPrescaler> for u32 {
    fn from(item: APBPrescaler) -> Self {
        match item {
            APBPrescaler::DivideBy1 => 1,
            APBPrescaler::DivideBy2 => 2,
            APBPrescaler::DivideBy4 => 4,
            APBPrescaler::DivideBy8 => 8,
            APBPrescaler::DivideBy16 => 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_the_register_encoding() {
        // exponent k > 0 is encoded as k + 3
        for exponent in 1..=4 {
            let prescaler = APBPrescaler::from_exponent(exponent).unwrap();
            assert_eq!(prescaler.code(), exponent + 3);
            assert_eq!(u32::from(prescaler), 1 << exponent);
        }
        assert_eq!(APBPrescaler::DivideBy1.code(), 0);
        assert_eq!(APBPrescaler::from_exponent(5), None);
    }

    #[test]
    fn derive_picks_the_smallest_divider() {
        assert_eq!(APBPrescaler::derive(216_000_000, 54_000_000), Ok(APBPrescaler::DivideBy4));
        assert_eq!(APBPrescaler::derive(216_000_000, 108_000_000), Ok(APBPrescaler::DivideBy2));
        assert_eq!(APBPrescaler::derive(16_000_000, 54_000_000), Ok(APBPrescaler::DivideBy1));
        assert_eq!(APBPrescaler::derive(180_000_000, 45_000_000), Ok(APBPrescaler::DivideBy4));
        assert_eq!(APBPrescaler::derive(100_000_000, 45_000_000), Ok(APBPrescaler::DivideBy4));
    }

    #[test]
    fn derive_never_under_divides() {
        for sysclk in (1_000_000..=216_000_000).step_by(7_000_000) {
            for &ceiling in &[54_000_000, 108_000_000, 20_000_000] {
                let prescaler = APBPrescaler::derive(sysclk, ceiling).unwrap();
                let divider = u32::from(prescaler);
                assert!(sysclk / divider <= ceiling);
                if divider > 1 {
                    assert!(sysclk / (divider / 2) > ceiling);
                }
            }
        }
    }

    #[test]
    fn derive_fails_past_divide_by_16() {
        assert_eq!(
            APBPrescaler::derive(216_000_000, 10_000_000),
            Err(ClockError::InvalidConfiguration)
        );
    }
}
