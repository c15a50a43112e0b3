// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Main PLL divider search.
//!
//! The PLL output is `(input / M) * N / P`. M and P are searched exhaustively
//! within the family limits, P over even values only. For every (M, P) pair N
//! is derived by rounding `target * P / (input / M)`, and the pair is kept if
//! the PLL input, N and the VCO frequency are all in range.
//!
//! Among the candidates within tolerance, the one with the smallest error
//! wins; ties keep the first found, in ascending M then P order. An exact
//! match ends the search.
//!
//! # Usage
//!
//! ```rust,ignore
//! let pll = PllConfig::search(216_000_000, 1000, 25_000_000, PllSource::HSE, &stm32f7::LIMITS)?;
//! assert_eq!(pll.output_frequency(25_000_000), 216_000_000);
//! ```
//!
//! Arithmetic is done on `u32` once the inputs have been checked against the
//! family's system clock ceiling. Intermediate products use checked
//! multiplication, so a pair that would overflow is rejected instead of
//! wrapping.

use crate::error::ClockError;
use crate::limits::ClockLimits;

/// Oscillator feeding the PLL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PllSource {
    HSI = 0b0,
    HSE = 0b1,
}

/// Dividers and multiplier of the main PLL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PllConfig {
    pub m: u32,
    pub n: u32,
    pub p: u32,
    pub q: u32,
    pub source: PllSource,
}

impl PllConfig {
    /// VCO frequency for the given PLL source frequency.
    pub fn vco_frequency(&self, input: u32) -> u32 {
        (input / self.m).saturating_mul(self.n)
    }

    /// Main output frequency for the given PLL source frequency.
    pub fn output_frequency(&self, input: u32) -> u32 {
        self.vco_frequency(input) / self.p
    }

    /// Find the dividers reaching `target` from `input` within `tolerance`.
    ///
    /// # Errors:
    ///
    /// + [Err]\([ClockError::NotAchievable]\) if the target exceeds the
    /// system clock ceiling, or no divider set is within tolerance.
    pub fn search(
        target: u64,
        tolerance: u64,
        input: u64,
        source: PllSource,
        limits: &ClockLimits,
    ) -> Result<Self, ClockError> {
        if target > u64::from(limits.max_sysclk) {
            return Err(ClockError::NotAchievable);
        }
        // Both checked against the ceiling above or by the conversion itself
        let target = target as u32;
        let input = u32::try_from(input).map_err(|_| ClockError::NotAchievable)?;
        let tolerance = u32::try_from(tolerance).unwrap_or(u32::MAX);

        let mut best: Option<(PllConfig, u32)> = None;

        for m in limits.pllm_min..=limits.pllm_max {
            if m == 0 {
                continue;
            }
            let pll_input = input / m;
            if pll_input == 0 || pll_input < limits.pll_in_min || pll_input > limits.pll_in_max {
                continue;
            }

            for p in (limits.pllp_min..=limits.pllp_max).step_by(2) {
                if p == 0 {
                    continue;
                }
                let n = match target.checked_mul(p).and_then(|t| t.checked_add(pll_input / 2)) {
                    Some(scaled) => scaled / pll_input,
                    None => continue,
                };
                if n < limits.plln_min || n > limits.plln_max {
                    continue;
                }
                let vco = match pll_input.checked_mul(n) {
                    Some(vco) => vco,
                    None => continue,
                };
                if vco < limits.vco_min || vco > limits.vco_max {
                    continue;
                }

                let error = (vco / p).abs_diff(target);
                if error > tolerance {
                    continue;
                }
                if let Some((_, best_error)) = best {
                    if error >= best_error {
                        continue;
                    }
                }

                let candidate = PllConfig {
                    m,
                    n,
                    p,
                    q: limits.pllq,
                    source,
                };
                if error == 0 {
                    return Ok(candidate);
                }
                best = Some((candidate, error));
            }
        }

        best.map(|(config, _)| config).ok_or(ClockError::NotAchievable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip_specific::{stm32f4, stm32f7};
    use crate::limits::HSI_FREQUENCY;

    fn assert_within_limits(pll: &PllConfig, input: u32, limits: &ClockLimits) {
        assert!(pll.m >= limits.pllm_min && pll.m <= limits.pllm_max);
        assert!(pll.n >= limits.plln_min && pll.n <= limits.plln_max);
        assert!(pll.p >= limits.pllp_min && pll.p <= limits.pllp_max);
        assert_eq!(pll.p % 2, 0);
        let pll_input = input / pll.m;
        assert!(pll_input >= limits.pll_in_min && pll_input <= limits.pll_in_max);
        let vco = pll.vco_frequency(input);
        assert!(vco >= limits.vco_min && vco <= limits.vco_max);
    }

    #[test]
    fn hse_25mhz_to_216mhz_is_exact() {
        let pll =
            PllConfig::search(216_000_000, 1000, 25_000_000, PllSource::HSE, &stm32f7::LIMITS)
                .unwrap();
        assert_eq!(pll.output_frequency(25_000_000), 216_000_000);
        assert_eq!(pll.q, 4);
        assert_eq!(pll.source, PllSource::HSE);
        assert_within_limits(&pll, 25_000_000, &stm32f7::LIMITS);
    }

    #[test]
    fn hsi_to_16mhz() {
        let pll = PllConfig::search(16_000_000, 1000, 16_000_000, PllSource::HSI, &stm32f7::LIMITS)
            .unwrap();
        assert_eq!(
            pll,
            PllConfig {
                m: 8,
                n: 64,
                p: 8,
                q: 4,
                source: PllSource::HSI
            }
        );
    }

    #[test]
    fn results_stay_within_tolerance_and_limits() {
        for &(target, input) in &[
            (48_000_000, 8_000_000),
            (100_000_000, 16_000_000),
            (168_000_000, 8_000_000),
            (180_000_000, 12_000_000),
            (72_000_000, 25_000_000),
        ] {
            let pll = PllConfig::search(target, 500_000, input, PllSource::HSE, &stm32f4::LIMITS)
                .unwrap();
            let output = pll.output_frequency(input as u32);
            assert!(output.abs_diff(target as u32) <= 500_000);
            assert_within_limits(&pll, input as u32, &stm32f4::LIMITS);
        }
    }

    #[test]
    fn above_ceiling_is_not_achievable() {
        assert_eq!(
            PllConfig::search(217_000_000, 1_000_000, 25_000_000, PllSource::HSE, &stm32f7::LIMITS),
            Err(ClockError::NotAchievable)
        );
        assert_eq!(
            PllConfig::search(200_000_000, 1000, 16_000_000, PllSource::HSI, &stm32f4::LIMITS),
            Err(ClockError::NotAchievable)
        );
    }

    #[test]
    fn below_vco_range_is_not_achievable() {
        // 100MHz VCO divided by at most 8
        assert_eq!(
            PllConfig::search(1_000_000, 1000, u64::from(HSI_FREQUENCY), PllSource::HSI, &stm32f7::LIMITS),
            Err(ClockError::NotAchievable)
        );
    }

    #[test]
    fn unusable_input_is_not_achievable() {
        // Too slow for the smallest PLL input once divided by 2
        assert_eq!(
            PllConfig::search(96_000_000, 1000, 1_500_000, PllSource::HSE, &stm32f7::LIMITS),
            Err(ClockError::NotAchievable)
        );
        assert_eq!(
            PllConfig::search(96_000_000, 1000, 0, PllSource::HSE, &stm32f7::LIMITS),
            Err(ClockError::NotAchievable)
        );
        assert_eq!(
            PllConfig::search(96_000_000, 1000, u64::MAX, PllSource::HSE, &stm32f7::LIMITS),
            Err(ClockError::NotAchievable)
        );
    }

    #[test]
    fn tolerance_rejects_approximations() {
        // No divider set hits 100.03MHz from 7MHz; the closest is ~11.6kHz off
        assert_eq!(
            PllConfig::search(100_030_000, 1000, 7_000_000, PllSource::HSE, &stm32f7::LIMITS),
            Err(ClockError::NotAchievable)
        );
        let loose =
            PllConfig::search(100_030_000, 300_000, 7_000_000, PllSource::HSE, &stm32f7::LIMITS)
                .unwrap();
        let error = loose.output_frequency(7_000_000).abs_diff(100_030_000);
        assert!(error > 1000 && error <= 300_000);
    }

    #[test]
    fn search_is_deterministic() {
        let first = PllConfig::search(123_456_789, 100_000, 25_000_000, PllSource::HSE, &stm32f7::LIMITS);
        let second = PllConfig::search(123_456_789, 100_000, 25_000_000, PllSource::HSE, &stm32f7::LIMITS);
        assert_eq!(first, second);
        assert!(first.is_ok());
    }
}
