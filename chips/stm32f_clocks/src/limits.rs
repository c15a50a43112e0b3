// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Frequency bounds of a chip family.
//!
//! A family is described by one [ClockLimits] value; see [crate::chip_specific]
//! for the supported ones. All frequencies are in Hz.

/// Frequency of the internal high-speed RC oscillator.
pub const HSI_FREQUENCY: u32 = 16_000_000;

/// Nominal frequency of the internal low-speed RC oscillator.
pub const LSI_FREQUENCY: u32 = 32_000;

/// One row of the flash access time table: up to `max_frequency`, `latency`
/// wait states are enough.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaitState {
    pub max_frequency: u32,
    pub latency: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockLimits {
    pub max_sysclk: u32,
    pub max_hclk: u32,
    /// APB1 ceiling
    pub max_pclk1: u32,
    /// APB2 ceiling
    pub max_pclk2: u32,
    pub vco_min: u32,
    pub vco_max: u32,
    pub pll_in_min: u32,
    pub pll_in_max: u32,
    pub pllm_min: u32,
    pub pllm_max: u32,
    pub plln_min: u32,
    pub plln_max: u32,
    /// Only even values between the bounds are legal.
    pub pllp_min: u32,
    pub pllp_max: u32,
    /// Fixed PLLQ divider programmed with every configuration.
    pub pllq: u32,
    /// Ascending by `max_frequency`.
    pub wait_states: &'static [WaitState],
}
