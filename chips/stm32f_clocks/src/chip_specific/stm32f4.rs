// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! STM32F42x/F43x, 2.7 V to 3.6 V supply, over-drive on.

use crate::limits::{ClockLimits, WaitState};

pub const RCC_BASE: usize = 0x4002_3800;
pub const FLASH_BASE: usize = 0x4002_3C00;

pub const LIMITS: ClockLimits = ClockLimits {
    max_sysclk: 180_000_000,
    max_hclk: 180_000_000,
    max_pclk1: 45_000_000,
    max_pclk2: 90_000_000,
    vco_min: 100_000_000,
    vco_max: 432_000_000,
    pll_in_min: 1_000_000,
    pll_in_max: 2_000_000,
    pllm_min: 2,
    pllm_max: 63,
    plln_min: 50,
    plln_max: 432,
    pllp_min: 2,
    pllp_max: 8,
    pllq: 4,
    wait_states: &[
        WaitState { max_frequency: 30_000_000, latency: 0 },
        WaitState { max_frequency: 60_000_000, latency: 1 },
        WaitState { max_frequency: 90_000_000, latency: 2 },
        WaitState { max_frequency: 120_000_000, latency: 3 },
        WaitState { max_frequency: 150_000_000, latency: 4 },
        WaitState { max_frequency: 180_000_000, latency: 5 },
    ],
};
