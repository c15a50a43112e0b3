// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Compile-time configuration of the clock engine.
//!
//! Boolean options are set through cargo features from the board crate. The
//! iteration budgets are plain constants: they count polls, not time, because
//! no timer exists while the system clock is being brought up.

/// Compile-time configuration options.
pub(crate) struct Config {
    /// Whether every sequencer step is logged at debug level.
    pub(crate) trace_sequencer: bool,
    /// Polls of an oscillator ready bit before giving up.
    pub(crate) oscillator_budget: usize,
    /// Polls of the PLL ready bit, when locking and when unlocking.
    pub(crate) pll_budget: usize,
    /// Polls of the system clock switch status.
    pub(crate) switch_budget: usize,
    /// Read-backs of a verified write (flash latency, bus prescalers).
    pub(crate) verify_budget: usize,
}

/// The unique instance of `Config`.
pub(crate) const CONFIG: Config = Config {
    trace_sequencer: cfg!(feature = "trace_sequencer"),
    oscillator_budget: 5000,
    pll_budget: 5000,
    switch_budget: 5000,
    verify_budget: 16,
};
