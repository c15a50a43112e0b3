// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! System clock configuration for the STM32F4 and STM32F7 families.
//!
//! The crate computes main PLL dividers for a target frequency and sequences
//! the RCC and FLASH register writes that move the system clock to it:
//! oscillator start-up, PLL programming and locking, flash wait states, bus
//! prescalers and the final clock switch.
//!
//! Family differences are data. A [limits::ClockLimits] value from
//! [chip_specific] is handed to the [sequencer::Sequencer] together with the
//! register capability.

#![no_std]

mod config;

pub mod chip_specific;
pub mod error;
pub mod flash;
pub mod limits;
pub mod pll;
pub mod prescaler;
pub mod registers;
pub mod sequencer;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[doc(inline)]
pub use crate::error::ClockError;
#[doc(inline)]
pub use crate::limits::ClockLimits;
#[doc(inline)]
pub use crate::registers::{ClockRegisters, MmioClockRegisters};
#[doc(inline)]
pub use crate::sequencer::Sequencer;

// This is used to run the tests on a host
#[cfg(test)]
extern crate std;
