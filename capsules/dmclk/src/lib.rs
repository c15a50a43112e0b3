// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! `dmclk`: clock device for STM32F boards.
//!
//! The device reads a clock configuration from the `dmclk` section of the
//! board configuration, applies it through [stm32f_clocks::Sequencer] and
//! then accepts commands to read or change individual settings. Reads of the
//! device return a one-line status, see [status].

#![no_std]

mod config;

pub mod clock_config;
pub mod command;
pub mod config_store;
pub mod dmclk;
pub mod status;

#[doc(inline)]
pub use crate::clock_config::{ClockConfig, ClockSourceKind};
#[doc(inline)]
pub use crate::command::{Command, CommandError, CommandReturn};
#[doc(inline)]
pub use crate::config_store::{ConfigStore, KeyValueConfig};
#[doc(inline)]
pub use crate::dmclk::DeviceContext;

// This is used to run the tests on a host
#[cfg(test)]
extern crate std;
