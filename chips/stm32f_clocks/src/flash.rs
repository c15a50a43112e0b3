// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Flash wait states.
//!
//! The number of wait states depends on the system clock frequency. It must
//! never be lower than what the frequency requires, so every write is read
//! back before the clock is allowed to change.

use crate::config::CONFIG;
use crate::error::ClockError;
use crate::limits::ClockLimits;
use crate::registers::{self, ClockRegister, ClockRegisters, ACR};

/// Wait states required at `frequency`: the first table row whose ceiling is
/// at least `frequency`.
///
/// # Errors:
///
/// + [Err]\([ClockError::NotAchievable]\) if the frequency is above every row.
pub fn wait_states(limits: &ClockLimits, frequency: u32) -> Result<u8, ClockError> {
    limits
        .wait_states
        .iter()
        .find(|row| frequency <= row.max_frequency)
        .map(|row| row.latency)
        .ok_or(ClockError::NotAchievable)
}

/// Currently configured wait states.
pub fn latency(registers: &impl ClockRegisters) -> u8 {
    registers::load::<ACR::Register>(registers, ClockRegister::FlashAcr).read(ACR::LATENCY) as u8
}

// Flash latency depends on the system clock frequency, so only the sequencer
// changes it.
pub(crate) fn set_latency(registers: &impl ClockRegisters, latency: u8) -> Result<(), ClockError> {
    registers::modify(
        registers,
        ClockRegister::FlashAcr,
        ACR::LATENCY.val(u32::from(latency)),
    );

    for _ in 0..CONFIG.verify_budget {
        if self::latency(registers) == latency {
            return Ok(());
        }
    }

    Err(ClockError::VerificationFailed)
}
