// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Error enum shared by the clock engine and its users.

use core::fmt;

/// Failures reported while validating, searching for or applying a clock
/// configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum ClockError {
    /// A parameter was out of range, or the command is not recognized
    InvalidArgument = 0,
    /// The configuration record is incomplete (zero target, zero tolerance,
    /// unknown source or missing oscillator frequency)
    InvalidConfiguration = 1,
    /// No divider set reaches the target within tolerance and limits
    NotAchievable = 2,
    /// A ready or status bit was not observed within its iteration budget
    HardwareTimeout = 3,
    /// A written value did not read back
    VerificationFailed = 4,
}

impl From<ClockError> for usize {
    fn from(err: ClockError) -> usize {
        err as usize
    }
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            ClockError::InvalidArgument => "invalid argument",
            ClockError::InvalidConfiguration => "invalid configuration",
            ClockError::NotAchievable => "frequency not achievable",
            ClockError::HardwareTimeout => "hardware timeout",
            ClockError::VerificationFailed => "register verification failed",
        };
        f.write_str(description)
    }
}
