// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Commands accepted by the clock device.
//!
//! A command is either a read of one field, a change of one setting, or a
//! request to apply the stored settings again. The classification is decided
//! by the command number alone, see [Command::decode].

use core::fmt;

use stm32f_clocks::ClockError;

use crate::clock_config::{ClockConfig, ClockSourceKind};

/// Readable fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    /// Frequency observed after the last successful configuration
    Frequency,
    Source,
    Tolerance,
    OscillatorFrequency,
    TargetFrequency,
}

/// Writable settings, each carrying its new value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Setting {
    Source(ClockSourceKind),
    Tolerance(u64),
    OscillatorFrequency(u64),
    TargetFrequency(u64),
}

impl Setting {
    /// Store the new value in `config`.
    pub fn apply_to(self, config: &mut ClockConfig) {
        match self {
            Setting::Source(source) => config.source = source,
            Setting::Tolerance(tolerance) => config.tolerance = tolerance,
            Setting::OscillatorFrequency(frequency) => config.oscillator_frequency = frequency,
            Setting::TargetFrequency(frequency) => config.target_frequency = frequency,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Get(Field),
    Set(Setting),
    Reconfigure,
}

impl Command {
    /// Decode a numbered command.
    ///
    /// * `1`: get frequency
    /// * `2`: set source (`argument`: 1 internal, 2 external, 3 hibernation)
    /// * `3`: get source
    /// * `4`: set tolerance
    /// * `5`: get tolerance
    /// * `6`: set oscillator frequency
    /// * `7`: get oscillator frequency
    /// * `8`: set target frequency
    /// * `9`: get target frequency
    /// * `10`: reconfigure
    ///
    /// Get commands and reconfigure ignore `argument`.
    ///
    /// # Errors:
    ///
    /// + [Err]\([ClockError::InvalidArgument]\) for an unknown number, a set
    /// command without an argument, or a source argument out of range.
    pub fn decode(command_num: usize, argument: Option<u64>) -> Result<Self, ClockError> {
        let value = || argument.ok_or(ClockError::InvalidArgument);

        match command_num {
            1 => Ok(Command::Get(Field::Frequency)),
            2 => {
                let raw = u32::try_from(value()?).map_err(|_| ClockError::InvalidArgument)?;
                Ok(Command::Set(Setting::Source(ClockSourceKind::try_from(raw)?)))
            }
            3 => Ok(Command::Get(Field::Source)),
            4 => Ok(Command::Set(Setting::Tolerance(value()?))),
            5 => Ok(Command::Get(Field::Tolerance)),
            6 => Ok(Command::Set(Setting::OscillatorFrequency(value()?))),
            7 => Ok(Command::Get(Field::OscillatorFrequency)),
            8 => Ok(Command::Set(Setting::TargetFrequency(value()?))),
            9 => Ok(Command::Get(Field::TargetFrequency)),
            10 => Ok(Command::Reconfigure),
            _ => Err(ClockError::InvalidArgument),
        }
    }
}

/// Successful outcome of a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandReturn {
    Success,
    Frequency(u64),
    Source(ClockSourceKind),
}

/// Failed outcome of a command.
///
/// The two variants tell whether the stored configuration changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandError {
    /// The stored configuration is unchanged.
    Rejected(ClockError),
    /// The new setting was stored, but applying it to the hardware failed.
    /// The reported frequency still describes the previous configuration.
    Committed(ClockError),
}

impl CommandError {
    pub fn kind(self) -> ClockError {
        match self {
            CommandError::Rejected(kind) | CommandError::Committed(kind) => kind,
        }
    }

    pub fn is_committed(self) -> bool {
        matches!(self, CommandError::Committed(_))
    }
}

impl From<ClockError> for CommandError {
    fn from(err: ClockError) -> Self {
        CommandError::Rejected(err)
    }
}

impl From<CommandError> for usize {
    fn from(err: CommandError) -> usize {
        err.kind().into()
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Rejected(kind) => write!(f, "rejected: {}", kind),
            CommandError::Committed(kind) => write!(f, "stored but not applied: {}", kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_decode_to_gets_and_sets() {
        assert_eq!(Command::decode(1, None), Ok(Command::Get(Field::Frequency)));
        assert_eq!(Command::decode(3, Some(7)), Ok(Command::Get(Field::Source)));
        assert_eq!(
            Command::decode(2, Some(1)),
            Ok(Command::Set(Setting::Source(ClockSourceKind::Internal)))
        );
        assert_eq!(
            Command::decode(4, Some(500)),
            Ok(Command::Set(Setting::Tolerance(500)))
        );
        assert_eq!(
            Command::decode(6, Some(8_000_000)),
            Ok(Command::Set(Setting::OscillatorFrequency(8_000_000)))
        );
        assert_eq!(
            Command::decode(8, Some(48_000_000)),
            Ok(Command::Set(Setting::TargetFrequency(48_000_000)))
        );
        assert_eq!(
            Command::decode(9, None),
            Ok(Command::Get(Field::TargetFrequency))
        );
        assert_eq!(Command::decode(10, None), Ok(Command::Reconfigure));
    }

    #[test]
    fn malformed_commands_are_invalid() {
        assert_eq!(Command::decode(0, None), Err(ClockError::InvalidArgument));
        assert_eq!(Command::decode(11, Some(1)), Err(ClockError::InvalidArgument));
        assert_eq!(Command::decode(8, None), Err(ClockError::InvalidArgument));
        assert_eq!(Command::decode(2, Some(9)), Err(ClockError::InvalidArgument));
        assert_eq!(Command::decode(2, Some(1 << 33)), Err(ClockError::InvalidArgument));
    }

    #[test]
    fn settings_touch_one_field() {
        let mut config = ClockConfig {
            target_frequency: 16_000_000,
            tolerance: 1000,
            oscillator_frequency: 0,
            source: ClockSourceKind::Internal,
        };
        Setting::OscillatorFrequency(25_000_000).apply_to(&mut config);
        Setting::Source(ClockSourceKind::External).apply_to(&mut config);
        assert_eq!(
            config,
            ClockConfig {
                target_frequency: 16_000_000,
                tolerance: 1000,
                oscillator_frequency: 25_000_000,
                source: ClockSourceKind::External,
            }
        );
    }

    #[test]
    fn error_kinds() {
        let committed = CommandError::Committed(ClockError::HardwareTimeout);
        assert!(committed.is_committed());
        assert_eq!(committed.kind(), ClockError::HardwareTimeout);
        assert_eq!(usize::from(committed), 3);
        assert!(!CommandError::from(ClockError::NotAchievable).is_committed());
    }
}
