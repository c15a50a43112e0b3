// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Clock configuration record and its validation.

use core::fmt;

use log::error;
use stm32f_clocks::sequencer::ClockRequest;
use stm32f_clocks::ClockError;

use crate::config_store::ConfigStore;

/// Configuration section read by the clock device.
pub const SECTION: &str = "dmclk";

/// Oscillator a configuration runs from.
///
/// The numeric values are the ones carried by the set-source and get-source
/// commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum ClockSourceKind {
    Unknown = 0,
    Internal = 1,
    External = 2,
    Hibernation = 3,
}

impl ClockSourceKind {
    /// Name used in the configuration input and in the status line.
    pub fn name(self) -> &'static str {
        match self {
            ClockSourceKind::Unknown => "unknown",
            ClockSourceKind::Internal => "internal",
            ClockSourceKind::External => "external",
            ClockSourceKind::Hibernation => "hibernation",
        }
    }

    /// Parse a configured source name. Anything unrecognized is `Unknown`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "internal" => ClockSourceKind::Internal,
            "external" => ClockSourceKind::External,
            "hibernation" => ClockSourceKind::Hibernation,
            _ => ClockSourceKind::Unknown,
        }
    }
}

impl TryFrom<u32> for ClockSourceKind {
    type Error = ClockError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ClockSourceKind::Unknown),
            1 => Ok(ClockSourceKind::Internal),
            2 => Ok(ClockSourceKind::External),
            3 => Ok(ClockSourceKind::Hibernation),
            _ => Err(ClockError::InvalidArgument),
        }
    }
}

impl fmt::Display for ClockSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Requested clock settings. Frequencies are in Hz.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockConfig {
    pub target_frequency: u64,
    pub tolerance: u64,
    /// Only meaningful for the external and hibernation sources.
    pub oscillator_frequency: u64,
    pub source: ClockSourceKind,
}

impl ClockConfig {
    /// Read the `dmclk` section. Missing or negative integers read as 0, a
    /// missing or unrecognized source as `Unknown`; [ClockConfig::validate]
    /// rejects both.
    pub fn from_store(store: &impl ConfigStore) -> Self {
        let frequency = |key: &str| u64::try_from(store.get_int(SECTION, key, 0)).unwrap_or(0);

        Self {
            target_frequency: frequency("target_frequency"),
            tolerance: frequency("tolerance"),
            oscillator_frequency: frequency("oscillator_frequency"),
            source: store
                .get_str(SECTION, "source")
                .map_or(ClockSourceKind::Unknown, ClockSourceKind::from_name),
        }
    }

    /// Check the record is complete enough to be applied.
    ///
    /// # Errors:
    ///
    /// + [Err]\([ClockError::InvalidConfiguration]\) if the target frequency
    /// or the tolerance is zero, the source is unknown, or the oscillator
    /// frequency is zero for a source other than the internal one.
    pub fn validate(&self) -> Result<(), ClockError> {
        if self.target_frequency == 0 {
            error!("dmclk: target frequency not set");
            return Err(ClockError::InvalidConfiguration);
        }
        if self.tolerance == 0 {
            error!("dmclk: tolerance not set");
            return Err(ClockError::InvalidConfiguration);
        }
        if self.source == ClockSourceKind::Unknown {
            error!("dmclk: clock source not set or unknown");
            return Err(ClockError::InvalidConfiguration);
        }
        if self.source != ClockSourceKind::Internal && self.oscillator_frequency == 0 {
            error!(
                "dmclk: oscillator frequency not set for the {} source",
                self.source
            );
            return Err(ClockError::InvalidConfiguration);
        }
        Ok(())
    }

    /// What the source asks of the hardware.
    pub fn request(&self) -> Result<ClockRequest, ClockError> {
        match self.source {
            ClockSourceKind::Unknown => Err(ClockError::InvalidConfiguration),
            ClockSourceKind::Internal => Ok(ClockRequest::Internal),
            ClockSourceKind::External => Ok(ClockRequest::External {
                oscillator_frequency: self.oscillator_frequency,
            }),
            ClockSourceKind::Hibernation => Ok(ClockRequest::Hibernation {
                oscillator_frequency: self.oscillator_frequency,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_store::{ConfigEntry, KeyValueConfig};

    fn valid() -> ClockConfig {
        ClockConfig {
            target_frequency: 216_000_000,
            tolerance: 1000,
            oscillator_frequency: 25_000_000,
            source: ClockSourceKind::External,
        }
    }

    #[test]
    fn source_names() {
        for source in [
            ClockSourceKind::Internal,
            ClockSourceKind::External,
            ClockSourceKind::Hibernation,
        ] {
            assert_eq!(ClockSourceKind::from_name(source.name()), source);
            assert_eq!(ClockSourceKind::try_from(source as u32), Ok(source));
        }
        assert_eq!(ClockSourceKind::Unknown.name(), "unknown");
        assert_eq!(ClockSourceKind::from_name("External"), ClockSourceKind::Unknown);
        assert_eq!(ClockSourceKind::from_name(""), ClockSourceKind::Unknown);
        assert_eq!(ClockSourceKind::try_from(4), Err(ClockError::InvalidArgument));
    }

    #[test]
    fn validation_rejects_incomplete_records() {
        assert_eq!(valid().validate(), Ok(()));

        let broken = [
            ClockConfig {
                target_frequency: 0,
                ..valid()
            },
            ClockConfig {
                tolerance: 0,
                ..valid()
            },
            ClockConfig {
                source: ClockSourceKind::Unknown,
                ..valid()
            },
            ClockConfig {
                oscillator_frequency: 0,
                ..valid()
            },
            ClockConfig {
                oscillator_frequency: 0,
                source: ClockSourceKind::Hibernation,
                ..valid()
            },
        ];
        for config in broken {
            assert_eq!(config.validate(), Err(ClockError::InvalidConfiguration));
        }
    }

    #[test]
    fn internal_source_needs_no_oscillator() {
        let config = ClockConfig {
            oscillator_frequency: 0,
            source: ClockSourceKind::Internal,
            ..valid()
        };
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.request(), Ok(ClockRequest::Internal));
    }

    #[test]
    fn read_from_store() {
        static ENTRIES: [ConfigEntry<'static>; 5] = [
            ConfigEntry {
                section: "dmclk",
                key: "source",
                value: "external",
            },
            ConfigEntry {
                section: "dmclk",
                key: "target_frequency",
                value: "216000000",
            },
            ConfigEntry {
                section: "dmclk",
                key: "tolerance",
                value: "1000",
            },
            ConfigEntry {
                section: "dmclk",
                key: "oscillator_frequency",
                value: "25000000",
            },
            ConfigEntry {
                section: "other",
                key: "tolerance",
                value: "1",
            },
        ];
        let config = ClockConfig::from_store(&KeyValueConfig::new(&ENTRIES));
        assert_eq!(config, valid());
        assert_eq!(
            config.request(),
            Ok(ClockRequest::External {
                oscillator_frequency: 25_000_000
            })
        );
    }

    #[test]
    fn missing_and_negative_values() {
        static ENTRIES: [ConfigEntry<'static>; 2] = [
            ConfigEntry {
                section: "dmclk",
                key: "tolerance",
                value: "-5",
            },
            ConfigEntry {
                section: "dmclk",
                key: "source",
                value: "pll",
            },
        ];
        let config = ClockConfig::from_store(&KeyValueConfig::new(&ENTRIES));
        assert_eq!(
            config,
            ClockConfig {
                target_frequency: 0,
                tolerance: 0,
                oscillator_frequency: 0,
                source: ClockSourceKind::Unknown,
            }
        );
        assert_eq!(config.validate(), Err(ClockError::InvalidConfiguration));
        assert_eq!(config.request(), Err(ClockError::InvalidConfiguration));
    }
}
