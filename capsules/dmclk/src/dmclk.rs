// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Clock device: owns the clock configuration and applies it.
//!
//! Device Interface
//! ----------------
//!
//! ### `command`
//!
//! Commands are numbered as listed in [Command::decode]. Get commands return
//! the stored value; set commands stage the new value on a copy of the
//! configuration and validate the copy, then store it and apply it.
//!
//! The possible errors are:
//!
//! * `Rejected(InvalidArgument)`: unknown command, missing argument or
//!   released device.
//! * `Rejected(InvalidConfiguration)`: the resulting configuration is
//!   incomplete, or its target is above the family's system clock ceiling.
//! * `Committed(NotAchievable)`: the new setting is stored, but no divider
//!   set reaches the target within tolerance. No register was written.
//! * `Committed(HardwareTimeout | VerificationFailed)`: the new setting is
//!   stored, but the hardware did not follow.
//!
//! A stored setting that can't be applied yet is how multi-field changes are
//! made one command at a time, e.g. from `external` to `hibernation`: set the
//! oscillator frequency, then the source, then the target. The last command
//! applies.
//!
//! The reported frequency is always read back from the registers after an
//! apply attempt, failed or not, so it matches the clock the chip runs on.
//!
//! ### `read`
//!
//! Returns the status line, see [crate::status].
//!
//! ### `write`
//!
//! The device is read-only. Writes are accepted and consume nothing.
//!
//! Usage
//! -----
//!
//! ```rust,ignore
//! let registers = unsafe { MmioClockRegisters::new(stm32f7::RCC_BASE, stm32f7::FLASH_BASE) };
//! let sequencer = Sequencer::new(registers, &stm32f7::LIMITS);
//! let mut dmclk = DeviceContext::create(&board_config, sequencer)?;
//! dmclk.command(Command::Set(Setting::TargetFrequency(96_000_000)))?;
//! ```

use log::{debug, error, info, warn};
use stm32f_clocks::sequencer::ClockPlan;
use stm32f_clocks::{ClockError, ClockRegisters, Sequencer};

use crate::clock_config::ClockConfig;
use crate::command::{Command, CommandError, CommandReturn, Field, Setting};
use crate::config::CONFIG;
use crate::config_store::ConfigStore;
use crate::status::Status;

/// Marker of a live context ("DCLK").
pub const MAGIC: u32 = 0x4443_4C4B;

/// Permissions reported by [DeviceContext::stat].
pub const MODE_READ_ONLY: u32 = 0o444;

/// Access requested when opening the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
    ReadWrite,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceStat {
    /// Length of the status line
    pub size: usize,
    pub mode: u32,
}

pub struct DeviceContext<R: ClockRegisters> {
    magic: u32,
    config: ClockConfig,
    current_frequency: u64,
    sequencer: Sequencer<R>,
}

impl<R: ClockRegisters> DeviceContext<R> {
    /// Read the `dmclk` section of `store` and apply it.
    ///
    /// No context exists unless the configuration is valid and was applied.
    pub fn create(store: &impl ConfigStore, sequencer: Sequencer<R>) -> Result<Self, ClockError> {
        Self::with_config(ClockConfig::from_store(store), sequencer)
    }

    /// Apply `config` and wrap it into a context.
    pub fn with_config(config: ClockConfig, sequencer: Sequencer<R>) -> Result<Self, ClockError> {
        let mut context = Self {
            magic: MAGIC,
            config,
            current_frequency: 0,
            sequencer,
        };
        context.admit(&config)?;
        context.configure()?;
        info!("Clock configured to {} Hz", context.current_frequency);
        Ok(context)
    }

    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC
    }

    /// Invalidate the context. Every later operation fails with
    /// `InvalidArgument`.
    pub fn release(&mut self) {
        self.magic = 0;
    }

    fn check(&self) -> Result<(), ClockError> {
        if self.is_valid() {
            Ok(())
        } else {
            error!("dmclk: invalid context");
            Err(ClockError::InvalidArgument)
        }
    }

    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    /// Frequency read back after the last apply attempt.
    pub fn current_frequency(&self) -> u64 {
        self.current_frequency
    }

    pub fn sequencer(&self) -> &Sequencer<R> {
        &self.sequencer
    }

    /// Checks a configuration must pass before it is stored.
    fn admit(&self, config: &ClockConfig) -> Result<(), ClockError> {
        config.validate()?;

        let ceiling = self.sequencer.limits().max_sysclk;
        if config.target_frequency > u64::from(ceiling) {
            error!("dmclk: target frequency above the {} Hz ceiling", ceiling);
            return Err(ClockError::InvalidConfiguration);
        }
        Ok(())
    }

    fn plan(&self, config: &ClockConfig) -> Result<ClockPlan, ClockError> {
        self.sequencer
            .plan(config.request()?, config.target_frequency, config.tolerance)
    }

    /// Apply the stored configuration and refresh the reported frequency.
    fn configure(&mut self) -> Result<(), ClockError> {
        let result = self
            .plan(&self.config)
            .and_then(|plan| self.sequencer.apply(&plan));

        // A failed sequence may already have moved the system clock
        self.current_frequency = u64::from(self.sequencer.frequency());
        result.map(|_| ())
    }

    /// Apply the stored configuration again.
    pub fn reconfigure(&mut self) -> Result<(), ClockError> {
        self.check()?;
        self.configure()?;
        info!("Clock reconfigured to {} Hz", self.current_frequency);
        Ok(())
    }

    pub fn get(&self, field: Field) -> Result<CommandReturn, ClockError> {
        self.check()?;

        Ok(match field {
            Field::Frequency => CommandReturn::Frequency(self.current_frequency),
            Field::Source => CommandReturn::Source(self.config.source),
            Field::Tolerance => CommandReturn::Frequency(self.config.tolerance),
            Field::OscillatorFrequency => {
                CommandReturn::Frequency(self.config.oscillator_frequency)
            }
            Field::TargetFrequency => CommandReturn::Frequency(self.config.target_frequency),
        })
    }

    /// Change one setting and apply the result.
    pub fn set(&mut self, setting: Setting) -> Result<(), CommandError> {
        self.check()?;

        let mut staged = self.config;
        setting.apply_to(&mut staged);
        self.admit(&staged)?;

        // From here on the new setting is kept even if it can't be applied
        self.config = staged;
        self.configure().map_err(|err| {
            warn!("dmclk: {:?} stored but not applied: {}", setting, err);
            CommandError::Committed(err)
        })?;

        info!("Clock reconfigured to {} Hz", self.current_frequency);
        Ok(())
    }

    pub fn command(&mut self, command: Command) -> Result<CommandReturn, CommandError> {
        if CONFIG.trace_commands {
            debug!("dmclk: {:?}", command);
        }

        match command {
            Command::Get(field) => Ok(self.get(field)?),
            Command::Set(setting) => self.set(setting).map(|()| CommandReturn::Success),
            Command::Reconfigure => {
                self.reconfigure()?;
                Ok(CommandReturn::Success)
            }
        }
    }

    /// Decode and run a numbered command.
    pub fn command_num(
        &mut self,
        command_num: usize,
        argument: Option<u64>,
    ) -> Result<CommandReturn, CommandError> {
        self.check()?;

        let command = Command::decode(command_num, argument).map_err(|err| {
            error!("dmclk: invalid command {}", command_num);
            err
        })?;
        self.command(command)
    }

    pub fn status(&self) -> Status {
        Status {
            frequency: self.current_frequency,
            source: self.config.source,
            oscillator_frequency: self.config.oscillator_frequency,
        }
    }

    /// # Errors:
    ///
    /// + [Err]\([ClockError::InvalidArgument]\) if write access is requested.
    pub fn open(&self, mode: AccessMode) -> Result<(), ClockError> {
        self.check()?;

        match mode {
            AccessMode::Read => Ok(()),
            AccessMode::Write | AccessMode::ReadWrite => {
                error!("dmclk: write access is not supported");
                Err(ClockError::InvalidArgument)
            }
        }
    }

    pub fn close(&self) {}

    /// Copy the status line into `buffer`, truncated to its length.
    pub fn read(&self, buffer: &mut [u8]) -> Result<usize, ClockError> {
        self.check()?;
        Ok(self.status().render(buffer))
    }

    /// Accepted and ignored.
    pub fn write(&self, _data: &[u8]) -> usize {
        0
    }

    pub fn flush(&self) -> Result<(), ClockError> {
        self.check()
    }

    pub fn stat(&self) -> Result<DeviceStat, ClockError> {
        self.check()?;
        Ok(DeviceStat {
            size: self.status().line_length(),
            mode: MODE_READ_ONLY,
        })
    }
}
