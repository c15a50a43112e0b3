// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! System clock sequencer.
//!
//! The sequencer owns the [ClockRegisters] capability and performs every
//! register access of a clock change. Each step is a method that either
//! completes or fails; the `configure_*` methods chain them and stop at the
//! first failure.
//!
//! A PLL based configuration runs, in order:
//!
//! 1. [Sequencer::plan]: PLL search, flash table lookup and bus prescaler
//!    derivation. Nothing is written if any of them fails.
//! 2. Enable the PLL source oscillator and wait until it is ready.
//! 3. If the PLL drives the system clock, move the system clock to the HSI.
//! 4. Set the flash wait states for the new frequency and read them back.
//! 5. Disable the PLL and wait until it unlocks.
//! 6. Program M, N, P, Q and the PLL source.
//! 7. Enable the PLL and wait until it locks.
//! 8. Set the AHB and APB prescalers.
//! 9. Select the PLL as system clock and wait for the switch status.
//!
//! Every wait is a poll loop with a fixed number of iterations taken from
//! `CONFIG`. The budgets do not correspond to a duration.
//!
//! # Usage
//!
//! ```rust,ignore
//! let registers = unsafe { MmioClockRegisters::new(stm32f7::RCC_BASE, stm32f7::FLASH_BASE) };
//! let sequencer = Sequencer::new(registers, &stm32f7::LIMITS);
//! let frequency = sequencer.configure_external(216_000_000, 1000, 25_000_000)?;
//! ```

use core::cell::Cell;

use log::debug;
use tock_registers::LocalRegisterCopy;

use crate::config::CONFIG;
use crate::error::ClockError;
use crate::flash;
use crate::limits::{ClockLimits, HSI_FREQUENCY};
use crate::pll::{PllConfig, PllSource};
use crate::prescaler::APBPrescaler;
use crate::registers::{self, ClockRegister, ClockRegisters, CFGR, CR, CSR, PLLCFGR};

/// Oscillators the sequencer can start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Oscillator {
    HSI,
    HSE,
    LSI,
}

/// Values of the `SW` and `SWS` fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SysClockSource {
    HSI = 0b00,
    HSE = 0b01,
    PLL = 0b10,
}

/// What a configuration asks of the hardware.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockRequest {
    /// PLL fed by the HSI
    Internal,
    /// PLL fed by an external oscillator
    External { oscillator_frequency: u64 },
    /// Low-speed internal oscillator, system clock untouched
    Hibernation { oscillator_frequency: u64 },
}

/// Register values computed from a [ClockRequest].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockPlan {
    Pll {
        pll: PllConfig,
        /// PLL source frequency
        input: u32,
        sysclk: u32,
        apb1: APBPrescaler,
        apb2: APBPrescaler,
    },
    /// Start the low-speed oscillator only
    LowSpeed,
}

fn poll(budget: usize, mut ready: impl FnMut() -> bool) -> Result<(), ClockError> {
    for _ in 0..budget {
        if ready() {
            return Ok(());
        }
    }

    Err(ClockError::HardwareTimeout)
}

/// Busy-loop iterations for `us` microseconds at `frequency` Hz, counting
/// four cycles per iteration.
pub fn delay_iterations(us: u32, frequency: u32) -> u32 {
    let cycles = us.saturating_mul(frequency / 1_000_000);
    (cycles / 4).max(1)
}

pub struct Sequencer<R: ClockRegisters> {
    registers: R,
    limits: &'static ClockLimits,
    hse_frequency: Cell<Option<u32>>,
}

impl<R: ClockRegisters> Sequencer<R> {
    pub fn new(registers: R, limits: &'static ClockLimits) -> Self {
        Self {
            registers,
            limits,
            hse_frequency: Cell::new(None),
        }
    }

    pub fn limits(&self) -> &'static ClockLimits {
        self.limits
    }

    /// Frequency of the external oscillator, once it has been started by
    /// [Sequencer::configure_external].
    pub fn hse_frequency(&self) -> Option<u32> {
        self.hse_frequency.get()
    }

    fn cr(&self) -> LocalRegisterCopy<u32, CR::Register> {
        registers::load(&self.registers, ClockRegister::RccCr)
    }

    fn cfgr(&self) -> LocalRegisterCopy<u32, CFGR::Register> {
        registers::load(&self.registers, ClockRegister::RccCfgr)
    }

    fn pllcfgr(&self) -> LocalRegisterCopy<u32, PLLCFGR::Register> {
        registers::load(&self.registers, ClockRegister::RccPllcfgr)
    }

    fn csr(&self) -> LocalRegisterCopy<u32, CSR::Register> {
        registers::load(&self.registers, ClockRegister::RccCsr)
    }

    /// Start an oscillator and wait until it is ready.
    ///
    /// # Errors:
    ///
    /// + [Err]\([ClockError::HardwareTimeout]\) if the ready flag stayed low.
    pub fn enable_oscillator(&self, oscillator: Oscillator) -> Result<(), ClockError> {
        if CONFIG.trace_sequencer {
            debug!("clocks: enabling {:?}", oscillator);
        }

        match oscillator {
            Oscillator::HSI => {
                registers::modify(&self.registers, ClockRegister::RccCr, CR::HSION::SET);
                poll(CONFIG.oscillator_budget, || self.cr().is_set(CR::HSIRDY))
            }
            Oscillator::HSE => {
                registers::modify(&self.registers, ClockRegister::RccCr, CR::HSEON::SET);
                poll(CONFIG.oscillator_budget, || self.cr().is_set(CR::HSERDY))
            }
            Oscillator::LSI => {
                registers::modify(&self.registers, ClockRegister::RccCsr, CSR::LSION::SET);
                poll(CONFIG.oscillator_budget, || self.csr().is_set(CSR::LSIRDY))
            }
        }
    }

    /// Stop the PLL and wait until it unlocks.
    ///
    /// # Errors:
    ///
    /// + [Err]\([ClockError::InvalidConfiguration]\) if the PLL is the system
    /// clock. See [Sequencer::park_on_hsi].
    /// + [Err]\([ClockError::HardwareTimeout]\) if the PLL stayed locked.
    pub fn disable_pll(&self) -> Result<(), ClockError> {
        if self.sys_clock_source() == Some(SysClockSource::PLL) {
            return Err(ClockError::InvalidConfiguration);
        }

        registers::modify(&self.registers, ClockRegister::RccCr, CR::PLLON::CLEAR);
        poll(CONFIG.pll_budget, || !self.cr().is_set(CR::PLLRDY))
    }

    /// Write the PLL dividers and source.
    ///
    /// # Errors:
    ///
    /// + [Err]\([ClockError::InvalidArgument]\) if P is not an even value
    /// the field can hold.
    /// + [Err]\([ClockError::InvalidConfiguration]\) if the PLL is running.
    pub fn program_pll(&self, pll: &PllConfig) -> Result<(), ClockError> {
        if pll.p < 2 || pll.p > 8 || pll.p % 2 != 0 {
            return Err(ClockError::InvalidArgument);
        }
        if self.cr().is_set(CR::PLLON) {
            return Err(ClockError::InvalidConfiguration);
        }

        if CONFIG.trace_sequencer {
            debug!("clocks: programming {:?}", pll);
        }

        registers::modify(
            &self.registers,
            ClockRegister::RccPllcfgr,
            PLLCFGR::PLLM.val(pll.m)
                + PLLCFGR::PLLN.val(pll.n)
                + PLLCFGR::PLLP.val(pll.p / 2 - 1)
                + PLLCFGR::PLLQ.val(pll.q)
                + PLLCFGR::PLLSRC.val(pll.source as u32),
        );
        Ok(())
    }

    /// Start the PLL and wait until it locks.
    ///
    /// # Errors:
    ///
    /// + [Err]\([ClockError::HardwareTimeout]\) if the PLL did not lock.
    pub fn enable_pll(&self) -> Result<(), ClockError> {
        registers::modify(&self.registers, ClockRegister::RccCr, CR::PLLON::SET);
        poll(CONFIG.pll_budget, || self.cr().is_set(CR::PLLRDY))
    }

    /// Set the flash wait states required at `frequency`.
    ///
    /// # Errors:
    ///
    /// + [Err]\([ClockError::NotAchievable]\) if the frequency is above the
    /// flash table.
    /// + [Err]\([ClockError::VerificationFailed]\) if the latency did not
    /// read back.
    pub fn set_flash_latency(&self, frequency: u32) -> Result<(), ClockError> {
        let latency = flash::wait_states(self.limits, frequency)?;
        if CONFIG.trace_sequencer {
            debug!("clocks: {} flash wait states", latency);
        }
        flash::set_latency(&self.registers, latency)
    }

    /// Leave the AHB undivided and set both APB prescalers.
    ///
    /// # Errors:
    ///
    /// + [Err]\([ClockError::VerificationFailed]\) if the prescalers did not
    /// read back.
    pub fn set_bus_prescalers(
        &self,
        apb1: APBPrescaler,
        apb2: APBPrescaler,
    ) -> Result<(), ClockError> {
        registers::modify(
            &self.registers,
            ClockRegister::RccCfgr,
            CFGR::HPRE.val(0) + CFGR::PPRE1.val(apb1.code()) + CFGR::PPRE2.val(apb2.code()),
        );

        for _ in 0..CONFIG.verify_budget {
            let cfgr = self.cfgr();
            if cfgr.read(CFGR::HPRE) == 0
                && cfgr.read(CFGR::PPRE1) == apb1.code()
                && cfgr.read(CFGR::PPRE2) == apb2.code()
            {
                return Ok(());
            }
        }

        Err(ClockError::VerificationFailed)
    }

    /// Select the system clock and wait until the hardware reports it.
    ///
    /// # Errors:
    ///
    /// + [Err]\([ClockError::HardwareTimeout]\) if the switch status did not
    /// change.
    pub fn switch_sys_clock(&self, source: SysClockSource) -> Result<(), ClockError> {
        if CONFIG.trace_sequencer {
            debug!("clocks: switching system clock to {:?}", source);
        }

        registers::modify(
            &self.registers,
            ClockRegister::RccCfgr,
            CFGR::SW.val(source as u32),
        );

        // SWS uses the same encoding as SW
        let expected = source as u32;
        poll(CONFIG.switch_budget, || self.cfgr().read(CFGR::SWS) == expected)
    }

    /// System clock source reported by the switch status. `None` for the
    /// reserved encoding.
    pub fn sys_clock_source(&self) -> Option<SysClockSource> {
        match self.cfgr().read(CFGR::SWS) {
            0b00 => Some(SysClockSource::HSI),
            0b01 => Some(SysClockSource::HSE),
            0b10 => Some(SysClockSource::PLL),
            _ => None,
        }
    }

    /// Move the system clock to the HSI if it currently runs from the PLL, so
    /// the PLL can be reprogrammed.
    pub fn park_on_hsi(&self) -> Result<(), ClockError> {
        if self.sys_clock_source() != Some(SysClockSource::PLL) {
            return Ok(());
        }

        self.enable_oscillator(Oscillator::HSI)?;
        self.switch_sys_clock(SysClockSource::HSI)
    }

    /// Current system clock frequency, computed from the registers.
    ///
    /// Returns 0 if the frequency depends on an external oscillator whose
    /// frequency is unknown, or if the registers hold no valid configuration.
    pub fn frequency(&self) -> u32 {
        let hse = self.hse_frequency.get().unwrap_or(0);

        match self.sys_clock_source() {
            Some(SysClockSource::HSI) => HSI_FREQUENCY,
            Some(SysClockSource::HSE) => hse,
            Some(SysClockSource::PLL) => {
                let pllcfgr = self.pllcfgr();
                let (source, input) = if pllcfgr.is_set(PLLCFGR::PLLSRC) {
                    (PllSource::HSE, hse)
                } else {
                    (PllSource::HSI, HSI_FREQUENCY)
                };
                let pll = PllConfig {
                    m: pllcfgr.read(PLLCFGR::PLLM),
                    n: pllcfgr.read(PLLCFGR::PLLN),
                    p: (pllcfgr.read(PLLCFGR::PLLP) + 1) * 2,
                    q: pllcfgr.read(PLLCFGR::PLLQ),
                    source,
                };
                if pll.m == 0 {
                    0
                } else {
                    pll.output_frequency(input)
                }
            }
            None => 0,
        }
    }

    /// Check a request against the limits and compute everything the
    /// registers will receive. No register is accessed.
    ///
    /// # Errors:
    ///
    /// + [Err]\([ClockError::InvalidArgument]\) if the oscillator frequency
    /// does not fit the hardware.
    /// + [Err]\([ClockError::NotAchievable]\) if the target can't be reached
    /// within tolerance.
    /// + [Err]\([ClockError::InvalidConfiguration]\) if the bus ceilings
    /// can't be met.
    pub fn plan(
        &self,
        request: ClockRequest,
        target: u64,
        tolerance: u64,
    ) -> Result<ClockPlan, ClockError> {
        let (source, input) = match request {
            ClockRequest::Internal => (PllSource::HSI, HSI_FREQUENCY),
            ClockRequest::External {
                oscillator_frequency,
            } => {
                let input = u32::try_from(oscillator_frequency)
                    .map_err(|_| ClockError::InvalidArgument)?;
                (PllSource::HSE, input)
            }
            ClockRequest::Hibernation {
                oscillator_frequency,
            } => {
                if target.abs_diff(oscillator_frequency) > tolerance {
                    return Err(ClockError::NotAchievable);
                }
                return Ok(ClockPlan::LowSpeed);
            }
        };

        let pll = PllConfig::search(target, tolerance, u64::from(input), source, self.limits)?;
        let sysclk = pll.output_frequency(input);
        if sysclk > self.limits.max_hclk {
            return Err(ClockError::NotAchievable);
        }
        flash::wait_states(self.limits, sysclk)?;

        Ok(ClockPlan::Pll {
            pll,
            input,
            sysclk,
            apb1: APBPrescaler::derive(sysclk, self.limits.max_pclk1)?,
            apb2: APBPrescaler::derive(sysclk, self.limits.max_pclk2)?,
        })
    }

    /// Write a plan to the registers.
    ///
    /// Returns the system clock frequency read back from the registers once
    /// the plan is written.
    pub fn apply(&self, plan: &ClockPlan) -> Result<u32, ClockError> {
        match *plan {
            ClockPlan::Pll {
                pll,
                input,
                sysclk,
                apb1,
                apb2,
            } => {
                match pll.source {
                    PllSource::HSI => self.enable_oscillator(Oscillator::HSI)?,
                    PllSource::HSE => {
                        self.enable_oscillator(Oscillator::HSE)?;
                        self.hse_frequency.set(Some(input));
                    }
                }
                self.park_on_hsi()?;
                self.set_flash_latency(sysclk)?;
                self.disable_pll()?;
                self.program_pll(&pll)?;
                self.enable_pll()?;
                self.set_bus_prescalers(apb1, apb2)?;
                self.switch_sys_clock(SysClockSource::PLL)?;

                Ok(self.frequency())
            }
            ClockPlan::LowSpeed => {
                self.enable_oscillator(Oscillator::LSI)?;
                Ok(self.frequency())
            }
        }
    }

    /// Run the system clock from the PLL fed by the HSI.
    pub fn configure_internal(&self, target: u64, tolerance: u64) -> Result<u32, ClockError> {
        self.apply(&self.plan(ClockRequest::Internal, target, tolerance)?)
    }

    /// Run the system clock from the PLL fed by an external oscillator of
    /// `oscillator_frequency` Hz.
    pub fn configure_external(
        &self,
        target: u64,
        tolerance: u64,
        oscillator_frequency: u64,
    ) -> Result<u32, ClockError> {
        let request = ClockRequest::External {
            oscillator_frequency,
        };
        self.apply(&self.plan(request, target, tolerance)?)
    }

    /// Start the low-speed oscillator used while hibernating.
    ///
    /// The system clock is left alone. Succeeds if `target` is within
    /// `tolerance` of the oscillator frequency, and returns the system clock
    /// frequency read back from the registers.
    pub fn configure_hibernation(
        &self,
        target: u64,
        tolerance: u64,
        oscillator_frequency: u64,
    ) -> Result<u32, ClockError> {
        let request = ClockRequest::Hibernation {
            oscillator_frequency,
        };
        self.apply(&self.plan(request, target, tolerance)?)
    }

    /// Spin for roughly `us` microseconds at the current system clock.
    pub fn delay_us(&self, us: u32) {
        if us == 0 {
            return;
        }
        for _ in 0..delay_iterations(us, self.frequency()) {
            core::hint::spin_loop();
        }
    }
}
