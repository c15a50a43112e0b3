// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Simulated clock registers for host tests.
//!
//! Writes are stored as-is, then the status bits are derived the way the
//! silicon derives them: every ready flag follows its enable bit, `SWS`
//! follows `SW` and the flash latency is accepted. Faults are injected by
//! holding status bits low, freezing the switch status or dropping latency
//! writes.

use core::cell::Cell;

use tock_registers::fields::Field;
use tock_registers::LocalRegisterCopy;

use crate::registers::{ClockRegister, ClockRegisters, ACR, CFGR, CR, CSR};

pub struct MockClockRegisters {
    cr: Cell<u32>,
    pllcfgr: Cell<u32>,
    cfgr: Cell<u32>,
    csr: Cell<u32>,
    acr: Cell<u32>,
    cr_held_low: Cell<u32>,
    csr_held_low: Cell<u32>,
    switch_frozen: Cell<bool>,
    latency_ignored: Cell<bool>,
    writes: [Cell<usize>; 5],
}

impl MockClockRegisters {
    /// Reset state: HSI on and selected, PLL off, zero wait states.
    pub fn new() -> Self {
        Self {
            cr: Cell::new(0x0000_0083),
            pllcfgr: Cell::new(0x2400_3010),
            cfgr: Cell::new(0),
            csr: Cell::new(0),
            acr: Cell::new(0),
            cr_held_low: Cell::new(0),
            csr_held_low: Cell::new(0),
            switch_frozen: Cell::new(false),
            latency_ignored: Cell::new(false),
            writes: Default::default(),
        }
    }

    /// Keep an `RCC_CR` status flag cleared whatever is written.
    pub fn hold_cr_low(&self, flag: Field<u32, CR::Register>) {
        let mask = flag.mask << flag.shift;
        self.cr_held_low.set(self.cr_held_low.get() | mask);
        self.cr.set(self.cr.get() & !mask);
    }

    /// Keep an `RCC_CSR` status flag cleared whatever is written.
    pub fn hold_csr_low(&self, flag: Field<u32, CSR::Register>) {
        let mask = flag.mask << flag.shift;
        self.csr_held_low.set(self.csr_held_low.get() | mask);
        self.csr.set(self.csr.get() & !mask);
    }

    /// Stop `SWS` from following `SW`.
    pub fn freeze_switch(&self) {
        self.switch_frozen.set(true);
    }

    /// Drop writes to the flash latency field.
    pub fn ignore_latency_writes(&self) {
        self.latency_ignored.set(true);
    }

    /// Set a register without simulating the hardware response.
    pub fn preload(&self, register: ClockRegister, value: u32) {
        self.cell(register).set(value);
    }

    /// Number of writes the register has received.
    pub fn writes(&self, register: ClockRegister) -> usize {
        self.writes[Self::index(register)].get()
    }

    fn index(register: ClockRegister) -> usize {
        match register {
            ClockRegister::RccCr => 0,
            ClockRegister::RccPllcfgr => 1,
            ClockRegister::RccCfgr => 2,
            ClockRegister::RccCsr => 3,
            ClockRegister::FlashAcr => 4,
        }
    }

    fn cell(&self, register: ClockRegister) -> &Cell<u32> {
        match register {
            ClockRegister::RccCr => &self.cr,
            ClockRegister::RccPllcfgr => &self.pllcfgr,
            ClockRegister::RccCfgr => &self.cfgr,
            ClockRegister::RccCsr => &self.csr,
            ClockRegister::FlashAcr => &self.acr,
        }
    }
}

impl ClockRegisters for MockClockRegisters {
    fn read(&self, register: ClockRegister) -> u32 {
        self.cell(register).get()
    }

    fn write(&self, register: ClockRegister, value: u32) {
        let counter = &self.writes[Self::index(register)];
        counter.set(counter.get() + 1);

        match register {
            ClockRegister::RccCr => {
                let mut cr = LocalRegisterCopy::<u32, CR::Register>::new(value);
                cr.modify(CR::HSIRDY.val(cr.read(CR::HSION)));
                cr.modify(CR::HSERDY.val(cr.read(CR::HSEON)));
                cr.modify(CR::PLLRDY.val(cr.read(CR::PLLON)));
                self.cr.set(cr.get() & !self.cr_held_low.get());
            }
            ClockRegister::RccCfgr => {
                let mut cfgr = LocalRegisterCopy::<u32, CFGR::Register>::new(value);
                let status = if self.switch_frozen.get() {
                    LocalRegisterCopy::<u32, CFGR::Register>::new(self.cfgr.get()).read(CFGR::SWS)
                } else {
                    cfgr.read(CFGR::SW)
                };
                cfgr.modify(CFGR::SWS.val(status));
                self.cfgr.set(cfgr.get());
            }
            ClockRegister::RccCsr => {
                let mut csr = LocalRegisterCopy::<u32, CSR::Register>::new(value);
                csr.modify(CSR::LSIRDY.val(csr.read(CSR::LSION)));
                self.csr.set(csr.get() & !self.csr_held_low.get());
            }
            ClockRegister::FlashAcr => {
                let mut acr = LocalRegisterCopy::<u32, ACR::Register>::new(value);
                if self.latency_ignored.get() {
                    let previous = LocalRegisterCopy::<u32, ACR::Register>::new(self.acr.get());
                    acr.modify(ACR::LATENCY.val(previous.read(ACR::LATENCY)));
                }
                self.acr.set(acr.get());
            }
            ClockRegister::RccPllcfgr => self.pllcfgr.set(value),
        }
    }
}
