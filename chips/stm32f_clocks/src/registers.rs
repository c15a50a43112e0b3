// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! RCC and FLASH registers driven by the clock engine.
//!
//! Only the registers taking part in system clock bring-up are described. The
//! layouts are shared by the STM32F4 and STM32F7 families.
//!
//! The engine never touches memory directly. It goes through a
//! [ClockRegisters] capability, implemented by [MmioClockRegisters] on
//! hardware and by `MockClockRegisters` in tests.

use core::ops::Deref;

use tock_registers::fields::FieldValue;
use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::registers::ReadWrite;
use tock_registers::{register_bitfields, LocalRegisterCopy, RegisterLongName};

/// Reset and clock control, up to the control & status register.
#[repr(C)]
struct RccRegisters {
    /// clock control register
    cr: ReadWrite<u32, CR::Register>,
    /// PLL configuration register
    pllcfgr: ReadWrite<u32, PLLCFGR::Register>,
    /// clock configuration register
    cfgr: ReadWrite<u32, CFGR::Register>,
    _reserved0: [u8; 104],
    /// clock control & status register
    csr: ReadWrite<u32, CSR::Register>,
}

/// Flash interface, access control only.
#[repr(C)]
struct FlashRegisters {
    /// Flash access control register
    acr: ReadWrite<u32, ACR::Register>,
}

register_bitfields![u32,
    pub CR [
        /// Main PLL (PLL) clock ready flag
        PLLRDY OFFSET(25) NUMBITS(1) [],
        /// Main PLL (PLL) enable
        PLLON OFFSET(24) NUMBITS(1) [],
        /// HSE clock bypass
        HSEBYP OFFSET(18) NUMBITS(1) [],
        /// HSE clock ready flag
        HSERDY OFFSET(17) NUMBITS(1) [],
        /// HSE clock enable
        HSEON OFFSET(16) NUMBITS(1) [],
        /// Internal high-speed clock ready flag
        HSIRDY OFFSET(1) NUMBITS(1) [],
        /// Internal high-speed clock enable
        HSION OFFSET(0) NUMBITS(1) []
    ],
    pub PLLCFGR [
        /// Main PLL (PLL) division factor for USB OTG FS, SDIO and random num
        PLLQ OFFSET(24) NUMBITS(4) [],
        /// Main PLL (PLL) entry clock source
        PLLSRC OFFSET(22) NUMBITS(1) [
            HSI = 0,
            HSE = 1,
        ],
        /// Main PLL (PLL) division factor for main system clock
        PLLP OFFSET(16) NUMBITS(2) [],
        /// Main PLL (PLL) multiplication factor for VCO
        PLLN OFFSET(6) NUMBITS(9) [],
        /// Division factor for the main PLL (PLL) input
        PLLM OFFSET(0) NUMBITS(6) []
    ],
    pub CFGR [
        /// APB high-speed prescaler (APB2)
        PPRE2 OFFSET(13) NUMBITS(3) [],
        /// APB Low speed prescaler (APB1)
        PPRE1 OFFSET(10) NUMBITS(3) [],
        /// AHB prescaler
        HPRE OFFSET(4) NUMBITS(4) [],
        /// System clock switch status
        SWS OFFSET(2) NUMBITS(2) [],
        /// System clock switch
        SW OFFSET(0) NUMBITS(2) []
    ],
    pub CSR [
        /// Internal low-speed oscillator ready
        LSIRDY OFFSET(1) NUMBITS(1) [],
        /// Internal low-speed oscillator enable
        LSION OFFSET(0) NUMBITS(1) []
    ],
    pub ACR [
        /// Data cache enable
        DCEN OFFSET(10) NUMBITS(1) [],
        /// Instruction cache enable
        ICEN OFFSET(9) NUMBITS(1) [],
        /// Prefetch enable
        PRFTEN OFFSET(8) NUMBITS(1) [],
        /// Latency
        LATENCY OFFSET(0) NUMBITS(4) []
    ]
];

/// Registers reachable through a [ClockRegisters] capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockRegister {
    RccCr,
    RccPllcfgr,
    RccCfgr,
    RccCsr,
    FlashAcr,
}

/// Exclusive access to the clock control registers.
///
/// Whoever holds the capability is the only party reconfiguring the clock
/// tree. Reads and writes are whole 32-bit accesses; field manipulation is
/// done on local copies.
pub trait ClockRegisters {
    fn read(&self, register: ClockRegister) -> u32;
    fn write(&self, register: ClockRegister, value: u32);
}

impl<T: ClockRegisters + ?Sized> ClockRegisters for &T {
    fn read(&self, register: ClockRegister) -> u32 {
        (**self).read(register)
    }

    fn write(&self, register: ClockRegister, value: u32) {
        (**self).write(register, value)
    }
}

/// Read a register into a local copy typed by its bitfields.
pub(crate) fn load<R: RegisterLongName>(
    registers: &impl ClockRegisters,
    register: ClockRegister,
) -> LocalRegisterCopy<u32, R> {
    LocalRegisterCopy::new(registers.read(register))
}

/// Read-modify-write of the given fields.
pub(crate) fn modify<R: RegisterLongName>(
    registers: &impl ClockRegisters,
    register: ClockRegister,
    field: FieldValue<u32, R>,
) {
    let mut copy: LocalRegisterCopy<u32, R> = load(registers, register);
    copy.modify(field);
    registers.write(register, copy.get());
}

/// Pointer to a memory-mapped register block valid for the whole program.
struct StaticRef<T> {
    ptr: *const T,
}

impl<T> StaticRef<T> {
    /// # Safety
    ///
    /// `ptr` must be aligned, non-null and dereferenceable for as long as
    /// the returned value is used.
    const unsafe fn new(ptr: *const T) -> StaticRef<T> {
        StaticRef { ptr }
    }
}

impl<T> Clone for StaticRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StaticRef<T> {}

impl<T> Deref for StaticRef<T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.ptr }
    }
}

/// Memory-mapped RCC and FLASH blocks of the running chip.
pub struct MmioClockRegisters {
    rcc: StaticRef<RccRegisters>,
    flash: StaticRef<FlashRegisters>,
}

impl MmioClockRegisters {
    /// # Safety
    ///
    /// `rcc_base` and `flash_base` must be the addresses of the RCC and FLASH
    /// interface blocks of the running chip, and no other code may write the
    /// registers handed out here for as long as the value lives.
    pub unsafe fn new(rcc_base: usize, flash_base: usize) -> Self {
        Self {
            rcc: StaticRef::new(rcc_base as *const RccRegisters),
            flash: StaticRef::new(flash_base as *const FlashRegisters),
        }
    }
}

impl ClockRegisters for MmioClockRegisters {
    fn read(&self, register: ClockRegister) -> u32 {
        match register {
            ClockRegister::RccCr => self.rcc.cr.get(),
            ClockRegister::RccPllcfgr => self.rcc.pllcfgr.get(),
            ClockRegister::RccCfgr => self.rcc.cfgr.get(),
            ClockRegister::RccCsr => self.rcc.csr.get(),
            ClockRegister::FlashAcr => self.flash.acr.get(),
        }
    }

    fn write(&self, register: ClockRegister, value: u32) {
        match register {
            ClockRegister::RccCr => self.rcc.cr.set(value),
            ClockRegister::RccPllcfgr => self.rcc.pllcfgr.set(value),
            ClockRegister::RccCfgr => self.rcc.cfgr.set(value),
            ClockRegister::RccCsr => self.rcc.csr.set(value),
            ClockRegister::FlashAcr => self.flash.acr.set(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockClockRegisters;

    #[test]
    fn csr_sits_at_its_documented_offset() {
        assert_eq!(core::mem::offset_of!(RccRegisters, csr), 0x74);
        assert_eq!(core::mem::offset_of!(RccRegisters, cfgr), 0x08);
    }

    #[test]
    fn mmio_accesses_land_at_register_offsets() {
        let mut rcc = [0u32; 30];
        let mut flash = [0u32; 1];
        {
            let registers = unsafe {
                MmioClockRegisters::new(rcc.as_mut_ptr() as usize, flash.as_mut_ptr() as usize)
            };
            registers.write(ClockRegister::RccCfgr, 0b1010);
            registers.write(ClockRegister::RccCsr, 0b11);
            registers.write(ClockRegister::FlashAcr, 0x705);
            assert_eq!(registers.read(ClockRegister::RccCfgr), 0b1010);
            assert_eq!(registers.read(ClockRegister::RccCr), 0);
        }
        assert_eq!(rcc[0x08 / 4], 0b1010);
        assert_eq!(rcc[0x74 / 4], 0b11);
        assert_eq!(flash[0], 0x705);
    }

    #[test]
    fn modify_keeps_other_fields() {
        let registers = MockClockRegisters::new();
        registers.write(ClockRegister::RccPllcfgr, 0x2400_3010);
        modify(
            &registers,
            ClockRegister::RccPllcfgr,
            PLLCFGR::PLLM.val(25) + PLLCFGR::PLLSRC::HSE,
        );
        let pllcfgr: LocalRegisterCopy<u32, PLLCFGR::Register> =
            load(&registers, ClockRegister::RccPllcfgr);
        assert_eq!(pllcfgr.read(PLLCFGR::PLLM), 25);
        assert_eq!(pllcfgr.read(PLLCFGR::PLLN), 0xC0);
        assert_eq!(pllcfgr.read(PLLCFGR::PLLQ), 4);
        assert!(pllcfgr.is_set(PLLCFGR::PLLSRC));
    }
}
