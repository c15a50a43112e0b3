// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Status line returned by reads of the clock device:
//!
//! ```text
//! frequency=216000000;source=external;oscillator_frequency=25000000
//! ```

use core::fmt::{self, Write};

use crate::clock_config::ClockSourceKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Status {
    pub frequency: u64,
    pub source: ClockSourceKind,
    pub oscillator_frequency: u64,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frequency={};source={};oscillator_frequency={}",
            self.frequency, self.source, self.oscillator_frequency
        )
    }
}

/// Writes into a byte buffer, silently dropping what doesn't fit.
struct TruncatingWriter<'a> {
    buffer: &'a mut [u8],
    position: usize,
}

impl Write for TruncatingWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let available = self.buffer.len() - self.position;
        let count = s.len().min(available);
        self.buffer[self.position..self.position + count].copy_from_slice(&s.as_bytes()[..count]);
        self.position += count;
        Ok(())
    }
}

/// Counts the bytes written.
struct LengthCounter(usize);

impl Write for LengthCounter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0 += s.len();
        Ok(())
    }
}

impl Status {
    /// Render into `buffer`, truncating if needed. Returns the number of bytes
    /// written.
    pub fn render(&self, buffer: &mut [u8]) -> usize {
        let mut writer = TruncatingWriter {
            buffer,
            position: 0,
        };
        // Neither writer nor the Display impl fail
        let _ = write!(writer, "{}", self);
        writer.position
    }

    /// Length of the full line.
    pub fn line_length(&self) -> usize {
        let mut counter = LengthCounter(0);
        let _ = write!(counter, "{}", self);
        counter.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: Status = Status {
        frequency: 216_000_000,
        source: ClockSourceKind::External,
        oscillator_frequency: 25_000_000,
    };
    const LINE: &[u8] = b"frequency=216000000;source=external;oscillator_frequency=25000000";

    #[test]
    fn renders_fields_in_order() {
        let mut buffer = [0u8; 128];
        let written = STATUS.render(&mut buffer);
        assert_eq!(&buffer[..written], LINE);
        assert_eq!(STATUS.line_length(), LINE.len());
    }

    #[test]
    fn truncates_to_the_buffer() {
        let mut buffer = [0u8; 16];
        assert_eq!(STATUS.render(&mut buffer), 16);
        assert_eq!(&buffer, &LINE[..16]);
        assert_eq!(STATUS.render(&mut []), 0);
    }

    #[test]
    fn unknown_source() {
        let status = Status {
            frequency: 0,
            source: ClockSourceKind::Unknown,
            oscillator_frequency: 0,
        };
        let mut buffer = [0u8; 64];
        let written = status.render(&mut buffer);
        assert_eq!(
            &buffer[..written],
            b"frequency=0;source=unknown;oscillator_frequency=0"
        );
    }
}
