// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Compile-time configuration of the clock device.

/// Compile-time configuration options.
pub(crate) struct Config {
    /// Whether every decoded command is logged at debug level.
    pub(crate) trace_commands: bool,
}

/// The unique instance of `Config`. Options are set through cargo features of
/// this crate.
pub(crate) const CONFIG: Config = Config {
    trace_commands: cfg!(feature = "trace_commands"),
};
