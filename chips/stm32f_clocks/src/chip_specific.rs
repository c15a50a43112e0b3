// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Limits and register addresses of the supported families.
//!
//! Adding a family means adding a module with its own `LIMITS` value.

pub mod stm32f4;
pub mod stm32f7;
