// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Key/value configuration input.
//!
//! The clock device reads its settings from the `dmclk` section of whatever
//! configuration source the board provides (an ini file, a flash record, a
//! static table). That source is reached through [ConfigStore].

/// Sectioned key/value lookups.
pub trait ConfigStore {
    /// Integer value of `key` in `section`, or `default` if the key is
    /// missing or not an integer.
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;

    /// String value of `key` in `section`.
    fn get_str(&self, section: &str, key: &str) -> Option<&str>;
}

/// One `key = value` line of a section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfigEntry<'a> {
    pub section: &'a str,
    pub key: &'a str,
    pub value: &'a str,
}

/// A [ConfigStore] over a static table, for boards without a configuration
/// file.
///
/// ```rust,ignore
/// static ENTRIES: [ConfigEntry; 2] = [
///     ConfigEntry { section: "dmclk", key: "source", value: "internal" },
///     ConfigEntry { section: "dmclk", key: "target_frequency", value: "96000000" },
/// ];
/// let store = KeyValueConfig::new(&ENTRIES);
/// ```
pub struct KeyValueConfig<'a> {
    entries: &'a [ConfigEntry<'a>],
}

impl<'a> KeyValueConfig<'a> {
    pub fn new(entries: &'a [ConfigEntry<'a>]) -> Self {
        Self { entries }
    }

    fn find(&self, section: &str, key: &str) -> Option<&'a str> {
        // Later entries override earlier ones
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.section == section && entry.key == key)
            .map(|entry| entry.value)
    }
}

impl ConfigStore for KeyValueConfig<'_> {
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.find(section, key)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(default)
    }

    fn get_str(&self, section: &str, key: &str) -> Option<&str> {
        self.find(section, key).map(str::trim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static ENTRIES: [ConfigEntry<'static>; 5] = [
        ConfigEntry {
            section: "dmclk",
            key: "source",
            value: "external",
        },
        ConfigEntry {
            section: "dmclk",
            key: "tolerance",
            value: " 1000 ",
        },
        ConfigEntry {
            section: "dmclk",
            key: "target_frequency",
            value: "fast",
        },
        ConfigEntry {
            section: "uart",
            key: "tolerance",
            value: "5",
        },
        ConfigEntry {
            section: "dmclk",
            key: "source",
            value: "internal",
        },
    ];

    #[test]
    fn lookups_are_scoped_by_section() {
        let store = KeyValueConfig::new(&ENTRIES);
        assert_eq!(store.get_int("dmclk", "tolerance", 0), 1000);
        assert_eq!(store.get_int("uart", "tolerance", 0), 5);
        assert_eq!(store.get_int("spi", "tolerance", 7), 7);
    }

    #[test]
    fn malformed_integers_fall_back_to_default() {
        let store = KeyValueConfig::new(&ENTRIES);
        assert_eq!(store.get_int("dmclk", "target_frequency", 0), 0);
        assert_eq!(store.get_int("dmclk", "oscillator_frequency", 0), 0);
    }

    #[test]
    fn last_entry_wins() {
        let store = KeyValueConfig::new(&ENTRIES);
        assert_eq!(store.get_str("dmclk", "source"), Some("internal"));
        assert_eq!(store.get_str("uart", "source"), None);
    }
}
