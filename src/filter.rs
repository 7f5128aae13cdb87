//! # Filter
//!
//! Whitelist / blacklist eligibility of statsd keys

use tracing::debug;

/// Matches every key, used when only a whitelist is configured
const BLACKLIST_EVERYTHING: &[String] = &[String::new()];

/// Key filtering rules for an instance
///
/// * `whitelist` entries are exact keys and always win over the blacklist
/// * `blacklist` entries are substrings, any key containing one is dropped
/// * A whitelist without a blacklist drops everything not whitelisted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    pub whitelist: Vec<String>,
    pub blacklist: Vec<String>,
}

impl FilterConfig {
    /// The blacklist actually applied once the whitelist has been taken into account
    pub fn active_blacklist(&self) -> &[String] {
        if !self.blacklist.is_empty() {
            &self.blacklist
        } else if !self.whitelist.is_empty() {
            BLACKLIST_EVERYTHING
        } else {
            &[]
        }
    }

    /// Returns true if `key` should be exported
    pub fn is_eligible(&self, key: &str) -> bool {
        if self.whitelist.iter().any(|entry| entry == key) {
            debug!("Key {key} is whitelisted");
            return true;
        }

        !self.active_blacklist().iter().any(|entry| key.contains(entry.as_str()))
    }
}
