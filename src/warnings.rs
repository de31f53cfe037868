//! Recoverable-anomaly reporting, deduplicated by call site rather than by
//! message text so a warning fires once per offending instruction even if
//! its exact wording varies run to run.

use indexmap::IndexSet;
use log::warn;

#[derive(Default)]
pub struct Warnings {
    seen_sites: IndexSet<String>,
    log: Vec<String>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning for `site` if it hasn't already fired. Returns
    /// `true` if this call actually emitted the warning.
    pub fn warn_once(&mut self, site: &str, message: impl Into<String>) -> bool {
        if self.seen_sites.contains(site) {
            return false;
        }
        self.seen_sites.insert(site.to_string());
        let message = message.into();
        warn!("{site}: {message}");
        self.log.push(message);
        true
    }

    pub fn has_fired(&self, site: &str) -> bool {
        self.seen_sites.contains(site)
    }

    pub fn all(&self) -> &[String] {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_site() {
        let mut w = Warnings::new();
        assert!(w.warn_once("op@0x10", "object 0 has no parent"));
        assert!(!w.warn_once("op@0x10", "object 0 has no parent again"));
        assert_eq!(w.all().len(), 1);
    }

    #[test]
    fn distinct_sites_both_fire() {
        let mut w = Warnings::new();
        assert!(w.warn_once("a", "x"));
        assert!(w.warn_once("b", "y"));
        assert_eq!(w.all().len(), 2);
    }
}
