//! One-shot backend capability probe

use crate::config::BackendPreference;
use crate::types::BackendKind;

/// Caches which backend is usable.
///
/// The verdict, including "none", is computed on first use and never
/// recomputed until [`reset`](Probe::reset).
#[derive(Debug, Default, Clone)]
pub struct Probe {
    verdict: Option<Option<BackendKind>>,
}

impl Probe {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached verdict, or `None` when nothing was probed yet.
    pub fn cached(&self) -> Option<Option<BackendKind>> {
        self.verdict
    }

    /// Returns the first usable candidate allowed by `preference`.
    ///
    /// `usable` is asked at most once per candidate and only until one
    /// answers yes.
    pub fn detect(
        &mut self,
        preference: BackendPreference,
        mut usable: impl FnMut(BackendKind) -> bool,
    ) -> Option<BackendKind> {
        if let Some(verdict) = self.verdict {
            return verdict;
        }

        let verdict = preference
            .candidates()
            .iter()
            .copied()
            .find(|kind| {
                let ok = usable(*kind);
                log::debug!("Backend {} is {}", kind, if ok { "usable" } else { "unavailable" });
                ok
            });

        match verdict {
            Some(kind) => log::debug!("Selected backend {}", kind),
            None => log::warn!("No usable backend for preference '{}'", preference),
        }

        self.verdict = Some(verdict);
        verdict
    }

    pub fn reset(&mut self) {
        self.verdict = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modern_wins_when_usable() {
        let mut probe = Probe::new();
        let mut asked = Vec::new();
        let kind = probe.detect(BackendPreference::Auto, |k| {
            asked.push(k);
            true
        });
        assert_eq!(kind, Some(BackendKind::Modern));
        assert_eq!(asked, vec![BackendKind::Modern]);
    }

    #[test]
    fn test_falls_back_to_legacy() {
        let mut probe = Probe::new();
        let kind = probe.detect(BackendPreference::Auto, |k| k == BackendKind::Legacy);
        assert_eq!(kind, Some(BackendKind::Legacy));
    }

    #[test]
    fn test_verdict_is_cached_including_none() {
        let mut probe = Probe::new();
        assert_eq!(probe.detect(BackendPreference::Auto, |_| false), None);
        assert_eq!(probe.cached(), Some(None));

        let mut calls = 0;
        assert_eq!(
            probe.detect(BackendPreference::Auto, |_| {
                calls += 1;
                true
            }),
            None
        );
        assert_eq!(calls, 0);

        probe.reset();
        assert_eq!(probe.detect(BackendPreference::Auto, |_| true), Some(BackendKind::Modern));
    }

    #[test]
    fn test_legacy_preference_never_asks_modern() {
        let mut probe = Probe::new();
        let kind = probe.detect(BackendPreference::Legacy, |k| {
            assert_ne!(k, BackendKind::Modern);
            true
        });
        assert_eq!(kind, Some(BackendKind::Legacy));
    }
}
