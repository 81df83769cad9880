use std::sync::Arc;
use tokio::sync::watch;

/// Percentage (0-100) of the submission in flight.
///
/// Only moves upward while a run is active; `reset` puts it back to 0 at the
/// start and end of every run. Cloning shares the same state.
#[derive(Debug, Clone)]
pub struct ProgressState {
    tx: Arc<watch::Sender<u8>>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressState {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    pub fn percent(&self) -> u8 {
        *self.tx.borrow()
    }

    /// Apply an engine-reported fraction. Returns true if the percentage rose.
    pub fn advance(&self, fraction: f64) -> bool {
        let pct = to_percent(fraction);
        self.tx.send_if_modified(|current| {
            if pct > *current {
                *current = pct;
                true
            } else {
                false
            }
        })
    }

    pub fn reset(&self) {
        self.tx.send_replace(0);
    }

    /// Observe changes, e.g. to drive a progress display
    pub fn subscribe(&self) -> watch::Receiver<u8> {
        self.tx.subscribe()
    }
}

/// Scale a 0-1 fraction to a rounded 0-100 percentage
pub fn to_percent(fraction: f64) -> u8 {
    if !fraction.is_finite() {
        return 0;
    }
    (fraction * 100.0).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The percentage never decreases, whatever order fractions arrive in.
        #[test]
        fn prop_progress_is_monotonic(fractions in prop::collection::vec(-0.5f64..1.5, 0..50)) {
            let progress = ProgressState::new();
            let mut last = progress.percent();
            for f in fractions {
                progress.advance(f);
                let now = progress.percent();
                prop_assert!(now >= last);
                prop_assert!(now <= 100);
                last = now;
            }
        }
    }

    #[test]
    fn test_to_percent_rounds() {
        assert_eq!(to_percent(0.0), 0);
        assert_eq!(to_percent(0.424), 42);
        assert_eq!(to_percent(0.426), 43);
        assert_eq!(to_percent(1.0), 100);
        assert_eq!(to_percent(3.0), 100);
        assert_eq!(to_percent(-1.0), 0);
        assert_eq!(to_percent(f64::NAN), 0);
    }

    #[test]
    fn test_reset_returns_to_zero() {
        let progress = ProgressState::new();
        assert!(progress.advance(0.6));
        assert!(!progress.advance(0.3));
        assert_eq!(progress.percent(), 60);

        progress.reset();
        assert_eq!(progress.percent(), 0);
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let progress = ProgressState::new();
        let mut rx = progress.subscribe();

        let shared = progress.clone();
        shared.advance(0.5);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 50);
    }
}
