use exadapt::core::nonce::{Clock, NoncePolicy, NonceProvider};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Clock that only moves when told to
struct ManualClock(AtomicU64);

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[test]
fn test_strictly_increasing_over_a_thousand_calls() {
    let provider = NonceProvider::new(NoncePolicy::milliseconds());
    let mut previous = 0;
    for _ in 0..1000 {
        let nonce = provider.next_nonce();
        assert!(nonce > previous);
        previous = nonce;
    }
}

#[test]
fn test_frozen_clock_still_yields_unique_nonces() {
    let clock = Arc::new(ManualClock(AtomicU64::new(1_700_000_000_000)));
    let provider = NonceProvider::with_clock(NoncePolicy::milliseconds(), clock);
    let nonces: Vec<u64> = (0..1000).map(|_| provider.next_nonce()).collect();

    assert_eq!(nonces[0], 1_700_000_000_000);
    assert_eq!(nonces[999], 1_700_000_000_999);
    assert_eq!(nonces.iter().collect::<HashSet<_>>().len(), 1000);
}

#[test]
fn test_clock_catching_up_takes_over() {
    let clock = Arc::new(ManualClock(AtomicU64::new(5_000)));
    let provider = NonceProvider::with_clock(NoncePolicy::seconds(), clock.clone());
    assert_eq!(provider.next_nonce(), 5);
    assert_eq!(provider.next_nonce(), 6);

    clock.0.store(60_000, Ordering::SeqCst);
    assert_eq!(provider.next_nonce(), 60);
}

#[test]
fn test_never_decreases_with_repeats_allowed() {
    let clock = Arc::new(ManualClock(AtomicU64::new(2_000)));
    let provider = NonceProvider::with_clock(NoncePolicy::milliseconds().allow_repeats(), clock.clone());
    assert_eq!(provider.next_nonce(), 2_000);
    assert_eq!(provider.next_nonce(), 2_000);

    clock.0.store(1_000, Ordering::SeqCst);
    assert_eq!(provider.next_nonce(), 2_000);
}

#[tokio::test]
async fn test_concurrent_callers_get_distinct_nonces() {
    let provider = Arc::new(NonceProvider::new(NoncePolicy::milliseconds()));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let provider = provider.clone();
            tokio::spawn(async move { (0..250).map(|_| provider.next_nonce()).collect::<Vec<_>>() })
        })
        .collect();

    let mut all = HashSet::new();
    for batch in join_all(handles).await {
        for nonce in batch.unwrap() {
            assert!(all.insert(nonce));
        }
    }
    assert_eq!(all.len(), 2000);
}
