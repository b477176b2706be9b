//! Property-based tests for toggle parity and convergence

use crate::common::*;
use ardelyoum::shared::{FavoriteSet, SyncError, UserSession};
use proptest::prelude::*;

const ITEMS: [&str; 4] = ["offerA", "offerB", "offerC", "offerD"];

#[derive(Debug, Clone)]
enum Step {
    Toggle(usize),
    Flush,
    FailNext,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => (0..ITEMS.len()).prop_map(Step::Toggle),
        2 => Just(Step::Flush),
        1 => Just(Step::FailNext),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn test_membership_follows_toggle_parity(
        initial in proptest::collection::btree_set(0..ITEMS.len(), 0..=ITEMS.len()),
        steps in proptest::collection::vec(step(), 0..40),
    ) {
        runtime().block_on(async {
            let h = Harness::new(manual_config());
            let seeded: Vec<&str> = initial.iter().map(|&i| ITEMS[i]).collect();
            h.store.seed(&user("u1"), seeded.iter().copied());
            h.coordinator.on_session_start(UserSession::new("u1")).await;

            let mut counts = [0usize; ITEMS.len()];
            for step in &steps {
                match step {
                    Step::Toggle(i) => {
                        h.coordinator.request_toggle(&item(ITEMS[*i])).await.unwrap();
                        counts[*i] += 1;
                    }
                    Step::Flush => {
                        h.coordinator.flush_pending().await;
                    }
                    Step::FailNext => h.store.fail_next_applies(1, SyncError::network("flaky")),
                }
            }

            for (i, id) in ITEMS.iter().enumerate() {
                let expected = initial.contains(&i) ^ (counts[i] % 2 == 1);
                prop_assert_eq!(h.coordinator.is_favorite(&item(id)), expected);
            }
            Ok(())
        })?;
    }

    #[test]
    fn test_remote_converges_to_local(
        initial in proptest::collection::btree_set(0..ITEMS.len(), 0..=ITEMS.len()),
        steps in proptest::collection::vec(step(), 0..40),
    ) {
        runtime().block_on(async {
            let h = Harness::new(manual_config());
            let seeded: Vec<&str> = initial.iter().map(|&i| ITEMS[i]).collect();
            h.store.seed(&user("u1"), seeded.iter().copied());
            h.coordinator.on_session_start(UserSession::new("u1")).await;

            for step in &steps {
                match step {
                    Step::Toggle(i) => {
                        h.coordinator.request_toggle(&item(ITEMS[*i])).await.unwrap();
                    }
                    Step::Flush => {
                        h.coordinator.flush_pending().await;
                    }
                    Step::FailNext => h.store.fail_next_applies(1, SyncError::network("flaky")),
                }
            }

            // Drain: re-arm anything stalled and let every backoff elapse
            for _ in 0..50 {
                h.coordinator.retry_stalled().await;
                h.coordinator.flush_pending().await;
                tokio::time::advance(MAX_DELAY * 2).await;
            }

            let local = h.coordinator.favorites().ids;
            let remote = h.store.favorites(&user("u1")).unwrap_or_else(FavoriteSet::new);
            prop_assert_eq!(local, remote);
            prop_assert_eq!(h.coordinator.queue_stats().await.total, 0);
            Ok(())
        })?;
    }
}
