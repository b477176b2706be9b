//! Property-based tests for the delta queue

use ardelyoum::client::offline::{DeltaQueue, RetryPolicy};
use ardelyoum::shared::{ItemId, SyncError, UserId};
use proptest::prelude::*;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
enum Action {
    Toggle(u8),
    Dispatch,
    Succeed,
    Fail,
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => (0u8..3).prop_map(Action::Toggle),
        1 => Just(Action::Dispatch),
        1 => Just(Action::Succeed),
        1 => Just(Action::Fail),
    ]
}

proptest! {
    #[test]
    fn test_at_most_one_delta_in_flight_per_item(actions in proptest::collection::vec(action(), 0..60)) {
        let mut queue = DeltaQueue::new(UserId::from("u1"), 1);
        let policy = RetryPolicy::exponential(Duration::ZERO, Duration::ZERO, 1000);
        let mut members = [false; 3];
        let mut in_flight = Vec::new();
        let now = Instant::now();

        for action in actions {
            match action {
                Action::Toggle(i) => {
                    members[i as usize] = !members[i as usize];
                    queue.record_toggle(&ItemId::new(format!("offer{i}")), members[i as usize]);
                }
                Action::Dispatch => in_flight.extend(queue.take_ready(now)),
                Action::Succeed => {
                    if let Some(delta) = in_flight.pop() {
                        queue.complete_success(&delta);
                    }
                }
                Action::Fail => {
                    if let Some(delta) = in_flight.pop() {
                        queue.complete_failure(&delta, &SyncError::network("flaky"), &policy, now);
                    }
                }
            }

            let items: HashSet<&ItemId> = in_flight.iter().map(|d| &d.item_id).collect();
            prop_assert_eq!(items.len(), in_flight.len());
            prop_assert_eq!(queue.stats().in_flight, in_flight.len());
        }
    }
}
