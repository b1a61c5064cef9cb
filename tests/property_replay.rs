//! Property-based tests for capture/replay round-trips.

#![cfg(feature = "local-host")]

use std::sync::{Arc, Mutex};

use ambient_bridge::host::local::{ambient_value, set_ambient};
use ambient_bridge::{capture, run};
use proptest::prelude::*;

fn current_str() -> Option<String> {
    ambient_value::<String>().map(|v| (*v).clone())
}

/// For any pair of ambient values, a callback replayed under a handle
/// captured at v1 observes v1, and the caller sees v2 again afterwards.
#[test]
fn replay_round_trip_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(any::<String>(), any::<String>()), |(v1, v2)| {
            set_ambient(Some(Arc::new(v1.clone())));
            let handle = capture();
            set_ambient(Some(Arc::new(v2.clone())));

            let seen = Arc::new(Mutex::new(None));
            let sink = Arc::clone(&seen);
            run(&handle, move || {
                *sink.lock().unwrap() = current_str();
            });

            let observed = seen.lock().unwrap().take();
            prop_assert_eq!(observed, Some(v1));
            prop_assert_eq!(current_str(), Some(v2));
            Ok(())
        })
        .unwrap();
}
