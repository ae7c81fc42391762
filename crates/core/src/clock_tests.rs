// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_clones_share_time() {
    let clock1 = FakeClock::new();
    let clock2 = clock1.clone();
    let t1 = clock1.now();
    clock2.advance(Duration::from_secs(30));
    assert_eq!(clock1.since(t1), Duration::from_secs(30));
}

#[test]
fn since_saturates_for_future_instants() {
    let clock = FakeClock::new();
    let future = clock.now() + Duration::from_secs(5);
    assert_eq!(clock.since(future), Duration::ZERO);
}
