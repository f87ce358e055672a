//! Minimal-latency buffer scenarios.
//!
//! Two-source interaction: late-joining sources (in both latency orders),
//! simultaneous starts, mixed frequencies, missing measurements, batching,
//! matching, and zero-latency dataset replay.
//!
//! Source convention: "a" has 50ms period and 10ms latency unless noted;
//! "b" varies per test.

use contracts::{BatchParams, BufferMode, MatchParams, MinimalLatencyParams, TimeDelta};
use reorder_engine::MinimalLatencyBuffer;

use crate::common::{at, pop_expect, push_expect_ok, Payload};

fn params() -> MinimalLatencyParams {
    MinimalLatencyParams {
        max_total_wait_time: TimeDelta::from_millis(100),
        batch: BatchParams {
            max_delta: TimeDelta::from_millis(10),
        },
        ..Default::default()
    }
}

fn buffer_with(params: MinimalLatencyParams) -> MinimalLatencyBuffer<Payload> {
    MinimalLatencyBuffer::new(params)
}

#[test]
fn late_joining_source_with_higher_latency() {
    // a: period 50ms, latency 10ms | b: period 50ms, latency 60ms
    let mut buffer = buffer_with(params());

    // two cycles with solely the first source
    pop_expect(&mut buffer, at(10), 0, 0);
    push_expect_ok(&mut buffer, "a", at(60), at(50));
    pop_expect(&mut buffer, at(60), 1, 0);

    // requesting data again with the same poll time delivers nothing new
    pop_expect(&mut buffer, at(60), 0, 0);
    pop_expect(&mut buffer, at(61), 0, 0);

    push_expect_ok(&mut buffer, "a", at(110), at(100));
    pop_expect(&mut buffer, at(110), 1, 0);

    // the second source has a higher latency and delivers a measurement
    // older than the buffer time, which has to be rejected
    push_expect_ok(&mut buffer, "b", at(150), at(90));
    let res = pop_expect(&mut buffer, at(150), 0, 1);
    assert_eq!(res.discarded_data[0].id, "b");

    pop_expect(&mut buffer, at(151), 0, 0);

    // a single sample from b is not enough to initialize its period
    // estimate, so b is ignored for in-sequence constraints and a behaves
    // like the single-source case
    push_expect_ok(&mut buffer, "a", at(160), at(150));
    pop_expect(&mut buffer, at(160), 1, 0);

    // still initializing: b keeps arriving too late and is discarded
    push_expect_ok(&mut buffer, "b", at(200), at(140));
    pop_expect(&mut buffer, at(200), 0, 1);

    push_expect_ok(&mut buffer, "a", at(210), at(200));
    pop_expect(&mut buffer, at(210), 1, 0);
    push_expect_ok(&mut buffer, "b", at(250), at(190));
    pop_expect(&mut buffer, at(250), 0, 1);

    // b's estimates are now initialized: its placeholder holds a back
    push_expect_ok(&mut buffer, "a", at(260), at(250));
    pop_expect(&mut buffer, at(260), 0, 0);
    push_expect_ok(&mut buffer, "b", at(300), at(240));
    pop_expect(&mut buffer, at(300), 2, 0);
}

#[test]
fn late_joining_source_with_lower_latency() {
    // b: period 50ms, latency 60ms, starts first | a: latency 10ms
    let mut buffer = buffer_with(params());

    pop_expect(&mut buffer, at(10), 0, 0);
    push_expect_ok(&mut buffer, "b", at(110), at(50));
    pop_expect(&mut buffer, at(110), 1, 0);
    pop_expect(&mut buffer, at(111), 0, 0);

    push_expect_ok(&mut buffer, "b", at(160), at(100));
    pop_expect(&mut buffer, at(160), 1, 0);
    push_expect_ok(&mut buffer, "b", at(210), at(150));
    pop_expect(&mut buffer, at(210), 1, 0);

    // b's estimates are now fully initialized; a joins with lower latency
    // and a measurement newer than b's next expected one, so the buffer
    // waits for b
    push_expect_ok(&mut buffer, "a", at(220), at(210));
    pop_expect(&mut buffer, at(220), 0, 0);
    push_expect_ok(&mut buffer, "b", at(260), at(200));
    pop_expect(&mut buffer, at(260), 2, 0);

    push_expect_ok(&mut buffer, "a", at(270), at(260));
    pop_expect(&mut buffer, at(270), 0, 0);
    push_expect_ok(&mut buffer, "b", at(310), at(250));
    pop_expect(&mut buffer, at(310), 2, 0);
}

#[test]
fn simultaneous_start() {
    // a: latency 10ms | b: latency 60ms, both period 50ms, b offset -40ms
    let mut buffer = buffer_with(params());

    pop_expect(&mut buffer, at(10), 0, 0);
    push_expect_ok(&mut buffer, "a", at(60), at(50));
    pop_expect(&mut buffer, at(60), 1, 0);
    push_expect_ok(&mut buffer, "b", at(70), at(10));
    pop_expect(&mut buffer, at(70), 0, 1);
    push_expect_ok(&mut buffer, "a", at(110), at(100));
    pop_expect(&mut buffer, at(110), 1, 0);
    push_expect_ok(&mut buffer, "b", at(120), at(60));
    pop_expect(&mut buffer, at(120), 0, 1);
    push_expect_ok(&mut buffer, "a", at(160), at(150));
    pop_expect(&mut buffer, at(160), 1, 0);
    push_expect_ok(&mut buffer, "b", at(170), at(110));
    pop_expect(&mut buffer, at(170), 0, 1);

    // both initialized, normal behaviour from here on
    push_expect_ok(&mut buffer, "a", at(210), at(200));
    pop_expect(&mut buffer, at(210), 0, 0);
    push_expect_ok(&mut buffer, "b", at(220), at(160));
    pop_expect(&mut buffer, at(220), 2, 0);

    push_expect_ok(&mut buffer, "a", at(260), at(250));
    pop_expect(&mut buffer, at(260), 0, 0);
    push_expect_ok(&mut buffer, "b", at(270), at(210));
    pop_expect(&mut buffer, at(270), 2, 0);
}

#[test]
fn different_source_frequencies() {
    // a: period 50ms, latency 10ms | b: period 100ms, latency 60ms
    let mut buffer = buffer_with(params());

    pop_expect(&mut buffer, at(10), 0, 0);
    push_expect_ok(&mut buffer, "a", at(50), at(40));
    pop_expect(&mut buffer, at(50), 1, 0);
    push_expect_ok(&mut buffer, "a", at(100), at(90));
    pop_expect(&mut buffer, at(100), 1, 0);

    push_expect_ok(&mut buffer, "b", at(110), at(50));
    pop_expect(&mut buffer, at(110), 0, 1);

    push_expect_ok(&mut buffer, "a", at(150), at(140));
    pop_expect(&mut buffer, at(150), 1, 0);
    push_expect_ok(&mut buffer, "a", at(200), at(190));
    pop_expect(&mut buffer, at(200), 1, 0);

    push_expect_ok(&mut buffer, "b", at(210), at(150));
    pop_expect(&mut buffer, at(210), 0, 1);

    push_expect_ok(&mut buffer, "a", at(250), at(240));
    pop_expect(&mut buffer, at(250), 1, 0);
    push_expect_ok(&mut buffer, "a", at(300), at(290));
    pop_expect(&mut buffer, at(300), 1, 0);

    push_expect_ok(&mut buffer, "b", at(310), at(250));
    pop_expect(&mut buffer, at(310), 0, 1);

    push_expect_ok(&mut buffer, "a", at(350), at(340));
    pop_expect(&mut buffer, at(350), 1, 0);
    push_expect_ok(&mut buffer, "a", at(400), at(390));
    pop_expect(&mut buffer, at(400), 0, 0);

    // b's estimates are initialized for the first time here, so the buffer
    // waits for its input before releasing a
    push_expect_ok(&mut buffer, "b", at(410), at(350));
    pop_expect(&mut buffer, at(410), 2, 0);

    push_expect_ok(&mut buffer, "a", at(450), at(440));
    pop_expect(&mut buffer, at(450), 1, 0);
    push_expect_ok(&mut buffer, "a", at(500), at(490));
    pop_expect(&mut buffer, at(500), 0, 0);

    push_expect_ok(&mut buffer, "b", at(510), at(450));
    pop_expect(&mut buffer, at(510), 2, 0);
}

#[test]
fn missing_measurement_is_skipped_over() {
    // a: period 50ms, latency 10ms | b: period 100ms, latency 60ms
    let mut buffer = buffer_with(params());

    pop_expect(&mut buffer, at(10), 0, 0);
    push_expect_ok(&mut buffer, "a", at(50), at(40));
    pop_expect(&mut buffer, at(50), 1, 0);
    push_expect_ok(&mut buffer, "a", at(100), at(90));
    pop_expect(&mut buffer, at(100), 1, 0);

    push_expect_ok(&mut buffer, "b", at(110), at(50));
    pop_expect(&mut buffer, at(110), 0, 1);

    push_expect_ok(&mut buffer, "a", at(150), at(140));
    pop_expect(&mut buffer, at(150), 1, 0);
    push_expect_ok(&mut buffer, "a", at(200), at(190));
    pop_expect(&mut buffer, at(200), 1, 0);

    push_expect_ok(&mut buffer, "b", at(210), at(150));
    pop_expect(&mut buffer, at(210), 0, 1);

    push_expect_ok(&mut buffer, "a", at(250), at(240));
    pop_expect(&mut buffer, at(250), 1, 0);

    // the a measurement at 290ms (receipt 300ms) never arrives
    pop_expect(&mut buffer, at(300), 0, 0);
    // the buffer time stays at the last released measurement
    assert_eq!(buffer.buffer_time(), at(240));

    push_expect_ok(&mut buffer, "b", at(310), at(250));
    pop_expect(&mut buffer, at(310), 1, 0);

    push_expect_ok(&mut buffer, "a", at(350), at(340));
    pop_expect(&mut buffer, at(350), 1, 0);
    push_expect_ok(&mut buffer, "a", at(400), at(390));
    pop_expect(&mut buffer, at(400), 0, 0);

    push_expect_ok(&mut buffer, "b", at(410), at(350));
    pop_expect(&mut buffer, at(410), 2, 0);
}

#[test]
fn synchronized_sources_with_batching() {
    // a: period 50ms, latency 10ms, offset 0 | b: period 50ms, latency
    // 20ms, offset 5ms
    let mut buffer = buffer_with(MinimalLatencyParams {
        mode: BufferMode::Batch,
        ..params()
    });

    pop_expect(&mut buffer, at(10), 0, 0);
    push_expect_ok(&mut buffer, "a", at(60), at(50));
    pop_expect(&mut buffer, at(60), 1, 0);
    push_expect_ok(&mut buffer, "b", at(75), at(55));
    pop_expect(&mut buffer, at(75), 1, 0);

    push_expect_ok(&mut buffer, "a", at(110), at(100));
    pop_expect(&mut buffer, at(110), 1, 0);
    push_expect_ok(&mut buffer, "b", at(125), at(105));
    pop_expect(&mut buffer, at(125), 1, 0);

    push_expect_ok(&mut buffer, "a", at(160), at(150));
    pop_expect(&mut buffer, at(160), 1, 0);
    push_expect_ok(&mut buffer, "b", at(175), at(155));
    pop_expect(&mut buffer, at(175), 1, 0);

    // estimates are now initialized and drive the batching decision
    push_expect_ok(&mut buffer, "a", at(210), at(200));
    pop_expect(&mut buffer, at(210), 0, 0);
    push_expect_ok(&mut buffer, "b", at(225), at(205));
    pop_expect(&mut buffer, at(225), 2, 0);

    push_expect_ok(&mut buffer, "a", at(260), at(250));
    pop_expect(&mut buffer, at(260), 0, 0);
    push_expect_ok(&mut buffer, "b", at(275), at(255));
    pop_expect(&mut buffer, at(275), 2, 0);

    // the b message at 305ms (receipt 325ms) goes missing
    push_expect_ok(&mut buffer, "a", at(310), at(300));
    pop_expect(&mut buffer, at(310), 0, 0);
    pop_expect(&mut buffer, at(320), 0, 0);

    // a is forwarded alone once b's expected receipt deadline is reached
    pop_expect(&mut buffer, at(325), 1, 0);
    pop_expect(&mut buffer, at(330), 0, 0);

    push_expect_ok(&mut buffer, "a", at(360), at(350));
    pop_expect(&mut buffer, at(360), 0, 0);
    push_expect_ok(&mut buffer, "b", at(375), at(355));
    pop_expect(&mut buffer, at(375), 2, 0);
}

#[test]
fn matching_selects_nearest_neighbor() {
    // a: period 50ms, latency 10ms (reference) | b: period 50ms, latency
    // 20ms, offset 5ms
    let mut buffer = buffer_with(MinimalLatencyParams {
        mode: BufferMode::Match,
        match_: MatchParams {
            reference_stream: "a".into(),
            num_streams: 0,
        },
        ..params()
    });

    pop_expect(&mut buffer, at(10), 0, 0);

    // with a as the only known source, tuples are singletons
    push_expect_ok(&mut buffer, "a", at(60), at(50));
    pop_expect(&mut buffer, at(60), 1, 0);

    // b has no reference to match against yet
    push_expect_ok(&mut buffer, "b", at(75), at(55));
    pop_expect(&mut buffer, at(75), 0, 0);

    push_expect_ok(&mut buffer, "a", at(110), at(100));
    pop_expect(&mut buffer, at(110), 2, 0);

    push_expect_ok(&mut buffer, "b", at(125), at(105));
    pop_expect(&mut buffer, at(125), 0, 0);
    push_expect_ok(&mut buffer, "a", at(160), at(150));
    pop_expect(&mut buffer, at(160), 2, 0);

    push_expect_ok(&mut buffer, "b", at(175), at(155));
    pop_expect(&mut buffer, at(175), 0, 0);

    // both initialized: b@155 is the ready candidate for a@200, but b's
    // placeholder at 205 is anticipated to fit better, so the pop waits
    push_expect_ok(&mut buffer, "a", at(210), at(200));
    pop_expect(&mut buffer, at(210), 0, 0);

    // the anticipated sample arrives and wins the tie-break
    push_expect_ok(&mut buffer, "b", at(225), at(205));
    let res = pop_expect(&mut buffer, at(225), 2, 0);
    assert_eq!(res.data[0].id, "a");
    assert_eq!(res.data[0].meas_time, at(200));
    assert_eq!(res.data[1].id, "b");
    assert_eq!(res.data[1].meas_time, at(205));

    // the passed-over b@155 is now behind the buffer time and gets dropped
    pop_expect(&mut buffer, at(226), 0, 1);
}

#[test]
fn zero_latency_dataset_replay() {
    // simulation input with a single timestamp per sample: the latency as
    // seen by the buffer is zero for both sources
    let mut buffer = buffer_with(params());

    pop_expect(&mut buffer, at(10), 0, 0);
    push_expect_ok(&mut buffer, "a", at(60), at(60));
    pop_expect(&mut buffer, at(60), 1, 0);
    push_expect_ok(&mut buffer, "b", at(60), at(60));
    pop_expect(&mut buffer, at(60), 1, 0);
    push_expect_ok(&mut buffer, "a", at(110), at(110));
    pop_expect(&mut buffer, at(110), 1, 0);
    push_expect_ok(&mut buffer, "b", at(110), at(110));
    pop_expect(&mut buffer, at(110), 1, 0);
    push_expect_ok(&mut buffer, "a", at(160), at(160));
    pop_expect(&mut buffer, at(160), 1, 0);
    push_expect_ok(&mut buffer, "b", at(160), at(160));
    pop_expect(&mut buffer, at(160), 1, 0);

    // both initialized
    push_expect_ok(&mut buffer, "a", at(210), at(210));
    pop_expect(&mut buffer, at(210), 1, 0);
    push_expect_ok(&mut buffer, "b", at(210), at(210));
    pop_expect(&mut buffer, at(210), 1, 0);

    push_expect_ok(&mut buffer, "a", at(260), at(260));
    // skipping the intermediate pop
    push_expect_ok(&mut buffer, "b", at(260), at(260));
    pop_expect(&mut buffer, at(260), 2, 0);
}
