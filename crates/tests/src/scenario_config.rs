//! Scenario files driving real buffers.

use bytes::Bytes;

use config_loader::{BufferFlavor, ConfigFormat, ScenarioLoader};
use contracts::{BufferMode, TimeDelta, TimePoint};
use reorder_engine::{FixedLagBuffer, MinimalLatencyBuffer};

const TWO_SOURCE_SCENARIO: &str = r#"
[scenario]
name = "two_source_match"
duration_ms = 2000
seed = 5

[buffer]
flavor = "fixed_lag"
mode = "match"
reference_stream = "cam"
delay_mean_ms = 50.0
delay_stddev_ms = 10.0
delay_quantile = 0.99

[[sources]]
id = "cam"
period_ms = 50.0
latency_ms = 10.0

[[sources]]
id = "lidar"
period_ms = 50.0
latency_ms = 60.0
"#;

#[test]
fn fixed_lag_params_from_scenario_drive_a_buffer() {
    let blueprint = ScenarioLoader::load_from_str(TWO_SOURCE_SCENARIO, ConfigFormat::Toml).unwrap();
    assert_eq!(blueprint.buffer.flavor, BufferFlavor::FixedLag);

    let params = blueprint.buffer.fixed_lag_params(blueprint.sources.len());
    assert_eq!(params.mode, BufferMode::Match);
    assert_eq!(params.match_.num_streams, 2);
    assert_eq!(params.delay_mean, TimeDelta::from_millis(50));

    let mut buffer: FixedLagBuffer<Bytes> = FixedLagBuffer::new(params);
    let lag = buffer.fixed_lag();
    // mean plus a positive two-sided 0.99 quantile of the 10ms spread
    assert!(lag > TimeDelta::from_millis(50));

    buffer.push(
        "cam".into(),
        TimePoint::from_millis(60),
        TimePoint::from_millis(50),
        Bytes::from_static(b"frame"),
    );
    buffer.push(
        "lidar".into(),
        TimePoint::from_millis(120),
        TimePoint::from_millis(60),
        Bytes::from_static(b"cloud"),
    );

    let res = buffer.pop(TimePoint::from_millis(50) + lag);
    assert_eq!(res.data.len(), 2);
    assert_eq!(res.data[0].id, "cam");
    assert_eq!(res.data[1].id, "lidar");
}

#[test]
fn minimal_latency_params_from_scenario_drive_a_buffer() {
    let toml = r#"
[scenario]
name = "single_source"
duration_ms = 1000

[buffer]
flavor = "minimal_latency"
mode = "single"

[[sources]]
id = "imu"
period_ms = 50.0
latency_ms = 10.0
"#;
    let blueprint = ScenarioLoader::load_from_str(toml, ConfigFormat::Toml).unwrap();
    let params = blueprint.buffer.minimal_latency_params();
    assert_eq!(params.mode, BufferMode::Single);

    let mut buffer: MinimalLatencyBuffer<Bytes> = MinimalLatencyBuffer::new(params);
    buffer.push(
        "imu".into(),
        TimePoint::from_millis(60),
        TimePoint::from_millis(50),
        Bytes::from_static(b"sample"),
    );
    let res = buffer.pop(TimePoint::from_millis(60));
    assert_eq!(res.data.len(), 1);
    assert_eq!(res.data[0].id, "imu");
    assert_eq!(
        res.data[0].clone().into_payload(),
        Some(Bytes::from_static(b"sample"))
    );
}
