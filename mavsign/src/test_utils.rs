//! Mavsign test utils.
//!
//! ⚠ Available only with `test_utils` Cargo feature or in tests. Do not use in production.

use mavio::dialects::minimal::enums::{MavAutopilot, MavState, MavType};
use mavio::dialects::minimal::messages::Heartbeat;
use mavio::protocol::V1;
use mavio::Frame;

use crate::protocol::{MavLinkId, RawFrame};

/// `HEARTBEAT` of a ground control station (`MAV_TYPE_GCS`, `MAV_AUTOPILOT_INVALID`).
pub fn gcs_heartbeat() -> Heartbeat {
    Heartbeat {
        type_: MavType::Gcs,
        autopilot: MavAutopilot::Invalid,
        system_status: MavState::Active,
        mavlink_version: 3,
        ..Default::default()
    }
}

/// Encodes an unsigned `MAVLink 2` `HEARTBEAT` frame.
pub fn heartbeat_frame(sequence: u8, sender: MavLinkId) -> RawFrame {
    RawFrame::from_message(sequence, sender, &gcs_heartbeat())
        .expect("heartbeat is always encodable")
}

/// Encodes a `MAVLink 1` `HEARTBEAT` frame.
pub fn heartbeat_frame_v1(sequence: u8, sender: MavLinkId) -> RawFrame {
    Frame::builder()
        .sequence(sequence)
        .system_id(sender.system)
        .component_id(sender.component)
        .version(V1)
        .message(&gcs_heartbeat())
        .expect("heartbeat is always encodable")
        .build()
        .into_versionless()
        .into()
}

#[cfg(test)]
static INIT_LOGGER: std::sync::Once = std::sync::Once::new();

/// Initializes logger once per test binary.
#[cfg(test)]
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::builder()
            // Suppress everything below `warn` for third-party modules
            .filter_level(log::LevelFilter::Warn)
            // Allow everything from current package
            .filter_module(env!("CARGO_PKG_NAME"), log::LevelFilter::Debug)
            .is_test(true)
            .init();
    });
}
