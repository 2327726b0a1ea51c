use mavsign::consts::SETUP_SIGNING_MESSAGE_ID;
use mavsign::prelude::*;
use mavsign::test_utils::heartbeat_frame;

const GCS: MavLinkId = MavLinkId {
    system: 255,
    component: 190,
};
const VEHICLE: MavLinkId = MavLinkId {
    system: 1,
    component: 1,
};

fn make_gcs(key: &str) -> SigningChannel {
    let mut gcs = SigningChannel::new(ChannelId(0), SigningPolicy::default());
    gcs.init_signing(key);
    log::warn!("[gcs] signing configured");
    gcs
}

fn make_vehicle() -> SigningChannel {
    let vehicle = SigningChannel::new(
        ChannelId(0),
        SigningPolicy::builder()
            .require_incoming_signed(true)
            .accept_unsigned(&[SETUP_SIGNING_MESSAGE_ID]),
    );
    log::warn!("[vehicle] started, signing required");
    vehicle
}

fn provision(gcs: &SigningChannel, vehicle: &mut SigningChannel) -> Result<()> {
    let bytes = gcs
        .create_setup_signing(VEHICLE)?
        .to_frame(0, GCS)?
        .to_bytes()?;
    log::info!("[gcs] sent SETUP_SIGNING");

    let frame = RawFrame::from_bytes(&bytes)?;
    if !vehicle.process_incoming(&frame).is_accepted() {
        panic!("[vehicle] SETUP_SIGNING should be accepted");
    }
    if let Some(setup) = SetupSigning::from_frame(&frame) {
        vehicle.apply_setup_signing(&setup?, VEHICLE);
        log::info!("[vehicle] signing configured by GCS");
    }

    Ok(())
}

fn run() -> Result<()> {
    let mut gcs = make_gcs("something unsecure");
    let mut vehicle = make_vehicle();
    let rejections = vehicle.subscribe();

    let unsigned = heartbeat_frame(0, GCS);
    assert!(!vehicle.process_incoming(&unsigned).is_accepted());
    log::info!("[vehicle] rejected unsigned heartbeat");

    provision(&gcs, &mut vehicle)?;

    let mut signed = heartbeat_frame(1, GCS);
    gcs.sign_outgoing(&mut signed)?;
    let received = RawFrame::from_bytes(&signed.to_bytes()?)?;
    assert!(vehicle.process_incoming(&received).is_accepted());
    log::info!(
        "[vehicle] accepted signed heartbeat with link ID: {}",
        received.link_id().unwrap_or_default()
    );

    assert!(!vehicle.process_incoming(&received).is_accepted());
    log::info!("[vehicle] rejected replayed heartbeat");

    for event in rejections.try_iter() {
        log::info!("[vehicle] event: {event:?}");
    }

    log::warn!("[all] finished");
    Ok(())
}

fn main() {
    // Setup logger
    env_logger::builder()
        .filter_level(log::LevelFilter::Info) // Suppress everything below `info` for third-party modules.
        .filter_module(env!("CARGO_PKG_NAME"), log::LevelFilter::Info) // Log level for current package
        .init();

    run().unwrap();
}

#[cfg(test)]
#[test]
fn message_signing() {
    run().unwrap();
}
