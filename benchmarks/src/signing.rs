use std::time::{Duration, Instant};

use mavsign::prelude::*;
use mavsign::test_utils::heartbeat_frame;

const GCS: MavLinkId = MavLinkId {
    system: 255,
    component: 190,
};

fn report(name: &str, n_frames: usize, elapsed: Duration) {
    let per_frame = elapsed / n_frames.max(1) as u32;
    log::info!("[{name}] {n_frames} frames in {elapsed:?}, {per_frame:?} per frame");
}

fn make_channel(id: u8, require: bool) -> SigningChannel {
    let mut channel = SigningChannel::new(
        ChannelId(id),
        SigningPolicy::builder().require_incoming_signed(require),
    );
    channel.init_signing("benchmark key");
    channel
}

pub fn benchmark_sign(n_frames: usize) {
    let mut channel = make_channel(0, false);
    let frames: Vec<RawFrame> = (0..n_frames)
        .map(|seq| heartbeat_frame(seq as u8, GCS))
        .collect();

    let start = Instant::now();
    for mut frame in frames {
        channel.sign_outgoing(&mut frame).unwrap();
    }
    report("benchmark_sign", n_frames, start.elapsed());
}

pub fn benchmark_verify(n_frames: usize) {
    let mut sender = make_channel(0, false);
    let mut receiver = make_channel(1, true);
    let frames: Vec<RawFrame> = (0..n_frames)
        .map(|seq| {
            let mut frame = heartbeat_frame(seq as u8, GCS);
            sender.sign_outgoing(&mut frame).unwrap();
            frame
        })
        .collect();

    let start = Instant::now();
    for frame in frames.iter() {
        assert!(receiver.process_incoming(frame).is_accepted());
    }
    report("benchmark_verify", n_frames, start.elapsed());

    let start = Instant::now();
    for frame in frames.iter() {
        assert!(!receiver.process_incoming(frame).is_accepted());
    }
    report("benchmark_reject_replays", n_frames, start.elapsed());
}
