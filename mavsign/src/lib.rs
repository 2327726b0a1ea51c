//! # Mavsign
//!
//! [MAVLink message signing](https://mavlink.io/en/guide/message_signing.html) for ground control
//! stations and vehicles: per-channel key management, signing of outgoing frames, and
//! link identity, replay and signature enforcement for incoming frames.
//!
//! Mavsign operates on [`mavio`] frames ([`protocol::RawFrame`]) and leaves
//! transport to the caller.
//!
//! # Usage
//!
//! ```rust
//! use mavsign::prelude::*;
//!
//! // Ground control station signs everything it sends.
//! let mut gcs = SigningChannel::new(ChannelId(0), SigningPolicy::default());
//! gcs.init_signing("secret_key");
//!
//! // Vehicle requires signed frames.
//! let mut vehicle = SigningChannel::new(
//!     ChannelId(1),
//!     SigningPolicy::builder().require_incoming_signed(true),
//! );
//! vehicle.init_signing("secret_key");
//!
//! // Frame bytes come from a MAVLink codec, here it is a HEARTBEAT.
//! let payload = [0, 0, 0, 0, 6, 8, 0, 0, 3];
//! let mut frame = RawFrame::new_v2(0, MavLinkId::new(255, 190), 0, &payload, 50).unwrap();
//! gcs.sign_outgoing(&mut frame).unwrap();
//!
//! assert!(vehicle.process_incoming(&frame).is_accepted());
//! // Replayed frame is rejected.
//! assert!(!vehicle.process_incoming(&frame).is_accepted());
//! ```
//!
//! # Feature flags
#![doc = document_features::document_features!()]
#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod consts;
pub mod errors;
pub mod prelude;
pub mod protocol;
pub mod signing;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

#[doc(inline = true)]
pub extern crate mavio;
