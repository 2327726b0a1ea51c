//! Encoded MAVLink frame passing through a signing channel.

use mavio::io::{Receiver, StdIoReader};
use mavio::protocol::{
    Checksum, CrcExtra, MavLinkVersion, MavSTX, Message, Sign, Signature, SigningConf, Versionless,
    V2,
};
use mavio::Frame;

use crate::consts::PAYLOAD_MAX_LEN;
use crate::protocol::{
    ComponentId, MavLinkId, MessageId, SignedLinkId, SigningTimestamp, SystemId,
};

use crate::prelude::*;

/// MAVLink frame of either protocol version.
///
/// This is a wrapper around [`mavio::Frame`] that keeps the frame checksum consistent whenever the
/// `MAVLINK_IFLAG_SIGNED` incompatibility flag is toggled. Frames are produced by an external codec,
/// so the `CRC_EXTRA` byte required to re-seal the checksum is recovered from the checksum itself.
#[derive(Clone, Debug)]
pub struct RawFrame(Frame<Versionless>);

impl From<Frame<Versionless>> for RawFrame {
    fn from(value: Frame<Versionless>) -> Self {
        Self(value)
    }
}

impl From<RawFrame> for Frame<Versionless> {
    /// Converts [`RawFrame`] into [`mavio::Frame`].
    fn from(value: RawFrame) -> Self {
        value.0
    }
}

impl RawFrame {
    /// Decodes a single frame occupying the whole buffer.
    ///
    /// Checksum is not validated, this is the responsibility of the frame codec.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        match bytes.first() {
            None => return Err(FrameError::Truncated(0).into()),
            Some(&magic) if !MavSTX::is_magic_byte(magic) => {
                return Err(FrameError::InvalidMagic(magic).into())
            }
            Some(_) => {}
        }

        let frame = Receiver::versionless(StdIoReader::new(bytes))
            .recv()
            .map_err(|err| match err {
                mavio::error::Error::Io(_) => FrameError::Truncated(bytes.len()).into(),
                err => Error::from(err),
            })?;

        if frame.size() < bytes.len() {
            return Err(FrameError::TrailingBytes(bytes.len() - frame.size()).into());
        }

        Ok(Self(frame))
    }

    /// Encodes an unsigned `MAVLink 2` frame from a message.
    pub fn from_message(sequence: u8, sender: MavLinkId, message: &dyn Message) -> Result<Self> {
        let frame = Frame::builder()
            .sequence(sequence)
            .system_id(sender.system)
            .component_id(sender.component)
            .version(V2)
            .message(message)?
            .build();

        Ok(Self(frame.into_versionless()))
    }

    /// Encodes an unsigned `MAVLink 2` frame from raw payload.
    ///
    /// Trailing zero bytes of the payload are truncated as `MAVLink 2` requires.
    pub fn new_v2(
        sequence: u8,
        sender: MavLinkId,
        message_id: MessageId,
        payload: &[u8],
        crc_extra: CrcExtra,
    ) -> Result<Self> {
        if payload.len() > PAYLOAD_MAX_LEN {
            return Err(FrameError::PayloadTooLong {
                expected: PAYLOAD_MAX_LEN,
                actual: payload.len(),
            }
            .into());
        }

        let frame = Frame::builder()
            .sequence(sequence)
            .system_id(sender.system)
            .component_id(sender.component)
            .version(V2)
            .message_id(message_id)
            .payload(payload)
            .crc_extra(crc_extra)
            .build();

        Ok(Self(frame.into_versionless()))
    }

    /// Returns wrapped [`mavio::Frame`].
    #[inline]
    pub fn frame(&self) -> &Frame<Versionless> {
        &self.0
    }

    /// MAVLink protocol version.
    ///
    /// See [`mavio::Frame::version`] for details.
    #[inline]
    pub fn version(&self) -> MavLinkVersion {
        self.0.version()
    }

    /// Message payload.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        self.0.payload().bytes()
    }

    /// Incompatibility flags, always `0` for `MAVLink 1`.
    pub fn incompat_flags(&self) -> u8 {
        self.0
            .header()
            .incompat_flags()
            .map_or(0, |flags| flags.bits())
    }

    /// Packet sequence number.
    ///
    /// See [`mavio::Frame::sequence`] for details.
    #[inline]
    pub fn sequence(&self) -> u8 {
        self.0.sequence()
    }

    /// Sender system `ID`.
    ///
    /// See [`mavio::Frame::system_id`] for details.
    #[inline]
    pub fn system_id(&self) -> SystemId {
        self.0.system_id()
    }

    /// Sender component `ID`.
    ///
    /// See [`mavio::Frame::component_id`] for details.
    #[inline]
    pub fn component_id(&self) -> ComponentId {
        self.0.component_id()
    }

    /// Message `ID`.
    ///
    /// See [`mavio::Frame::message_id`] for details.
    #[inline]
    pub fn message_id(&self) -> MessageId {
        self.0.message_id()
    }

    /// Frame checksum.
    ///
    /// See [`mavio::Frame::checksum`] for details.
    #[inline]
    pub fn checksum(&self) -> Checksum {
        self.0.checksum()
    }

    /// Returns `true` if frame carries a signature.
    #[inline]
    pub fn is_signed(&self) -> bool {
        self.0.is_signed()
    }

    /// `MAVLink 2` signature.
    ///
    /// See [`mavio::Frame::signature`] for details.
    #[inline]
    pub fn signature(&self) -> Option<&Signature> {
        self.0.signature()
    }

    /// Signature link `ID`.
    pub fn link_id(&self) -> Option<SignedLinkId> {
        self.0.signature().map(|signature| signature.link_id)
    }

    /// Signature timestamp.
    pub fn timestamp(&self) -> Option<SigningTimestamp> {
        self.0
            .signature()
            .map(|signature| signature.timestamp.into())
    }

    /// Signs a `MAVLink 2` frame, replacing any previous signature.
    ///
    /// The signed flag is set and the checksum is re-sealed before the signature is calculated, so
    /// the signature covers the final header.
    pub fn sign(&mut self, conf: &SigningConf, signer: &mut dyn Sign) -> Result<()> {
        let frame = self.to_v2()?;
        let crc_extra = self.crc_extra()?;
        // `Behold::unwrap` lifts the builder out of its marker, there is nothing to fail here.
        let mut frame = frame
            .to_builder()
            .crc_extra(crc_extra)
            .signature(Signature {
                link_id: conf.link_id,
                timestamp: conf.timestamp,
                value: Default::default(),
            })
            .unwrap()
            .build();

        frame.add_signature(signer, conf);
        self.0 = frame.into_versionless();
        Ok(())
    }

    /// Strips signature, clears the signed flag and re-seals the checksum.
    pub fn remove_signature(&mut self) -> Result<()> {
        if !self.is_signed() {
            return Ok(());
        }

        let frame = self.to_v2()?;
        let crc_extra = self.crc_extra()?;
        let frame = frame.to_builder().crc_extra(crc_extra).build();
        self.0 = frame.into_versionless();
        Ok(())
    }

    /// Encodes frame including signature, if any.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = vec![0u8; self.0.size()];
        self.0
            .serialize(&mut bytes)
            .map_err(mavio::error::Error::from)?;
        Ok(bytes)
    }

    fn to_v2(&self) -> Result<Frame<V2>> {
        self.0
            .clone()
            .try_into_versioned::<V2>()
            .map_err(|_| FrameError::Unsignable.into())
    }

    /// Finds `CRC_EXTRA` which produces the current checksum.
    ///
    /// A single CRC step is injective in its input byte, so at most one value matches.
    fn crc_extra(&self) -> Result<CrcExtra> {
        (0..=u8::MAX)
            .find(|&crc_extra| self.0.calculate_crc(crc_extra) == self.0.checksum())
            .ok_or(FrameError::Checksum.into())
    }
}

#[cfg(test)]
mod frame_tests {
    use super::*;
    use crate::consts::{MAVLINK_IFLAG_SIGNED, SIGNATURE_LENGTH, STX_V1};
    use crate::protocol::derive;
    use mavio::dialects::minimal::messages::Heartbeat;
    use mavio::protocol::{MessageSpec, SecretKey};
    use mavio::utils::MavSha256;

    fn heartbeat() -> RawFrame {
        RawFrame::from_message(0, MavLinkId::new(1, 1), &Heartbeat::default()).unwrap()
    }

    fn conf(link_id: SignedLinkId, timestamp: u64) -> SigningConf {
        SigningConf {
            link_id,
            timestamp: SigningTimestamp::from_raw(timestamp).into(),
            secret: SecretKey::from(&derive(b"secret_key")),
        }
    }

    #[test]
    fn parse_v2_frame() {
        let frame = heartbeat();
        let parsed = RawFrame::from_bytes(&frame.to_bytes().unwrap()).unwrap();

        assert_eq!(parsed.version(), MavLinkVersion::V2);
        assert_eq!(parsed.system_id(), 1);
        assert_eq!(parsed.component_id(), 1);
        assert_eq!(parsed.message_id(), 0);
        assert_eq!(parsed.payload(), frame.payload());
        assert_eq!(parsed.checksum(), frame.checksum());
        assert!(!parsed.is_signed());
    }

    #[test]
    fn parse_v1_frame() {
        let bytes = [STX_V1, 1, 7, 42, 17, 0, 0xAB, 0x12, 0x34];
        let mut frame = RawFrame::from_bytes(&bytes).unwrap();

        assert_eq!(frame.version(), MavLinkVersion::V1);
        assert_eq!(frame.sequence(), 7);
        assert_eq!(frame.system_id(), 42);
        assert_eq!(frame.component_id(), 17);
        assert_eq!(frame.payload(), &[0xAB]);
        assert_eq!(frame.incompat_flags(), 0);
        assert!(matches!(
            frame.sign(&conf(0, 1), &mut MavSha256::default()),
            Err(Error::Frame(FrameError::Unsignable))
        ));
    }

    #[test]
    fn payload_is_truncated() {
        let frame = RawFrame::new_v2(0, MavLinkId::new(1, 1), 300, &[1, 2, 0, 0], 0).unwrap();
        assert_eq!(frame.payload(), &[1, 2]);
        assert_eq!(frame.message_id(), 300);

        assert!(matches!(
            RawFrame::new_v2(0, MavLinkId::new(1, 1), 300, &[1u8; 256], 0),
            Err(Error::Frame(FrameError::PayloadTooLong { .. }))
        ));
    }

    #[test]
    fn layout_errors() {
        assert!(matches!(
            RawFrame::from_bytes(&[]),
            Err(Error::Frame(FrameError::Truncated(0)))
        ));
        assert!(matches!(
            RawFrame::from_bytes(&[0x55, 0, 0]),
            Err(Error::Frame(FrameError::InvalidMagic(0x55)))
        ));

        let mut bytes = heartbeat().to_bytes().unwrap();
        bytes.push(0);
        assert!(matches!(
            RawFrame::from_bytes(&bytes),
            Err(Error::Frame(FrameError::TrailingBytes(1)))
        ));

        let mut bytes = heartbeat().to_bytes().unwrap();
        bytes[2] |= MAVLINK_IFLAG_SIGNED;
        let len = bytes.len();
        assert!(matches!(
            RawFrame::from_bytes(&bytes),
            Err(Error::Frame(FrameError::Truncated(actual))) if actual == len
        ));
    }

    #[test]
    fn signing_reseals_checksum() {
        let unsigned = heartbeat();
        let mut frame = unsigned.clone();

        frame.sign(&conf(3, 100), &mut MavSha256::default()).unwrap();
        assert_eq!(frame.incompat_flags(), MAVLINK_IFLAG_SIGNED);
        assert_eq!(frame.link_id(), Some(3));
        assert_eq!(frame.timestamp(), Some(SigningTimestamp::from_raw(100)));
        assert_eq!(
            frame.to_bytes().unwrap().len(),
            unsigned.to_bytes().unwrap().len() + SIGNATURE_LENGTH
        );
        assert!(frame
            .frame()
            .validate_checksum_with_crc_extra(Heartbeat::default().crc_extra())
            .is_ok());

        frame.remove_signature().unwrap();
        assert!(!frame.is_signed());
        assert_eq!(frame.to_bytes().unwrap(), unsigned.to_bytes().unwrap());
    }

    #[test]
    fn resigning_replaces_signature() {
        let mut frame = heartbeat();
        frame.sign(&conf(3, 100), &mut MavSha256::default()).unwrap();
        frame.sign(&conf(4, 200), &mut MavSha256::default()).unwrap();

        let parsed = RawFrame::from_bytes(&frame.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed.link_id(), Some(4));
        assert_eq!(parsed.timestamp(), Some(SigningTimestamp::from_raw(200)));
    }

    #[test]
    fn corrupted_checksum_cannot_be_resealed() {
        let mut bytes = heartbeat().to_bytes().unwrap();
        let len = bytes.len();
        let mut frame = None;
        // Only 256 of 65536 checksums are reachable from a given state.
        for corrupted in 0..=u8::MAX {
            bytes[len - 1] = corrupted;
            let candidate = RawFrame::from_bytes(&bytes).unwrap();
            if candidate.crc_extra().is_err() {
                frame = Some(candidate);
                break;
            }
        }

        let mut frame = frame.unwrap();
        assert!(matches!(
            frame.sign(&conf(0, 1), &mut MavSha256::default()),
            Err(Error::Frame(FrameError::Checksum))
        ));
    }
}
