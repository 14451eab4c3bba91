use std::collections::VecDeque;

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::FrameError;
use crate::framer::{FramerConfig, StreamFramer};
use crate::message::Message;

/// `tokio_util` codec over [`StreamFramer`].
///
/// Decodes inbound bytes into [`Message`]s and passes encoded commands
/// (as produced by [`crate::encoder`]) through unchanged.
#[derive(Debug, Default)]
pub struct FirmataCodec {
    framer: StreamFramer,
    ready: VecDeque<Message>,
}

impl FirmataCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FramerConfig) -> Self {
        Self {
            framer: StreamFramer::with_config(config),
            ready: VecDeque::new(),
        }
    }

    pub fn framer(&self) -> &StreamFramer {
        &self.framer
    }
}

impl Decoder for FirmataCodec {
    type Item = Message;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>, FrameError> {
        if let Some(msg) = self.ready.pop_front() {
            return Ok(Some(msg));
        }
        if src.is_empty() {
            return Ok(None);
        }

        // The framer keeps its own partial-message buffer.
        let data = src.split();
        let ready = &mut self.ready;
        self.framer.process_bytes(&data, |msg| ready.push_back(msg));

        Ok(self.ready.pop_front())
    }
}

impl Encoder<Bytes> for FirmataCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), FrameError> {
        dst.reserve(item.len());
        dst.put_slice(&item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;
    use tokio_util::codec::FramedRead;

    use super::*;
    use crate::encoder;
    use crate::message::{ChannelMessage, SysexMessage};

    #[test]
    fn decode_across_calls() {
        let mut codec = FirmataCodec::new();
        let mut buf = BytesMut::from(&[0x90, 0x01][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert!(buf.is_empty());

        buf.extend_from_slice(&[0x00, 0xE1, 0x10, 0x00]);
        let first = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first, Message::Channel(ChannelMessage::new(0x90, 0x01, 0x00)));

        // Second message is queued and returned without new input.
        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(second, Message::Channel(ChannelMessage::new(0xE1, 0x10, 0x00)));
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn encode_passes_bytes_through() {
        let mut codec = FirmataCodec::new();
        let mut dst = BytesMut::new();
        codec.encode(encoder::display_clear(), &mut dst).unwrap();
        codec
            .encode(encoder::set_touch_mode(0, true).unwrap(), &mut dst)
            .unwrap();
        assert_eq!(&dst[..], &[0xF0, 0x01, 0xF7, 0xF0, 0x06, 0x00, 0x01, 0xF7]);
    }

    #[tokio::test]
    async fn framed_read_stream() {
        let wire: &[u8] = &[
            0xF0, 0x0D, 0x01, 0x00, 0x00, 0x03, 0x00, 0x00, 0xF7, 0xC0, 0x01,
        ];
        let mut framed = FramedRead::new(wire, FirmataCodec::new());

        let msg = framed.next().await.unwrap().unwrap();
        assert_eq!(
            msg,
            Message::Sysex(SysexMessage::new(0x0D, vec![1, 0, 0, 3, 0, 0]))
        );
        // 0xC0 with one argument completes at end of input.
        let msg = framed.next().await.unwrap().unwrap();
        assert_eq!(msg, Message::Channel(ChannelMessage::new(0xC0, 0x01, 0x00)));
        assert!(framed.next().await.is_none());
    }
}
