use bytes::{Buf, BytesMut};
use tracing::warn;

/// Incremental decoder for the DBGp wire framing:
/// `<ASCII decimal length>\0<xml payload of exactly length bytes>\0`.
///
/// Feed bytes into a [`BytesMut`] in whatever chunks the socket delivers and
/// call [`FrameDecoder::decode`]; it consumes as many complete frames as the
/// buffer holds. Malformed length prefixes and missing NUL trailers are
/// recoverable: the decoder logs, resynchronizes, and keeps going.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    state: DecodeState,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
enum DecodeState {
    #[default]
    AwaitingLength,
    AwaitingBody(usize),
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode every complete frame currently in `buf`, returning the XML
    /// payloads in arrival order. Partial frames stay buffered until the
    /// next call.
    pub fn decode(&mut self, buf: &mut BytesMut) -> Vec<String> {
        let mut frames = Vec::new();

        loop {
            match self.state {
                DecodeState::AwaitingLength => {
                    let Some(nul) = buf.iter().position(|&b| b == 0) else {
                        break;
                    };
                    let length = std::str::from_utf8(&buf[..nul])
                        .ok()
                        .and_then(|s| s.parse::<usize>().ok())
                        .filter(|&n| n > 0);
                    buf.advance(nul + 1);
                    match length {
                        Some(n) => self.state = DecodeState::AwaitingBody(n),
                        None => warn!("discarding malformed DBGp length prefix"),
                    }
                }
                DecodeState::AwaitingBody(n) => {
                    if buf.len() < n + 1 {
                        break;
                    }
                    if buf[n] != 0 {
                        warn!("DBGp frame missing NUL trailer, resynchronizing");
                        buf.advance(1);
                        self.state = DecodeState::AwaitingLength;
                        continue;
                    }
                    let payload = buf.split_to(n);
                    buf.advance(1);
                    self.state = DecodeState::AwaitingLength;
                    match String::from_utf8(payload.to_vec()) {
                        Ok(xml) => frames.push(xml),
                        Err(_) => warn!("DBGp payload is not valid UTF-8, dropping frame"),
                    }
                }
            }
        }

        frames
    }
}
