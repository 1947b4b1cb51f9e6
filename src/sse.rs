//! Event-stream decoding and encoding.
//!
//! The Anakin streaming reply is a line-delimited event stream: each event
//! is a `data: <payload>\n\n` frame, terminated by the literal sentinel
//! `data: [DONE]\n\n`. The decoder here is deliberately narrower than a full
//! SSE parser: the upstream never emits `event:`/`id:` fields, so any line
//! without the `data: ` prefix is skipped.

use crate::error::RelayError;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};

/// Terminal sentinel payload.
pub const DONE_SENTINEL: &str = "[DONE]";

/// One decoded upstream event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEvent {
    /// Payload text of one `data: ` line.
    Payload(String),
    /// The `[DONE]` sentinel: the stream ended normally.
    Done,
}

/// Incremental line decoder.
///
/// Feed it raw bytes as they arrive (in arbitrary chunk boundaries) and it
/// yields one [`RawEvent`] per complete `data: ` line. Partial lines are
/// buffered across calls; everything after a `Done` is discarded.
#[derive(Debug, Default)]
pub struct SseLineDecoder {
    buf: String,
    done: bool,
}

impl SseLineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes and collect any events completed by it.
    ///
    /// Invalid UTF-8 is decoded lossily; the payloads we care about are JSON
    /// and the sentinel, both ASCII-clean in practice.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<RawEvent> {
        let mut out = Vec::new();
        if self.done {
            return out;
        }
        self.buf.push_str(&String::from_utf8_lossy(chunk));

        while let Some(pos) = self.buf.find('\n') {
            let line: String = self.buf.drain(..=pos).collect();
            match decode_line(line.trim_end_matches(['\n', '\r'])) {
                Some(RawEvent::Done) => {
                    self.done = true;
                    self.buf.clear();
                    out.push(RawEvent::Done);
                    return out;
                }
                Some(event) => out.push(event),
                None => {}
            }
        }
        out
    }

    /// Whether the sentinel has been observed.
    pub fn is_done(&self) -> bool {
        self.done
    }
}

/// Classify one line of the upstream stream.
///
/// Lines carrying the `data: ` prefix yield an event; every other line
/// (blank separators, comments, unknown fields) is skipped, not an error.
fn decode_line(line: &str) -> Option<RawEvent> {
    let payload = line.strip_prefix("data: ")?;
    if payload == DONE_SENTINEL {
        Some(RawEvent::Done)
    } else {
        Some(RawEvent::Payload(payload.to_string()))
    }
}

/// Decode an upstream byte stream into a lazy, finite sequence of payloads.
///
/// The sequence ends without an item at the `[DONE]` sentinel or clean EOF.
/// A transport read failure yields one final `Err`, a distinct outcome from
/// normal completion, which the session turns into an `error:` frame.
pub fn raw_events<S, E>(byte_stream: S) -> impl Stream<Item = Result<String, RelayError>>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    async_stream::stream! {
        let mut decoder = SseLineDecoder::new();
        futures_util::pin_mut!(byte_stream);
        while let Some(chunk) = byte_stream.next().await {
            match chunk {
                Ok(bytes) => {
                    for event in decoder.feed(&bytes) {
                        match event {
                            RawEvent::Payload(payload) => yield Ok(payload),
                            RawEvent::Done => return,
                        }
                    }
                }
                Err(e) => {
                    yield Err(RelayError::Stream(e.to_string()));
                    return;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Frame encoders (downstream wire format)
// ---------------------------------------------------------------------------

/// Encode a JSON payload as a `data: ` frame.
pub fn data_frame(json: &str) -> Bytes {
    let mut out = String::with_capacity(8 + json.len());
    out.push_str("data: ");
    out.push_str(json);
    out.push_str("\n\n");
    Bytes::from(out)
}

/// The terminal `data: [DONE]\n\n` frame.
pub fn done_frame() -> Bytes {
    Bytes::from_static(b"data: [DONE]\n\n")
}

/// Diagnostic frame emitted when the upstream fetch fails mid-stream.
///
/// Not `data:`-prefixed, mirroring the wire behavior clients of this relay
/// already special-case.
pub fn error_frame(msg: &str) -> Bytes {
    Bytes::from(format!("error: {msg}\n\n"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use std::convert::Infallible;

    fn payloads(events: Vec<RawEvent>) -> Vec<String> {
        events
            .into_iter()
            .map(|e| match e {
                RawEvent::Payload(p) => p,
                RawEvent::Done => "[DONE]".to_string(),
            })
            .collect()
    }

    #[test]
    fn decodes_simple_data_lines() {
        let mut decoder = SseLineDecoder::new();
        let events = decoder.feed(b"data: {\"content\":\"a\"}\n\ndata: {\"content\":\"b\"}\n\n");
        assert_eq!(
            payloads(events),
            vec!["{\"content\":\"a\"}", "{\"content\":\"b\"}"]
        );
    }

    #[test]
    fn skips_lines_without_prefix() {
        let mut decoder = SseLineDecoder::new();
        let events = decoder.feed(b": comment\nevent: message\ndata: x\n\n");
        assert_eq!(payloads(events), vec!["x"]);
    }

    #[test]
    fn requires_space_after_colon() {
        // The upstream always emits "data: "; a bare "data:" line is skipped.
        let mut decoder = SseLineDecoder::new();
        let events = decoder.feed(b"data:nospace\ndata: yes\n\n");
        assert_eq!(payloads(events), vec!["yes"]);
    }

    #[test]
    fn sentinel_ends_decoding() {
        let mut decoder = SseLineDecoder::new();
        let events = decoder.feed(b"data: one\n\ndata: [DONE]\n\ndata: after\n\n");
        assert_eq!(events.last(), Some(&RawEvent::Done));
        assert_eq!(events.len(), 2);
        assert!(decoder.is_done());
        assert!(decoder.feed(b"data: more\n\n").is_empty());
    }

    #[test]
    fn buffers_partial_lines_across_chunks() {
        let mut decoder = SseLineDecoder::new();
        assert!(decoder.feed(b"data: hel").is_empty());
        let events = decoder.feed(b"lo\n");
        assert_eq!(payloads(events), vec!["hello"]);
    }

    #[test]
    fn handles_crlf_line_endings() {
        let mut decoder = SseLineDecoder::new();
        let events = decoder.feed(b"data: hello\r\n\r\n");
        assert_eq!(payloads(events), vec!["hello"]);
    }

    #[test]
    fn empty_payload_is_an_event() {
        // Dropping empty content is the translator's call, not the decoder's.
        let mut decoder = SseLineDecoder::new();
        let events = decoder.feed(b"data: \n\n");
        assert_eq!(payloads(events), vec![""]);
    }

    #[tokio::test]
    async fn raw_events_ends_at_sentinel() {
        let source = stream::iter(vec![
            Ok::<Bytes, Infallible>(Bytes::from_static(b"data: {\"content\":\"a\"}\n\n")),
            Ok(Bytes::from_static(b"data: [DONE]\n\ndata: ignored\n\n")),
        ]);
        let items: Vec<_> = raw_events(source).collect().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_deref().unwrap(), "{\"content\":\"a\"}");
    }

    #[tokio::test]
    async fn raw_events_ends_cleanly_at_eof_without_sentinel() {
        let source = stream::iter(vec![Ok::<Bytes, Infallible>(Bytes::from_static(
            b"data: x\n\n",
        ))]);
        let items: Vec<_> = raw_events(source).collect().await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_ok());
    }

    #[tokio::test]
    async fn raw_events_surfaces_transport_errors() {
        let source = stream::iter(vec![
            Ok(Bytes::from_static(b"data: x\n\n")),
            Err("connection reset"),
        ]);
        let items: Vec<_> = raw_events(source).collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(RelayError::Stream(_))));
    }

    #[test]
    fn frame_encoders() {
        assert_eq!(data_frame("{}").as_ref(), b"data: {}\n\n");
        assert_eq!(done_frame().as_ref(), b"data: [DONE]\n\n");
        assert_eq!(error_frame("boom").as_ref(), b"error: boom\n\n");
    }
}
