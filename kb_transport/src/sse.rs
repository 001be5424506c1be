//! Streaming reader for newline-delimited server-sent events.
//!
//! The knowledge-base service streams long-running results as
//! `data: <payload>` lines separated by blank lines. This module decodes
//! that format into discrete payloads: incrementally, in wire order, with
//! back-pressure (the pull-based [`Stream`] never runs ahead of its
//! consumer). Streamed responses are never retried mid-stream.

use std::collections::VecDeque;
use std::pin::Pin;

use futures::{Stream, StreamExt};

use crate::classify;
use crate::error::TransportError;

/// Lazy, finite, non-restartable sequence of decoded payloads.
///
/// Terminates with `None` at stream EOF; an underlying read error is yielded
/// as an `Err` item, distinct from normal termination. Dropping the stream
/// closes the connection and stops the reader promptly.
pub type PayloadStream = Pin<Box<dyn Stream<Item = Result<String, TransportError>> + Send>>;

/// Incremental decoder for `data: `-prefixed event lines.
///
/// Handles chunk boundaries splitting lines. Lines without the `data:`
/// prefix are discarded (not an error), as are `data:` lines whose payload
/// trims to empty; blank separator lines produce no output.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
}

impl SseDecoder {
    /// Creates an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a chunk of bytes and returns decoded payloads in wire order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let text = String::from_utf8_lossy(chunk);
        self.buffer.push_str(&text);

        let mut payloads = Vec::new();
        while let Some(newline_pos) = self.buffer.find('\n') {
            let line = self.buffer[..newline_pos]
                .trim_end_matches('\r')
                .to_string();
            self.buffer.drain(..=newline_pos);
            if let Some(payload) = decode_line(&line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flushes a final unterminated line at end of stream.
    pub fn flush(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buffer);
        decode_line(line.trim_end_matches('\r'))
    }
}

fn decode_line(line: &str) -> Option<String> {
    let value = line.strip_prefix("data:")?;
    let value = value.strip_prefix(' ').unwrap_or(value);
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Wraps a response body in a decoding [`PayloadStream`].
///
/// The stream owns the response; HTTP status handling happens before the
/// body is handed over.
#[must_use]
pub fn payload_stream(response: reqwest::Response) -> PayloadStream {
    let body = response.bytes_stream();

    // `unfold` panics if polled again after returning `None`; fuse so a
    // finished stream keeps yielding `None` as the contract promises.
    Box::pin(
        futures::stream::unfold(
            (body, SseDecoder::new(), VecDeque::new(), false),
            |(mut body, mut decoder, mut pending, mut done)| async move {
                loop {
                    if let Some(payload) = pending.pop_front() {
                        return Some((Ok(payload), (body, decoder, pending, done)));
                    }
                    if done {
                        return None;
                    }
                    match body.next().await {
                        Some(Ok(chunk)) => pending.extend(decoder.push(&chunk)),
                        Some(Err(err)) => {
                            done = true;
                            let kind = classify::classify_reqwest(&err);
                            let detail = classify::error_chain_text(&err);
                            return Some((
                                Err(TransportError::Network {
                                    kind,
                                    detail,
                                    attempts: 1,
                                    source: Some(err),
                                }),
                                (body, decoder, pending, done),
                            ));
                        }
                        None => {
                            done = true;
                            pending.extend(decoder.flush());
                        }
                    }
                }
            },
        )
        .fuse(),
    )
}
