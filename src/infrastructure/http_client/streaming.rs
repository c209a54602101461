//! Server-Sent Events parsing for streamed completions
//!
//! Yields the `data:` payload of every event. A `[DONE]` payload ends the
//! stream.

use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::warn;

use super::errors::ApiError;

type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// Stream of SSE `data:` payloads parsed from a response body
pub struct SseDataStream {
    inner: ByteStream,
    buffer: Vec<u8>,
    finished: bool,
}

impl SseDataStream {
    /// Create a new SSE parser from a byte stream
    pub fn new(stream: impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static) -> Self {
        Self {
            inner: Box::pin(stream),
            buffer: Vec::new(),
            finished: false,
        }
    }

    /// Remove the next complete event from the buffer, if any.
    fn next_event(&mut self) -> Option<String> {
        let (end, sep_len) = find_event_boundary(&self.buffer)?;
        let event: Vec<u8> = self.buffer.drain(..end + sep_len).take(end).collect();
        Some(String::from_utf8_lossy(&event).into_owned())
    }
}

/// Position and length of the first blank-line separator.
fn find_event_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buffer
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|i| (i, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

/// Join the `data:` lines of one event. Comments and other fields are ignored.
pub fn parse_event_data(event: &str) -> Option<String> {
    let lines: Vec<&str> = event
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.strip_prefix(' ').unwrap_or(value))
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

impl Stream for SseDataStream {
    type Item = Result<String, ApiError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if self.finished {
                return Poll::Ready(None);
            }

            if let Some(event) = self.next_event() {
                match parse_event_data(&event) {
                    Some(data) if data.trim() == "[DONE]" => {
                        self.finished = true;
                        return Poll::Ready(None);
                    }
                    Some(data) if !data.trim().is_empty() => return Poll::Ready(Some(Ok(data))),
                    _ => continue,
                }
            }

            match self.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    self.buffer.extend_from_slice(&bytes);
                }
                Poll::Ready(Some(Err(err))) => {
                    self.finished = true;
                    return Poll::Ready(Some(Err(ApiError::NetworkError(err))));
                }
                Poll::Ready(None) => {
                    self.finished = true;
                    let remaining = String::from_utf8_lossy(&self.buffer).into_owned();
                    self.buffer.clear();
                    return match parse_event_data(&remaining) {
                        Some(data) if data.trim() == "[DONE]" || data.trim().is_empty() => {
                            Poll::Ready(None)
                        }
                        Some(data) => Poll::Ready(Some(Ok(data))),
                        None => {
                            if !remaining.trim().is_empty() {
                                warn!(remaining = %remaining, "stream ended with unparsed data");
                            }
                            Poll::Ready(None)
                        }
                    };
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{stream, StreamExt};

    fn byte_stream(
        parts: Vec<&'static str>,
    ) -> impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static {
        stream::iter(parts.into_iter().map(|p| Ok(Bytes::from(p))))
    }

    #[tokio::test]
    async fn test_parses_events_until_done() {
        let parser = SseDataStream::new(byte_stream(vec![
            "data: {\"a\":1}\n\n",
            "data: {\"a\":2}\n\ndata: [DONE]\n\n",
            "data: {\"a\":3}\n\n",
        ]));

        let items: Vec<String> = parser.map(|item| item.unwrap()).collect().await;
        assert_eq!(items, vec!["{\"a\":1}", "{\"a\":2}"]);
    }

    #[tokio::test]
    async fn test_event_split_across_chunks() {
        let parser = SseDataStream::new(byte_stream(vec!["da", "ta: hel", "lo\n", "\n"]));
        let items: Vec<String> = parser.map(|item| item.unwrap()).collect().await;
        assert_eq!(items, vec!["hello"]);
    }

    #[tokio::test]
    async fn test_multibyte_character_split_across_chunks() {
        let bytes = "data: é\n\n".as_bytes();
        let (head, tail) = bytes.split_at(7);
        let parts = vec![
            Ok(Bytes::copy_from_slice(head)),
            Ok(Bytes::copy_from_slice(tail)),
        ];
        let parser = SseDataStream::new(stream::iter(parts));
        let items: Vec<String> = parser.map(|item| item.unwrap()).collect().await;
        assert_eq!(items, vec!["é"]);
    }

    #[tokio::test]
    async fn test_ignores_comments_and_crlf() {
        let parser = SseDataStream::new(byte_stream(vec![": keep-alive\r\n\r\ndata: x\r\n\r\n"]));
        let items: Vec<String> = parser.map(|item| item.unwrap()).collect().await;
        assert_eq!(items, vec!["x"]);
    }

    #[tokio::test]
    async fn test_trailing_event_without_separator() {
        let parser = SseDataStream::new(byte_stream(vec!["data: tail"]));
        let items: Vec<String> = parser.map(|item| item.unwrap()).collect().await;
        assert_eq!(items, vec!["tail"]);
    }

    #[test]
    fn test_parse_event_data_multiline() {
        assert_eq!(parse_event_data("event: x\ndata: a\ndata: b"), Some("a\nb".to_string()));
        assert_eq!(parse_event_data("event: ping"), None);
    }
}
