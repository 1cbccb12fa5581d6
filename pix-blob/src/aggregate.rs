//! Stream aggregation: drain a [`ByteStream`] into one contiguous buffer.
//!
//! Chunks are kept as received (`Bytes` handles, no copy) and concatenated
//! once the stream ends. A stream error or cancellation drops everything
//! collected so far; a partial buffer is never returned.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::{BlobError, BlobResult, ByteStream};

/// Drain `stream` to completion.
pub async fn aggregate(stream: ByteStream, cancel: &CancellationToken) -> BlobResult<Bytes> {
    collect(stream, cancel, None).await
}

/// Drain `stream`, failing with [`BlobError::TooLarge`] once more than
/// `max_bytes` have been received.
pub async fn aggregate_with_limit(
    stream: ByteStream,
    cancel: &CancellationToken,
    max_bytes: u64,
) -> BlobResult<Bytes> {
    collect(stream, cancel, Some(max_bytes)).await
}

/// Like [`aggregate_with_limit`], bounded by a wall-clock deadline.
pub async fn aggregate_within(
    stream: ByteStream,
    cancel: &CancellationToken,
    max_bytes: u64,
    deadline: Duration,
) -> BlobResult<Bytes> {
    match tokio::time::timeout(deadline, collect(stream, cancel, Some(max_bytes))).await {
        Ok(result) => result,
        Err(_) => Err(BlobError::Timeout(deadline)),
    }
}

async fn collect(
    mut stream: ByteStream,
    cancel: &CancellationToken,
    limit: Option<u64>,
) -> BlobResult<Bytes> {
    let mut chunks: Vec<Bytes> = Vec::new();
    let mut total: u64 = 0;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(BlobError::Cancelled),
            next = stream.next() => next,
        };

        match next {
            Some(Ok(chunk)) => {
                total += chunk.len() as u64;
                if let Some(limit) = limit {
                    if total > limit {
                        return Err(BlobError::TooLarge { limit });
                    }
                }
                if !chunk.is_empty() {
                    chunks.push(chunk);
                }
            }
            Some(Err(source)) => return Err(BlobError::Io { source }),
            None => break,
        }
    }

    tracing::trace!(chunks = chunks.len(), bytes = total, "stream aggregated");
    Ok(concat(chunks, total))
}

fn concat(mut chunks: Vec<Bytes>, total: u64) -> Bytes {
    if chunks.len() <= 1 {
        return chunks.pop().unwrap_or_default();
    }

    // Sized from what was actually received, never from a declared length.
    let mut buf = BytesMut::with_capacity(total as usize);
    for chunk in &chunks {
        buf.extend_from_slice(chunk);
    }
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream_from_chunks;
    use proptest::prelude::*;

    fn chunks(parts: &[&'static [u8]]) -> ByteStream {
        stream_from_chunks(parts.iter().map(|p| Bytes::from_static(p)).collect::<Vec<_>>())
    }

    #[tokio::test]
    async fn zero_chunks_yield_empty_buffer() {
        let buf = aggregate(chunks(&[]), &CancellationToken::new()).await.unwrap();
        assert!(buf.is_empty());
    }

    #[tokio::test]
    async fn chunks_are_joined_in_arrival_order() {
        let buf = aggregate(chunks(&[b"\x89PN", b"", b"G\r\n", b"\x1a\n"]), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(&buf[..], b"\x89PNG\r\n\x1a\n");
    }

    #[tokio::test]
    async fn stream_error_discards_partial_data() {
        let stream: ByteStream = Box::pin(futures::stream::iter(vec![
            Ok(Bytes::from_static(b"abc")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
            Ok(Bytes::from_static(b"def")),
        ]));

        let err = aggregate(stream, &CancellationToken::new()).await.unwrap_err();
        match err {
            BlobError::Io { source } => assert_eq!(source.kind(), std::io::ErrorKind::ConnectionReset),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancelled_token_stops_pending_stream() {
        let cancel = CancellationToken::new();
        let stream: ByteStream = Box::pin(futures::stream::pending::<Result<Bytes, std::io::Error>>());

        let child = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            child.cancel();
        });

        let err = aggregate(stream, &cancel).await.unwrap_err();
        assert!(matches!(err, BlobError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_expires_on_stalled_stream() {
        let stream: ByteStream = Box::pin(futures::stream::pending::<Result<Bytes, std::io::Error>>());
        let err = aggregate_within(stream, &CancellationToken::new(), 1024, Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::Timeout(d) if d == Duration::from_secs(2)));
    }

    #[tokio::test]
    async fn limit_is_enforced_on_received_bytes() {
        let err = aggregate_with_limit(chunks(&[b"1234", b"5678"]), &CancellationToken::new(), 6)
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::TooLarge { limit: 6 }));

        let ok = aggregate_with_limit(chunks(&[b"1234", b"56"]), &CancellationToken::new(), 6)
            .await
            .unwrap();
        assert_eq!(ok.len(), 6);
    }

    proptest! {
        #[test]
        fn aggregation_is_exact_concatenation(parts in proptest::collection::vec(
            proptest::collection::vec(any::<u8>(), 0..64),
            0..16,
        )) {
            let expected: Vec<u8> = parts.iter().flatten().copied().collect();
            let stream = stream_from_chunks(parts.into_iter().map(Bytes::from).collect::<Vec<_>>());

            let buf = futures::executor::block_on(aggregate(stream, &CancellationToken::new())).unwrap();

            prop_assert_eq!(buf.len(), expected.len());
            prop_assert_eq!(&buf[..], &expected[..]);
        }
    }
}
