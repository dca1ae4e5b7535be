// src/exec/reader.rs

//! Per-stream reader tasks.
//!
//! Each reader owns one child pipe and pushes complete lines into its own
//! unbounded queue. The coordinator drains the queues without blocking, so a
//! reader never waits on the consumer and the child never stalls on a full
//! pipe.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::exec::{OutputLine, StreamKind};

/// Spawn a reader for `pipe`, tagging lines with `stream`.
///
/// The reader ends on end-of-stream, on a read error (logged, treated as
/// end-of-stream), or when the queue's receiver has been dropped. A missing
/// pipe yields a reader that finishes immediately.
pub fn spawn_reader<R>(
    stream: StreamKind,
    pipe: Option<R>,
    clock: Arc<AtomicU64>,
    tx: mpsc::UnboundedSender<OutputLine>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let Some(pipe) = pipe else {
            debug!(%stream, "no pipe attached; reader exits");
            return;
        };

        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::with_capacity(256);
        let mut count = 0usize;

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = OutputLine {
                        stream,
                        seq: clock.fetch_add(1, Ordering::Relaxed),
                        text: String::from_utf8_lossy(&buf).into_owned(),
                    };
                    if tx.send(line).is_err() {
                        debug!(%stream, "line queue closed; reader exits");
                        break;
                    }
                    count += 1;
                }
                Err(err) => {
                    warn!(%stream, error = %err, "error reading child output; treating as end of stream");
                    break;
                }
            }
        }

        debug!(%stream, lines = count, "reader reached end of stream");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reader_keeps_terminators_and_trailing_partial_line() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let clock = Arc::new(AtomicU64::new(0));
        let data: &[u8] = b"first\nsecond\r\nlast";

        spawn_reader(StreamKind::Stdout, Some(data), clock, tx)
            .await
            .unwrap();

        let mut texts = Vec::new();
        while let Ok(line) = rx.try_recv() {
            texts.push(line.text);
        }
        assert_eq!(texts, vec!["first\n", "second\r\n", "last"]);
    }

    #[tokio::test]
    async fn reader_replaces_invalid_utf8() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let clock = Arc::new(AtomicU64::new(0));
        let data: &[u8] = b"ok \xff\n";

        spawn_reader(StreamKind::Stderr, Some(data), clock, tx)
            .await
            .unwrap();

        let line = rx.try_recv().unwrap();
        assert_eq!(line.stream, StreamKind::Stderr);
        assert_eq!(line.text, "ok \u{fffd}\n");
    }

    #[tokio::test]
    async fn readers_share_one_logical_clock() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let clock = Arc::new(AtomicU64::new(0));

        spawn_reader(StreamKind::Stdout, Some(&b"a\nb\n"[..]), Arc::clone(&clock), tx.clone())
            .await
            .unwrap();
        spawn_reader(StreamKind::Stderr, Some(&b"c\n"[..]), Arc::clone(&clock), tx)
            .await
            .unwrap();

        let mut seqs = Vec::new();
        while let Ok(line) = rx.try_recv() {
            seqs.push(line.seq);
        }
        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(clock.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn missing_pipe_finishes_immediately() {
        let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
        let clock = Arc::new(AtomicU64::new(0));

        spawn_reader::<&[u8]>(StreamKind::Stdout, None, clock, tx)
            .await
            .unwrap();

        assert!(rx.try_recv().is_err());
    }
}
