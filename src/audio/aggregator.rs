//! # Frame Batching
//!
//! Drains the capture channel and coalesces whatever frames have queued up
//! into one outbound batch per pull. Batching amortizes per-message overhead
//! on the network leg while preserving byte-exact ordering: the
//! concatenation of all yielded batches equals the concatenation of all
//! captured frames, whatever the batching split turns out to be.
//!
//! ## Pull Semantics:
//! 1. Block until at least one frame (or the sentinel) is available
//! 2. Sentinel → the sequence ends; it is finite and not restartable
//! 3. Otherwise greedily drain every frame currently queued without
//!    blocking, concatenate in arrival order, yield the batch
//!
//! A sentinel seen mid-drain still yields the partial batch first — the
//! final audio of a session is never dropped. The drain loop is a plain
//! `try_recv` loop that stops the instant the channel reports empty; it
//! never spins.

use crate::audio::source::FrameMessage;
use crossbeam_channel::{Receiver, TryRecvError};

/// Lazy sequence of audio batches over the capture channel.
///
/// This is the single consumer of the capture channel; it runs on the
/// blocking bridge thread, never on the async runtime.
pub struct ChunkAggregator {
    frames: Receiver<FrameMessage>,
    finished: bool,
}

impl ChunkAggregator {
    pub fn new(frames: Receiver<FrameMessage>) -> Self {
        Self {
            frames,
            finished: false,
        }
    }
}

impl Iterator for ChunkAggregator {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        if self.finished {
            return None;
        }

        // Blocking wait for the first frame. A disconnected channel means the
        // producer is gone, which terminates the sequence the same way the
        // sentinel does.
        let mut batch = match self.frames.recv() {
            Ok(FrameMessage::Frame(bytes)) => bytes,
            Ok(FrameMessage::End) | Err(_) => {
                self.finished = true;
                return None;
            }
        };

        // Non-blocking drain of everything already queued
        loop {
            match self.frames.try_recv() {
                Ok(FrameMessage::Frame(bytes)) => batch.extend_from_slice(&bytes),
                Ok(FrameMessage::End) => {
                    self.finished = true;
                    break;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.finished = true;
                    break;
                }
            }
        }

        Some(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn frame(bytes: &[u8]) -> FrameMessage {
        FrameMessage::Frame(bytes.to_vec())
    }

    /// Ordering/completeness: the concatenation of yielded batches equals
    /// the concatenation of input frames, byte for byte, regardless of how
    /// the frames get split into batches.
    #[test]
    fn test_batches_preserve_order_and_bytes() {
        let (tx, rx) = unbounded();
        let frames: Vec<Vec<u8>> = (0u8..50)
            .map(|i| vec![i, i.wrapping_add(1), i.wrapping_add(2)])
            .collect();

        for f in &frames {
            tx.send(FrameMessage::Frame(f.clone())).unwrap();
        }
        tx.send(FrameMessage::End).unwrap();

        let yielded: Vec<Vec<u8>> = ChunkAggregator::new(rx).collect();

        let expected: Vec<u8> = frames.into_iter().flatten().collect();
        let actual: Vec<u8> = yielded.into_iter().flatten().collect();
        assert_eq!(actual, expected);
    }

    /// All frames queued before a pull come back as one coalesced batch.
    #[test]
    fn test_queued_frames_coalesce_into_one_batch() {
        let (tx, rx) = unbounded();
        tx.send(frame(b"ab")).unwrap();
        tx.send(frame(b"cd")).unwrap();
        tx.send(frame(b"ef")).unwrap();

        let mut agg = ChunkAggregator::new(rx);
        assert_eq!(agg.next(), Some(b"abcdef".to_vec()));
    }

    /// Sentinel termination: frames F1..Fk followed by the sentinel yield a
    /// finite sequence covering exactly F1..Fk and then end. No deadlock and
    /// no dropped final batch, even when the sentinel is already queued
    /// behind the frames.
    #[test]
    fn test_sentinel_ends_sequence_without_dropping_final_batch() {
        let (tx, rx) = unbounded();
        tx.send(frame(b"f1")).unwrap();
        tx.send(frame(b"f2")).unwrap();
        tx.send(FrameMessage::End).unwrap();

        let mut agg = ChunkAggregator::new(rx);
        assert_eq!(agg.next(), Some(b"f1f2".to_vec()));
        assert_eq!(agg.next(), None);
        // Not restartable
        assert_eq!(agg.next(), None);
    }

    #[test]
    fn test_immediate_sentinel_yields_empty_sequence() {
        let (tx, rx) = unbounded();
        tx.send(FrameMessage::End).unwrap();

        let mut agg = ChunkAggregator::new(rx);
        assert_eq!(agg.next(), None);
    }

    #[test]
    fn test_disconnected_producer_ends_sequence() {
        let (tx, rx) = unbounded();
        tx.send(frame(b"last")).unwrap();
        drop(tx);

        let mut agg = ChunkAggregator::new(rx);
        assert_eq!(agg.next(), Some(b"last".to_vec()));
        assert_eq!(agg.next(), None);
    }

    /// Frames arriving between pulls land in separate batches, still in
    /// arrival order.
    #[test]
    fn test_interleaved_pulls_and_sends() {
        let (tx, rx) = unbounded();
        let mut agg = ChunkAggregator::new(rx);

        tx.send(frame(b"one")).unwrap();
        assert_eq!(agg.next(), Some(b"one".to_vec()));

        tx.send(frame(b"two")).unwrap();
        tx.send(frame(b"three")).unwrap();
        assert_eq!(agg.next(), Some(b"twothree".to_vec()));

        tx.send(FrameMessage::End).unwrap();
        assert_eq!(agg.next(), None);
    }
}
