//! # Audio Capture Module
//!
//! Real-time microphone capture and frame batching for the streaming
//! transcription pipeline.
//!
//! ## Key Components:
//! - **Audio Source**: Owns the input device; the hardware callback pushes
//!   PCM frames into a sentinel-closed channel
//! - **Chunk Aggregator**: Drains the channel, coalescing queued frames into
//!   one outbound batch per pull
//!
//! ## Audio Format:
//! - **Sample Rate**: 16kHz by default (configurable)
//! - **Bit Depth**: 16-bit PCM
//! - **Channels**: Mono
//! - **Encoding**: Little-endian signed integers, raw on the wire

pub mod aggregator; // Frame coalescing into outbound batches
pub mod source;     // Microphone device ownership and capture callback

pub use aggregator::ChunkAggregator;
pub use source::{AudioSource, FrameMessage};
