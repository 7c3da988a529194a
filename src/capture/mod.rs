//! Event capture module
//!
//! Raw hook-event model, the lock-free buffer that decouples hook-thread
//! timing from timeline mutation, and the normalizer that owns
//! press/release deduplication.

pub mod normalizer;
pub mod raw;
pub mod ring_buffer;

pub use normalizer::EventNormalizer;
pub use raw::{HookError, HookService, MouseButton, NullHookService, RawHookEvent, RawKey};
pub use ring_buffer::{HookEventBuffer, HookEventConsumer, HookEventProducer};
