//! The AT transaction engine shared by every atlink device driver.
//!
//! One transaction is: write the command, read until the deadline while
//! tolerating quiet read windows, strip the module's echo, and split what
//! is left into response lines.
//!
//! # Architecture
//!
//! - [`protocol`] -- line splitting and final-status detection
//! - [`echo`] -- the per-vendor echo strategies
//! - [`frame`] -- capacity-bounded frame buffer, accumulation loop, line draining
//! - [`engine`] -- the [`TransactionEngine`] that ties them together

pub mod echo;
pub mod engine;
pub mod frame;
pub mod protocol;

pub use echo::{EchoMatch, EchoStrategy};
pub use engine::{EngineConfig, TransactionEngine, TransactionPhase, TransportSlot, transport_slot};
pub use frame::{DEFAULT_FRAME_CAPACITY, FrameBuffer, StopCondition};
