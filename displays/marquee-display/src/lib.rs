//! Frame buffer and animation engine for the character panel
//!
//! This crate provides:
//! - `FrameBuffer`, the authoritative cell grid in front of a `CharacterPanel`
//! - `AnimationEngine`, a background ticker that scrolls rows wider than the
//!   panel and hands rows back to foreground writers through a
//!   pause/acknowledge handshake
//! - `show_loading`, a cancellable "Loading..." indicator
//!
//! # Architecture
//!
//! ```text
//! screens ──┬──> AnimationEngine ──┐
//!           │    (ticker thread)   ├──> Mutex<FrameBuffer> ──> CharacterPanel
//!           └──> LoadingHandle ────┘
//!                (worker thread)
//! ```
//!
//! Every panel write goes through the frame buffer lock. Scrolling rows are
//! additionally owned by the ticker until a foreground writer pauses them.

#![deny(unsafe_code)]

// Std critical-section implementation behind the signal mutex
use critical_section as _;

pub mod animation;
pub mod framebuffer;
pub mod loading;

pub use animation::{pad_content, scroll_window, AnimationEngine, RowAnimation};
pub use framebuffer::{lock_frame, FrameBuffer, SharedFrame, WriteStatus};
pub use loading::{show_loading, LoadingHandle};
