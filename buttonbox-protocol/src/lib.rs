//! # Buttonbox Protocol
//!
//! Single-byte protocol spoken by the illuminated pushbutton panel.
//!
//! ## Wire Format
//!
//! One byte is one message, in both directions. No framing, no checksum.
//! ```text
//! panel -> host   [release:1][button:7]
//! host  -> panel  [off:1][led:7]
//! ```
//!
//! | Value | Direction | Meaning |
//! |-------|-----------|---------|
//! | 0x00-0x7F | panel→host | button pressed |
//! | 0x80-0xFF | panel→host | button released (ignored) |
//! | 0x00-0x7F | host→panel | turn LED on |
//! | 0x80-0xFE | host→panel | turn LED off |
//! | 0xFF | host→panel | heartbeat (keep-alive) |

mod codec;
mod engine;
pub mod panel;

pub use codec::{decode_button, encode_led, ButtonEvent, EventKind, FLAG_BIT, HEARTBEAT_BYTE, ID_MASK};
pub use engine::{ButtonEngine, ButtonLedTable, ButtonState, TableError};
