//! Byte encoding and decoding for button events and LED commands.

/// Bit 7: release flag on inbound bytes, off flag on outbound bytes
pub const FLAG_BIT: u8 = 0x80;

/// Bits 0-6: button or LED identifier
pub const ID_MASK: u8 = 0x7f;

/// Reserved keep-alive byte, outside the LED command space
pub const HEARTBEAT_BYTE: u8 = 0xff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Press,
    Release,
}

/// A decoded inbound byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub button: u8,
    pub kind: EventKind,
}

/// Decode a byte received from the panel
pub fn decode_button(byte: u8) -> ButtonEvent {
    ButtonEvent {
        button: byte & ID_MASK,
        kind: if byte & FLAG_BIT != 0 {
            EventKind::Release
        } else {
            EventKind::Press
        },
    }
}

/// Encode an LED command. The flag bit is set when the LED goes off.
pub fn encode_led(led: u8, on: bool) -> u8 {
    let led = led & ID_MASK;
    if on {
        led
    } else {
        led | FLAG_BIT
    }
}
