//! Button toggle state machine.

use crate::codec::{decode_button, encode_led, EventKind, HEARTBEAT_BYTE, ID_MASK};
use crate::panel;

/// Number of distinct 7-bit button identifiers
const BUTTON_SPACE: usize = 128;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TableError {
    #[error("button id {0} does not fit in 7 bits")]
    ButtonOutOfRange(u8),
    #[error("LED id {0} is outside the LED command space")]
    LedOutOfRange(u8),
    #[error("button id {0} is mapped more than once")]
    DuplicateButton(u8),
}

/// Static mapping from button identifier to LED identifier.
///
/// Entries keep their declared order, which is the order LEDs are seeded in.
#[derive(Debug, Clone)]
pub struct ButtonLedTable {
    entries: Vec<(u8, u8)>,
    lookup: [Option<u8>; BUTTON_SPACE],
}

impl ButtonLedTable {
    pub fn new(entries: &[(u8, u8)]) -> Result<Self, TableError> {
        let mut lookup = [None; BUTTON_SPACE];
        for &(button, led) in entries {
            if button > ID_MASK {
                return Err(TableError::ButtonOutOfRange(button));
            }
            // LED 127 switched off would encode to the heartbeat byte
            if led > ID_MASK || (led | 0x80) == HEARTBEAT_BYTE {
                return Err(TableError::LedOutOfRange(led));
            }
            if lookup[button as usize].is_some() {
                return Err(TableError::DuplicateButton(button));
            }
            lookup[button as usize] = Some(led);
        }
        Ok(ButtonLedTable {
            entries: entries.to_vec(),
            lookup,
        })
    }

    pub fn led_for(&self, button: u8) -> Option<u8> {
        self.lookup.get(button as usize).copied().flatten()
    }
}

impl Default for ButtonLedTable {
    fn default() -> Self {
        let mut lookup = [None; BUTTON_SPACE];
        for (button, led) in panel::BUTTON_LEDS {
            lookup[button as usize] = Some(led);
        }
        ButtonLedTable {
            entries: panel::BUTTON_LEDS.to_vec(),
            lookup,
        }
    }
}

/// Per-button "LED currently on" flags, all off at start
#[derive(Debug, Clone)]
pub struct ButtonState {
    on: [bool; BUTTON_SPACE],
}

impl ButtonState {
    pub fn new() -> Self {
        ButtonState {
            on: [false; BUTTON_SPACE],
        }
    }

    pub fn is_on(&self, button: u8) -> bool {
        self.on.get(button as usize).copied().unwrap_or(false)
    }

    /// Flip the flag and return the new value
    fn toggle(&mut self, button: u8) -> bool {
        let flag = &mut self.on[(button & ID_MASK) as usize];
        *flag = !*flag;
        *flag
    }
}

impl Default for ButtonState {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes button bytes and produces LED command bytes.
///
/// The engine is owned by a single task; its state is never reset, so a
/// toggle recorded before a link drop is still authoritative afterwards.
#[derive(Debug, Clone)]
pub struct ButtonEngine {
    table: ButtonLedTable,
    state: ButtonState,
}

impl ButtonEngine {
    pub fn new(table: ButtonLedTable) -> Self {
        ButtonEngine {
            table,
            state: ButtonState::new(),
        }
    }

    /// One LED command per mapped button, in declared order, reflecting the
    /// current state.
    pub fn seed_commands(&self) -> Vec<u8> {
        self.table
            .entries
            .iter()
            .map(|&(button, led)| encode_led(led, self.state.is_on(button)))
            .collect()
    }

    /// Apply one inbound byte. Returns the LED command to send, if any.
    ///
    /// Releases and unmapped buttons leave the state untouched.
    pub fn handle_byte(&mut self, byte: u8) -> Option<u8> {
        let event = decode_button(byte);
        if event.kind == EventKind::Release {
            return None;
        }
        let led = self.table.led_for(event.button)?;
        let on = self.state.toggle(event.button);
        Some(encode_led(led, on))
    }

    pub fn is_on(&self, button: u8) -> bool {
        self.state.is_on(button)
    }
}

impl Default for ButtonEngine {
    fn default() -> Self {
        Self::new(ButtonLedTable::default())
    }
}
