//! Identifiers wired into the physical panel.

pub const WHITE_BUTTON: u8 = 30;
pub const GREEN_BUTTON: u8 = 32;
pub const YELLOW_BUTTON: u8 = 34;
pub const RED_BUTTON: u8 = 36;
pub const SQUARE_BUTTON: u8 = 38;

/// Toggle switch inputs. They have no LED and never produce output.
pub const SWITCH_UP: u8 = 25;
pub const SWITCH_DOWN: u8 = 23;

pub const WHITE_BUTTON_LED: u8 = 13;
pub const GREEN_BUTTON_LED: u8 = 12;
pub const YELLOW_BUTTON_LED: u8 = 11;
pub const RED_BUTTON_LED: u8 = 10;
pub const SQUARE_BUTTON_LED: u8 = 9;

/// Indicator LEDs without a button, reachable only through the control API
pub const BLUE_LED: u8 = 2;
pub const GREEN_LED: u8 = 3;
pub const YELLOW_LED: u8 = 4;
pub const DUAL_LED_GREEN: u8 = 5;
pub const RED_LED: u8 = 6;
pub const DUAL_LED_RED: u8 = 7;

/// Illuminated buttons in seeding order
pub const BUTTON_LEDS: [(u8, u8); 5] = [
    (WHITE_BUTTON, WHITE_BUTTON_LED),
    (GREEN_BUTTON, GREEN_BUTTON_LED),
    (YELLOW_BUTTON, YELLOW_BUTTON_LED),
    (RED_BUTTON, RED_BUTTON_LED),
    (SQUARE_BUTTON, SQUARE_BUTTON_LED),
];
