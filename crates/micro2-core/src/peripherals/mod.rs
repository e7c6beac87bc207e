//! Standard MICRO II peripherals.
//!
//! Each type implements [`crate::bus::Device`] and can be installed in any
//! slot from 1 to 7; the `*_SLOT` constants give the conventional layout used
//! by [`crate::bus::IoBus::with_standard_devices`].

mod console;
mod panel;
mod tape;

pub use console::{ConsoleInput, ConsoleOutput, CONSOLE_BUFFER_CAPACITY};
pub use panel::{DataSwitches, LedDisplay};
pub use tape::PaperTape;

/// Keyboard input queue.
pub const CONSOLE_INPUT_SLOT: u8 = 1;
/// Teleprinter output.
pub const CONSOLE_OUTPUT_SLOT: u8 = 2;
/// Front-panel data switches.
pub const DATA_SWITCHES_SLOT: u8 = 3;
/// Front-panel LED register.
pub const LED_DISPLAY_SLOT: u8 = 4;
/// Paper tape reader and punch.
pub const PAPER_TAPE_SLOT: u8 = 5;
