//! Eight-slot device I/O bus.
//!
//! Slot 0 is the memory selection register: writes to it are reported back
//! to the engine as a bank selection and never reach a device.

use std::any::Any;

use crate::fault::ConfigurationError;
use crate::memory::BANK_SELECT_MASK;
use crate::peripherals::{
    ConsoleInput, ConsoleOutput, DataSwitches, LedDisplay, PaperTape, CONSOLE_INPUT_SLOT,
    CONSOLE_OUTPUT_SLOT, DATA_SWITCHES_SLOT, LED_DISPLAY_SLOT, PAPER_TAPE_SLOT,
};

/// Number of device slots addressable by a 3-bit device id.
pub const DEVICE_SLOTS: usize = 8;
/// Slot reserved for bank selection.
pub const BANK_SELECT_DEVICE: u8 = 0;

/// Capability set every peripheral implements.
///
/// Devices must be `Send` so a machine can be moved to a worker thread.
pub trait Device: Any + Send {
    /// Short human-readable name.
    fn name(&self) -> &str {
        "device"
    }

    /// Ready/attention flag tested by `SFG`.
    fn flag(&self) -> bool;

    /// Produces a word for `INP`.
    fn read(&mut self) -> u8;

    /// Consumes a word from `OUT`.
    fn write(&mut self, value: u8);

    /// Returns the device to its power-on state.
    fn reset(&mut self) {}
}

/// Result categories for a bus write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusWrite {
    /// The installed device consumed the word.
    Delivered,
    /// Slot 0 write; carries the requested bank (low 4 bits of the word).
    BankSelect(u8),
    /// No device is installed in the slot; the word was dropped.
    Unconnected,
}

/// Fixed table of exclusively owned devices.
pub struct IoBus {
    slots: [Option<Box<dyn Device>>; DEVICE_SLOTS],
}

impl Default for IoBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IoBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.installed()).finish()
    }
}

impl IoBus {
    /// Creates a bus with every slot empty.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Creates a bus with the standard console, switch, LED and tape devices
    /// in slots 1 through 5.
    #[must_use]
    pub fn with_standard_devices() -> Self {
        let mut bus = Self::new();
        let standard: [(u8, Box<dyn Device>); 5] = [
            (CONSOLE_INPUT_SLOT, Box::new(ConsoleInput::default())),
            (CONSOLE_OUTPUT_SLOT, Box::new(ConsoleOutput::default())),
            (DATA_SWITCHES_SLOT, Box::new(DataSwitches::default())),
            (LED_DISPLAY_SLOT, Box::new(LedDisplay::default())),
            (PAPER_TAPE_SLOT, Box::new(PaperTape::default())),
        ];
        for (id, device) in standard {
            bus.slots[usize::from(id)] = Some(device);
        }
        bus
    }

    /// Installs `device` in slot `id`, returning the device it replaces.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::ReservedDeviceSlot`] for slot 0 and
    /// [`ConfigurationError::DeviceOutOfRange`] for ids above 7.
    pub fn install(
        &mut self,
        id: u8,
        device: Box<dyn Device>,
    ) -> Result<Option<Box<dyn Device>>, ConfigurationError> {
        let slot = self.slot_mut(id)?;
        Ok(slot.replace(device))
    }

    /// Removes and returns the device in slot `id`.
    pub fn remove(&mut self, id: u8) -> Option<Box<dyn Device>> {
        self.slot_mut(id).ok().and_then(Option::take)
    }

    /// Device flag; `false` for slot 0 and empty slots.
    #[must_use]
    pub fn flag(&self, id: u8) -> bool {
        self.device(id).is_some_and(|device| device.flag())
    }

    /// Reads a word from a device; `0` for slot 0 and empty slots.
    pub fn read(&mut self, id: u8) -> u8 {
        self.device_mut(id).map_or(0, |device| device.read())
    }

    /// Writes a word to a device.
    pub fn write(&mut self, id: u8, value: u8) -> BusWrite {
        if id == BANK_SELECT_DEVICE {
            return BusWrite::BankSelect(value & BANK_SELECT_MASK);
        }
        match self.device_mut(id) {
            Some(device) => {
                device.write(value);
                BusWrite::Delivered
            }
            None => BusWrite::Unconnected,
        }
    }

    /// Borrows the device installed in slot `id`.
    #[must_use]
    pub fn device(&self, id: u8) -> Option<&(dyn Device + 'static)> {
        if id == BANK_SELECT_DEVICE {
            return None;
        }
        self.slots.get(usize::from(id))?.as_deref()
    }

    /// Mutably borrows the device installed in slot `id`.
    pub fn device_mut(&mut self, id: u8) -> Option<&mut (dyn Device + 'static)> {
        if id == BANK_SELECT_DEVICE {
            return None;
        }
        self.slots.get_mut(usize::from(id))?.as_deref_mut()
    }

    /// Borrows the device in slot `id` as its concrete type.
    #[must_use]
    pub fn device_as<T: Device>(&self, id: u8) -> Option<&T> {
        let device: &dyn Any = self.device(id)?;
        device.downcast_ref::<T>()
    }

    /// Mutably borrows the device in slot `id` as its concrete type.
    pub fn device_as_mut<T: Device>(&mut self, id: u8) -> Option<&mut T> {
        let device: &mut dyn Any = self.device_mut(id)?;
        device.downcast_mut::<T>()
    }

    /// Installed devices in slot order.
    pub fn installed(&self) -> impl Iterator<Item = (u8, &str)> + '_ {
        self.slots.iter().zip(0u8..).filter_map(|(slot, id)| {
            slot.as_deref().map(|device| (id, device.name()))
        })
    }

    /// Resets every installed device.
    pub fn reset_devices(&mut self) {
        for device in self.slots.iter_mut().flatten() {
            device.reset();
        }
    }

    fn slot_mut(&mut self, id: u8) -> Result<&mut Option<Box<dyn Device>>, ConfigurationError> {
        if id == BANK_SELECT_DEVICE {
            return Err(ConfigurationError::ReservedDeviceSlot);
        }
        self.slots
            .get_mut(usize::from(id))
            .ok_or(ConfigurationError::DeviceOutOfRange(id))
    }
}
