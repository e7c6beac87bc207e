use crate::bus::Device;

/// Eight front-panel toggle switches readable as a device.
///
/// Always ready.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataSwitches {
    value: u8,
}

impl DataSwitches {
    /// Sets the switch positions.
    pub const fn set(&mut self, value: u8) {
        self.value = value;
    }

    /// Current switch positions.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.value
    }
}

impl Device for DataSwitches {
    fn name(&self) -> &str {
        "data switches"
    }

    fn flag(&self) -> bool {
        true
    }

    fn read(&mut self) -> u8 {
        self.value
    }

    fn write(&mut self, _value: u8) {}
}

/// Eight-lamp display latching the last word written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedDisplay {
    value: u8,
}

impl LedDisplay {
    /// Latched value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.value
    }

    /// Lamp pattern, most significant bit first.
    #[must_use]
    pub fn lamps(&self) -> String {
        format!("{:08b}", self.value)
    }
}

impl Device for LedDisplay {
    fn name(&self) -> &str {
        "led display"
    }

    fn flag(&self) -> bool {
        false
    }

    fn read(&mut self) -> u8 {
        0
    }

    fn write(&mut self, value: u8) {
        self.value = value;
    }

    fn reset(&mut self) {
        self.value = 0;
    }
}
