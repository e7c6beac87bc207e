/// Two's-complement reading of a word.
#[must_use]
pub const fn as_signed(word: u8) -> i8 {
    i8::from_ne_bytes([word])
}

/// Sign bit of an 8-bit word.
pub const SIGN_BIT: u8 = 0x80;

/// Register file of the MICRO II processor.
///
/// The memory selection register lives with the bank selector in
/// [`crate::memory::Memory`]; snapshots combine both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Registers {
    ac: u8,
    pc: u8,
    ir: u8,
    mar: u8,
    mdr: u8,
    overflow: bool,
}

impl Registers {
    /// Reads the accumulator.
    #[must_use]
    pub const fn ac(&self) -> u8 {
        self.ac
    }

    /// Signed view of the accumulator.
    #[must_use]
    pub const fn ac_signed(&self) -> i8 {
        as_signed(self.ac)
    }

    /// Writes the accumulator.
    pub const fn set_ac(&mut self, value: u8) {
        self.ac = value;
    }

    /// Reads the program counter.
    #[must_use]
    pub const fn pc(&self) -> u8 {
        self.pc
    }

    /// Writes the program counter.
    pub const fn set_pc(&mut self, value: u8) {
        self.pc = value;
    }

    /// Reads the instruction register.
    #[must_use]
    pub const fn ir(&self) -> u8 {
        self.ir
    }

    /// Writes the instruction register.
    pub const fn set_ir(&mut self, value: u8) {
        self.ir = value;
    }

    /// Reads the memory address register.
    #[must_use]
    pub const fn mar(&self) -> u8 {
        self.mar
    }

    /// Writes the memory address register.
    pub const fn set_mar(&mut self, value: u8) {
        self.mar = value;
    }

    /// Reads the memory data register.
    #[must_use]
    pub const fn mdr(&self) -> u8 {
        self.mdr
    }

    /// Writes the memory data register.
    pub const fn set_mdr(&mut self, value: u8) {
        self.mdr = value;
    }

    /// Overflow flag from the most recent `ADD`.
    #[must_use]
    pub const fn overflow(&self) -> bool {
        self.overflow
    }

    /// Writes the overflow flag.
    pub const fn set_overflow(&mut self, value: bool) {
        self.overflow = value;
    }

    /// Advances the program counter by `words`, wrapping at 256.
    pub const fn advance_pc(&mut self, words: u8) {
        self.pc = self.pc.wrapping_add(words);
    }
}

#[cfg(test)]
mod tests {
    use super::{as_signed, Registers};

    #[test]
    fn default_registers_are_zeroed() {
        let registers = Registers::default();
        assert_eq!(registers.ac(), 0);
        assert_eq!(registers.pc(), 0);
        assert_eq!(registers.ir(), 0);
        assert_eq!(registers.mar(), 0);
        assert_eq!(registers.mdr(), 0);
        assert!(!registers.overflow());
    }

    #[test]
    fn signed_view_is_twos_complement() {
        assert_eq!(as_signed(0x7F), 127);
        assert_eq!(as_signed(0x80), -128);
        assert_eq!(as_signed(0xFF), -1);

        let mut registers = Registers::default();
        registers.set_ac(251);
        assert_eq!(registers.ac_signed(), -5);
    }

    #[test]
    fn pc_advance_wraps() {
        let mut registers = Registers::default();
        registers.set_pc(255);
        registers.advance_pc(2);
        assert_eq!(registers.pc(), 1);
    }
}
