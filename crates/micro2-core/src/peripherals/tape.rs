use crate::bus::Device;

/// Paper tape reader (input) and punch (output) sharing one slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaperTape {
    tape: Vec<u8>,
    position: usize,
    punched: Vec<u8>,
}

impl PaperTape {
    /// Mounts a new tape in the reader and rewinds it.
    pub fn load(&mut self, tape: impl Into<Vec<u8>>) {
        self.tape = tape.into();
        self.position = 0;
    }

    /// Words not yet read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.tape.len() - self.position
    }

    /// Words punched so far.
    #[must_use]
    pub fn punched(&self) -> &[u8] {
        &self.punched
    }

    /// Discards punched output.
    pub fn clear_punch(&mut self) {
        self.punched.clear();
    }
}

impl Device for PaperTape {
    fn name(&self) -> &str {
        "paper tape"
    }

    fn flag(&self) -> bool {
        self.position < self.tape.len()
    }

    fn read(&mut self) -> u8 {
        let Some(word) = self.tape.get(self.position).copied() else {
            return 0;
        };
        self.position += 1;
        word
    }

    fn write(&mut self, value: u8) {
        self.punched.push(value);
    }

    fn reset(&mut self) {
        self.position = 0;
        self.punched.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::PaperTape;
    use crate::bus::Device;

    #[test]
    fn reader_drops_flag_after_last_word() {
        let mut tape = PaperTape::default();
        assert!(!tape.flag());
        tape.load([3, 4]);
        assert!(tape.flag());
        assert_eq!(tape.read(), 3);
        assert!(tape.flag());
        assert_eq!(tape.read(), 4);
        assert!(!tape.flag());
        assert_eq!(tape.read(), 0);
        assert_eq!(tape.remaining(), 0);
    }

    #[test]
    fn punch_collects_written_words() {
        let mut tape = PaperTape::default();
        tape.write(9);
        tape.write(8);
        assert_eq!(tape.punched(), &[9, 8]);
        tape.clear_punch();
        assert!(tape.punched().is_empty());
    }

    #[test]
    fn reset_rewinds_reader() {
        let mut tape = PaperTape::default();
        tape.load(vec![1, 2]);
        tape.read();
        tape.reset();
        assert_eq!(tape.remaining(), 2);
    }
}
