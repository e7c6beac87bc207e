use std::collections::VecDeque;

use crate::bus::Device;

/// Words retained by [`ConsoleOutput`]; older words are discarded first.
pub const CONSOLE_BUFFER_CAPACITY: usize = 1000;

/// Queue of pending keyboard words.
///
/// The flag is raised while at least one word is queued.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleInput {
    queue: VecDeque<u8>,
}

impl ConsoleInput {
    /// Appends one word to the queue.
    pub fn push(&mut self, value: u8) {
        self.queue.push_back(value);
    }

    /// Appends the bytes of `text` to the queue.
    pub fn push_text(&mut self, text: &str) {
        self.queue.extend(text.bytes());
    }

    /// Number of queued words.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Device for ConsoleInput {
    fn name(&self) -> &str {
        "console input"
    }

    fn flag(&self) -> bool {
        !self.queue.is_empty()
    }

    fn read(&mut self) -> u8 {
        self.queue.pop_front().unwrap_or(0)
    }

    fn write(&mut self, _value: u8) {}

    fn reset(&mut self) {
        self.queue.clear();
    }
}

/// Bounded log of words written by the program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleOutput {
    buffer: VecDeque<u8>,
}

impl ConsoleOutput {
    /// Words written so far, oldest first.
    #[must_use]
    pub fn words(&self) -> Vec<u8> {
        self.buffer.iter().copied().collect()
    }

    /// Printable ASCII as characters, anything else as `[n]`.
    #[must_use]
    pub fn text(&self) -> String {
        let mut text = String::with_capacity(self.buffer.len());
        for word in &self.buffer {
            if (0x20..=0x7E).contains(word) {
                text.push(char::from(*word));
            } else {
                text.push_str(&format!("[{word}]"));
            }
        }
        text
    }

    /// Discards buffered output.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Device for ConsoleOutput {
    fn name(&self) -> &str {
        "console output"
    }

    fn flag(&self) -> bool {
        false
    }

    fn read(&mut self) -> u8 {
        0
    }

    fn write(&mut self, value: u8) {
        if self.buffer.len() == CONSOLE_BUFFER_CAPACITY {
            self.buffer.pop_front();
        }
        self.buffer.push_back(value);
    }

    fn reset(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{ConsoleInput, ConsoleOutput, CONSOLE_BUFFER_CAPACITY};
    use crate::bus::Device;

    #[test]
    fn input_flag_tracks_queue_and_empty_read_is_zero() {
        let mut input = ConsoleInput::default();
        assert!(!input.flag());
        input.push_text("OK");
        assert!(input.flag());
        assert_eq!(input.read(), b'O');
        assert_eq!(input.read(), b'K');
        assert!(!input.flag());
        assert_eq!(input.read(), 0);
    }

    #[test]
    fn output_text_escapes_non_printable_words() {
        let mut output = ConsoleOutput::default();
        for word in [b'H', b'I', 10, 200] {
            output.write(word);
        }
        assert_eq!(output.text(), "HI[10][200]");
        assert_eq!(output.words(), vec![b'H', b'I', 10, 200]);
    }

    #[test]
    fn output_buffer_drops_oldest_word_at_capacity() {
        let mut output = ConsoleOutput::default();
        for index in 0..=CONSOLE_BUFFER_CAPACITY {
            output.write(u8::try_from(index % 256).expect("fits"));
        }
        let words = output.words();
        assert_eq!(words.len(), CONSOLE_BUFFER_CAPACITY);
        assert_eq!(words[0], 1);
    }

    #[test]
    fn reset_clears_both_consoles() {
        let mut input = ConsoleInput::default();
        input.push(1);
        input.reset();
        assert_eq!(input.pending(), 0);

        let mut output = ConsoleOutput::default();
        output.write(1);
        output.reset();
        assert!(output.words().is_empty());
    }
}
