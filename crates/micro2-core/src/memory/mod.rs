//! Banked word memory and bank selection.

/// Page/bank geometry and address decomposition helpers.
pub mod map;

use std::ops::RangeInclusive;

pub use map::{
    compose_address, page_base, page_index, page_offset, same_page, BANK_SELECT_MASK, BANK_SIZE,
    MAX_BANKS, PAGES_PER_BANK, PAGE_SIZE,
};

use crate::fault::ConfigurationError;
use crate::image::ProgramImage;

/// Installed memory banks plus the memory selection register.
///
/// Every read and write through the unbanked API targets the selected bank.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Memory {
    banks: Vec<Vec<u8>>,
    selected: u8,
}

impl Default for Memory {
    fn default() -> Self {
        Self::with_banks(MAX_BANKS)
    }
}

impl Memory {
    /// Allocates `bank_count` zeroed banks with bank 0 selected.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnsupportedBankCount`] unless
    /// `1 <= bank_count <= 8`.
    pub fn new(bank_count: u8) -> Result<Self, ConfigurationError> {
        if bank_count == 0 || bank_count > MAX_BANKS {
            return Err(ConfigurationError::UnsupportedBankCount(bank_count));
        }
        Ok(Self::with_banks(bank_count))
    }

    fn with_banks(bank_count: u8) -> Self {
        Self {
            banks: vec![vec![0; BANK_SIZE]; usize::from(bank_count)],
            selected: 0,
        }
    }

    /// Number of installed banks.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn bank_count(&self) -> u8 {
        self.banks.len() as u8
    }

    /// Currently selected bank (the MSR value).
    #[must_use]
    pub const fn selected_bank(&self) -> u8 {
        self.selected
    }

    /// Selects the bank used by subsequent reads, writes and fetches.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::BankOutOfRange`] and keeps the current
    /// selection when `bank` is not installed.
    pub fn select_bank(&mut self, bank: u8) -> Result<(), ConfigurationError> {
        self.check_bank(bank)?;
        self.selected = bank;
        Ok(())
    }

    /// Returns the selection to bank 0.
    pub const fn reset_selection(&mut self) {
        self.selected = 0;
    }

    /// Page containing `pc`; direct operands resolve inside this page.
    #[must_use]
    pub const fn current_page(pc: u8) -> u8 {
        page_index(pc)
    }

    /// Reads a word from the selected bank.
    #[must_use]
    pub fn read(&self, address: u8) -> u8 {
        self.selected_words()[usize::from(address)]
    }

    /// Writes a word to the selected bank.
    pub fn write(&mut self, address: u8, value: u8) {
        let bank = usize::from(self.selected);
        self.banks[bank][usize::from(address)] = value;
    }

    /// Reads a word from an explicit bank.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::BankOutOfRange`] for uninstalled banks.
    pub fn read_bank(&self, bank: u8, address: u8) -> Result<u8, ConfigurationError> {
        Ok(self.bank(bank)?[usize::from(address)])
    }

    /// Writes a word to an explicit bank.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::BankOutOfRange`] for uninstalled banks.
    pub fn write_bank(&mut self, bank: u8, address: u8, value: u8) -> Result<(), ConfigurationError> {
        self.check_bank(bank)?;
        self.banks[usize::from(bank)][usize::from(address)] = value;
        Ok(())
    }

    /// All words of an explicit bank.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::BankOutOfRange`] for uninstalled banks.
    pub fn bank(&self, bank: u8) -> Result<&[u8], ConfigurationError> {
        self.check_bank(bank)?;
        Ok(&self.banks[usize::from(bank)])
    }

    /// Words of the selected bank inside `range`.
    #[must_use]
    pub fn inspect(&self, range: RangeInclusive<u8>) -> &[u8] {
        let (start, end) = range.into_inner();
        if start > end {
            return &[];
        }
        &self.selected_words()[usize::from(start)..=usize::from(end)]
    }

    /// The 32 words of `page` in the selected bank.
    #[must_use]
    pub fn page_contents(&self, page: u8) -> &[u8] {
        let base = usize::from(page_base(page));
        &self.selected_words()[base..base + PAGE_SIZE]
    }

    /// Writes every word of `image` into `bank`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::BankOutOfRange`] for uninstalled banks;
    /// nothing is written in that case.
    pub fn load_image(&mut self, bank: u8, image: &ProgramImage) -> Result<(), ConfigurationError> {
        self.check_bank(bank)?;
        let words = &mut self.banks[usize::from(bank)];
        for (address, word) in image.iter() {
            words[usize::from(address)] = word;
        }
        Ok(())
    }

    /// Zeroes every bank without touching the selection.
    pub fn clear(&mut self) {
        for bank in &mut self.banks {
            bank.fill(0);
        }
    }

    fn selected_words(&self) -> &[u8] {
        &self.banks[usize::from(self.selected)]
    }

    fn check_bank(&self, bank: u8) -> Result<(), ConfigurationError> {
        if bank < self.bank_count() {
            Ok(())
        } else {
            Err(ConfigurationError::BankOutOfRange {
                bank,
                bank_count: self.bank_count(),
            })
        }
    }
}
