//! Sparse program images and symbol tables.
//!
//! Both are produced by the assembler and consumed by the loader and the
//! disassembler. Neither is mutated after assembly.

use std::collections::BTreeMap;

use crate::encoding::Mnemonic;

/// Returns `true` when `name` can be written as a label in source: an
/// identifier that does not spell a mnemonic or directive.
#[must_use]
pub fn is_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    starts_well
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !is_reserved_word(name)
}

fn is_reserved_word(name: &str) -> bool {
    name.eq_ignore_ascii_case("ORG")
        || name.eq_ignore_ascii_case("DATA")
        || Mnemonic::from_name(name).is_some()
}

/// Contiguous run of words starting at `origin`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ImageBlock {
    /// Address of the first word.
    pub origin: u8,
    /// Words in address order.
    pub words: Vec<u8>,
}

impl ImageBlock {
    /// Address of the last word in the block.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn end(&self) -> u8 {
        self.origin
            .wrapping_add(self.words.len().saturating_sub(1) as u8)
    }
}

/// Sparse memory image: a set of `(address, word)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ProgramImage {
    words: BTreeMap<u8, u8>,
}

impl ProgramImage {
    /// Creates an empty image.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            words: BTreeMap::new(),
        }
    }

    /// Builds an image from address/word pairs; later pairs win.
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (u8, u8)>) -> Self {
        Self {
            words: pairs.into_iter().collect(),
        }
    }

    /// Builds an image from a contiguous block.
    ///
    /// Returns `None` when the block runs past address 255.
    #[must_use]
    pub fn from_block(origin: u8, words: &[u8]) -> Option<Self> {
        let mut image = Self::new();
        for (index, word) in words.iter().enumerate() {
            let address = u8::try_from(usize::from(origin) + index).ok()?;
            image.words.insert(address, *word);
        }
        Some(image)
    }

    /// Sets the word at `address`, returning the previous word.
    pub fn insert(&mut self, address: u8, word: u8) -> Option<u8> {
        self.words.insert(address, word)
    }

    /// Word at `address`, if the image defines it.
    #[must_use]
    pub fn get(&self, address: u8) -> Option<u8> {
        self.words.get(&address).copied()
    }

    /// Returns `true` when the image defines `address`.
    #[must_use]
    pub fn contains(&self, address: u8) -> bool {
        self.words.contains_key(&address)
    }

    /// Number of defined words.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns `true` when no word is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Defined words in ascending address order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.words.iter().map(|(address, word)| (*address, *word))
    }

    /// Maximal contiguous runs in ascending address order.
    #[must_use]
    pub fn blocks(&self) -> Vec<ImageBlock> {
        let mut blocks: Vec<ImageBlock> = Vec::new();
        for (address, word) in self.iter() {
            match blocks.last_mut() {
                Some(block) if block.end().checked_add(1) == Some(address) => {
                    block.words.push(word);
                }
                _ => blocks.push(ImageBlock {
                    origin: address,
                    words: vec![word],
                }),
            }
        }
        blocks
    }

    /// Flat 256-word bank with undefined addresses zeroed.
    #[must_use]
    pub fn to_bank(&self) -> Vec<u8> {
        let mut bank = vec![0; crate::memory::BANK_SIZE];
        for (address, word) in self.iter() {
            bank[usize::from(address)] = word;
        }
        bank
    }
}

/// Label-to-address mapping built by assembler pass 1.
///
/// Names are case-insensitive and stored upper-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SymbolTable {
    symbols: BTreeMap<String, u8>,
}

impl SymbolTable {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            symbols: BTreeMap::new(),
        }
    }

    /// Defines `name` at `address`, returning the previous address if any.
    pub fn insert(&mut self, name: &str, address: u8) -> Option<u8> {
        self.symbols.insert(name.to_ascii_uppercase(), address)
    }

    /// Address of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<u8> {
        self.symbols.get(&name.to_ascii_uppercase()).copied()
    }

    /// Returns `true` when `name` is defined.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// First label (in name order) defined at `address`.
    #[must_use]
    pub fn label_at(&self, address: u8) -> Option<&str> {
        self.symbols
            .iter()
            .find_map(|(name, value)| (*value == address).then_some(name.as_str()))
    }

    /// Every label defined at `address`, in name order.
    pub fn labels_at(&self, address: u8) -> impl Iterator<Item = &str> + '_ {
        self.symbols
            .iter()
            .filter(move |(_, value)| **value == address)
            .map(|(name, _)| name.as_str())
    }

    /// Number of labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns `true` when no label is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Labels in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> + '_ {
        self.symbols
            .iter()
            .map(|(name, address)| (name.as_str(), *address))
    }
}
