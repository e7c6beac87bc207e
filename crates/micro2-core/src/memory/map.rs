//! Page and bank geometry of the MICRO II address space.

/// Words per page; direct addresses are relative to the current page.
pub const PAGE_SIZE: usize = 32;
/// Words per bank (the full 8-bit address space).
pub const BANK_SIZE: usize = 256;
/// Pages per bank.
pub const PAGES_PER_BANK: usize = BANK_SIZE / PAGE_SIZE;
/// Maximum number of installable banks.
pub const MAX_BANKS: u8 = 8;
/// Bits of a device-0 write that name the selected bank.
pub const BANK_SELECT_MASK: u8 = 0x0F;

const PAGE_SHIFT: u32 = PAGE_SIZE.trailing_zeros();
#[allow(clippy::cast_possible_truncation)]
const PAGE_OFFSET_BITS: u8 = (PAGE_SIZE - 1) as u8;

const _: () = assert!(PAGE_SIZE.is_power_of_two(), "page size must be a power of two");
const _: () = assert!(PAGES_PER_BANK * PAGE_SIZE == BANK_SIZE, "pages must tile a bank");

/// Page index (`0..=7`) containing `address`.
#[must_use]
pub const fn page_index(address: u8) -> u8 {
    address >> PAGE_SHIFT
}

/// Offset of `address` within its page (`0..=31`).
#[must_use]
pub const fn page_offset(address: u8) -> u8 {
    address & PAGE_OFFSET_BITS
}

/// First address of `page`; the page index wraps modulo the page count.
#[must_use]
pub const fn page_base(page: u8) -> u8 {
    (page & 0x07) << PAGE_SHIFT
}

/// Combines a page index and a page offset into an address.
#[must_use]
pub const fn compose_address(page: u8, offset: u8) -> u8 {
    page_base(page) | (offset & PAGE_OFFSET_BITS)
}

/// Returns `true` when both addresses lie in the same page.
#[must_use]
pub const fn same_page(a: u8, b: u8) -> bool {
    page_index(a) == page_index(b)
}
