use crate::config::CacheConfig;
use crate::utils::calculate_mask;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedAddress {
    pub tag: u32,
    pub set_index: usize,
    pub offset: usize,
}

/// Splits raw addresses into tag, set index and word offset.
#[derive(Debug, Clone, Copy)]
pub struct AddressDecoder {
    offset_bits: u32,
    set_bits: u32,
    address_mask: u32,
}

impl AddressDecoder {
    pub fn new(config: &CacheConfig) -> Self {
        AddressDecoder {
            offset_bits: config.offset_bits(),
            set_bits: config.set_bits(),
            address_mask: calculate_mask(config.address_bits),
        }
    }

    /// Bits above the configured address width are ignored.
    #[inline]
    pub fn decode(&self, address: u32) -> DecodedAddress {
        let address = address & self.address_mask;
        DecodedAddress {
            tag: address.checked_shr(self.offset_bits + self.set_bits).unwrap_or(0),
            set_index: ((address >> self.offset_bits) & calculate_mask(self.set_bits)) as usize,
            offset: (address & calculate_mask(self.offset_bits)) as usize,
        }
    }

    /// Address of the first word of the block holding `tag` in `set_index`.
    #[inline]
    pub fn block_address(&self, tag: u32, set_index: usize) -> usize {
        ((tag as usize) << (self.set_bits + self.offset_bits)) | (set_index << self.offset_bits)
    }
}
