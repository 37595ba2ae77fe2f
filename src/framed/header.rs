use bitflags::bitflags;
use fehler::{throw, throws};
use thiserror::Error;

bitflags! {
    /// Feature bits of the frame descriptor's FLG byte. The top two bits
    /// hold the format version and never reach these flags; `parse` strips
    /// them after checking.
    pub struct Flags: u8 {
        const INDEPENDENT_BLOCKS = 1 << 5;
        const BLOCK_CHECKSUMS    = 1 << 4;
        const CONTENT_SIZE       = 1 << 3;
        const CONTENT_CHECKSUM   = 1 << 2;
        const DICTIONARY_ID      = 1 << 0;
    }
}

#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("frame format version is {0}, not 1")]
    BadVersion(u8),
    #[error("a reserved flag bit is set")]
    ReservedFlagBits,
    #[error("a reserved bd bit is set")]
    ReservedBdBits,
    #[error("block-maxsize id {0} is reserved")]
    ReservedBlockSize(u8),
}

impl Flags {
    #[throws(HeaderError)]
    pub fn parse(byte: u8) -> Self {
        match byte >> 6 {
            1 => {}
            version => throw!(HeaderError::BadVersion(version)),
        }
        if byte & 0b10 != 0 {
            throw!(HeaderError::ReservedFlagBits);
        }
        Flags::from_bits_truncate(byte)
    }
}

/// The descriptor's BD byte. Bits 4..=6 carry the block-maxsize id;
/// everything else must be zero.
#[derive(Clone, Copy)]
pub struct BlockDescriptor(pub u8);

impl BlockDescriptor {
    #[throws(HeaderError)]
    pub fn parse(byte: u8) -> Self {
        if byte & 0b1000_1111 != 0 {
            throw!(HeaderError::ReservedBdBits);
        }
        BlockDescriptor(byte)
    }

    /// Ids 0..=3 are reserved; the rest step up by factors of four.
    #[throws(HeaderError)]
    pub fn block_maxsize(&self) -> usize {
        match (self.0 >> 4) & 0b111 {
            4 => 64 * 1024,
            5 => 256 * 1024,
            6 => 1024 * 1024,
            7 => 4 * 1024 * 1024,
            id => throw!(HeaderError::ReservedBlockSize(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_version_one_parses() {
        assert!(Flags::parse(0x40).is_ok());
        assert!(Flags::parse(0x00).is_err()); // version 0
        assert!(Flags::parse(0xC0).is_err()); // version 3
        assert!(Flags::parse(0x42).is_err()); // reserved bit set
    }

    #[test]
    fn parse_keeps_the_feature_bits_only() {
        let flags = Flags::parse(0x60).unwrap();
        assert!(flags.contains(Flags::INDEPENDENT_BLOCKS));
        assert_eq!(flags.bits(), 0x20);
    }

    #[test]
    fn size_ids_decode_per_the_table() {
        let maxsize = |byte| BlockDescriptor::parse(byte).unwrap().block_maxsize();
        assert_eq!(maxsize(0x40).unwrap(), 64 * 1024);
        assert_eq!(maxsize(0x70).unwrap(), 4 * 1024 * 1024);
        assert!(maxsize(0x30).is_err());
        assert!(BlockDescriptor::parse(0x71).is_err());
        assert!(BlockDescriptor::parse(0x80).is_err());
    }
}
