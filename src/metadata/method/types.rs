//! Header and section flags of CIL method bodies (ECMA-335 II.25.4).

use bitflags::bitflags;

/// Mask selecting the header format bits of the first body byte
pub const METHOD_BODY_FORMAT_MASK: u8 = 0x03;
/// Mask selecting the flag bits of a fat header's first word
pub const METHOD_BODY_FLAGS_MASK: u16 = 0x0FFF;
/// Size in bytes of a fat method header
pub const FAT_HEADER_SIZE: usize = 12;
/// Size in bytes of a method data section header
pub const SECTION_HEADER_SIZE: usize = 4;
/// Largest code size a tiny header can describe
pub const TINY_MAX_CODE_SIZE: usize = 63;
/// Evaluation stack depth implied by a tiny header
pub const TINY_MAX_STACK: u16 = 8;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Flags that a method body can have
    pub struct MethodBodyFlags: u16 {
        /// Tiny method header format
        const TINY_FORMAT = 0x2;
        /// Fat method header format
        const FAT_FORMAT = 0x3;
        /// Flag of the fat method header, showing that there are more data sections appended to the header
        const MORE_SECTS = 0x8;
        /// Flag to indicate that this method should call the default constructor on all local variables
        const INIT_LOCALS = 0x10;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Flags that a method body section can have
    pub struct SectionFlags: u8 {
        /// Indicates that this section contains exception handling data
        const EHTABLE = 0x1;
        /// Reserved, shall be 0
        const OPT_ILTABLE = 0x2;
        /// Indicates that the data section format is fat
        const FAT_FORMAT = 0x40;
        /// Indicates that the data section is followed by another one
        const MORE_SECTS = 0x80;
    }
}
