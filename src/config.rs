//! Codec configuration
//!
//! This module provides the options that control how tolerant the method body and instruction
//! stream decoders are towards unusual but recoverable input.

/// Configuration for method body and instruction stream decoding
///
/// The defaults reject nothing a conforming compiler emits while still preserving unusual
/// branch targets, so that re-encoding unmodified input reproduces it byte for byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Reject branch and switch targets that do not land on an instruction boundary or the end
    /// of the code. When disabled such targets are kept as detached labels holding the raw
    /// offset.
    pub strict_branch_targets: bool,

    /// Stop reading exception sections at the first malformed one and keep the clauses read so
    /// far, instead of failing the whole body. The dropped section is logged as a warning.
    pub lenient_exception_sections: bool,

    /// Maximum number of targets accepted in a single `switch` table (default: 65536).
    /// The case count is checked against this limit before anything is allocated
    pub max_switch_targets: u32,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            strict_branch_targets: false,
            lenient_exception_sections: false,
            max_switch_targets: 0x10000,
        }
    }
}

impl CodecConfig {
    /// Creates a configuration that rejects every irregularity it can detect
    #[must_use]
    pub fn strict() -> Self {
        Self {
            strict_branch_targets: true,
            ..Self::default()
        }
    }

    /// Creates a configuration for analysing damaged or hand-crafted binaries
    ///
    /// Malformed exception sections are dropped instead of failing the method body.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            lenient_exception_sections: true,
            ..Self::default()
        }
    }
}
