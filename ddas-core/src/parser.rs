//! Low-level field extraction from DDAS 32-bit words.
//!
//! The [`layout`] module is the single word-to-field table for the Pixie-16
//! list-mode format; every getter below reads through it.

/// Word positions, masks and shifts of the hit record format.
pub mod layout {
    /// Words preceding the channel header: body size and module identity.
    pub const PREFIX_WORDS: usize = 2;
    /// Channel header words that are always present.
    pub const BASE_HEADER_WORDS: u32 = 4;
    /// Smallest window that can hold a record.
    pub const MIN_WINDOW_WORDS: usize = PREFIX_WORDS + BASE_HEADER_WORDS as usize;

    pub mod index {
        pub const BODY_SIZE: usize = 0;
        pub const MODULE_ID: usize = 1;
        pub const HEADER_WORD_0: usize = 2;
        pub const TIME_LOW: usize = 3;
        pub const TIME_HIGH_CFD: usize = 4;
        pub const ENERGY_TRACE: usize = 5;
    }

    pub mod module_id {
        pub const MSPS_MASK: u32 = 0x0000_FFFF;
        pub const RESOLUTION_SHIFT: u32 = 16;
        pub const RESOLUTION_MASK: u32 = 0xFF;
        pub const REVISION_SHIFT: u32 = 24;
        pub const REVISION_MASK: u32 = 0xF;
    }

    pub mod header_word_0 {
        pub const CHANNEL_MASK: u32 = 0xF;
        pub const SLOT_SHIFT: u32 = 4;
        pub const SLOT_MASK: u32 = 0xF;
        pub const CRATE_SHIFT: u32 = 8;
        pub const CRATE_MASK: u32 = 0xF;
        pub const HEADER_LENGTH_SHIFT: u32 = 12;
        pub const HEADER_LENGTH_MASK: u32 = 0x1F;
        pub const CHANNEL_LENGTH_SHIFT: u32 = 17;
        pub const CHANNEL_LENGTH_MASK: u32 = 0x3FFF;
        pub const FINISH_CODE_SHIFT: u32 = 31;
    }

    pub mod time_high_cfd {
        pub const TIME_HIGH_MASK: u32 = 0x0000_FFFF;
        /// The CFD register occupies the upper half-word.
        pub const CFD_SHIFT: u32 = 16;
    }

    pub mod energy_trace {
        pub const ENERGY_MASK: u32 = 0x0000_FFFF;
        pub const TRACE_LENGTH_SHIFT: u32 = 16;
        pub const TRACE_LENGTH_MASK: u32 = 0x7FFF;
        pub const OVERFLOW_SHIFT: u32 = 31;
    }

    /// Optional header sections, keyed by bits of `header length - 4`.
    pub mod sections {
        pub const EXTERNAL_TIMESTAMP_BIT: u32 = 0b0010;
        pub const ENERGY_SUMS_BIT: u32 = 0b0100;
        pub const QDC_SUMS_BIT: u32 = 0b1000;

        pub const EXTERNAL_TIMESTAMP_WORDS: usize = 2;
        pub const ENERGY_SUM_WORDS: usize = 4;
        pub const QDC_SUM_WORDS: usize = 8;
    }

    pub mod trace {
        pub const SAMPLES_PER_WORD: usize = 2;
        pub const SAMPLE_MASK: u32 = 0xFFFF;
        pub const UPPER_SAMPLE_SHIFT: u32 = 16;
    }
}

use layout::{energy_trace, header_word_0, module_id, time_high_cfd, trace};

// ============================================================================
// Module identity word
// Bits: [31:28] reserved | [27:24] revision | [23:16] ADC bits | [15:0] MSPS
// ============================================================================

/// Extracts the ADC sampling frequency in MSPS.
#[inline]
pub fn module_msps(word: u32) -> u32 {
    word & module_id::MSPS_MASK
}

/// Extracts the ADC resolution in bits.
#[inline]
pub fn module_resolution(word: u32) -> u32 {
    (word >> module_id::RESOLUTION_SHIFT) & module_id::RESOLUTION_MASK
}

/// Extracts the hardware revision.
#[inline]
pub fn module_revision(word: u32) -> u32 {
    (word >> module_id::REVISION_SHIFT) & module_id::REVISION_MASK
}

// ============================================================================
// Channel header word 0
// Bits: [31] finish | [30:17] chan length | [16:12] header length
//       | [11:8] crate | [7:4] slot | [3:0] channel
// ============================================================================

#[inline]
pub fn channel_id(word: u32) -> u32 {
    word & header_word_0::CHANNEL_MASK
}

#[inline]
pub fn slot_id(word: u32) -> u32 {
    (word >> header_word_0::SLOT_SHIFT) & header_word_0::SLOT_MASK
}

#[inline]
pub fn crate_id(word: u32) -> u32 {
    (word >> header_word_0::CRATE_SHIFT) & header_word_0::CRATE_MASK
}

/// Extracts the channel header length in 32-bit words.
#[inline]
pub fn header_length(word: u32) -> u32 {
    (word >> header_word_0::HEADER_LENGTH_SHIFT) & header_word_0::HEADER_LENGTH_MASK
}

/// Extracts the channel (event) length in 32-bit words.
#[inline]
pub fn channel_length(word: u32) -> u32 {
    (word >> header_word_0::CHANNEL_LENGTH_SHIFT) & header_word_0::CHANNEL_LENGTH_MASK
}

#[inline]
pub fn finish_code(word: u32) -> bool {
    (word >> header_word_0::FINISH_CODE_SHIFT) & 0x1 != 0
}

// ============================================================================
// Channel header word 2
// Bits: [31:16] CFD register | [15:0] time high
// ============================================================================

/// Extracts the upper 16 bits of the 48-bit coarse timestamp.
#[inline]
pub fn time_high(word: u32) -> u32 {
    word & time_high_cfd::TIME_HIGH_MASK
}

/// Extracts the 16-bit CFD register.
#[inline]
pub fn cfd_register(word: u32) -> u32 {
    word >> time_high_cfd::CFD_SHIFT
}

// ============================================================================
// Channel header word 3
// Bits: [31] overflow/underflow | [30:16] trace length | [15:0] energy
// ============================================================================

#[inline]
pub fn energy(word: u32) -> u32 {
    word & energy_trace::ENERGY_MASK
}

/// Extracts the declared trace length in samples.
#[inline]
pub fn trace_length(word: u32) -> u32 {
    (word >> energy_trace::TRACE_LENGTH_SHIFT) & energy_trace::TRACE_LENGTH_MASK
}

#[inline]
pub fn adc_overflow_underflow(word: u32) -> bool {
    (word >> energy_trace::OVERFLOW_SHIFT) & 0x1 != 0
}

// ============================================================================
// Trace words
// Bits: [31:16] sample n+1 | [15:0] sample n
// ============================================================================

/// Splits a trace word into its (lower, upper) 16-bit samples.
#[inline]
pub fn trace_samples(word: u32) -> (u16, u16) {
    (
        (word & trace::SAMPLE_MASK) as u16,
        (word >> trace::UPPER_SAMPLE_SHIFT) as u16,
    )
}

/// Joins two consecutive words, low word first, into a 64-bit value.
#[inline]
pub fn join_words(low: u32, high: u32) -> u64 {
    (u64::from(high) << 32) | u64::from(low)
}

/// Assembles the raw 48-bit coarse timestamp.
#[inline]
pub fn raw_timestamp(time_low: u32, time_high: u32) -> u64 {
    join_words(time_low, time_high & time_high_cfd::TIME_HIGH_MASK)
}
