//! Decoder for DDAS hit records from XIA Pixie-16 digitizers.
//!
//! Pixie-16 modules sample at 100, 250 or 500 MSPS and emit one
//! variable-length record per channel hit. This crate turns a window of 32-bit
//! words holding such a record into a [`HitRecord`], reconstructing the
//! CFD-corrected timestamp on the way.
//!
//! # Example
//!
//! ```
//! use ddas_core::HitUnpacker;
//!
//! let words: [u32; 6] = [
//!     0x0000000c, 0x0f0e01f4, 0x00084321, 0x0000f687, 0x747f000a, 0x000008b3,
//! ];
//!
//! let unpacked = HitUnpacker::new().unpack(&words).unwrap();
//! assert_eq!(unpacked.consumed, 6);
//! assert_eq!(unpacked.hit.adc_frequency(), 500);
//! assert_eq!(unpacked.hit.cfd_trig_source(), 3);
//! ```
//!
//! # Features
//!
//! - All three module variants, with per-variant CFD bit rules
//! - Energy sums, QDC sums, external clock timestamp and trace readout
//! - Stateless, reentrant unpacker with owned and in-place call shapes
//! - Optional `serde` support for [`HitRecord`]

pub mod decoder;
pub mod hit;
pub mod parser;
pub mod types;

// Re-export commonly used types
pub use decoder::{DecodeError, DecodeWarning, HitUnpacker, Malformed, UnpackStatus, Unpacked};
pub use hit::HitRecord;
pub use types::{CfdFields, CfdRule, ModuleVariant, OptionalSections};
