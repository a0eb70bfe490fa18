//! Stateless DDAS hit unpacker.
//!
//! Decodes one hit record from the front of a window of 32-bit words in four
//! forward stages: channel header, module variant, timestamp and CFD, then the
//! optional sections and trace.

use crate::hit::HitRecord;
use crate::parser::{self, layout};
use crate::types::{ModuleVariant, OptionalSections};
use thiserror::Error;
use tracing::{debug, trace};

/// Result type for unpacking.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Errors that abort decoding of a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("truncated record: need {needed} words, have {available}")]
    TruncatedRecord { needed: usize, available: usize },

    #[error("malformed record: {0}")]
    MalformedRecord(#[from] Malformed),
}

/// Inconsistent length bookkeeping inside a record.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformed {
    #[error("header length {0} does not match any section layout")]
    InvalidHeaderLength(u32),

    #[error("channel length {channel_length} is shorter than header length {header_length}")]
    ChannelShorterThanHeader {
        channel_length: u32,
        header_length: u32,
    },

    #[error("{surplus} unread words after a trace of {trace_length} samples")]
    SurplusWords { trace_length: u32, surplus: usize },
}

/// Conditions that still produce a best-effort record.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeWarning {
    #[error("unknown module variant: {msps} MSPS, decoded with 100 MSPS rules")]
    UnknownModuleVariant { msps: u32 },
}

/// Outcome of [`HitUnpacker::unpack_into`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnpackStatus {
    /// Words of the window belonging to this record.
    pub consumed: usize,
    pub warning: Option<DecodeWarning>,
}

/// A decoded hit and how much of the window it used.
#[derive(Debug, Clone, PartialEq)]
pub struct Unpacked {
    pub hit: HitRecord,
    /// Words of the window belonging to this record.
    pub consumed: usize,
    pub warning: Option<DecodeWarning>,
}

impl Unpacked {
    /// The part of `window` after this record.
    pub fn remaining<'a>(&self, window: &'a [u32]) -> &'a [u32] {
        &window[self.consumed.min(window.len())..]
    }

    pub fn into_parts(self) -> (HitRecord, UnpackStatus) {
        (
            self.hit,
            UnpackStatus {
                consumed: self.consumed,
                warning: self.warning,
            },
        )
    }
}

/// Channel header fields needed to walk the rest of the record.
#[derive(Debug, Clone, Copy)]
struct Lengths {
    header: u32,
    channel: u32,
    sections: OptionalSections,
}

/// Decoder for DDAS hit records.
///
/// Holds no state, so one unpacker can serve any number of windows, from any
/// number of threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct HitUnpacker;

impl HitUnpacker {
    pub fn new() -> Self {
        Self
    }

    /// Decodes the record at the front of `window` into a new [`HitRecord`].
    pub fn unpack(&self, window: &[u32]) -> Result<Unpacked> {
        let result = self.decode(window);
        if let Err(err) = &result {
            debug!(%err, window_words = window.len(), "rejected hit record");
        }
        result
    }

    /// Decodes the record at the front of `window` into `hit`.
    ///
    /// `hit` is overwritten on success and left untouched on error.
    pub fn unpack_into(&self, window: &[u32], hit: &mut HitRecord) -> Result<UnpackStatus> {
        let (decoded, status) = self.unpack(window)?.into_parts();
        *hit = decoded;
        Ok(status)
    }

    fn decode(&self, window: &[u32]) -> Result<Unpacked> {
        let mut hit = HitRecord::new();

        let lengths = parse_header(window, &mut hit)?;
        let (variant, warning) = resolve_variant(window[layout::index::MODULE_ID], &mut hit);
        reconstruct_time(window, variant, &mut hit);
        read_optional_sections(window, &lengths, &mut hit)?;

        let consumed = layout::PREFIX_WORDS + lengths.channel as usize;
        trace!(
            crate_id = hit.crate_id(),
            slot_id = hit.slot_id(),
            channel_id = hit.channel_id(),
            consumed,
            "unpacked hit"
        );

        Ok(Unpacked {
            hit,
            consumed,
            warning,
        })
    }
}

/// Stage 1: lengths, location and finish code, with every window-size check
/// made before later stages run.
fn parse_header(window: &[u32], hit: &mut HitRecord) -> Result<Lengths> {
    if window.len() < layout::MIN_WINDOW_WORDS {
        return Err(DecodeError::TruncatedRecord {
            needed: layout::MIN_WINDOW_WORDS,
            available: window.len(),
        });
    }

    // Body size counts 16-bit words.
    let body_words = (window[layout::index::BODY_SIZE] as usize).div_ceil(2);
    if body_words > window.len() {
        return Err(DecodeError::TruncatedRecord {
            needed: body_words,
            available: window.len(),
        });
    }

    let word = window[layout::index::HEADER_WORD_0];
    let header = parser::header_length(word);
    let channel = parser::channel_length(word);

    let sections = OptionalSections::from_header_length(header)
        .ok_or(Malformed::InvalidHeaderLength(header))?;
    if channel < header {
        return Err(Malformed::ChannelShorterThanHeader {
            channel_length: channel,
            header_length: header,
        }
        .into());
    }

    let needed = layout::PREFIX_WORDS + channel as usize;
    if needed > window.len() {
        return Err(DecodeError::TruncatedRecord {
            needed,
            available: window.len(),
        });
    }

    hit.set_module_location(
        parser::crate_id(word),
        parser::slot_id(word),
        parser::channel_id(word),
    );
    hit.set_channel_header_length(header);
    hit.set_channel_length(channel);
    hit.set_finish_code(parser::finish_code(word));

    Ok(Lengths {
        header,
        channel,
        sections,
    })
}

/// Stage 2: module type. Unknown frequencies fall back to the 100 MSPS rules.
fn resolve_variant(word: u32, hit: &mut HitRecord) -> (ModuleVariant, Option<DecodeWarning>) {
    let msps = parser::module_msps(word);
    hit.set_module_type(
        msps,
        parser::module_resolution(word),
        parser::module_revision(word),
    );

    match ModuleVariant::from_msps(msps) {
        Some(variant) => (variant, None),
        None => {
            debug!(msps, "unknown module variant");
            (
                ModuleVariant::Msps100,
                Some(DecodeWarning::UnknownModuleVariant { msps }),
            )
        }
    }
}

/// Stage 3: coarse timestamp, CFD fields and corrected time.
fn reconstruct_time(window: &[u32], variant: ModuleVariant, hit: &mut HitRecord) {
    let time_low = window[layout::index::TIME_LOW];
    let datum = window[layout::index::TIME_HIGH_CFD];
    let time_high = parser::time_high(datum);

    let coarse_time = parser::raw_timestamp(time_low, time_high) * variant.clock_tick_ns();
    let cfd = variant.split_cfd(parser::cfd_register(datum));
    let correction = variant.cfd_correction_ns(&cfd);

    hit.set_time_low(time_low);
    hit.set_time_high(time_high);
    hit.set_coarse_time(coarse_time);
    hit.set_raw_cfd_time(cfd.fraction);
    hit.set_cfd_trig_source(cfd.trigger_source);
    hit.set_cfd_fail(cfd.fail);
    hit.set_time(coarse_time as f64 + correction);

    let energy_word = window[layout::index::ENERGY_TRACE];
    hit.set_energy(parser::energy(energy_word));
    hit.set_trace_length(parser::trace_length(energy_word));
    hit.set_adc_overflow_underflow(parser::adc_overflow_underflow(energy_word));
}

/// Stage 4: energy sums, QDC sums, external timestamp, then the trace.
///
/// Only reads inside the declared channel length, which `parse_header` has
/// already checked against the window.
fn read_optional_sections(window: &[u32], lengths: &Lengths, hit: &mut HitRecord) -> Result<()> {
    use layout::sections;

    let start = layout::MIN_WINDOW_WORDS;
    let header_end = layout::PREFIX_WORDS + lengths.header as usize;
    let record_end = layout::PREFIX_WORDS + lengths.channel as usize;

    let mut words = window[start..header_end].iter().copied();
    if lengths.sections.energy_sums {
        for value in words.by_ref().take(sections::ENERGY_SUM_WORDS) {
            hit.append_energy_sum(value);
        }
    }
    if lengths.sections.qdc_sums {
        for value in words.by_ref().take(sections::QDC_SUM_WORDS) {
            hit.append_qdc_sum(value);
        }
    }
    if lengths.sections.external_timestamp {
        if let (Some(low), Some(high)) = (words.next(), words.next()) {
            hit.set_external_timestamp(parser::join_words(low, high));
        }
    }

    read_trace(&window[header_end..record_end], header_end, hit)
}

/// Reads the trace words, which start `trace_start` words into the window.
fn read_trace(trace_words: &[u32], trace_start: usize, hit: &mut HitRecord) -> Result<()> {
    let samples = hit.trace_length() as usize;
    let needed = samples.div_ceil(layout::trace::SAMPLES_PER_WORD);

    // Counted from the start of the window, like the header checks.
    if needed > trace_words.len() {
        return Err(DecodeError::TruncatedRecord {
            needed: trace_start + needed,
            available: trace_start + trace_words.len(),
        });
    }
    if needed < trace_words.len() {
        return Err(Malformed::SurplusWords {
            trace_length: hit.trace_length(),
            surplus: trace_words.len() - needed,
        }
        .into());
    }

    for (i, &word) in trace_words.iter().enumerate() {
        let (lower, upper) = parser::trace_samples(word);
        hit.append_trace_sample(lower);
        if 2 * i + 1 < samples {
            hit.append_trace_sample(upper);
        }
    }
    Ok(())
}
