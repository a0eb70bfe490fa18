//! The decoded hit record.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One channel hit from a Pixie-16 module.
///
/// A plain data holder: the unpacker fills it through the setters below and
/// consumers read it through the accessors. All fields start at zero.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HitRecord {
    // Module location
    crate_id: u32,
    slot_id: u32,
    channel_id: u32,

    // Lengths in 32-bit words
    channel_header_length: u32,
    channel_length: u32,
    finish_code: bool,

    // Module type
    adc_frequency: u32,
    adc_resolution: u32,
    hardware_revision: u32,

    // Timing
    time_low: u32,
    time_high: u32,
    coarse_time: u64,
    raw_cfd_time: u32,
    cfd_trig_source: u32,
    cfd_fail: bool,
    time: f64,

    energy: u32,
    trace_length: u32,
    adc_overflow_underflow: bool,

    // Optional data
    energy_sums: Vec<u32>,
    qdc_sums: Vec<u32>,
    trace: Vec<u16>,
    external_timestamp: Option<u64>,
}

impl HitRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every field to zero and empties the sequences.
    ///
    /// Sequence capacity is kept so a record can be reused across hits.
    pub fn reset(&mut self) {
        let energy_sums = std::mem::take(&mut self.energy_sums);
        let qdc_sums = std::mem::take(&mut self.qdc_sums);
        let trace = std::mem::take(&mut self.trace);
        *self = Self {
            energy_sums,
            qdc_sums,
            trace,
            ..Self::default()
        };
        self.energy_sums.clear();
        self.qdc_sums.clear();
        self.trace.clear();
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn crate_id(&self) -> u32 {
        self.crate_id
    }

    pub fn slot_id(&self) -> u32 {
        self.slot_id
    }

    pub fn channel_id(&self) -> u32 {
        self.channel_id
    }

    /// Channel header length in 32-bit words.
    pub fn channel_header_length(&self) -> u32 {
        self.channel_header_length
    }

    /// Total channel length in 32-bit words.
    pub fn channel_length(&self) -> u32 {
        self.channel_length
    }

    pub fn finish_code(&self) -> bool {
        self.finish_code
    }

    /// ADC sampling frequency in MSPS.
    pub fn adc_frequency(&self) -> u32 {
        self.adc_frequency
    }

    /// ADC resolution in bits.
    pub fn adc_resolution(&self) -> u32 {
        self.adc_resolution
    }

    pub fn hardware_revision(&self) -> u32 {
        self.hardware_revision
    }

    /// Lower 32 bits of the raw 48-bit timestamp.
    pub fn time_low(&self) -> u32 {
        self.time_low
    }

    /// Upper 16 bits of the raw 48-bit timestamp.
    pub fn time_high(&self) -> u32 {
        self.time_high
    }

    /// Coarse timestamp in nanoseconds.
    ///
    /// Latched to the sample before the CFD zero crossing when the CFD
    /// succeeds, to the leading-edge trigger otherwise.
    pub fn coarse_time(&self) -> u64 {
        self.coarse_time
    }

    /// Fractional-time field of the CFD register.
    pub fn raw_cfd_time(&self) -> u32 {
        self.raw_cfd_time
    }

    /// Sample within the FPGA clock tick where the CFD zero crossing
    /// occurred. Always 0 on 100 MSPS modules.
    pub fn cfd_trig_source(&self) -> u32 {
        self.cfd_trig_source
    }

    /// Set when the CFD found no zero crossing.
    pub fn cfd_fail(&self) -> bool {
        self.cfd_fail
    }

    /// Coarse time plus CFD correction, in nanoseconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn energy(&self) -> u32 {
        self.energy
    }

    /// Declared trace length in samples.
    pub fn trace_length(&self) -> u32 {
        self.trace_length
    }

    pub fn adc_overflow_underflow(&self) -> bool {
        self.adc_overflow_underflow
    }

    pub fn energy_sums(&self) -> &[u32] {
        &self.energy_sums
    }

    pub fn qdc_sums(&self) -> &[u32] {
        &self.qdc_sums
    }

    pub fn trace(&self) -> &[u16] {
        &self.trace
    }

    /// External clock timestamp, when the module recorded one.
    pub fn external_timestamp(&self) -> Option<u64> {
        self.external_timestamp
    }

    // ------------------------------------------------------------------
    // Mutators
    // ------------------------------------------------------------------

    pub fn set_crate(&mut self, crate_id: u32) {
        self.crate_id = crate_id;
    }

    pub fn set_slot(&mut self, slot_id: u32) {
        self.slot_id = slot_id;
    }

    pub fn set_channel(&mut self, channel_id: u32) {
        self.channel_id = channel_id;
    }

    pub fn set_channel_header_length(&mut self, length: u32) {
        self.channel_header_length = length;
    }

    pub fn set_channel_length(&mut self, length: u32) {
        self.channel_length = length;
    }

    pub fn set_finish_code(&mut self, finish_code: bool) {
        self.finish_code = finish_code;
    }

    pub fn set_adc_frequency(&mut self, msps: u32) {
        self.adc_frequency = msps;
    }

    pub fn set_adc_resolution(&mut self, bits: u32) {
        self.adc_resolution = bits;
    }

    pub fn set_hardware_revision(&mut self, revision: u32) {
        self.hardware_revision = revision;
    }

    pub fn set_time_low(&mut self, datum: u32) {
        self.time_low = datum;
    }

    /// Keeps only the low 16 bits of `datum`.
    pub fn set_time_high(&mut self, datum: u32) {
        self.time_high = datum & 0xFFFF;
    }

    pub fn set_coarse_time(&mut self, time: u64) {
        self.coarse_time = time;
    }

    pub fn set_raw_cfd_time(&mut self, data: u32) {
        self.raw_cfd_time = data;
    }

    pub fn set_cfd_trig_source(&mut self, source: u32) {
        self.cfd_trig_source = source;
    }

    pub fn set_cfd_fail(&mut self, fail: bool) {
        self.cfd_fail = fail;
    }

    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    pub fn set_energy(&mut self, energy: u32) {
        self.energy = energy;
    }

    pub fn set_trace_length(&mut self, length: u32) {
        self.trace_length = length;
    }

    pub fn set_adc_overflow_underflow(&mut self, state: bool) {
        self.adc_overflow_underflow = state;
    }

    pub fn append_energy_sum(&mut self, value: u32) {
        self.energy_sums.push(value);
    }

    pub fn append_qdc_sum(&mut self, value: u32) {
        self.qdc_sums.push(value);
    }

    pub fn append_trace_sample(&mut self, value: u16) {
        self.trace.push(value);
    }

    pub fn set_external_timestamp(&mut self, value: u64) {
        self.external_timestamp = Some(value);
    }

    /// Sets frequency, resolution and revision together.
    pub fn set_module_type(&mut self, msps: u32, bits: u32, revision: u32) {
        self.set_adc_frequency(msps);
        self.set_adc_resolution(bits);
        self.set_hardware_revision(revision);
    }

    /// Sets crate, slot and channel together.
    pub fn set_module_location(&mut self, crate_id: u32, slot_id: u32, channel_id: u32) {
        self.set_crate(crate_id);
        self.set_slot(slot_id);
        self.set_channel(channel_id);
    }

    pub fn set_module_info(
        &mut self,
        (crate_id, slot_id, channel_id): (u32, u32, u32),
        (msps, bits, revision): (u32, u32, u32),
    ) {
        self.set_module_location(crate_id, slot_id, channel_id);
        self.set_module_type(msps, bits, revision);
    }

    /// Format hit for display
    pub fn display(&self) -> String {
        format!(
            "C:{:2} S:{:2} Ch:{:2} T:{:18.3}ns E:{:5} CFD:{}{}{}",
            self.crate_id,
            self.slot_id,
            self.channel_id,
            self.time,
            self.energy,
            self.cfd_trig_source,
            if self.cfd_fail { " [CFD FAIL]" } else { "" },
            if self.trace.is_empty() { "" } else { " [TR]" }
        )
    }
}

impl std::fmt::Display for HitRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}
