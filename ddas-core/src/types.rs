//! Module variants and the per-variant decoding rules.
//!
//! Pixie-16 modules come in three sampling-rate variants. The variant decides
//! the coarse clock tick and how the CFD register is split into trigger
//! source, fail flag and fractional time.

use crate::parser::layout::sections;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sampling-rate variant of a Pixie-16 module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ModuleVariant {
    /// 100 MSPS: FPGA runs at the ADC rate, no trigger-source bits.
    Msps100,
    /// 250 MSPS: two samples per FPGA tick, 1 trigger-source bit.
    Msps250,
    /// 500 MSPS: five samples per FPGA tick, 3 trigger-source bits.
    Msps500,
}

/// How the CFD fail indicator is encoded in the CFD register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfdFailEncoding {
    /// A dedicated bit at the top of the register.
    TopBit,
    /// The trigger-source field saturates to its maximum value.
    SaturatedSource,
}

/// Bit rule for one variant's 16-bit CFD register.
///
/// Layout from the top: optional fail bit, `source_bits` of trigger source,
/// then `fraction_bits` of fractional time. `source_offset` is added to the
/// trigger source before it is turned into a sample count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfdRule {
    pub fail: CfdFailEncoding,
    pub source_bits: u32,
    pub fraction_bits: u32,
    pub source_offset: i32,
}

/// Fields decoded from a CFD register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfdFields {
    pub fraction: u32,
    pub trigger_source: u32,
    pub fail: bool,
}

impl ModuleVariant {
    /// Every known variant.
    pub const ALL: [ModuleVariant; 3] = [Self::Msps100, Self::Msps250, Self::Msps500];

    /// Resolves a variant from the module's sampling frequency.
    #[inline]
    pub fn from_msps(msps: u32) -> Option<Self> {
        match msps {
            100 => Some(Self::Msps100),
            250 => Some(Self::Msps250),
            500 => Some(Self::Msps500),
            _ => None,
        }
    }

    /// Sampling frequency in MSPS.
    pub fn msps(self) -> u32 {
        match self {
            Self::Msps100 => 100,
            Self::Msps250 => 250,
            Self::Msps500 => 500,
        }
    }

    /// Nanoseconds per coarse-timestamp increment.
    #[inline]
    pub fn clock_tick_ns(self) -> u64 {
        match self {
            Self::Msps100 => 10,
            Self::Msps250 => 8,
            Self::Msps500 => 10,
        }
    }

    /// ADC sample period in nanoseconds.
    #[inline]
    pub fn sample_period_ns(self) -> f64 {
        match self {
            Self::Msps100 => 10.0,
            Self::Msps250 => 4.0,
            Self::Msps500 => 2.0,
        }
    }

    /// ADC samples per coarse clock tick.
    #[inline]
    pub fn samples_per_tick(self) -> u32 {
        match self {
            Self::Msps100 => 1,
            Self::Msps250 => 2,
            Self::Msps500 => 5,
        }
    }

    #[inline]
    pub fn cfd_rule(self) -> CfdRule {
        match self {
            Self::Msps100 => CfdRule {
                fail: CfdFailEncoding::TopBit,
                source_bits: 0,
                fraction_bits: 15,
                source_offset: 0,
            },
            Self::Msps250 => CfdRule {
                fail: CfdFailEncoding::TopBit,
                source_bits: 1,
                fraction_bits: 14,
                source_offset: 0,
            },
            Self::Msps500 => CfdRule {
                fail: CfdFailEncoding::SaturatedSource,
                source_bits: 3,
                fraction_bits: 13,
                // Source 1 is the first sample of the tick.
                source_offset: -1,
            },
        }
    }

    /// Splits a 16-bit CFD register according to this variant's rule.
    pub fn split_cfd(self, register: u32) -> CfdFields {
        let rule = self.cfd_rule();
        let register = register & 0xFFFF;
        let fraction = register & ((1 << rule.fraction_bits) - 1);
        let source_mask = (1 << rule.source_bits) - 1;
        let trigger_source = (register >> rule.fraction_bits) & source_mask;
        let fail = match rule.fail {
            CfdFailEncoding::TopBit => (register >> 15) & 0x1 != 0,
            CfdFailEncoding::SaturatedSource => trigger_source == source_mask,
        };
        CfdFields {
            fraction,
            trigger_source,
            fail,
        }
    }

    /// Sub-sample time correction in nanoseconds, in `[0, clock_tick_ns)`.
    ///
    /// The trigger source selects the sample within the FPGA tick and the
    /// fraction field interpolates within that sample. Applied whether or not
    /// the CFD failed.
    pub fn cfd_correction_ns(self, cfd: &CfdFields) -> f64 {
        let rule = self.cfd_rule();
        let scale = f64::from(1u32 << rule.fraction_bits);
        let source = f64::from(cfd.trigger_source) + f64::from(rule.source_offset);
        let samples = source + f64::from(cfd.fraction) / scale;
        samples.rem_euclid(f64::from(self.samples_per_tick())) * self.sample_period_ns()
    }
}

impl std::fmt::Display for ModuleVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} MSPS", self.msps())
    }
}

/// Optional channel-header sections enabled by a header length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OptionalSections {
    pub energy_sums: bool,
    pub qdc_sums: bool,
    pub external_timestamp: bool,
}

impl OptionalSections {
    /// Decodes the enabled sections from a channel header length.
    ///
    /// Returns `None` for lengths the format cannot produce.
    pub fn from_header_length(header_length: u32) -> Option<Self> {
        use crate::parser::layout::BASE_HEADER_WORDS;

        let extra = header_length.checked_sub(BASE_HEADER_WORDS)?;
        let all = sections::EXTERNAL_TIMESTAMP_BIT | sections::ENERGY_SUMS_BIT | sections::QDC_SUMS_BIT;
        if extra & !all != 0 {
            return None;
        }
        Some(Self {
            energy_sums: extra & sections::ENERGY_SUMS_BIT != 0,
            qdc_sums: extra & sections::QDC_SUMS_BIT != 0,
            external_timestamp: extra & sections::EXTERNAL_TIMESTAMP_BIT != 0,
        })
    }

    /// Header words taken up by the enabled sections.
    pub fn words(&self) -> usize {
        let mut words = 0;
        if self.energy_sums {
            words += sections::ENERGY_SUM_WORDS;
        }
        if self.qdc_sums {
            words += sections::QDC_SUM_WORDS;
        }
        if self.external_timestamp {
            words += sections::EXTERNAL_TIMESTAMP_WORDS;
        }
        words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_from_msps() {
        assert_eq!(ModuleVariant::from_msps(100), Some(ModuleVariant::Msps100));
        assert_eq!(ModuleVariant::from_msps(250), Some(ModuleVariant::Msps250));
        assert_eq!(ModuleVariant::from_msps(500), Some(ModuleVariant::Msps500));
        assert_eq!(ModuleVariant::from_msps(0), None);
        assert_eq!(ModuleVariant::from_msps(125), None);
    }

    #[test]
    fn test_tick_is_whole_samples() {
        for variant in ModuleVariant::ALL {
            let tick = variant.sample_period_ns() * f64::from(variant.samples_per_tick());
            assert_eq!(tick, variant.clock_tick_ns() as f64, "{variant}");
        }
    }

    #[test]
    fn test_split_cfd_100() {
        let cfd = ModuleVariant::Msps100.split_cfd(0x947f);
        assert_eq!(cfd.fraction, 0x147f);
        assert_eq!(cfd.trigger_source, 0);
        assert!(cfd.fail);
    }

    #[test]
    fn test_split_cfd_250() {
        let cfd = ModuleVariant::Msps250.split_cfd(0x547f);
        assert_eq!(cfd.fraction, 0x147f);
        assert_eq!(cfd.trigger_source, 1);
        assert!(!cfd.fail);

        let failed = ModuleVariant::Msps250.split_cfd(0xc47f);
        assert!(failed.fail);
        assert_eq!(failed.trigger_source, 1);
    }

    #[test]
    fn test_split_cfd_500() {
        let cfd = ModuleVariant::Msps500.split_cfd(0x747f);
        assert_eq!(cfd.fraction, 0x147f);
        assert_eq!(cfd.trigger_source, 3);
        assert!(!cfd.fail);

        let saturated = ModuleVariant::Msps500.split_cfd(0xf47f);
        assert_eq!(saturated.trigger_source, 7);
        assert!(saturated.fail);
    }

    #[test]
    fn test_correction_values() {
        let v100 = ModuleVariant::Msps100;
        assert_eq!(v100.cfd_correction_ns(&v100.split_cfd(0x947f)), 1.601_257_324_218_75);

        let v250 = ModuleVariant::Msps250;
        assert_eq!(v250.cfd_correction_ns(&v250.split_cfd(0x547f)), 5.281_005_859_375);

        let v500 = ModuleVariant::Msps500;
        assert_eq!(v500.cfd_correction_ns(&v500.split_cfd(0x747f)), 5.281_005_859_375);
    }

    #[test]
    fn test_correction_500_source_offset() {
        let v500 = ModuleVariant::Msps500;
        // Source 1 starts the tick, source 0 wraps to the last sample.
        assert_eq!(v500.cfd_correction_ns(&v500.split_cfd(0x2000)), 0.0);
        assert_eq!(v500.cfd_correction_ns(&v500.split_cfd(0x0000)), 8.0);
        assert_eq!(v500.cfd_correction_ns(&v500.split_cfd(0x8000)), 6.0);
        // Saturated source: 7 - 1 = 6 samples, one tick plus one sample.
        assert_eq!(v500.cfd_correction_ns(&v500.split_cfd(0xe000)), 2.0);
    }

    #[test]
    fn test_correction_bounded_for_saturated_source() {
        let v500 = ModuleVariant::Msps500;
        for register in [0xe000, 0xffff, 0xbfff, 0xa000] {
            let correction = v500.cfd_correction_ns(&v500.split_cfd(register));
            assert!((0.0..10.0).contains(&correction), "{register:#x} -> {correction}");
        }
    }

    #[test]
    fn test_optional_sections() {
        assert_eq!(
            OptionalSections::from_header_length(4),
            Some(OptionalSections::default())
        );

        let ext = OptionalSections::from_header_length(6).unwrap();
        assert!(ext.external_timestamp && !ext.energy_sums && !ext.qdc_sums);
        assert_eq!(ext.words(), 2);

        let all = OptionalSections::from_header_length(18).unwrap();
        assert!(all.external_timestamp && all.energy_sums && all.qdc_sums);
        assert_eq!(all.words(), 14);

        let qdc_ext = OptionalSections::from_header_length(14).unwrap();
        assert!(qdc_ext.qdc_sums && qdc_ext.external_timestamp && !qdc_ext.energy_sums);

        assert_eq!(OptionalSections::from_header_length(3), None);
        assert_eq!(OptionalSections::from_header_length(5), None);
        assert_eq!(OptionalSections::from_header_length(20), None);
    }
}
