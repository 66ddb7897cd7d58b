//! Conversion between raw ADC codes and millivolts.

use crate::params::Range;

/// Full scale ADC code in every resolution mode except 8 bit.
pub const MAX_ADC: i16 = 32767;

/// Converts an ADC code to millivolts for a channel configured with `range`.
///
/// The result is truncated toward zero. A `max_adc` of zero yields zero.
pub fn adc_to_mv(code: i16, range: Range, max_adc: i16) -> i32 {
    if max_adc == 0 {
        return 0
    }
    (code as i32 * range.millivolts()) / max_adc as i32
}

/// Converts millivolts to the ADC code that a channel configured with `range` would report.
///
/// Values outside of the range saturate to the extreme codes.
pub fn mv_to_adc(millivolts: i32, range: Range, max_adc: i16) -> i16 {
    let code = (millivolts as i64 * max_adc as i64) / range.millivolts() as i64;
    code.clamp(i16::MIN as i64, i16::MAX as i64) as i16
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_full_scale() {
        assert_eq!(adc_to_mv(MAX_ADC, Range::V1, MAX_ADC), 1000);
        assert_eq!(adc_to_mv(-MAX_ADC, Range::V1, MAX_ADC), -1000);
        assert_eq!(adc_to_mv(0, Range::V2, MAX_ADC), 0);
        assert_eq!(adc_to_mv(MAX_ADC, Range::V50, MAX_ADC), 50_000);
    }

    #[test]
    fn test_truncation() {
        // 10000 * 2000 / 32767 = 610.35...
        assert_eq!(adc_to_mv(10000, Range::V2, MAX_ADC), 610);
        assert_eq!(adc_to_mv(-10000, Range::V2, MAX_ADC), -610);
    }

    #[test]
    fn test_monotonic() {
        for &range in Range::ALL.iter() {
            let mut last = i32::MIN;
            for code in (i16::MIN..=i16::MAX).step_by(97) {
                let mv = adc_to_mv(code, range, MAX_ADC);
                assert!(mv >= last, "{:?}: {} mV < {} mV at code {}", range, mv, last, code);
                last = mv;
            }
        }
    }

    #[test]
    fn test_reversible() {
        for &range in Range::ALL.iter() {
            // one millivolt is the resolution of `adc_to_mv`
            let tolerance = (MAX_ADC as i32 / range.millivolts()).max(1) + 1;
            for code in (-MAX_ADC..=MAX_ADC).step_by(331) {
                let round_trip = mv_to_adc(adc_to_mv(code, range, MAX_ADC), range, MAX_ADC);
                assert!((round_trip as i32 - code as i32).abs() <= tolerance,
                    "{:?}: code {} came back as {}", range, code, round_trip);
            }
        }
    }

    #[test]
    fn test_degenerate() {
        assert_eq!(adc_to_mv(1234, Range::V1, 0), 0);
        assert_eq!(mv_to_adc(5000, Range::V1, MAX_ADC), i16::MAX);
        assert_eq!(mv_to_adc(-5000, Range::V1, MAX_ADC), i16::MIN);
    }
}
