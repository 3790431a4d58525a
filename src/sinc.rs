//! Delayed sinc pulse generation.
//!
//! An oversampled prototype pulse is built once per shape ([`SincTable::build`]),
//! then arbitrarily many sub-sample-delayed device-rate pulses are decimated
//! out of it ([`SincTable::gen`]) without re-evaluating the sinc function.

use std::f64::consts::PI;
use std::fmt;

use num::Complex;

#[derive(Debug, Clone, PartialEq)]
pub enum SincError {
    InvalidConfiguration(String),
    DelayOutOfRange { delay: f32, max: f32 },
    ShapeMismatch { expected: usize, got: usize },
}

impl fmt::Display for SincError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SincError::InvalidConfiguration(msg) => {
                write!(f, "invalid pulse shape: {}", msg)
            }
            SincError::DelayOutOfRange { delay, max } => {
                write!(f, "delay {} outside representable range (|delay| < {})", delay, max)
            }
            SincError::ShapeMismatch { expected, got } => {
                write!(f, "pulse length mismatch: table built for spb={}, requested {}", expected, got)
            }
        }
    }
}

impl std::error::Error for SincError {}

/// Pulse shape parameters, all bandwidths normalized to the device sample rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseShape {
    /// Passband bandwidth, cycles per device sample, > 0.
    pub bw: f32,
    /// Containment bandwidth controlling the spectral roll-off, >= bw.
    pub cbw: f32,
    /// Device-rate samples per pulse.
    pub spb: usize,
    /// Oversampling ratio of the prototype table.
    pub ratio: usize,
}

impl PulseShape {
    fn validate(&self) -> Result<(), SincError> {
        if !self.bw.is_finite() || self.bw <= 0.0 {
            return Err(SincError::InvalidConfiguration(format!(
                "bw must be positive and finite, got {}",
                self.bw
            )));
        }
        if !self.cbw.is_finite() || self.cbw < self.bw {
            return Err(SincError::InvalidConfiguration(format!(
                "cbw must be finite and >= bw, got cbw={} bw={}",
                self.cbw, self.bw
            )));
        }
        if self.spb == 0 {
            return Err(SincError::InvalidConfiguration(
                "spb must be positive".to_string(),
            ));
        }
        if self.ratio == 0 {
            return Err(SincError::InvalidConfiguration(
                "ratio must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-12 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

/// Raised-cosine taper with excess bandwidth `beta`, evaluated at time `t`
/// in device-sample units. Degenerates to 1 everywhere when `beta == 0`.
fn rc_taper(beta: f64, t: f64) -> f64 {
    if beta == 0.0 {
        return 1.0;
    }
    let u = 2.0 * beta * t;
    let den = 1.0 - u * u;
    if den.abs() < 1e-9 {
        // limit of cos(pi*beta*t) / (1 - (2*beta*t)^2) at |2*beta*t| = 1
        PI / 4.0
    } else {
        (PI * beta * t).cos() / den
    }
}

fn quantize(x: f32) -> i16 {
    x.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Oversampled prototype pulse. Immutable once built; share it behind an
/// `Arc` to synthesize from several threads, rebuild by swapping the `Arc`.
#[derive(Debug, Clone)]
pub struct SincTable {
    taps: Vec<f32>,
    spb: usize,
    ratio: usize,
}

impl SincTable {
    /// Builds the oversampled prototype: a `bw`-scaled sinc tapered by a
    /// raised-cosine window of excess bandwidth `cbw - bw`, sampled at
    /// `ratio` times the device rate over `spb` device-sample periods and
    /// centered at the midpoint (unit peak, zero delay reference).
    pub fn build(shape: &PulseShape) -> Result<SincTable, SincError> {
        shape.validate()?;
        let n = shape.spb * shape.ratio;
        let half = n as f64 / 2.0;
        let beta = (shape.cbw - shape.bw) as f64;
        let bw = shape.bw as f64;
        let ratio = shape.ratio as f64;

        let mut taps = Vec::with_capacity(n);
        for i in 0..n {
            let t = (i as f64 - half) / ratio;
            taps.push((sinc(bw * t) * rc_taper(beta, t)) as f32);
        }

        Ok(SincTable {
            taps,
            spb: shape.spb,
            ratio: shape.ratio,
        })
    }

    pub fn taps(&self) -> &[f32] {
        &self.taps
    }

    pub fn spb(&self) -> usize {
        self.spb
    }

    pub fn ratio(&self) -> usize {
        self.ratio
    }

    /// Synthesizes one device-rate pulse, delayed by `delay` device-sample
    /// periods (fractional allowed, positive moves the peak later), scaled
    /// by `ampl` and saturated to sc16. Q is always zero; the pulse is a
    /// real baseband envelope on the in-phase rail.
    ///
    /// Taps shifted past either end of the prototype contribute zero
    /// samples; a delay with no overlap at all is rejected.
    pub fn gen(
        &self,
        ampl: i16,
        spb: usize,
        delay: f32,
    ) -> Result<Vec<Complex<i16>>, SincError> {
        if spb != self.spb {
            return Err(SincError::ShapeMismatch {
                expected: self.spb,
                got: spb,
            });
        }
        let mut pulse = vec![Complex::new(0i16, 0i16); self.spb];
        self.gen_into(ampl, delay, &mut pulse)?;
        Ok(pulse)
    }

    /// Like [`gen`](Self::gen) but fills a caller-provided (e.g. pooled)
    /// buffer, which must be exactly `spb` samples long. Every element is
    /// overwritten; nothing is written if an error is returned.
    pub fn gen_into(
        &self,
        ampl: i16,
        delay: f32,
        out: &mut [Complex<i16>],
    ) -> Result<(), SincError> {
        if out.len() != self.spb {
            return Err(SincError::ShapeMismatch {
                expected: self.spb,
                got: out.len(),
            });
        }
        let max = self.spb as f32;
        if !delay.is_finite() || delay.abs() >= max {
            return Err(SincError::DelayOutOfRange { delay, max });
        }
        let offset = (delay as f64 * self.ratio as f64).round() as i64;

        let n = self.taps.len() as i64;
        let ratio = self.ratio as i64;
        for (k, s) in out.iter_mut().enumerate() {
            let idx = k as i64 * ratio - offset;
            s.im = 0;
            s.re = if idx < 0 || idx >= n {
                0
            } else {
                quantize(self.taps[idx as usize] * ampl as f32)
            };
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape() -> PulseShape {
        PulseShape {
            bw: 0.2,
            cbw: 0.25,
            spb: 64,
            ratio: 16,
        }
    }

    #[test]
    fn table_len_is_spb_times_ratio() {
        let t = SincTable::build(&shape()).unwrap();
        assert_eq!(t.taps().len(), 64 * 16);
        assert_eq!(t.spb(), 64);
        assert_eq!(t.ratio(), 16);
    }

    #[test]
    fn table_has_unit_peak_at_midpoint() {
        let t = SincTable::build(&shape()).unwrap();
        let mid = t.taps().len() / 2;
        assert!((t.taps()[mid] - 1.0).abs() < 1e-6);
        for &v in t.taps() {
            assert!(v.abs() <= 1.0 + 1e-6);
        }
    }

    #[test]
    fn rejects_bad_shapes() {
        let mut s = shape();
        s.bw = 0.0;
        assert!(matches!(
            SincTable::build(&s),
            Err(SincError::InvalidConfiguration(_))
        ));
        let mut s = shape();
        s.cbw = 0.1;
        assert!(matches!(
            SincTable::build(&s),
            Err(SincError::InvalidConfiguration(_))
        ));
        let mut s = shape();
        s.spb = 0;
        assert!(matches!(
            SincTable::build(&s),
            Err(SincError::InvalidConfiguration(_))
        ));
        let mut s = shape();
        s.ratio = 0;
        assert!(matches!(
            SincTable::build(&s),
            Err(SincError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn degenerate_taper_is_plain_sinc() {
        let mut s = shape();
        s.cbw = s.bw;
        let t = SincTable::build(&s).unwrap();
        let mid = t.taps().len() / 2;
        assert!((t.taps()[mid] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_delay_pulse_is_symmetric() {
        let t = SincTable::build(&shape()).unwrap();
        let p = t.gen(1000, 64, 0.0).unwrap();
        assert_eq!(p.len(), 64);
        let mid = 32;
        for m in 1..32 {
            assert_eq!(p[mid + m].re, p[mid - m].re, "asymmetry at offset {}", m);
        }
        assert_eq!(p[mid].re, 1000);
        for s in &p {
            assert_eq!(s.im, 0);
        }
    }

    #[test]
    fn zero_amplitude_yields_all_zero() {
        let t = SincTable::build(&shape()).unwrap();
        let p = t.gen(0, 64, 13.7).unwrap();
        assert!(p.iter().all(|s| s.re == 0 && s.im == 0));
    }

    #[test]
    fn amplitude_scaling_is_linear_up_to_rounding() {
        let t = SincTable::build(&shape()).unwrap();
        let p1 = t.gen(500, 64, 2.25).unwrap();
        let p2 = t.gen(1000, 64, 2.25).unwrap();
        for (a, b) in p1.iter().zip(&p2) {
            assert!((b.re as i32 - 2 * a.re as i32).abs() <= 1);
        }
    }

    #[test]
    fn integer_delay_shifts_by_whole_samples() {
        let t = SincTable::build(&shape()).unwrap();
        let p0 = t.gen(1000, 64, 0.0).unwrap();
        let p1 = t.gen(1000, 64, 1.0).unwrap();
        for k in 1..64 {
            assert_eq!(p1[k].re, p0[k - 1].re);
        }
    }

    #[test]
    fn half_sample_delay_splits_the_peak() {
        let t = SincTable::build(&shape()).unwrap();
        let p = t.gen(1000, 64, 0.5).unwrap();
        // peak straddles the midpoint, taps are symmetric around it
        assert_eq!(p[32].re, p[33].re);
        assert!(p[32].re > p[31].re.max(p[34].re));
    }

    #[test]
    fn negative_and_large_delays_stay_in_bounds() {
        let t = SincTable::build(&shape()).unwrap();
        for d in [-63.0f32, -31.5, 40.25, 63.0] {
            let p = t.gen(i16::MAX, 64, d).unwrap();
            assert_eq!(p.len(), 64);
        }
    }

    #[test]
    fn delay_without_overlap_is_rejected() {
        let t = SincTable::build(&shape()).unwrap();
        assert!(matches!(
            t.gen(1000, 64, 64.0),
            Err(SincError::DelayOutOfRange { .. })
        ));
        assert!(matches!(
            t.gen(1000, 64, -64.0),
            Err(SincError::DelayOutOfRange { .. })
        ));
        assert!(matches!(
            t.gen(1000, 64, f32::NAN),
            Err(SincError::DelayOutOfRange { .. })
        ));
    }

    #[test]
    fn mismatched_spb_is_rejected() {
        let t = SincTable::build(&shape()).unwrap();
        assert_eq!(
            t.gen(1000, 65, 0.0),
            Err(SincError::ShapeMismatch {
                expected: 64,
                got: 65
            })
        );
    }

    #[test]
    fn gen_into_overwrites_stale_buffers() {
        let t = SincTable::build(&shape()).unwrap();
        let mut buf = vec![Complex::new(i16::MAX, i16::MAX); 64];
        t.gen_into(1000, 0.0, &mut buf).unwrap();
        assert_eq!(buf, t.gen(1000, 64, 0.0).unwrap());

        let mut short = vec![Complex::new(0i16, 0i16); 63];
        assert!(matches!(
            t.gen_into(1000, 0.0, &mut short),
            Err(SincError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn quantize_saturates_instead_of_wrapping() {
        assert_eq!(quantize(40000.0), i16::MAX);
        assert_eq!(quantize(-40000.0), i16::MIN);
        assert_eq!(quantize(32767.4), 32767);
        assert_eq!(quantize(-0.4), 0);
    }

    #[test]
    fn extreme_amplitudes_never_wrap() {
        let t = SincTable::build(&shape()).unwrap();
        for ampl in [i16::MAX, i16::MIN] {
            let p = t.gen(ampl, 64, 0.0).unwrap();
            assert_eq!(p[32].re, ampl);
        }
    }
}
