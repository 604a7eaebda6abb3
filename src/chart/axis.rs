//! Value axis range and tick computation.

use super::ChartError;

/// How many ticks to aim for on an automatic axis
const TARGET_TICKS: f64 = 6.;

/// Headroom above the highest error bar on an automatic axis
const HEADROOM: f64 = 1.05;

#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub ticks: Vec<f64>,
}

/// A step of 1, 2 or 5 times a power of ten, at least `raw`. `None`
/// if `raw` is not a positive finite number.
pub fn nice_step(raw: f64) -> Option<f64> {
    if !(raw > 0. && raw.is_finite()) {
        return None;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    // Tolerate rounding noise from the division
    let normalized = raw / magnitude * (1. - 1e-9);
    let factor = if normalized <= 1. {
        1.
    } else if normalized <= 2. {
        2.
    } else if normalized <= 5. {
        5.
    } else {
        10.
    };
    let step = factor * magnitude;
    (step > 0. && step.is_finite()).then_some(step)
}

impl Axis {
    /// `data_max` is the highest value that must be visible; if
    /// `fixed_max` is given, it is used instead of an automatic upper
    /// limit.
    pub fn new(min: f64, fixed_max: Option<f64>, data_max: f64) -> Result<Self, ChartError> {
        if !min.is_finite() {
            return Err(ChartError::InvalidRange { min, max: f64::NAN });
        }
        let invalid = |max| ChartError::InvalidRange { min, max };
        let (max, step) = match fixed_max {
            Some(max) => {
                if !max.is_finite() || max <= min {
                    return Err(invalid(max));
                }
                let step = nice_step((max - min) / TARGET_TICKS).ok_or_else(|| invalid(max))?;
                (max, step)
            }
            None => {
                let top = data_max * HEADROOM;
                let top = if top.is_finite() && top > min {
                    top
                } else {
                    min + 1.
                };
                let step = nice_step((top - min) / TARGET_TICKS).ok_or_else(|| invalid(top))?;
                let max = min + ((top - min) / step).ceil() * step;
                if !max.is_finite() {
                    return Err(invalid(max));
                }
                (max, step)
            }
        };

        let first = (min / step).ceil();
        // The step must still be resolvable at the magnitude of `min`
        if first + 1. == first {
            return Err(invalid(max));
        }
        let mut ticks = Vec::new();
        let eps = step * 1e-9;
        let mut i = 0.;
        loop {
            let tick = (first + i) * step;
            if tick > max + eps {
                break;
            }
            ticks.push(tick);
            i += 1.;
        }
        Ok(Axis {
            min,
            max,
            step,
            ticks,
        })
    }

    /// Fraction of the axis length at which `value` lies, clamped to
    /// the axis.
    pub fn fraction(&self, value: f64) -> f64 {
        ((value - self.min) / (self.max - self.min)).clamp(0., 1.)
    }

    pub fn format_tick(&self, value: f64) -> String {
        let decimals = if self.step >= 1. {
            0
        } else {
            (-self.step.log10()).ceil() as usize
        };
        format!("{value:.decimals$}")
    }
}
