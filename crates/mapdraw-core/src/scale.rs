//! Scale line and scale bar readout.

use serde::{Deserialize, Serialize};

/// Minimum rendered width of the scale line in pixels.
pub const DEFAULT_MIN_WIDTH: f64 = 140.0;

/// Screen dots per inch assumed for the scale text (0.28 mm pixels).
const DPI: f64 = 25.4 / 0.28;
const INCHES_PER_METER: f64 = 1000.0 / 25.4;
const METERS_PER_DEGREE: f64 = 2.0 * std::f64::consts::PI * 6_370_997.0 / 360.0;
const LEADING_DIGITS: [f64; 3] = [1.0, 2.0, 5.0];

/// Unit system of the scale line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleUnits {
    Degrees,
    Imperial,
    Us,
    Nautical,
    #[default]
    Metric,
}

impl ScaleUnits {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "degrees" => Some(Self::Degrees),
            "imperial" => Some(Self::Imperial),
            "us" => Some(Self::Us),
            "nautical" => Some(Self::Nautical),
            "metric" => Some(Self::Metric),
            _ => None,
        }
    }
}

/// Plain line or segmented bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleLineKind {
    Line,
    #[default]
    Bar,
}

/// Options read from the scale controls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleLineOptions {
    pub units: ScaleUnits,
    pub kind: ScaleLineKind,
    /// Number of bar segments (1-8).
    pub steps: u8,
    /// Show the `1 : N` scale text under the bar.
    pub show_text: bool,
    pub invert_colors: bool,
}

impl Default for ScaleLineOptions {
    fn default() -> Self {
        Self {
            units: ScaleUnits::Metric,
            kind: ScaleLineKind::Bar,
            steps: 4,
            show_text: true,
            invert_colors: false,
        }
    }
}

/// Computed scale line for the current view.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleReading {
    /// Width in pixels.
    pub width: f64,
    /// Distance represented by the full width, in `suffix` units.
    pub count: f64,
    pub suffix: &'static str,
    /// Label of the plain scale line, e.g. `"200 m"`.
    pub label: String,
    /// Labels at each bar division (bar only), the last one with its unit.
    pub step_labels: Vec<String>,
    /// `"1 : 2,133"` when enabled.
    pub scale_text: Option<String>,
    pub inverted: bool,
}

/// Scale line control.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleLine {
    pub options: ScaleLineOptions,
    pub min_width: f64,
}

impl ScaleLine {
    pub fn new(options: ScaleLineOptions) -> Self {
        Self {
            options: ScaleLineOptions {
                steps: options.steps.clamp(1, 8),
                ..options
            },
            min_width: DEFAULT_MIN_WIDTH,
        }
    }

    /// Reconfigure from new control values.
    pub fn reconfigure(&mut self, options: ScaleLineOptions) {
        *self = Self::new(options);
    }

    /// Compute the readout for a ground resolution in metres per pixel.
    pub fn reading(&self, point_resolution: f64) -> Option<ScaleReading> {
        if !(point_resolution.is_finite() && point_resolution > 0.0) {
            return None;
        }
        let nominal = self.min_width * point_resolution;
        let (suffix, resolution) = unit_resolution(self.options.units, nominal, point_resolution);

        let mut i = 3 * (self.min_width * resolution).log10().floor() as i32;
        let (count, width, decimals) = loop {
            let decimals = i.div_euclid(3);
            let count = LEADING_DIGITS[i.rem_euclid(3) as usize] * 10f64.powi(decimals);
            let width = (count / resolution).round();
            if width >= self.min_width {
                break (count, width, decimals);
            }
            i += 1;
        };

        let digits = if decimals < 0 { (-decimals) as usize } else { 0 };
        let label = format!("{:.*} {}", digits, count, suffix);
        let step_labels = match self.options.kind {
            ScaleLineKind::Line => Vec::new(),
            ScaleLineKind::Bar => {
                let steps = self.options.steps as usize;
                (0..=steps)
                    .map(|step| {
                        let value = round2(count * step as f64 / steps as f64);
                        if step == steps {
                            format!("{} {}", value, suffix)
                        } else {
                            value.to_string()
                        }
                    })
                    .collect()
            }
        };
        let scale_text = (self.options.kind == ScaleLineKind::Bar && self.options.show_text)
            .then(|| format!("1 : {}", group_thousands(scale_denominator(point_resolution))));

        Some(ScaleReading {
            width,
            count,
            suffix,
            label,
            step_labels,
            scale_text,
            inverted: self.options.invert_colors,
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Unit suffix and the resolution expressed in that unit.
fn unit_resolution(units: ScaleUnits, nominal: f64, resolution: f64) -> (&'static str, f64) {
    match units {
        ScaleUnits::Degrees => {
            let degrees = resolution / METERS_PER_DEGREE;
            if nominal < METERS_PER_DEGREE / 60.0 {
                ("\u{2033}", degrees * 3600.0)
            } else if nominal < METERS_PER_DEGREE {
                ("\u{2032}", degrees * 60.0)
            } else {
                ("\u{00b0}", degrees)
            }
        }
        ScaleUnits::Imperial => {
            if nominal < 0.9144 {
                ("in", resolution / 0.0254)
            } else if nominal < 1609.344 {
                ("ft", resolution / 0.3048)
            } else {
                ("mi", resolution / 1609.344)
            }
        }
        ScaleUnits::Us => {
            if nominal < 0.9144 {
                ("in", resolution * 39.37)
            } else if nominal < 1609.344 {
                ("ft", resolution / 0.30480061)
            } else {
                ("mi", resolution / 1609.3472)
            }
        }
        ScaleUnits::Nautical => ("NM", resolution / 1852.0),
        ScaleUnits::Metric => {
            if nominal < 0.001 {
                ("μm", resolution * 1_000_000.0)
            } else if nominal < 1.0 {
                ("mm", resolution * 1000.0)
            } else if nominal < 1000.0 {
                ("m", resolution)
            } else {
                ("km", resolution / 1000.0)
            }
        }
    }
}

/// Map scale denominator for a ground resolution.
pub fn scale_denominator(point_resolution: f64) -> u64 {
    (point_resolution * INCHES_PER_METER * DPI).round() as u64
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_line_picks_nice_number() {
        let scale = ScaleLine::new(ScaleLineOptions {
            kind: ScaleLineKind::Line,
            ..Default::default()
        });
        // 140 px * 1 m/px = 140 m nominal -> 200 m at 200 px
        let reading = scale.reading(1.0).unwrap();
        assert_eq!(reading.label, "200 m");
        assert_eq!(reading.width, 200.0);
        assert!(reading.step_labels.is_empty());
        assert!(reading.scale_text.is_none());
    }

    #[test]
    fn test_metric_switches_to_km() {
        let scale = ScaleLine::new(ScaleLineOptions {
            kind: ScaleLineKind::Line,
            ..Default::default()
        });
        let reading = scale.reading(10.0).unwrap();
        assert_eq!(reading.suffix, "km");
        assert_eq!(reading.label, "2 km");
    }

    #[test]
    fn test_bar_steps_and_text() {
        let scale = ScaleLine::new(ScaleLineOptions::default());
        let reading = scale.reading(1.0).unwrap();
        assert_eq!(reading.step_labels, vec!["0", "50", "100", "150", "200 m"]);
        assert_eq!(reading.scale_text.as_deref(), Some("1 : 3,571"));
    }

    #[test]
    fn test_steps_are_clamped() {
        let scale = ScaleLine::new(ScaleLineOptions { steps: 20, ..Default::default() });
        assert_eq!(scale.options.steps, 8);
    }

    #[test]
    fn test_nautical_and_invalid_resolution() {
        let scale = ScaleLine::new(ScaleLineOptions {
            units: ScaleUnits::Nautical,
            kind: ScaleLineKind::Line,
            ..Default::default()
        });
        assert_eq!(scale.reading(100.0).unwrap().suffix, "NM");
        assert!(scale.reading(0.0).is_none());
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(1234567), "1,234,567");
        assert_eq!(group_thousands(999), "999");
    }
}
