//! Grouped bar charts comparing the two conditions, one group of two
//! bars per function, with the standard deviation shown as error
//! bars.
//!
//! The layout is computed once (`BarChart::new`) in page coordinates
//! (points, origin at the bottom left) and then drawn onto a `Canvas`
//! backend: Encapsulated PostScript or SVG.

pub mod axis;
pub mod eps;
pub mod svg;

use std::{
    fmt::Display,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    chart::axis::Axis,
    condition::Condition,
    info,
    io_utils::tempfile_utils::write_file_atomically,
    series::{Comparison, SeriesPoint},
};

pub const POINTS_PER_INCH: f64 = 72.;

const MARGIN_LEFT: f64 = 64.;
const MARGIN_RIGHT: f64 = 16.;
const MARGIN_TOP: f64 = 16.;
const MARGIN_BOTTOM_PER_LABEL_CHAR: f64 = 4.5;
const MARGIN_BOTTOM_MIN: f64 = 36.;
const FONT_SIZE: f64 = 10.;
const TICK_FONT_SIZE: f64 = 7.;
const TICK_LENGTH: f64 = 4.;
const LINE_WIDTH: f64 = 0.8;
/// Error bar cap width as a fraction of the bar width
const CAP_FRACTION: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChartError {
    #[error("the two series differ in length: {left} vs. {right}")]
    ShapeMismatch { left: usize, right: usize },
    #[error("no function records to plot")]
    NoData,
    #[error("cannot determine image format from output path {0:?}, use .eps, .ps or .svg")]
    UnknownFormat(PathBuf),
    #[error("invalid value axis range: {min} .. {max}")]
    InvalidRange { min: f64, max: f64 },
    #[error("invalid chart option: {0}")]
    InvalidOption(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn fractions(self) -> (f64, f64, f64) {
        let Rgb(r, g, b) = self;
        (r as f64 / 255., g as f64 / 255., b as f64 / 255.)
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Rgb(r, g, b) = self;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl FromStr for Rgb {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| anyhow!("color must be given as #rrggbb, got {s:?}"))?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(anyhow!("color must be given as #rrggbb, got {s:?}"));
        }
        let component = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .with_context(|| anyhow!("invalid hex digits in color {s:?}"))
        };
        Ok(Rgb(component(0)?, component(2)?, component(4)?))
    }
}

impl Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// What to show below each group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickLabels {
    /// The function names
    #[default]
    Names,
    /// `a`, `b`, `c`, ... instead of the names
    Letters,
}

/// `a`..`z`, then `aa`, `ab`, ...
pub fn letter_label(index: usize) -> String {
    let mut label = Vec::new();
    let mut i = index;
    loop {
        label.push(b'a' + (i % 26) as u8);
        if i < 26 {
            break;
        }
        i = i / 26 - 1;
    }
    label.reverse();
    String::from_utf8(label).expect("ascii letters")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(default)]
pub struct ChartOptions {
    /// The image file to write; the extension selects the format
    pub output: PathBuf,
    pub width_inches: f64,
    pub height_inches: f64,
    /// Only used for the pixel size of SVG output
    pub dpi: u32,
    pub title: Option<String>,
    pub y_label: String,
    pub y_min: f64,
    /// Automatic if not given
    pub y_max: Option<f64>,
    /// Width of one bar, also the offset of the second series, in
    /// units of the group distance
    pub bar_width: f64,
    /// Bar colors for no_pi and pi
    pub colors: [Rgb; 2],
    pub tick_labels: TickLabels,
    /// Counter-clockwise, in degrees
    pub tick_label_rotation: f64,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            output: "durations.eps".into(),
            width_inches: 8.,
            height_inches: 6.,
            dpi: 100,
            title: None,
            y_label: "duration (us)".into(),
            y_min: 0.,
            y_max: None,
            bar_width: 0.35,
            colors: [Rgb(0xff, 0, 0), Rgb(0xbf, 0xbf, 0)],
            tick_labels: TickLabels::Names,
            tick_label_rotation: 60.,
        }
    }
}

impl ChartOptions {
    pub fn check(&self) -> Result<(), ChartError> {
        let positive = |v: f64| v.is_finite() && v > 0.;
        if !positive(self.width_inches) || !positive(self.height_inches) {
            return Err(ChartError::InvalidOption(format!(
                "figure size must be positive, got {} x {} inches",
                self.width_inches, self.height_inches
            )));
        }
        if self.dpi == 0 {
            return Err(ChartError::InvalidOption("dpi must be positive".into()));
        }
        if !positive(self.bar_width) || self.bar_width > 0.5 {
            return Err(ChartError::InvalidOption(format!(
                "bar_width must be in (0, 0.5], got {}",
                self.bar_width
            )));
        }
        if !self.tick_label_rotation.is_finite() {
            return Err(ChartError::InvalidOption(
                "tick_label_rotation must be a number".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Eps,
    Svg,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self, ChartError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("eps") | Some("ps") => Ok(OutputFormat::Eps),
            Some("svg") => Ok(OutputFormat::Svg),
            _ => Err(ChartError::UnknownFormat(path.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f64,
    pub anchor: Anchor,
    /// Counter-clockwise, in degrees
    pub rotation: f64,
}

/// Drawing primitives, in points with the origin at the bottom left.
/// Strokes are black.
pub trait Canvas {
    fn begin_group(&mut self, label: &str);
    fn end_group(&mut self);
    fn filled_rect(&mut self, x: f64, y: f64, width: f64, height: f64, fill: Rgb);
    fn stroked_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn line(&mut self, from: (f64, f64), to: (f64, f64));
    fn text(&mut self, at: (f64, f64), text: &str, style: TextStyle);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    /// In group units
    pub x_left: f64,
    pub mean: f64,
    pub standard_deviation: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub name: String,
    pub label: String,
    pub tick_x: f64,
    /// For no_pi and pi
    pub bars: [Bar; 2],
}

#[derive(Debug, Clone, PartialEq)]
struct Frame {
    left: f64,
    bottom: f64,
    width: f64,
    height: f64,
    x_min: f64,
    x_max: f64,
}

impl Frame {
    fn x(&self, group_x: f64) -> f64 {
        self.left + (group_x - self.x_min) / (self.x_max - self.x_min) * self.width
    }
}

#[derive(Debug, Clone)]
pub struct BarChart {
    options: ChartOptions,
    /// From the extension of `options.output`
    format: OutputFormat,
    groups: Vec<Group>,
    y_axis: Axis,
    frame: Frame,
}

fn bar(x_left: f64, point: &SeriesPoint) -> Bar {
    Bar {
        x_left,
        mean: point.mean,
        standard_deviation: point.standard_deviation(),
    }
}

impl BarChart {
    pub fn new(comparison: &Comparison, options: &ChartOptions) -> Result<Self, ChartError> {
        options.check()?;
        let format = OutputFormat::from_path(&options.output)?;
        let (left, right) = comparison.series();
        if left.len() != right.len() {
            return Err(ChartError::ShapeMismatch {
                left: left.len(),
                right: right.len(),
            });
        }
        if left.is_empty() {
            return Err(ChartError::NoData);
        }

        let w = options.bar_width;
        let groups: Vec<Group> = left
            .iter()
            .zip(right)
            .enumerate()
            .map(|(i, (a, b))| {
                let x = i as f64;
                Group {
                    name: a.name.clone(),
                    label: match options.tick_labels {
                        TickLabels::Names => a.name.clone(),
                        TickLabels::Letters => letter_label(i),
                    },
                    tick_x: x + w,
                    bars: [bar(x, a), bar(x + w, b)],
                }
            })
            .collect();

        let data_max = groups
            .iter()
            .flat_map(|g| &g.bars)
            .map(|b| b.mean + b.standard_deviation)
            .fold(f64::NEG_INFINITY, f64::max);
        let y_axis = Axis::new(options.y_min, options.y_max, data_max)?;

        let page_width = options.width_inches * POINTS_PER_INCH;
        let page_height = options.height_inches * POINTS_PER_INCH;
        let longest_label = groups
            .iter()
            .map(|g| g.label.chars().count())
            .max()
            .unwrap_or(0) as f64;
        let bottom = MARGIN_BOTTOM_MIN
            + longest_label
                * MARGIN_BOTTOM_PER_LABEL_CHAR
                * options.tick_label_rotation.to_radians().sin().abs();
        let top = MARGIN_TOP + if options.title.is_some() { FONT_SIZE * 1.5 } else { 0. };
        let width = page_width - MARGIN_LEFT - MARGIN_RIGHT;
        let height = page_height - bottom - top;
        if width <= 0. || height <= 0. {
            return Err(ChartError::InvalidOption(format!(
                "figure of {} x {} inches is too small for the labels",
                options.width_inches, options.height_inches
            )));
        }
        let gap = (1. - 2. * w) / 2.;
        let frame = Frame {
            left: MARGIN_LEFT,
            bottom,
            width,
            height,
            x_min: -gap,
            x_max: (groups.len() - 1) as f64 + 2. * w + gap,
        };

        Ok(BarChart {
            options: options.clone(),
            format,
            groups,
            y_axis,
            frame,
        })
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn y_axis(&self) -> &Axis {
        &self.y_axis
    }

    pub fn options(&self) -> &ChartOptions {
        &self.options
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Page size in points
    pub fn page_size(&self) -> (f64, f64) {
        (
            self.options.width_inches * POINTS_PER_INCH,
            self.options.height_inches * POINTS_PER_INCH,
        )
    }

    fn y(&self, value: f64) -> f64 {
        self.frame.bottom + self.y_axis.fraction(value) * self.frame.height
    }

    pub fn draw(&self, canvas: &mut impl Canvas) {
        let frame = &self.frame;
        let w = self.options.bar_width;
        let bar_points = w / (frame.x_max - frame.x_min) * frame.width;
        let baseline = self.y(self.y_axis.min.max(0.));

        for group in &self.groups {
            canvas.begin_group(&group.name);
            for (bar, color) in group.bars.iter().zip(self.options.colors) {
                let x = frame.x(bar.x_left);
                let top = self.y(bar.mean);
                let (y0, y1) = if top >= baseline {
                    (baseline, top)
                } else {
                    (top, baseline)
                };
                canvas.filled_rect(x, y0, bar_points, y1 - y0, color);
                canvas.stroked_rect(x, y0, bar_points, y1 - y0);

                let center = x + bar_points / 2.;
                let lo = self.y(bar.mean - bar.standard_deviation);
                let hi = self.y(bar.mean + bar.standard_deviation);
                let cap = bar_points * CAP_FRACTION / 2.;
                canvas.line((center, lo), (center, hi));
                canvas.line((center - cap, lo), (center + cap, lo));
                canvas.line((center - cap, hi), (center + cap, hi));
            }

            let tick_x = frame.x(group.tick_x);
            canvas.line((tick_x, frame.bottom), (tick_x, frame.bottom - TICK_LENGTH));
            let rotation = self.options.tick_label_rotation;
            canvas.text(
                (tick_x, frame.bottom - TICK_LENGTH - TICK_FONT_SIZE),
                &group.label,
                TextStyle {
                    size: TICK_FONT_SIZE,
                    anchor: if rotation == 0. {
                        Anchor::Middle
                    } else {
                        Anchor::End
                    },
                    rotation,
                },
            );
            canvas.end_group();
        }

        // Value axis
        for &tick in &self.y_axis.ticks {
            let y = self.y(tick);
            canvas.line((frame.left, y), (frame.left - TICK_LENGTH, y));
            canvas.text(
                (frame.left - TICK_LENGTH - 2., y - FONT_SIZE * 0.35),
                &self.y_axis.format_tick(tick),
                TextStyle {
                    size: FONT_SIZE,
                    anchor: Anchor::End,
                    rotation: 0.,
                },
            );
        }
        canvas.text(
            (MARGIN_LEFT / 4., frame.bottom + frame.height / 2.),
            &self.options.y_label,
            TextStyle {
                size: FONT_SIZE,
                anchor: Anchor::Middle,
                rotation: 90.,
            },
        );
        canvas.stroked_rect(frame.left, frame.bottom, frame.width, frame.height);

        if let Some(title) = &self.options.title {
            canvas.text(
                (frame.left + frame.width / 2., frame.bottom + frame.height + FONT_SIZE * 0.8),
                title,
                TextStyle {
                    size: FONT_SIZE * 1.2,
                    anchor: Anchor::Middle,
                    rotation: 0.,
                },
            );
        }

        self.draw_legend(canvas);
    }

    fn draw_legend(&self, canvas: &mut impl Canvas) {
        let frame = &self.frame;
        let swatch = FONT_SIZE;
        let row_height = FONT_SIZE * 1.6;
        let labels = [Condition::NoPi.label(), Condition::Pi.label()];
        let text_width = labels.iter().map(|l| l.len()).max().unwrap_or(0) as f64 * FONT_SIZE * 0.6;
        let box_width = swatch + 3. * FONT_SIZE * 0.5 + text_width;
        let box_height = row_height * labels.len() as f64 + FONT_SIZE * 0.4;
        let x0 = frame.left + frame.width - box_width - 6.;
        let y0 = frame.bottom + frame.height - box_height - 6.;
        canvas.filled_rect(x0, y0, box_width, box_height, Rgb(0xff, 0xff, 0xff));
        canvas.stroked_rect(x0, y0, box_width, box_height);
        for (i, (label, color)) in labels.iter().zip(self.options.colors).enumerate() {
            let y = y0 + box_height - FONT_SIZE * 0.2 - row_height * (i + 1) as f64
                + (row_height - swatch) / 2.;
            let x = x0 + FONT_SIZE * 0.5;
            canvas.filled_rect(x, y, swatch, swatch, color);
            canvas.stroked_rect(x, y, swatch, swatch);
            canvas.text(
                (x + swatch + FONT_SIZE * 0.5, y + swatch * 0.15),
                label,
                TextStyle {
                    size: FONT_SIZE,
                    anchor: Anchor::Start,
                    rotation: 0.,
                },
            );
        }
    }

    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Eps => eps::render(self),
            OutputFormat::Svg => svg::render(self),
        }
    }

    /// Render in the format given by the extension of the configured
    /// output path and write it there; the file is only replaced once
    /// it is complete.
    pub fn write_to_file(&self) -> Result<()> {
        let path = &self.options.output;
        let contents = self.render(self.format);
        write_file_atomically(path, contents.as_bytes())
            .with_context(|| anyhow!("writing chart to {path:?}"))?;
        info!("wrote chart with {} groups to {path:?}", self.groups.len());
        Ok(())
    }
}
