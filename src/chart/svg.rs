//! SVG output. Page coordinates are kept in points via `viewBox`, the
//! pixel size follows from the configured dpi.

use std::fmt::Write;

use super::{Anchor, BarChart, Canvas, Rgb, TextStyle, LINE_WIDTH, POINTS_PER_INCH};

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

struct SvgCanvas {
    out: String,
    page_height: f64,
}

impl SvgCanvas {
    /// SVG has its origin at the top left
    fn flip(&self, y: f64) -> f64 {
        self.page_height - y
    }
}

impl Canvas for SvgCanvas {
    fn begin_group(&mut self, label: &str) {
        writeln!(
            self.out,
            "<g class=\"group\" data-function=\"{}\">",
            escape(label)
        )
        .expect("no IO");
    }

    fn end_group(&mut self) {
        self.out.push_str("</g>\n");
    }

    fn filled_rect(&mut self, x: f64, y: f64, width: f64, height: f64, fill: Rgb) {
        let top = self.flip(y + height);
        writeln!(
            self.out,
            "<rect x=\"{x:.2}\" y=\"{top:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" \
             fill=\"{fill}\"/>"
        )
        .expect("no IO");
    }

    fn stroked_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let top = self.flip(y + height);
        writeln!(
            self.out,
            "<rect x=\"{x:.2}\" y=\"{top:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" \
             fill=\"none\" stroke=\"black\"/>"
        )
        .expect("no IO");
    }

    fn line(&mut self, (x1, y1): (f64, f64), (x2, y2): (f64, f64)) {
        let (y1, y2) = (self.flip(y1), self.flip(y2));
        writeln!(
            self.out,
            "<line x1=\"{x1:.2}\" y1=\"{y1:.2}\" x2=\"{x2:.2}\" y2=\"{y2:.2}\" stroke=\"black\"/>"
        )
        .expect("no IO");
    }

    fn text(&mut self, (x, y): (f64, f64), text: &str, style: TextStyle) {
        let TextStyle {
            size,
            anchor,
            rotation,
        } = style;
        let y = self.flip(y);
        let anchor = match anchor {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        };
        let transform = if rotation == 0. {
            String::new()
        } else {
            // SVG rotates clockwise
            format!(" transform=\"rotate({:.1} {x:.2} {y:.2})\"", -rotation)
        };
        writeln!(
            self.out,
            "<text x=\"{x:.2}\" y=\"{y:.2}\" font-size=\"{size:.1}\" \
             text-anchor=\"{anchor}\"{transform}>{}</text>",
            escape(text)
        )
        .expect("no IO");
    }
}

pub fn render(chart: &BarChart) -> String {
    let (width, height) = chart.page_size();
    let dpi = chart.options().dpi as f64;
    let mut canvas = SvgCanvas {
        out: String::new(),
        page_height: height,
    };
    let out = &mut canvas.out;
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{:.0}\" height=\"{:.0}\" \
         viewBox=\"0 0 {width:.2} {height:.2}\" font-family=\"Helvetica, Arial, sans-serif\" \
         stroke-width=\"{LINE_WIDTH}\">",
        width / POINTS_PER_INCH * dpi,
        height / POINTS_PER_INCH * dpi,
    )
    .expect("no IO");
    if let Some(title) = &chart.options().title {
        writeln!(out, "<title>{}</title>", escape(title)).expect("no IO");
    }
    out.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");

    chart.draw(&mut canvas);

    canvas.out.push_str("</svg>\n");
    canvas.out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chart::ChartOptions,
        series::{Comparison, SeriesPoint},
    };

    #[test]
    fn t_render() {
        let p = |name: &str, mean: f64| SeriesPoint {
            name: name.into(),
            mean,
            variance: 0.5,
        };
        let c = Comparison::new(
            vec![p("a<b", 1.), p("c", 2.), p("d", 3.)],
            vec![p("a<b", 1.5), p("c", 2.5), p("d", 3.5)],
        )
        .unwrap();
        let chart = BarChart::new(&c, &ChartOptions::default()).unwrap();
        let s = render(&chart);
        assert!(s.contains("width=\"800\" height=\"600\""));
        assert_eq!(s.matches("<g class=\"group\"").count(), 3);
        assert!(s.contains("data-function=\"a&lt;b\""));
        assert!(s.contains("rotate(-60.0 "));
        assert!(s.contains("fill=\"#ff0000\""));
        assert!(s.trim_end().ends_with("</svg>"));
    }
}
