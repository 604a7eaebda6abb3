//! Encapsulated PostScript output.

use std::fmt::Write;

use super::{Anchor, BarChart, Canvas, Rgb, TextStyle, LINE_WIDTH};

/// Escape for a PostScript string literal `( .. )`; non-ASCII is
/// replaced by `?` as the standard fonts only cover Latin-1.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

struct EpsCanvas {
    out: String,
}

impl Canvas for EpsCanvas {
    fn begin_group(&mut self, label: &str) {
        writeln!(self.out, "% group: {}", escape(label)).expect("no IO");
    }

    fn end_group(&mut self) {}

    fn filled_rect(&mut self, x: f64, y: f64, width: f64, height: f64, fill: Rgb) {
        let (r, g, b) = fill.fractions();
        writeln!(
            self.out,
            "{r:.3} {g:.3} {b:.3} setrgbcolor {x:.2} {y:.2} {width:.2} {height:.2} rectfill"
        )
        .expect("no IO");
    }

    fn stroked_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        writeln!(
            self.out,
            "0 setgray {x:.2} {y:.2} {width:.2} {height:.2} rectstroke"
        )
        .expect("no IO");
    }

    fn line(&mut self, (x1, y1): (f64, f64), (x2, y2): (f64, f64)) {
        writeln!(
            self.out,
            "0 setgray newpath {x1:.2} {y1:.2} moveto {x2:.2} {y2:.2} lineto stroke"
        )
        .expect("no IO");
    }

    fn text(&mut self, (x, y): (f64, f64), text: &str, style: TextStyle) {
        let TextStyle {
            size,
            anchor,
            rotation,
        } = style;
        let shift = match anchor {
            Anchor::Start => "pop 0",
            Anchor::Middle => "2 div neg",
            Anchor::End => "neg",
        };
        writeln!(
            self.out,
            "gsave 0 setgray /Helvetica findfont {size:.1} scalefont setfont \
             {x:.2} {y:.2} translate {rotation:.1} rotate \
             ({text}) dup stringwidth pop {shift} 0 moveto show grestore",
            text = escape(text)
        )
        .expect("no IO");
    }
}

pub fn render(chart: &BarChart) -> String {
    let (width, height) = chart.page_size();
    let mut canvas = EpsCanvas { out: String::new() };
    let out = &mut canvas.out;
    out.push_str("%!PS-Adobe-3.0 EPSF-3.0\n");
    writeln!(
        out,
        "%%BoundingBox: 0 0 {} {}",
        width.ceil() as u64,
        height.ceil() as u64
    )
    .expect("no IO");
    writeln!(out, "%%HiResBoundingBox: 0 0 {width:.2} {height:.2}").expect("no IO");
    if let Some(title) = &chart.options().title {
        writeln!(out, "%%Title: {}", escape(title)).expect("no IO");
    }
    writeln!(out, "%%Creator: {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
        .expect("no IO");
    out.push_str("%%Pages: 1\n%%EndComments\n");
    writeln!(out, "{LINE_WIDTH} setlinewidth 0 setlinejoin").expect("no IO");

    chart.draw(&mut canvas);

    canvas.out.push_str("showpage\n%%EOF\n");
    canvas.out
}
