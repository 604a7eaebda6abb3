//! Printing of tables either for humans on a terminal (padded, with
//! ANSI formatting for the title row) or as TSV.

//! Does not escape anything in the fields; values must not contain
//! tabs or newlines.

use std::{fmt::Display, io::Write};

use anyhow::{bail, Result};
use yansi::{Paint, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct Column {
    pub title: String,
    /// Minimum width in characters
    pub width: usize,
    pub align: Align,
}

impl Column {
    pub fn new(title: impl Into<String>, width: usize, align: Align) -> Self {
        Self {
            title: title.into(),
            width,
            align,
        }
    }
}

/// Capable of streaming, which requires defining the column widths
/// beforehand. If a value is wider than its column, a single space is
/// still printed between it and the next value.
pub struct TerminalTable {
    columns: Vec<Column>,
    /// Print as TSV and omit ANSI codes and padding
    pub tsv_mode: bool,
}

impl TerminalTable {
    pub fn new(columns: Vec<Column>, tsv_mode: bool) -> Self {
        Self { columns, tsv_mode }
    }

    fn write_row<V: Display>(
        &self,
        row: &[V],
        style: Option<&Style>,
        out: &mut impl Write,
    ) -> Result<()> {
        if row.len() != self.columns.len() {
            bail!(
                "row has {} values but the table has {} columns",
                row.len(),
                self.columns.len()
            )
        }
        let last = row.len().saturating_sub(1);
        for (i, (column, val)) in self.columns.iter().zip(row).enumerate() {
            let s = val.to_string();
            if self.tsv_mode {
                if i > 0 {
                    out.write_all(b"\t")?;
                }
                out.write_all(s.as_bytes())?;
                continue;
            }

            let padding = " ".repeat(column.width.saturating_sub(s.chars().count()));
            let s = if let Some(style) = style {
                s.paint(*style).to_string()
            } else {
                s
            };
            match column.align {
                Align::Left => {
                    out.write_all(s.as_bytes())?;
                    if i != last {
                        out.write_all(padding.as_bytes())?;
                    }
                }
                Align::Right => {
                    out.write_all(padding.as_bytes())?;
                    out.write_all(s.as_bytes())?;
                }
            }
            if i != last {
                out.write_all(b" ")?;
            }
        }
        out.write_all(b"\n")?;
        Ok(())
    }

    pub fn write_title_row(&self, out: &mut impl Write) -> Result<()> {
        const STYLE: Style = Style::new().bold().italic();
        let titles: Vec<&str> = self.columns.iter().map(|c| c.title.as_str()).collect();
        self.write_row(
            &titles,
            if self.tsv_mode { None } else { Some(&STYLE) },
            out,
        )
    }

    pub fn write_data_row<V: Display>(&self, data: &[V], out: &mut impl Write) -> Result<()> {
        self.write_row(data, None, out)
    }
}
