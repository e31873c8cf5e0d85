/*!
format.rs

Column alignment for human (tabular) output.

`TabWriter` buffers tab separated text and, on `flush`, pads every
tab-terminated cell so that cells of the same column line up:

  - A column block is a run of consecutive lines that all have a
    tab-terminated cell in that column; widths are computed per block.
  - The text after the last tab of a line is not part of any column.
  - Cell width = max(text width) + padding (never below minwidth).
  - With '\t' as pad character, widths are rounded up to a multiple of
    tabwidth and padding is emitted as whole tabs.

Usage Example:
  let mut tw = TabWriter::new(Vec::new(), 0, 8, 8, '\t');
  writeln!(tw, "Name\t{}", name)?;
  tw.flush()?;
  let bytes = tw.into_inner();

NOTE:
  - Widths count chars, not terminal cells; input is expected to be plain
    (no ANSI escapes).
  - JSON / YAML paths never go through this module.
*/

use std::io::{self, Write};

/* -------------------------------------------------------------------------- */
/* Writer                                                                      */
/* -------------------------------------------------------------------------- */

pub struct TabWriter<W: Write> {
    out: W,
    minwidth: usize,
    tabwidth: usize,
    padding: usize,
    padchar: char,
    buf: Vec<u8>,
}

impl<W: Write> TabWriter<W> {
    pub fn new(out: W, minwidth: usize, tabwidth: usize, padding: usize, padchar: char) -> Self {
        Self {
            out,
            minwidth,
            tabwidth,
            padding,
            padchar,
            buf: Vec::new(),
        }
    }

    /// Give back the underlying writer. Unflushed text is discarded.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn layout(&self, text: &str) -> String {
        let lines: Vec<Vec<&str>> = text.split('\n').map(|l| l.split('\t').collect()).collect();
        let mut out = String::with_capacity(text.len() * 2);
        let mut widths = Vec::new();
        self.format(&mut out, &lines, &mut widths, 0, lines.len());
        out
    }

    fn format(
        &self,
        out: &mut String,
        lines: &[Vec<&str>],
        widths: &mut Vec<usize>,
        mut line0: usize,
        line1: usize,
    ) {
        let column = widths.len();
        let mut this = line0;
        while this < line1 {
            if column + 1 >= lines[this].len() {
                this += 1;
                continue;
            }

            // Lines before the block are done at this depth.
            self.write_lines(out, lines, widths, line0, this);
            line0 = this;

            let mut width = self.minwidth;
            while this < line1 {
                let line = &lines[this];
                if column + 1 >= line.len() {
                    break;
                }
                width = width.max(text_width(line[column]) + self.padding);
                this += 1;
            }

            widths.push(width);
            self.format(out, lines, widths, line0, this);
            widths.pop();
            line0 = this;
        }
        self.write_lines(out, lines, widths, line0, line1);
    }

    fn write_lines(
        &self,
        out: &mut String,
        lines: &[Vec<&str>],
        widths: &[usize],
        line0: usize,
        line1: usize,
    ) {
        for (i, line) in lines.iter().enumerate().take(line1).skip(line0) {
            for (j, cell) in line.iter().enumerate() {
                out.push_str(cell);
                if j < widths.len() {
                    self.write_padding(out, text_width(cell), widths[j]);
                }
            }
            // The last segment has no terminating newline of its own.
            if i + 1 < lines.len() {
                out.push('\n');
            }
        }
    }

    fn write_padding(&self, out: &mut String, textw: usize, cellw: usize) {
        if self.padchar == '\t' {
            if self.tabwidth == 0 {
                return;
            }
            let cellw = cellw.div_ceil(self.tabwidth) * self.tabwidth;
            let n = cellw.saturating_sub(textw);
            for _ in 0..n.div_ceil(self.tabwidth) {
                out.push('\t');
            }
            return;
        }
        for _ in 0..cellw.saturating_sub(textw) {
            out.push(self.padchar);
        }
    }
}

impl<W: Write> Write for TabWriter<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return self.out.flush();
        }
        let text = String::from_utf8_lossy(&self.buf).into_owned();
        let formatted = self.layout(&text);
        self.buf.clear();
        self.out.write_all(formatted.as_bytes())?;
        self.out.flush()
    }
}

/* -------------------------------------------------------------------------- */
/* Text Helpers                                                                */
/* -------------------------------------------------------------------------- */

fn text_width(s: &str) -> usize {
    s.chars().count()
}

/* -------------------------------------------------------------------------- */
/* Tests                                                                       */
/* -------------------------------------------------------------------------- */
