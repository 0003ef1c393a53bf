/// One rendered frame: `height` rows of exactly `width` glyphs each.
///
/// Widths are counted in `char`s so multi-byte glyphs such as `Ä` still
/// occupy a single cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharFrame {
    width: usize,
    lines: Vec<String>,
}

impl CharFrame {
    pub fn blank(width: usize, height: usize) -> Self {
        let line = " ".repeat(width);
        Self {
            width,
            lines: vec![line; height],
        }
    }

    pub fn from_lines<I>(lines: I, width: usize, height: usize) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Self {
            width,
            lines: normalize_lines(lines, width, height),
        }
    }

    /// Builds a frame from `pad_rows` blank rows followed by `rows`.
    pub(crate) fn with_top_padding(pad_rows: usize, rows: Vec<String>, width: usize) -> Self {
        let mut lines = Vec::with_capacity(pad_rows + rows.len());
        lines.extend(std::iter::repeat(" ".repeat(width)).take(pad_rows));
        lines.extend(rows);
        Self { width, lines }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Glyphs of the frame in row-major order.
    pub fn glyphs(&self) -> impl Iterator<Item = char> + '_ {
        self.lines.iter().flat_map(|line| line.chars())
    }

    pub fn to_text(&self) -> String {
        if self.lines.is_empty() {
            return String::new();
        }
        let mut value = self.lines.join("\n");
        value.push('\n');
        value
    }
}

fn normalize_lines<I>(lines: I, width: usize, height: usize) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut normalized = lines
        .into_iter()
        .take(height)
        .map(|line| normalize_line(line.as_ref(), width))
        .collect::<Vec<_>>();

    if normalized.len() < height {
        normalized.extend(std::iter::repeat(" ".repeat(width)).take(height - normalized.len()));
    }

    normalized
}

fn normalize_line(line: &str, width: usize) -> String {
    let mut output = line.chars().take(width).collect::<String>();
    let glyphs = output.chars().count();
    if glyphs < width {
        output.push_str(&" ".repeat(width - glyphs));
    }
    output
}
