/// Position of a function declaration within its file. Rows are zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSpan {
    /// Row of the `def` keyword
    pub header_row: usize,

    /// Row and byte column where the body block starts
    pub body_row: usize,
    pub body_column: usize,

    /// Last row of the declaration, when the syntax tree provides it
    pub end_row: Option<usize>,
}

impl FunctionSpan {
    /// Same span with the end row dropped, forcing indentation scanning
    pub fn without_end(self) -> Self {
        Self { end_row: None, ..self }
    }
}

/// Source text of a function body.
///
/// Takes every line after the header through the end row. A body written on
/// the header line itself yields the text after the colon. Without an end
/// row the body runs until the first non-blank line indented no deeper than
/// the header. Out-of-range spans give an empty string.
pub fn extract_body(span: &FunctionSpan, lines: &[&str]) -> String {
    let body = match span.end_row {
        Some(end_row) if end_row <= span.header_row => inline_body(span, lines),
        Some(end_row) => slice_lines(lines, span.header_row + 1, end_row + 1),
        None if span.body_row == span.header_row => inline_body(span, lines),
        None => {
            let end = scan_block_end(span.header_row, lines);
            slice_lines(lines, span.header_row + 1, end)
        }
    };
    body.unwrap_or_default()
}

fn inline_body(span: &FunctionSpan, lines: &[&str]) -> Option<String> {
    lines
        .get(span.body_row)
        .and_then(|line| line.get(span.body_column..))
        .map(|text| text.trim().to_string())
}

fn slice_lines(lines: &[&str], start: usize, end: usize) -> Option<String> {
    let end = end.min(lines.len());
    if start > end {
        return None;
    }
    lines
        .get(start..end)
        .map(|body| body.join("\n").trim().to_string())
}

/// Row of the first line that closes the block opened at `header_row`
fn scan_block_end(header_row: usize, lines: &[&str]) -> usize {
    let Some(header) = lines.get(header_row) else {
        return lines.len();
    };
    let header_indent = indentation(header);

    lines
        .iter()
        .enumerate()
        .skip(header_row + 1)
        .find(|(_, line)| !line.trim().is_empty() && indentation(line) <= header_indent)
        .map(|(row, _)| row)
        .unwrap_or(lines.len())
}

fn indentation(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}
