use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableAlignment {
    #[default]
    Left,
    Center,
    Right,
}

impl TableAlignment {
    /// Read a delimiter-row cell such as `:---:`. Anything without a trailing
    /// colon is left aligned.
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        match (token.starts_with(':'), token.ends_with(':')) {
            (true, true) => TableAlignment::Center,
            (_, true) => TableAlignment::Right,
            _ => TableAlignment::Left,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            TableAlignment::Left => ":---",
            TableAlignment::Center => ":---:",
            TableAlignment::Right => "---:",
        }
    }
}

/// A pipe table as a grid of unescaped cell strings.
///
/// Every row has `headers.len()` cells and there is one alignment per column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableModel {
    pub headers: Vec<String>,
    pub alignments: Vec<TableAlignment>,
    pub rows: Vec<Vec<String>>,
}

/// Cell address where row 0 is the header row and body rows start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellCoords {
    pub row: usize,
    pub column: usize,
}

impl CellCoords {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl TableModel {
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn body_row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, coords: CellCoords) -> Option<&str> {
        if coords.row == 0 {
            return self.headers.get(coords.column).map(String::as_str);
        }
        self.rows
            .get(coords.row - 1)?
            .get(coords.column)
            .map(String::as_str)
    }

    /// Parse pipe-table text. Needs a header row and a delimiter row; ragged
    /// rows are padded to the widest row.
    pub fn parse(text: &str) -> Option<Self> {
        let lines: Vec<&str> = text.split('\n').filter(|line| !line.trim().is_empty()).collect();
        if lines.len() < 2 {
            return None;
        }

        let headers = parse_cells(lines[0]);
        let alignment_cells = parse_cells(lines[1]);
        let body: Vec<Vec<String>> = lines[2..].iter().map(|line| parse_cells(line)).collect();

        let column_count = body
            .iter()
            .map(Vec::len)
            .chain([headers.len(), alignment_cells.len(), 1])
            .max()
            .unwrap_or(1);

        let pad = |cells: &[String]| -> Vec<String> {
            (0..column_count)
                .map(|i| cells.get(i).cloned().unwrap_or_default())
                .collect()
        };

        Some(Self {
            headers: pad(&headers),
            alignments: (0..column_count)
                .map(|i| TableAlignment::parse(alignment_cells.get(i).map_or("", String::as_str)))
                .collect(),
            rows: body.iter().map(|row| pad(row)).collect(),
        })
    }

    /// Render as markdown with every column padded to its widest cell.
    pub fn serialize(&self) -> String {
        let tokens: Vec<String> = self.alignments.iter().map(|a| a.token().to_string()).collect();
        let headers: Vec<String> = self.headers.iter().map(|cell| escape_cell(cell)).collect();
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|cell| escape_cell(cell)).collect())
            .collect();

        let widths: Vec<usize> = (0..headers.len())
            .map(|column| {
                let header = headers[column].chars().count();
                let token = tokens.get(column).map_or(0, |t| t.chars().count());
                let body = rows
                    .iter()
                    .map(|row| row.get(column).map_or(0, |cell| cell.chars().count()))
                    .max()
                    .unwrap_or(0);
                header.max(token).max(body).max(1)
            })
            .collect();

        let format_row = |cells: &[String]| -> String {
            let segments: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(column, width)| {
                    let cell = cells.get(column).map_or("", String::as_str);
                    format!(" {cell:<width$} ")
                })
                .collect();
            format!("|{}|", segments.join("|"))
        };

        let mut lines = vec![format_row(&headers), format_row(&tokens)];
        lines.extend(rows.iter().map(|row| format_row(row)));
        lines.join("\n")
    }
}

/// Collapse whitespace runs to single spaces and trim, as typed cell values
/// may contain line breaks that a table row cannot hold.
pub fn normalize_cell_value(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let mut segments = split_unescaped_pipes(trimmed);

    if trimmed.starts_with('|') && segments.first().is_some_and(|s| s.is_empty()) {
        segments.remove(0);
    }
    if has_unescaped_trailing_pipe(trimmed) && segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }

    segments
        .into_iter()
        .map(|cell| decode_escaped_cell(cell.trim()))
        .collect()
}

fn split_unescaped_pipes(text: &str) -> Vec<&str> {
    let mut cells = Vec::new();
    let mut start = 0;
    for (index, ch) in text.char_indices() {
        if ch == '|' && !is_escaped(text, index) {
            cells.push(&text[start..index]);
            start = index + 1;
        }
    }
    cells.push(&text[start..]);
    cells
}

/// Odd number of backslashes directly before `index`.
fn is_escaped(text: &str, index: usize) -> bool {
    let slashes = text.as_bytes()[..index]
        .iter()
        .rev()
        .take_while(|&&b| b == b'\\')
        .count();
    slashes % 2 == 1
}

fn has_unescaped_trailing_pipe(text: &str) -> bool {
    text.ends_with('|') && !is_escaped(text, text.len() - 1)
}

fn decode_escaped_cell(cell: &str) -> String {
    let mut decoded = String::with_capacity(cell.len());
    let mut chars = cell.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(&next) = chars.peek() {
                if next == '\\' || next == '|' {
                    decoded.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        decoded.push(ch);
    }
    decoded
}

fn escape_cell(cell: &str) -> String {
    let mut escaped = String::with_capacity(cell.len());
    for ch in cell.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '|' => escaped.push_str("\\|"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    // ============ Parsing ============

    #[test]
    fn test_parse_requires_header_and_delimiter() {
        assert_eq!(TableModel::parse("| a |"), None);
        assert_eq!(TableModel::parse("\n  \n| a |\n"), None);
    }

    #[test]
    fn test_parse_pads_ragged_rows() {
        let model = TableModel::parse("| a | b |\n| --- | ---: |\n| 1 |\n| 1 | 2 | 3 |").unwrap();

        assert_eq!(model.headers, strings(&["a", "b", ""]));
        assert_eq!(
            model.alignments,
            vec![
                TableAlignment::Left,
                TableAlignment::Right,
                TableAlignment::Left
            ]
        );
        assert_eq!(
            model.rows,
            vec![strings(&["1", "", ""]), strings(&["1", "2", "3"])]
        );
    }

    #[test]
    fn test_parse_without_outer_pipes() {
        let model = TableModel::parse("a | b\n:-: | -\nx | y").unwrap();

        assert_eq!(model.headers, strings(&["a", "b"]));
        assert_eq!(model.alignments[0], TableAlignment::Center);
        assert_eq!(model.rows, vec![strings(&["x", "y"])]);
    }

    #[rstest]
    #[case(":---:", TableAlignment::Center)]
    #[case("---:", TableAlignment::Right)]
    #[case(":---", TableAlignment::Left)]
    #[case("---", TableAlignment::Left)]
    #[case("", TableAlignment::Left)]
    fn test_alignment_tokens(#[case] token: &str, #[case] expected: TableAlignment) {
        assert_eq!(TableAlignment::parse(token), expected);
    }

    // ============ Escaping ============

    #[test]
    fn test_escaped_pipes_and_backslashes_round_trip() {
        let markdown =
            "| Name\\|Title | Path\\\\Root |\n| :--- | :--- |\n| Keep\\|Pipe | Slash\\\\Value |";

        let parsed = TableModel::parse(markdown).unwrap();
        assert_eq!(parsed.headers, strings(&["Name|Title", "Path\\Root"]));
        assert_eq!(parsed.rows[0], strings(&["Keep|Pipe", "Slash\\Value"]));

        let serialized = parsed.serialize();
        assert!(serialized.contains("Name\\|Title"));
        assert!(serialized.contains("Path\\\\Root"));
        assert!(serialized.contains("Keep\\|Pipe"));
        assert!(serialized.contains("Slash\\\\Value"));

        assert_eq!(TableModel::parse(&serialized), Some(parsed));
    }

    #[test]
    fn test_trailing_escaped_pipe_is_cell_content() {
        let model = TableModel::parse("| a | b\\|\n| - | - |").unwrap();
        assert_eq!(model.headers, strings(&["a", "b|"]));
    }

    // ============ Serialization ============

    #[test]
    fn test_serialize_pads_columns() {
        let model = TableModel {
            headers: strings(&["Feature", "Key"]),
            alignments: vec![TableAlignment::Left, TableAlignment::Center],
            rows: vec![strings(&["Open", "Cmd+O"])],
        };

        assert_snapshot!(model.serialize(), @r"
        | Feature | Key   |
        | :---    | :---: |
        | Open    | Cmd+O |
        ");
    }

    #[test]
    fn test_round_trip_preserves_model() {
        let model = TableModel {
            headers: strings(&["", "B"]),
            alignments: vec![TableAlignment::Right, TableAlignment::Center],
            rows: vec![strings(&["x", ""]), strings(&["", ""])],
        };

        assert_eq!(TableModel::parse(&model.serialize()), Some(model));
    }

    #[test]
    fn test_normalize_cell_value() {
        assert_eq!(normalize_cell_value("  a \n b\t c  "), "a b c");
        assert_eq!(normalize_cell_value("   "), "");
    }
}
