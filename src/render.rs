//! Plain-text rendering of tables and hits for the CLI.

use serde_json::Value;

use crate::models::SearchHit;
use crate::warehouse::Table;

const MAX_CELL_WIDTH: usize = 48;

pub const HIT_COLUMNS: [&str; 8] = [
    "DOC_ID",
    "FILENAME",
    "RELATIVE_PATH",
    "PERSON",
    "DOC_TYPE",
    "DOC_DATE",
    "score_sem",
    "score_text",
];

/// Renders a warehouse result as an aligned text grid.
pub fn render_table(table: &Table) -> String {
    let rows: Vec<Vec<String>> = table
        .rows()
        .map(|r| r.values().iter().map(cell_text).collect())
        .collect();
    grid(table.columns(), &rows)
}

/// Renders hits with the service's column names.
pub fn render_hits(hits: &[SearchHit]) -> String {
    let columns: Vec<String> = HIT_COLUMNS.iter().map(|c| c.to_string()).collect();
    let rows: Vec<Vec<String>> = hits
        .iter()
        .map(|h| {
            vec![
                h.doc_id.as_ref().map(cell_text).unwrap_or_default(),
                h.filename.clone().unwrap_or_default(),
                h.relative_path.clone().unwrap_or_default(),
                h.person.clone().unwrap_or_default(),
                h.doc_type.clone().unwrap_or_default(),
                h.doc_date.clone().unwrap_or_default(),
                h.score_semantic.map(|s| format!("{:.3}", s)).unwrap_or_default(),
                h.score_text.map(|s| format!("{:.3}", s)).unwrap_or_default(),
            ]
        })
        .collect();
    grid(&columns, &rows)
}

pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn grid(columns: &[String], rows: &[Vec<String>]) -> String {
    let header: Vec<String> = columns.iter().map(|c| clip(c)).collect();
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|r| r.iter().map(|c| clip(c)).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &body {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let mut out = line(&header, &widths);
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in &body {
        out.push('\n');
        out.push_str(&line(row, &widths));
    }
    out
}

fn clip(cell: &str) -> String {
    let flat = cell.replace('\n', " ");
    if flat.chars().count() > MAX_CELL_WIDTH {
        let head: String = flat.chars().take(MAX_CELL_WIDTH - 3).collect();
        format!("{}...", head)
    } else {
        flat
    }
}

fn line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(c, w)| format!("{:<width$}", c, width = *w))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_table_aligns_columns() {
        let table = Table::new(
            vec!["NAME".into(), "ROWS".into()],
            vec![
                vec![json!("RAW_DOCS"), json!(12)],
                vec![json!("E"), Value::Null],
            ],
        );
        let text = render_table(&table);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "NAME      ROWS");
        assert_eq!(lines[1], "--------  ----");
        assert_eq!(lines[2], "RAW_DOCS  12");
        assert_eq!(lines[3], "E");
    }

    #[test]
    fn test_long_cells_are_clipped() {
        let long = "x".repeat(100);
        let table = Table::new(vec!["C".into()], vec![vec![json!(long)]]);
        let text = render_table(&table);
        let last = text.lines().last().unwrap();
        assert_eq!(last.chars().count(), MAX_CELL_WIDTH);
        assert!(last.ends_with("..."));
    }

    #[test]
    fn test_render_hits_header() {
        let text = render_hits(&[SearchHit {
            doc_id: Some(json!(1)),
            score_semantic: Some(0.5),
            ..Default::default()
        }]);
        assert!(text.lines().next().unwrap().starts_with("DOC_ID"));
        assert!(text.contains("0.500"));
    }
}
