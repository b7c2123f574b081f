use crate::remote::service::ResultRow;

/// Insights adds a pointer field to every row; it is never useful on screen
const HIDDEN_FIELDS: [&str; 1] = ["@ptr"];

/// Render query rows as tab-separated lines.
///
/// Columns come from the first appearance of each field across all rows;
/// rows missing a field get an empty cell.
pub fn format_rows(rows: &[ResultRow], headers: bool) -> Vec<String> {
    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        for (field, _) in row {
            if !HIDDEN_FIELDS.contains(&field.as_str()) && !columns.contains(&field.as_str()) {
                columns.push(field);
            }
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    if headers && !columns.is_empty() {
        lines.push(columns.join("\t"));
    }

    for row in rows {
        let cells: Vec<&str> = columns
            .iter()
            .map(|column| {
                row.iter()
                    .find(|(field, _)| field == column)
                    .map(|(_, value)| value.as_str())
                    .unwrap_or("")
            })
            .collect();
        lines.push(cells.join("\t"));
    }

    lines
}
