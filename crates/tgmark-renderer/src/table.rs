//! Table rendering.
//!
//! MarkdownV2 has no table syntax. By default a table becomes a numbered
//! list of records; [`table_to_markdown`] writes the native pipe table for
//! the unsupported-element policy to deal with.

use pulldown_cmark::Alignment;

use crate::ast::Node;
use crate::escape::{EscapeContext, escape};
use crate::renderer::Renderer;

/// Render every cell of a row, collapsing line breaks.
fn row_cells(renderer: &Renderer<'_>, row: &Node) -> Vec<String> {
    row.children()
        .iter()
        .map(|cell| {
            renderer
                .phrasing(cell.children())
                .replace('\n', " ")
                .trim()
                .to_owned()
        })
        .collect()
}

/// Convert table rows into a vertical record list.
///
/// The first row holds the headers. Each following row becomes one record:
///
/// ```text
/// 1\. Name: Alice
/// - Role: Admin
/// ```
///
/// Returns an empty string when there is no data row.
pub fn table_to_list(renderer: &Renderer<'_>, rows: &[Node]) -> String {
    let Some((header_row, data_rows)) = rows.split_first() else {
        return String::new();
    };
    if data_rows.is_empty() {
        return String::new();
    }

    let placeholder = escape("-", EscapeContext::Default);
    let headers: Vec<String> = row_cells(renderer, header_row)
        .into_iter()
        .map(|header| {
            if header.is_empty() {
                placeholder.clone()
            } else {
                header
            }
        })
        .collect();

    data_rows
        .iter()
        .zip(1..)
        .map(|(row, number)| {
            let values = row_cells(renderer, row);
            let columns = headers.len().max(values.len());
            if columns == 0 {
                return format!(r"{number}\. Item {number}: {placeholder}");
            }

            (0..columns)
                .map(|index| {
                    let header = headers.get(index).unwrap_or(&placeholder);
                    let value = values
                        .get(index)
                        .filter(|value| !value.is_empty())
                        .unwrap_or(&placeholder);
                    if index == 0 {
                        format!(r"{number}\. {header}: {value}")
                    } else {
                        format!("- {header}: {value}")
                    }
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Minimum delimiter width for a column alignment.
fn min_width(align: Alignment) -> usize {
    match align {
        Alignment::None => 1,
        Alignment::Left | Alignment::Right => 2,
        Alignment::Center => 3,
    }
}

fn delimiter(align: Alignment, width: usize) -> String {
    match align {
        Alignment::None => "-".repeat(width),
        Alignment::Left => format!(":{}", "-".repeat(width - 1)),
        Alignment::Right => format!("{}:", "-".repeat(width - 1)),
        Alignment::Center => format!(":{}:", "-".repeat(width - 2)),
    }
}

fn pad(value: &str, align: Alignment, width: usize) -> String {
    let gap = width.saturating_sub(value.chars().count());
    match align {
        Alignment::None | Alignment::Left => format!("{value}{}", " ".repeat(gap)),
        Alignment::Right => format!("{}{value}", " ".repeat(gap)),
        Alignment::Center => {
            let before = gap / 2;
            format!("{}{value}{}", " ".repeat(before), " ".repeat(gap - before))
        }
    }
}

/// Write table rows as a GFM pipe table with aligned columns.
///
/// Rows shorter than the widest row are padded with empty cells.
pub fn table_to_markdown(renderer: &Renderer<'_>, align: &[Alignment], rows: &[Node]) -> String {
    let cells: Vec<Vec<String>> = rows.iter().map(|row| row_cells(renderer, row)).collect();
    let columns = cells
        .iter()
        .map(Vec::len)
        .max()
        .unwrap_or(0)
        .max(align.len());
    if columns == 0 {
        return String::new();
    }

    let aligns: Vec<Alignment> = (0..columns)
        .map(|index| align.get(index).copied().unwrap_or(Alignment::None))
        .collect();
    let widths: Vec<usize> = aligns
        .iter()
        .enumerate()
        .map(|(index, align)| {
            cells
                .iter()
                .filter_map(|row| row.get(index))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
                .max(min_width(*align))
        })
        .collect();

    let format_row = |row: &[String]| {
        let padded: Vec<String> = (0..columns)
            .map(|index| {
                let value = row.get(index).map_or("", String::as_str);
                pad(value, aligns[index], widths[index])
            })
            .collect();
        format!("| {} |", padded.join(" | "))
    };

    let mut lines = Vec::with_capacity(cells.len() + 1);
    for (index, row) in cells.iter().enumerate() {
        lines.push(format_row(row.as_slice()));
        if index == 0 {
            let delimiters: Vec<String> = aligns
                .iter()
                .zip(&widths)
                .map(|(align, width)| delimiter(*align, *width))
                .collect();
            lines.push(format!("| {} |", delimiters.join(" | ")));
        }
    }
    lines.join("\n")
}
