//! Plain-text rendering of a partners page.

use std::fmt::Write;

use partners::contract::model::Partner;
use partners::domain::filter::PartnerColumn;

const ID_TITLE: &str = "ID";

fn width(s: &str) -> usize {
    s.chars().count()
}

fn pad(out: &mut String, cell: &str, w: usize) {
    out.push_str(cell);
    out.extend(std::iter::repeat(' ').take(w.saturating_sub(width(cell))));
}

/// Left-aligned table: id column followed by every partner column.
pub fn render(rows: &[&Partner]) -> String {
    let ids: Vec<String> = rows.iter().map(|p| p.id.to_string()).collect();

    let mut widths = vec![ids.iter().map(|s| width(s)).fold(width(ID_TITLE), usize::max)];
    for column in PartnerColumn::ALL {
        let w = rows
            .iter()
            .map(|p| width(column.value_of(p)))
            .fold(width(column.title()), usize::max);
        widths.push(w);
    }

    let mut out = String::new();
    let mut line = |cells: Vec<&str>| {
        let mut row = String::new();
        for (i, (cell, w)) in cells.iter().zip(&widths).enumerate() {
            if i > 0 {
                row.push_str("  ");
            }
            pad(&mut row, cell, *w);
        }
        let _ = writeln!(out, "{}", row.trim_end());
    };

    let mut header = vec![ID_TITLE];
    header.extend(PartnerColumn::ALL.iter().map(|c| c.title()));
    line(header);

    for (partner, id) in rows.iter().zip(&ids) {
        let mut cells = vec![id.as_str()];
        cells.extend(PartnerColumn::ALL.iter().map(|c| c.value_of(partner)));
        line(cells);
    }
    out
}
