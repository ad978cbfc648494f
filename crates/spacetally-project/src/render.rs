//! Report renderers.
//!
//! All renderers consume the ordered traversal of a built projection:
//!
//! - a JS tree literal, `var <name>DATA = [...]`, for a collapsible tree view
//! - HTML table rows and a `TOTAL` summary row
//! - a JSON document with the summary and every visited row

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use serde::Serialize;
use tracing::debug;

use spacetally_core::{Node, RenderRow, SummaryRow, TableRow, Totals};

use crate::assembler::Projection;
use crate::error::{ProjectError, ProjectionWarning};
use crate::spec::TableLayout;

const INDENT: &str = "     ";

/// Escape text for HTML content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text for a single-quoted JS string.
fn escape_js(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

fn indent(level: u32) -> String {
    INDENT.repeat(level as usize)
}

fn js_label(row: &RenderRow) -> String {
    let totals = &row.totals;
    escape_js(&format!(
        "{} [<span class=\"nFiles\">{} files</span>] <span class=\"size {}\">{}</span>\
         &nbsp;&nbsp;&nbsp;<span class=\"lastMod\"> {{Last Mod. {}}}</span>",
        escape_html(&row.title),
        totals.total_files,
        totals.alarm,
        totals.human_size(),
        escape_html(&totals.modify_date),
    ))
}

/// Render the tree below `root` as a JS array literal named `<name>DATA`.
///
/// Children appear only where the traversal expands a node.
pub fn js_tree(name: &str, root: &Node) -> String {
    let rows = root.render_rows();
    let mut out = format!("var {name}DATA = [\n");
    let mut open: Vec<u32> = Vec::new();
    let mut iter = rows.iter().peekable();

    while let Some(row) = iter.next() {
        let pad = indent(row.level);
        let _ = writeln!(out, "{pad} {{ label: '{}',", js_label(row));

        let next_level = iter.peek().map(|next| next.level);
        if next_level.is_some_and(|level| level > row.level) {
            let _ = writeln!(out, "{pad}   children: [");
            open.push(row.level);
            continue;
        }
        let _ = writeln!(out, "{pad} }},");

        while let Some(&level) = open.last() {
            if next_level.is_some_and(|next| next > level) {
                break;
            }
            open.pop();
            let pad = indent(level);
            let _ = writeln!(out, "{pad}   ],");
            let _ = writeln!(out, "{pad} }},");
        }
    }

    out.push_str("]\n");
    out
}

fn value_cells(out: &mut String, totals: &Totals, footer: bool) {
    let footer = if footer { " footer" } else { "" };
    let _ = writeln!(
        out,
        "<td class=\"size{footer} {}\">{}</td>\
         <td class=\"nFiles{footer}\">{}</td>\
         <td class=\"time{footer}\">{}</td>\
         <td class=\"time{footer}\">{}</td>\
         <td class=\"time{footer}\">{}</td></tr>",
        totals.alarm,
        escape_html(&totals.gib_size()),
        totals.total_files,
        escape_html(&totals.create_date),
        escape_html(&totals.modify_date),
        escape_html(&totals.access_date),
    );
}

fn label_cell(out: &mut String, label: &str) {
    let _ = write!(out, "<td class=\"user\">{}</td>", escape_html(label));
}

fn table_row(out: &mut String, row: &TableRow, prefix: Option<&str>, with_parent: bool) {
    out.push_str("<tr>");
    if let Some(prefix) = prefix {
        label_cell(out, prefix);
    }
    label_cell(out, &row.title);
    if with_parent {
        label_cell(out, &row.parent);
    }
    value_cells(out, &row.totals, false);
}

/// HTML table rows for `root` in the given layout, sorted by title at
/// every level.
pub fn table_rows(root: &Node, layout: TableLayout) -> String {
    let mut out = String::new();
    match layout {
        TableLayout::Plain => {
            for row in root.table_rows() {
                table_row(&mut out, &row, None, false);
            }
        }
        TableLayout::WithParent => {
            for parent in root.sorted_children() {
                for row in parent.table_rows() {
                    table_row(&mut out, &row, None, true);
                }
            }
        }
        TableLayout::Extended => {
            for group in root.sorted_children() {
                for parent in group.sorted_children() {
                    for row in parent.table_rows() {
                        table_row(&mut out, &row, Some(group.title()), true);
                    }
                }
            }
        }
    }
    out
}

/// The `TOTAL` row for `root`, padded to the layout's label columns.
pub fn table_summary(root: &Node, layout: TableLayout) -> String {
    let summary = root.summary();
    let mut out =
        String::from("<tr><td class=\"user footer\" style=\"font-weight: bold;\">TOTAL</td>");
    for _ in 1..layout.label_columns() {
        out.push_str("<td class=\"user footer\">&nbsp;</td>");
    }
    value_cells(&mut out, &summary.totals, true);
    out
}

/// JSON document of one projection.
#[derive(Debug, Serialize)]
pub struct ProjectionReport<'a> {
    pub name: &'a str,
    pub depth_limit: u32,
    pub summary: SummaryRow,
    pub rows: Vec<RenderRow>,
    pub warnings: &'a [ProjectionWarning],
}

impl<'a> ProjectionReport<'a> {
    pub fn new(projection: &'a Projection) -> Self {
        Self {
            name: projection.name(),
            depth_limit: projection.depth_limit,
            summary: projection.root.summary(),
            rows: projection.root.render_rows(),
            warnings: &projection.warnings,
        }
    }
}

/// Render a projection as pretty JSON.
pub fn json_report(projection: &Projection) -> Result<String, ProjectError> {
    Ok(serde_json::to_string_pretty(&ProjectionReport::new(
        projection,
    ))?)
}

fn write_file(path: PathBuf, contents: &str, written: &mut Vec<PathBuf>) -> Result<(), ProjectError> {
    fs::write(&path, contents).map_err(|e| ProjectError::io(&path, e))?;
    debug!(path = %path.display(), bytes = contents.len(), "Wrote output");
    written.push(path);
    Ok(())
}

/// Write every output of a projection into `dir`; returns the paths
/// written.
///
/// - `outfile_<name>.js`
/// - `<stem>_<name>.txt` and `<stem>_<name>_Sum.txt` per table layout
/// - `<name>.json` when `json` is set
pub fn write_projection(
    projection: &Projection,
    dir: &Path,
    json: bool,
) -> Result<Vec<PathBuf>, ProjectError> {
    fs::create_dir_all(dir).map_err(|e| ProjectError::io(dir, e))?;

    let name: CompactString = projection.spec.name.clone();
    let mut written = Vec::new();

    write_file(
        dir.join(format!("outfile_{name}.js")),
        &js_tree(&name, &projection.root),
        &mut written,
    )?;

    for &layout in &projection.spec.tables {
        let stem = layout.file_stem();
        write_file(
            dir.join(format!("{stem}_{name}.txt")),
            &table_rows(&projection.root, layout),
            &mut written,
        )?;
        write_file(
            dir.join(format!("{stem}_{name}_Sum.txt")),
            &table_summary(&projection.root, layout),
            &mut written,
        )?;
    }

    if json {
        write_file(
            dir.join(format!("{name}.json")),
            &json_report(projection)?,
            &mut written,
        )?;
    }

    Ok(written)
}
