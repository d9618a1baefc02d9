//! `.base` files: saved views over the vault.
//!
//! ```yaml
//! filters:
//!   and:
//!     - 'file.hasTag("project")'
//! views:
//!   - type: table
//!     name: Active
//!     order: [file.name, status, due]
//!     filters:
//!       not: ['status == "done"']
//!     sort:
//!       - property: due
//!         direction: ASC
//!     groupBy:
//!       property: status
//!       direction: DESC
//! properties:
//!   status:
//!     displayName: Status
//! ```

use super::eval::{field_value, filter_notes, group_by, sort_notes, Direction, Filters};
use crate::error::{KilnError, Result};
use crate::note::{Note, NoteKind};
use crate::render::escape_html;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const DEFAULT_COLUMN: &str = "file.name";

// Columns rendered as a link to the note
const LINK_COLUMNS: &[&str] = &["file", "file.name", "file.stem", "file.basename"];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BaseFile {
    /// Applied before any view's own filters.
    pub filters: Filters,
    pub views: Vec<ViewConfig>,
    pub properties: BTreeMap<String, PropertyConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ViewConfig {
    #[serde(rename = "type")]
    pub view_type: String,
    pub name: String,
    /// Column fields, in display order.
    pub order: Vec<String>,
    pub filters: Filters,
    pub sort: Vec<SortConfig>,
    #[serde(rename = "groupBy")]
    pub group_by: Option<SortConfig>,
    pub limit: Option<usize>,
}

/// A property plus a direction, used by both `sort` and `groupBy`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SortConfig {
    pub property: String,
    pub direction: String,
}

impl SortConfig {
    pub fn direction(&self) -> Direction {
        Direction::from_name(&self.direction)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PropertyConfig {
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
}

impl BaseFile {
    /// Parse `.base` YAML. An empty file is an empty base.
    pub fn parse(yaml: &str, path: &Path) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| KilnError::InvalidBase {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// The named view, or the first one when `name` is `None`.
    pub fn view(&self, name: Option<&str>) -> Option<&ViewConfig> {
        match name {
            Some(name) => self
                .views
                .iter()
                .find(|v| v.name.eq_ignore_ascii_case(name)),
            None => self.views.first(),
        }
    }

    fn column_title(&self, field: &str) -> String {
        if let Some(title) = self
            .properties
            .get(field)
            .and_then(|p| p.display_name.clone())
        {
            return title;
        }
        match field {
            "file" | "file.name" | "file.stem" | "file.basename" => "Name".to_string(),
            _ => field
                .strip_prefix("note.")
                .or_else(|| field.strip_prefix("file."))
                .unwrap_or(field)
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub field: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewRow {
    /// Public address of the note.
    pub address: String,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewGroup {
    /// Group key, empty for an ungrouped view.
    pub key: String,
    pub rows: Vec<ViewRow>,
}

/// The evaluated view, ready for output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewResult {
    pub name: String,
    pub view_type: String,
    pub columns: Vec<Column>,
    pub groups: Vec<ViewGroup>,
}

impl ViewResult {
    pub fn row_count(&self) -> usize {
        self.groups.iter().map(|g| g.rows.len()).sum()
    }
}

/// Evaluate a view over the markdown notes of the vault: base filters, view
/// filters, sort, limit, then grouping.
pub fn apply_view(notes: &[Note], base: &BaseFile, view: Option<&ViewConfig>) -> ViewResult {
    let default_view = ViewConfig::default();
    let view = view.unwrap_or(&default_view);

    let markdown = notes.iter().filter(|n| n.kind == NoteKind::Markdown);
    let selected = filter_notes(markdown, &base.filters);
    let mut selected = filter_notes(selected, &view.filters);

    // Later keys are secondary: sort by them first, stable sorts keep it
    for sort in view.sort.iter().rev() {
        sort_notes(&mut selected, &sort.property, sort.direction());
    }
    if let Some(limit) = view.limit {
        selected.truncate(limit);
    }

    let fields: Vec<String> = if view.order.is_empty() {
        vec![DEFAULT_COLUMN.to_string()]
    } else {
        view.order.clone()
    };
    let columns = fields
        .iter()
        .map(|field| Column {
            field: field.clone(),
            title: base.column_title(field),
        })
        .collect();

    let to_rows = |notes: &[&Note]| -> Vec<ViewRow> {
        notes
            .iter()
            .map(|note| ViewRow {
                address: note.web_path.clone(),
                cells: fields
                    .iter()
                    .map(|field| field_value(note, field).to_string())
                    .collect(),
            })
            .collect()
    };

    let groups = match view.group_by.as_ref().filter(|g| !g.property.is_empty()) {
        Some(group) => group_by(&selected, &group.property, group.direction())
            .into_iter()
            .map(|g| ViewGroup {
                rows: to_rows(&g.notes),
                key: g.key,
            })
            .collect(),
        None => vec![ViewGroup {
            key: String::new(),
            rows: to_rows(&selected),
        }],
    };

    let result = ViewResult {
        name: view.name.clone(),
        view_type: if view.view_type.is_empty() {
            "table".to_string()
        } else {
            view.view_type.clone()
        },
        columns,
        groups,
    };
    log::debug!(
        "View {:?} selected {} notes",
        result.name,
        result.row_count()
    );
    result
}

// ============================================================================
// HTML
// ============================================================================

fn cell_html(column: &Column, row: &ViewRow, value: &str) -> String {
    if LINK_COLUMNS.contains(&column.field.as_str()) {
        format!(
            "<a href=\"{}\" class=\"internal-link\">{}</a>",
            escape_html(&row.address),
            escape_html(value)
        )
    } else {
        escape_html(value)
    }
}

fn table_html(result: &ViewResult, group: &ViewGroup) -> String {
    let mut html = String::from("<table class=\"base-table\">\n<thead><tr>");
    for column in &result.columns {
        html.push_str(&format!("<th>{}</th>", escape_html(&column.title)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in &group.rows {
        html.push_str("<tr>");
        for (column, value) in result.columns.iter().zip(&row.cells) {
            html.push_str(&format!("<td>{}</td>", cell_html(column, row, value)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>");
    html
}

fn list_html(result: &ViewResult, group: &ViewGroup) -> String {
    let mut html = String::from("<ul class=\"base-list\">\n");
    for row in &group.rows {
        let parts: Vec<String> = result
            .columns
            .iter()
            .zip(&row.cells)
            .filter(|(_, value)| !value.is_empty())
            .map(|(column, value)| cell_html(column, row, value))
            .collect();
        html.push_str(&format!("<li>{}</li>\n", parts.join(" &middot; ")));
    }
    html.push_str("</ul>");
    html
}

fn cards_html(result: &ViewResult, group: &ViewGroup) -> String {
    let mut html = String::from("<div class=\"base-cards\">\n");
    for row in &group.rows {
        html.push_str("<div class=\"base-card\">");
        for (column, value) in result.columns.iter().zip(&row.cells) {
            html.push_str(&format!(
                "<div class=\"base-card-field\"><span class=\"base-card-label\">{}</span> {}</div>",
                escape_html(&column.title),
                cell_html(column, row, value)
            ));
        }
        html.push_str("</div>\n");
    }
    html.push_str("</div>");
    html
}

/// Render an evaluated view as an HTML fragment.
pub fn render_view(result: &ViewResult) -> String {
    let mut html = format!(
        "<div class=\"base-view\" data-view-type=\"{}\">\n",
        escape_html(&result.view_type)
    );
    if !result.name.is_empty() {
        html.push_str(&format!(
            "<h2 class=\"base-view-title\">{}</h2>\n",
            escape_html(&result.name)
        ));
    }
    for group in &result.groups {
        if !group.key.is_empty() {
            html.push_str(&format!(
                "<h3 class=\"base-group-title\">{}</h3>\n",
                escape_html(&group.key)
            ));
        }
        let body = match result.view_type.as_str() {
            "list" => list_html(result, group),
            "cards" => cards_html(result, group),
            _ => table_html(result, group),
        };
        html.push_str(&body);
        html.push('\n');
    }
    html.push_str("</div>");
    html
}

/// Render every view of a base file.
pub fn render_base(notes: &[Note], base: &BaseFile) -> String {
    if base.views.is_empty() {
        return render_view(&apply_view(notes, base, None));
    }
    base.views
        .iter()
        .map(|view| render_view(&apply_view(notes, base, Some(view))))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BASE: &str = r#"
filters:
  and:
    - 'file.hasTag("project")'
views:
  - type: table
    name: Active
    order: [file.name, status, priority]
    filters:
      not: ['status == "done"']
    sort:
      - property: priority
        direction: DESC
  - type: list
    name: By status
    order: [file.stem, status]
    groupBy:
      property: status
      direction: ASC
properties:
  status:
    displayName: Status
"#;

    fn notes() -> Vec<Note> {
        vec![
            Note::new("Alpha.md", "---\nstatus: open\npriority: 1\ntags: [project]\n---\n"),
            Note::new("Beta.md", "---\nstatus: done\npriority: 5\ntags: [project]\n---\n"),
            Note::new("Gamma.md", "---\nstatus: open\npriority: 3\ntags: [project]\n---\n"),
            Note::new("Delta.md", "---\nstatus: open\npriority: 9\n---\n"),
            Note::new("Board.canvas", "{}"),
        ]
    }

    fn base() -> BaseFile {
        BaseFile::parse(BASE, Path::new("Projects.base")).unwrap()
    }

    #[test]
    fn test_parse_base() {
        let base = base();
        assert_eq!(base.filters.and.len(), 1);
        assert_eq!(base.views.len(), 2);
        assert_eq!(base.views[0].sort[0].direction(), Direction::Desc);
        assert_eq!(
            base.views[1].group_by.as_ref().map(|g| g.property.as_str()),
            Some("status")
        );
        assert_eq!(base.view(Some("by STATUS")).map(|v| v.view_type.as_str()), Some("list"));
        assert!(base.view(Some("missing")).is_none());
    }

    #[test]
    fn test_parse_errors() {
        let err = BaseFile::parse("views: 3", Path::new("Bad.base")).unwrap_err();
        assert!(matches!(err, KilnError::InvalidBase { .. }));
        assert!(BaseFile::parse("  \n", Path::new("Empty.base")).unwrap().views.is_empty());
    }

    #[test]
    fn test_table_view() {
        let base = base();
        let result = apply_view(&notes(), &base, base.view(None));
        assert_eq!(result.name, "Active");
        assert_eq!(
            result.columns.iter().map(|c| c.title.as_str()).collect::<Vec<_>>(),
            vec!["Name", "Status", "priority"]
        );
        assert_eq!(result.groups.len(), 1);
        let cells: Vec<_> = result.groups[0].rows.iter().map(|r| r.cells.clone()).collect();
        assert_eq!(
            cells,
            vec![
                vec!["Gamma".to_string(), "open".to_string(), "3".to_string()],
                vec!["Alpha".to_string(), "open".to_string(), "1".to_string()],
            ]
        );
    }

    #[test]
    fn test_grouped_list_view() {
        let base = base();
        let result = apply_view(&notes(), &base, base.view(Some("By status")));
        let keys: Vec<_> = result.groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["done", "open"]);
        assert_eq!(result.row_count(), 3);

        let html = render_view(&result);
        assert!(html.contains("<h3 class=\"base-group-title\">open</h3>"));
        assert!(html.contains("<ul class=\"base-list\">"));
        assert!(html.contains("class=\"internal-link\">Beta</a> &middot; done"));
    }

    #[test]
    fn test_default_view_and_limit() {
        let base = BaseFile::default();
        let result = apply_view(&notes(), &base, None);
        assert_eq!(result.view_type, "table");
        assert_eq!(result.row_count(), 4);
        // The default column shows the display name, without the extension
        assert_eq!(result.groups[0].rows[0].cells, vec!["Alpha".to_string()]);

        let limited = ViewConfig {
            limit: Some(2),
            ..ViewConfig::default()
        };
        assert_eq!(apply_view(&notes(), &base, Some(&limited)).row_count(), 2);
    }

    #[test]
    fn test_render_table_escapes() {
        let notes = vec![Note::new("A & B.md", "---\nnote: <b>\n---\n")];
        let base = BaseFile::parse("views:\n  - order: [file.stem, note]\n", Path::new("x.base")).unwrap();
        let html = render_base(&notes, &base);
        assert!(html.contains("<thead><tr><th>Name</th><th>note</th></tr></thead>"));
        assert!(html.contains("class=\"internal-link\">A &amp; B</a></td><td>&lt;b&gt;</td>"));
    }
}
