//! # Rendering Module
//!
//! Every command builds a `serde_json::Value` first. With `--json` that value
//! is printed as is; otherwise it is laid out as plain text here. Nothing in
//! this module touches the store.
//!
//! ## List Layout
//!
//! One row per displayed entry:
//! - marker (2 chars): `/` for folders, `*` for favorites, blank otherwise
//! - record name (fill); the arcade title only appears in `--json`
//! - playcount (right-aligned) for games that have been played

use romshelfapp::names::TitleLookup;
use romshelfapp::schema::{FieldId, Schema};
use romshelfapp::store::{LoadReport, SaveReport};
use romshelfapp::tree::{Catalog, EntryId, EntryKind};
use serde::Serialize;
use serde_json::{json, Map, Value};

pub const COL_MARKER: usize = 2;
pub const LINE_WIDTH: usize = 72;

fn kind_label(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Game => "game",
        EntryKind::Folder => "folder",
        EntryKind::Placeholder => "placeholder",
    }
}

/// An entry with its non-default fields.
pub fn entry_value(catalog: &Catalog, id: EntryId, titles: &dyn TitleLookup) -> Value {
    let entry = catalog.entry(id);
    let record = catalog.record(id);
    let mut fields = Map::new();
    for decl in record.schema().fields() {
        if decl.id != FieldId::Name && record.is_present(decl.id) {
            fields.insert(decl.key.to_string(), Value::String(record.get(decl.id).to_string()));
        }
    }
    json!({
        "path": catalog.path(id).to_string_lossy(),
        "kind": entry.map(|e| kind_label(e.kind())).unwrap_or("gone"),
        "name": record.name(),
        "title": catalog.display_name(id, titles),
        "dirty": record.is_dirty(),
        "fields": fields,
    })
}

pub fn render_list(values: &[Value], json: bool) -> String {
    if json {
        return pretty(&Value::Array(values.to_vec()));
    }
    if values.is_empty() {
        return "(nothing to show)\n".to_string();
    }
    let mut out = String::new();
    for value in values {
        let fields = &value["fields"];
        let marker = if value["kind"] == "folder" {
            "/"
        } else if fields["favorite"] == "true" {
            "*"
        } else {
            ""
        };
        let name = value["name"].as_str().unwrap_or_default();
        let plays = fields["playcount"].as_str().unwrap_or_default();
        let width = LINE_WIDTH - COL_MARKER;
        out.push_str(&format!(
            "{marker:<COL_MARKER$}{name:<width$}{plays:>6}\n",
            width = width.saturating_sub(6)
        ));
    }
    out
}

/// Every declared field of an entry, defaults included.
pub fn render_entry(catalog: &Catalog, id: EntryId, titles: &dyn TitleLookup, json: bool) -> String {
    let record = catalog.record(id);
    if json {
        let mut value = entry_value(catalog, id, titles);
        let all: Map<String, Value> = record
            .schema()
            .fields()
            .iter()
            .map(|decl| (decl.key.to_string(), Value::String(record.get(decl.id).to_string())))
            .collect();
        value["fields"] = Value::Object(all);
        return pretty(&value);
    }

    let mut out = format!("{}\n", catalog.path(id).display());
    let width = record
        .schema()
        .fields()
        .iter()
        .map(|decl| decl.key.len())
        .max()
        .unwrap_or(0);
    for decl in record.schema().fields() {
        let marker = if decl.id == FieldId::Name || record.is_present(decl.id) {
            " "
        } else {
            "~"
        };
        out.push_str(&format!(
            "{marker} {key:<width$}  {value}\n",
            key = decl.key,
            value = record.get(decl.id)
        ));
    }
    if record.is_dirty() {
        out.push_str("(unsaved changes)\n");
    }
    out
}

pub fn render_fields(schema: &Schema, json: bool) -> String {
    if json {
        let fields: Vec<Value> = schema
            .fields()
            .iter()
            .map(|decl| {
                json!({
                    "key": decl.key,
                    "type": format!("{:?}", decl.ty),
                    "default": decl.default,
                    "statistic": decl.is_statistic,
                    "label": decl.display_name,
                })
            })
            .collect();
        return pretty(&Value::Array(fields));
    }
    let mut out = String::new();
    for decl in schema.fields() {
        let stat = if decl.is_statistic { " (statistic)" } else { "" };
        out.push_str(&format!(
            "{:<14}{:<16}{:?} = {:?}{}\n",
            decl.key, decl.display_name, decl.ty, decl.default, stat
        ));
    }
    out
}

#[derive(Debug, Serialize)]
pub struct StatusRow {
    pub library: String,
    pub games: usize,
    pub dirty: usize,
    pub fragments: usize,
    pub load: LoadReport,
}

pub fn render_status(rows: &[StatusRow], json: bool) -> String {
    if json {
        return pretty(&serde_json::to_value(rows).unwrap_or(Value::Null));
    }
    let mut out = String::new();
    for row in rows {
        out.push_str(&format!(
            "{}: {} games, {} dirty, {} journaled{}\n",
            row.library,
            row.games,
            row.dirty,
            row.fragments,
            if row.load.malformed { " (gamelist malformed)" } else { "" }
        ));
    }
    out
}

pub fn render_save(results: &[(String, SaveReport)], json: bool) -> String {
    if json {
        let value: Vec<Value> = results
            .iter()
            .map(|(library, report)| json!({ "library": library, "report": report }))
            .collect();
        return pretty(&Value::Array(value));
    }
    let mut out = String::new();
    for (library, report) in results {
        let line = if report.skipped {
            format!("{library}: skipped\n")
        } else if report.document_written {
            format!(
                "{library}: saved {} entries ({} replaced)\n",
                report.written, report.removed
            )
        } else {
            format!("{library}: nothing to save\n")
        };
        out.push_str(&line);
    }
    out
}

pub fn render_message(message: &str, value: Value, json: bool) -> String {
    if json {
        pretty(&value)
    } else {
        format!("{message}\n")
    }
}

fn pretty(value: &Value) -> String {
    let mut text = serde_json::to_string_pretty(value).unwrap_or_default();
    text.push('\n');
    text
}
