//! # Metadata Records
//!
//! A [`MetadataRecord`] is the typed key/value bag attached to one entry.
//!
//! ## Sparse Storage
//!
//! Only values that differ from their schema default are stored. An absent
//! field resolves to the default, so a freshly scanned game costs one
//! `String` (its name) and an empty map. `name` is the exception: it is
//! always present and defaults to the entry's filename stem.
//!
//! ## Dirty Tracking
//!
//! `dirty` means "differs from what was last flushed to the gamelist". It
//! is only raised by a write that actually changes the resolved value:
//! setting `favorite` to `"TRUE"` on an entry that is already a favorite is
//! a no-op. Loading a gamelist never raises it; replaying a recovery
//! fragment does (the store decides that, not the record).
//!
//! ## Paths
//!
//! `Path` fields keep whatever text they were given. They are resolved
//! against the library root only when asked ([`MetadataRecord::resolved_path`])
//! and rewritten relative to the root when serialized.

use crate::document::Element;
use crate::error::{Result, StoreError};
use crate::paths;
use crate::schema::{canonicalize, format_time, parse_time, AssetMask, FieldId, FieldType, Schema};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct MetadataRecord {
    schema: Arc<Schema>,
    name: String,
    values: BTreeMap<FieldId, String>,
    dirty: bool,
}

impl MetadataRecord {
    pub fn new(schema: Arc<Schema>, name: impl Into<String>) -> Self {
        Self {
            schema,
            name: name.into(),
            values: BTreeMap::new(),
            dirty: false,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// The stored value, or the schema default when absent.
    ///
    /// Fields the schema does not declare for this kind read as `""`.
    pub fn get(&self, id: FieldId) -> &str {
        if id == FieldId::Name {
            return &self.name;
        }
        match self.values.get(&id) {
            Some(value) => value,
            None => self.schema.default_of(id),
        }
    }

    pub fn get_by_key(&self, key: &str) -> Option<&str> {
        self.schema.by_key(key).map(|decl| self.get(decl.id))
    }

    /// True when `id` holds a non-default value.
    pub fn is_present(&self, id: FieldId) -> bool {
        self.values.contains_key(&id)
    }

    /// True when any field other than `name` differs from its default.
    pub fn has_non_default_fields(&self) -> bool {
        !self.values.is_empty()
    }

    pub fn get_bool(&self, id: FieldId) -> bool {
        self.get(id) == "true"
    }

    pub fn get_int(&self, id: FieldId) -> i64 {
        self.get(id).parse().unwrap_or(0)
    }

    pub fn get_rating(&self, id: FieldId) -> f32 {
        self.get(id).parse().unwrap_or(0.0)
    }

    pub fn get_time(&self, id: FieldId) -> Option<NaiveDateTime> {
        parse_time(self.get(id))
    }

    /// Resolves a `Path` field against `root`. Empty values resolve to `None`.
    pub fn resolved_path(&self, id: FieldId, root: &Path) -> Option<PathBuf> {
        let decl = self.schema.get(id)?;
        if decl.ty != FieldType::Path {
            return None;
        }
        let value = self.get(id);
        if value.is_empty() {
            None
        } else {
            Some(paths::resolve(root, value))
        }
    }

    /// Sets a field, returning whether the resolved value changed.
    ///
    /// The value is canonicalised for the field's type first. Only a real
    /// change marks the record dirty. Fields this kind does not declare are
    /// ignored.
    pub fn set(&mut self, id: FieldId, value: impl AsRef<str>) -> bool {
        let changed = self.apply(id, value.as_ref());
        if changed {
            self.dirty = true;
        }
        changed
    }

    pub fn set_by_key(&mut self, key: &str, value: impl AsRef<str>) -> Result<bool> {
        let id = self
            .schema
            .by_key(key)
            .map(|decl| decl.id)
            .ok_or_else(|| StoreError::UnknownField(key.to_string()))?;
        Ok(self.set(id, value))
    }

    pub fn set_bool(&mut self, id: FieldId, value: bool) -> bool {
        self.set(id, if value { "true" } else { "false" })
    }

    pub fn set_int(&mut self, id: FieldId, value: i64) -> bool {
        self.set(id, value.to_string())
    }

    pub fn set_time(&mut self, id: FieldId, value: NaiveDateTime) -> bool {
        self.set(id, format_time(&value))
    }

    /// Copies scraped data from `source`.
    ///
    /// Statistics are never copied, nor are media fields whose category is
    /// missing from `assets`. Only fields the source actually carries are
    /// taken, so an import cannot blank out existing data.
    pub fn import_from(&mut self, source: &MetadataRecord, assets: AssetMask) -> usize {
        let mut changed = 0;
        for decl in source.schema.fields() {
            if decl.is_statistic || !self.schema.contains(decl.id) {
                continue;
            }
            if let Some(kind) = decl.asset {
                if !assets.contains(kind) {
                    continue;
                }
            }
            let carried = if decl.id == FieldId::Name {
                !source.name.is_empty()
            } else {
                source.is_present(decl.id)
            };
            if carried && self.set(decl.id, source.get(decl.id)) {
                changed += 1;
            }
        }
        changed
    }

    /// Appends one child element per field to `node`.
    ///
    /// `name` is always written. With `skip_defaults` only non-default
    /// fields follow it; otherwise every declared field is written. `Path`
    /// values are rewritten relative to `relative_base`.
    pub fn serialize(&self, node: &mut Element, skip_defaults: bool, relative_base: &Path) {
        for decl in self.schema.fields() {
            if decl.id == FieldId::Name {
                node.push_text_child(decl.key, self.name.as_str());
                continue;
            }
            if skip_defaults && !self.is_present(decl.id) {
                continue;
            }
            let value = self.get(decl.id);
            if decl.ty == FieldType::Path && !value.is_empty() {
                let resolved = paths::resolve(relative_base, value);
                node.push_text_child(decl.key, paths::relative_to(relative_base, &resolved));
            } else {
                node.push_text_child(decl.key, value);
            }
        }
    }

    /// Reads every declared field found among `node`'s children.
    ///
    /// Unknown elements are ignored. Returns how many declared fields were
    /// found; the dirty flag is left alone.
    pub fn deserialize(&mut self, node: &Element) -> usize {
        let mut found = 0;
        for child in &node.children {
            let Some(id) = self.schema.by_key(&child.name).map(|decl| decl.id) else {
                continue;
            };
            found += 1;
            self.apply(id, &child.text);
        }
        found
    }

    /// Drops every stored value and renames the record, leaving it as a
    /// fresh entry would be. The dirty flag is left alone.
    pub(crate) fn reset(&mut self, name: impl Into<String>) {
        self.values.clear();
        self.name = name.into();
    }

    fn apply(&mut self, id: FieldId, raw: &str) -> bool {
        let Some(decl) = self.schema.get(id) else {
            debug!(field = ?id, "field not declared for this entry kind");
            return false;
        };
        let value = canonicalize(decl.ty, raw);

        if id == FieldId::Name {
            if self.name == value {
                return false;
            }
            self.name = value;
            return true;
        }

        if self.get(id) == value {
            return false;
        }
        if value == decl.default {
            self.values.remove(&id);
        } else {
            self.values.insert(id, value);
        }
        true
    }
}
