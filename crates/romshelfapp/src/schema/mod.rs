//! # Metadata Schema
//!
//! Each entry kind has a fixed, ordered list of field declarations. The
//! order is the order fields are written to gamelists; the declaration
//! carries everything generic code needs to treat a field correctly:
//!
//! | Part | Example | Used for |
//! |------|---------|----------|
//! | `id` | `FieldId::Favorite` | sparse storage key in records |
//! | `key` | `"favorite"` | XML element name |
//! | `ty` | `FieldType::Boolean` | canonicalisation on set/load |
//! | `default` | `"false"` | value of an absent field |
//! | `is_statistic` | `playcount` | excluded from scraper imports |
//!
//! ## Registry
//!
//! There is no global table. The application builds one [`SchemaRegistry`]
//! at startup and hands it (behind an `Arc`) to the catalog; every record
//! keeps a handle to the schema of its kind.

mod field;
mod value;

pub use field::{AssetKind, AssetMask, FieldDecl, FieldId, FieldType};
pub use value::{canonicalize, format_time, parse_time, TIME_FORMAT};

use std::sync::Arc;

/// Which field list a record is declared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Game,
    Folder,
}

/// Ordered field declarations for one [`RecordKind`].
#[derive(Debug)]
pub struct Schema {
    kind: RecordKind,
    fields: Vec<FieldDecl>,
    slots: [Option<u8>; FieldId::COUNT],
}

impl Schema {
    fn new(kind: RecordKind, fields: Vec<FieldDecl>) -> Self {
        let mut slots = [None; FieldId::COUNT];
        for (position, decl) in fields.iter().enumerate() {
            slots[decl.id.index()] = Some(position as u8);
        }
        Self {
            kind,
            fields,
            slots,
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Declarations in gamelist order.
    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    pub fn get(&self, id: FieldId) -> Option<&FieldDecl> {
        self.slots[id.index()].map(|slot| &self.fields[slot as usize])
    }

    pub fn contains(&self, id: FieldId) -> bool {
        self.slots[id.index()].is_some()
    }

    /// Look up a declaration by its gamelist key.
    pub fn by_key(&self, key: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|decl| decl.key == key)
    }

    /// Default for `id`, or `""` when this kind does not declare it.
    pub fn default_of(&self, id: FieldId) -> &'static str {
        self.get(id).map(|decl| decl.default).unwrap_or("")
    }
}

/// The schemas for every record kind, built once at startup.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    game: Arc<Schema>,
    folder: Arc<Schema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self {
            game: Arc::new(Schema::new(RecordKind::Game, field::game_fields())),
            folder: Arc::new(Schema::new(RecordKind::Folder, field::folder_fields())),
        }
    }

    pub fn schema(&self, kind: RecordKind) -> &Arc<Schema> {
        match kind {
            RecordKind::Game => &self.game,
            RecordKind::Folder => &self.folder,
        }
    }

    pub fn game(&self) -> &Arc<Schema> {
        &self.game
    }

    pub fn folder(&self) -> &Arc<Schema> {
        &self.folder
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}
