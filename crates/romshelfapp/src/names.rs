//! Canonical title lookup for arcade-style libraries, whose files are named
//! after short set names (`sf2.zip`) rather than titles.

use std::collections::HashMap;

pub trait TitleLookup {
    fn canonical_title(&self, short_name: &str) -> Option<String>;
}

/// Lookup that knows no titles.
pub struct NoTitles;

impl TitleLookup for NoTitles {
    fn canonical_title(&self, _short_name: &str) -> Option<String> {
        None
    }
}

impl TitleLookup for HashMap<String, String> {
    fn canonical_title(&self, short_name: &str) -> Option<String> {
        self.get(short_name).cloned()
    }
}
