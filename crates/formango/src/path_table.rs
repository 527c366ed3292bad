//! Bidirectional mapping between field identities and their current paths.

use formango_path::Path;
use indexmap::IndexMap;

use crate::id::FieldId;
use crate::reactive::Revision;

/// Sole source of truth for where a registered field currently lives.
///
/// Entries keep registration order. Lookups by path scan the table; paths
/// are unique except transiently while a move rewrites them.
#[derive(Debug, Default)]
pub(crate) struct PathTable {
    entries: IndexMap<FieldId, Path>,
    revision: Revision,
}

impl PathTable {
    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn id_of(&self, path: &Path) -> Option<&FieldId> {
        self.entries.iter().find(|(_, p)| *p == path).map(|(id, _)| id)
    }

    pub fn path_of(&self, id: &FieldId) -> Option<&Path> {
        self.entries.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldId, &Path)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Look up the identity registered for `path`, or create one with `fresh_id`.
    ///
    /// Returns the identity and whether it was newly created.
    pub fn register_or_lookup(&mut self, path: &Path, fresh_id: impl FnOnce() -> FieldId) -> (FieldId, bool) {
        if let Some(id) = self.id_of(path) {
            return (id.clone(), false);
        }
        let id = fresh_id();
        self.insert(id.clone(), path.clone());
        (id, true)
    }

    pub fn insert(&mut self, id: FieldId, path: Path) {
        self.entries.insert(id, path);
        self.revision.bump();
    }

    pub fn set_path(&mut self, id: &FieldId, path: Path) {
        if let Some(slot) = self.entries.get_mut(id) {
            if *slot != path {
                *slot = path;
                self.revision.bump();
            }
        }
    }

    pub fn remove(&mut self, id: &FieldId) -> Option<Path> {
        let removed = self.entries.shift_remove(id);
        if removed.is_some() {
            self.revision.bump();
        }
        removed
    }

    /// Identities whose path is a strict descendant of `ancestor`.
    pub fn descendants_of(&self, ancestor: &Path) -> Vec<FieldId> {
        self.entries
            .iter()
            .filter(|(_, path)| path.is_descendant_of(ancestor))
            .map(|(id, _)| id.clone())
            .collect()
    }
}
