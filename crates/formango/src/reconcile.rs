//! Path table rewrites for structural array mutations.
//!
//! Removing, inserting or swapping array elements changes the index segment
//! of every registered path below the touched elements. These functions
//! rewrite the table so each identity keeps pointing at the same logical
//! element, including arbitrarily nested sub-paths.

use formango_path::{Path, PathStep};
use tracing::trace;

use crate::id::FieldId;
use crate::path_table::PathTable;

/// Index segment of `path` right below `array`, if `path` lives inside it.
fn element_index(path: &Path, array: &Path) -> Option<usize> {
    path.step_after(array).and_then(PathStep::as_index)
}

/// Rewrite the table for the removal of `array.index`.
///
/// Every entry at `array.index` or below it is deleted; entries under a
/// higher index move down by one, keeping their suffix. Returns the deleted
/// identities.
pub(crate) fn remove_index(table: &mut PathTable, array: &Path, index: usize) -> Vec<FieldId> {
    let position = array.len();
    let mut removed = Vec::new();
    let mut moved = Vec::new();
    for (id, path) in table.iter() {
        match element_index(path, array) {
            Some(i) if i == index => removed.push(id.clone()),
            Some(i) if i > index => moved.push((id.clone(), path.with_step(position, PathStep::Index(i - 1)))),
            _ => {}
        }
    }
    for id in &removed {
        table.remove(id);
    }
    for (id, path) in moved {
        trace!(%id, %path, "renumbered after removal");
        table.set_path(&id, path);
    }
    removed
}

/// Rewrite the table for an insertion at `array.index`: entries at that
/// index or above move up by one.
pub(crate) fn insert_index(table: &mut PathTable, array: &Path, index: usize) {
    let position = array.len();
    let moved: Vec<_> = table
        .iter()
        .filter_map(|(id, path)| match element_index(path, array) {
            Some(i) if i >= index => Some((id.clone(), path.with_step(position, PathStep::Index(i + 1)))),
            _ => None,
        })
        .collect();
    for (id, path) in moved {
        trace!(%id, %path, "renumbered after insertion");
        table.set_path(&id, path);
    }
}

/// Rewrite the table for swapping `array.from` and `array.to`.
///
/// Prefixes are compared segment by segment, so swapping index 1 never
/// touches paths under index 10. All new paths are computed from the table
/// as it was before the swap.
pub(crate) fn swap_indices(table: &mut PathTable, array: &Path, from: usize, to: usize) {
    let from_path = array.child(from);
    let to_path = array.child(to);
    let from_id = table.id_of(&from_path).cloned();
    let to_id = table.id_of(&to_path).cloned();

    let moved: Vec<_> = table
        .iter()
        .filter_map(|(id, path)| {
            path.replace_prefix(&from_path, &to_path)
                .or_else(|| path.replace_prefix(&to_path, &from_path))
                .map(|new_path| (id.clone(), new_path))
        })
        .collect();
    for (id, path) in moved {
        trace!(%id, %path, "relocated by swap");
        table.set_path(&id, path);
    }

    // The element entries themselves get their swapped targets last.
    if let Some(id) = from_id {
        table.set_path(&id, to_path.clone());
    }
    if let Some(id) = to_id {
        table.set_path(&id, from_path);
    }
}

/// The element paths that must be registered alongside `path`.
///
/// For every index segment of `path` except a trailing one, the path
/// truncated right after that segment, innermost first: `a.0.b.1.c` yields
/// `a.0.b.1` then `a.0`.
pub(crate) fn parent_element_paths(path: &Path) -> Vec<Path> {
    let steps = path.steps();
    (0..steps.len().saturating_sub(1))
        .rev()
        .filter(|&i| steps[i].is_index())
        .map(|i| path.truncate(i + 1))
        .collect()
}
