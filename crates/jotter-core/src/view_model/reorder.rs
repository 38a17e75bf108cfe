//! List move semantics shared by drag-and-drop style reordering.

use crate::error::{Error, Result};

/// Move the elements at `from_offsets` so they sit at `to_offset`.
///
/// `to_offset` indexes the list *before* the moved elements are taken out
/// (`0..=len`), matching drag-and-drop list APIs. Moved elements keep their
/// relative order, as do all others.
pub fn move_offsets<T: Clone>(items: &[T], from_offsets: &[usize], to_offset: usize) -> Result<Vec<T>> {
    if to_offset > items.len() {
        return Err(Error::InvalidInput(format!(
            "destination {to_offset} is out of range for {} notes",
            items.len()
        )));
    }

    let mut offsets = from_offsets.to_vec();
    offsets.sort_unstable();
    offsets.dedup();
    if let Some(&bad) = offsets.iter().find(|&&offset| offset >= items.len()) {
        return Err(Error::InvalidInput(format!(
            "position {bad} is out of range for {} notes",
            items.len()
        )));
    }

    let moving: Vec<T> = offsets.iter().map(|&offset| items[offset].clone()).collect();
    let mut remaining: Vec<T> = items
        .iter()
        .enumerate()
        .filter(|(index, _)| offsets.binary_search(index).is_err())
        .map(|(_, item)| item.clone())
        .collect();

    let shift = offsets.iter().filter(|&&offset| offset < to_offset).count();
    let insert_at = to_offset - shift;
    remaining.splice(insert_at..insert_at, moving);
    Ok(remaining)
}
