//! Ancestry path maintenance for hierarchical tasks.

/// Removes repeated elements, keeping first occurrences in order.
#[must_use]
pub fn dedup<T: Clone + PartialEq>(items: &[T]) -> Vec<T> {
    let mut unique: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !unique.contains(item) {
            unique.push(item.clone());
        }
    }
    unique
}

/// Places `parent` immediately before `current` in an ancestry path.
///
/// An empty `path` yields `[parent, current]` (or `[current]` when both are
/// equal). Otherwise every other occurrence of `parent` is dropped and the
/// remaining order is kept. Applying the function twice gives the same
/// result as applying it once.
#[must_use]
pub fn patch_ancestry<T: Clone + PartialEq>(parent: &T, current: &T, path: &[T]) -> Vec<T> {
    if path.is_empty() {
        return dedup(&[parent.clone(), current.clone()]);
    }

    let mut patched = Vec::with_capacity(path.len() + 1);
    for element in dedup(path) {
        if element == *current {
            patched.push(parent.clone());
        }
        if element != *parent {
            patched.push(element);
        }
    }
    patched
}
