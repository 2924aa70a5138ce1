//! Aggregate mode: deep-merging every resource into one dictionary.
//!
//! Merging is reference-preserving: when the accumulator has no value for a
//! key, it takes the incoming value itself, so a nested [`Dictionary`] in the
//! result is the very handle some source exported. Sequences are never merged
//! element-wise; a later sequence replaces an earlier one.

use dl_core::{Dictionary, Resource};
use tracing::trace;

use crate::error::ScanError;
use crate::walker::{ScanEntry, ScanTree};

/// Deep-merges `incoming` into `acc` in place.
///
/// Per key: two dictionaries merge recursively (into the existing nested
/// dictionary); anything else replaces the existing value. A missing key
/// takes the incoming value unchanged.
///
/// # Examples
///
/// ```
/// use dl_core::Resource;
/// use dl_scanner::merge_into;
/// use serde_json::json;
///
/// let acc = Resource::from(json!({ "a": { "x": 1 }, "arr": [1, 2, 3] }));
/// let incoming = Resource::from(json!({ "a": { "y": 2 }, "arr": [9] }));
/// let (Some(acc), Some(incoming)) = (acc.as_dict(), incoming.as_dict()) else {
///     unreachable!();
/// };
///
/// merge_into(acc, incoming);
/// assert_eq!(acc.to_json(), json!({ "a": { "x": 1, "y": 2 }, "arr": [9] }));
/// ```
pub fn merge_into(acc: &Dictionary, incoming: &Dictionary) {
    if acc.ptr_eq(incoming) {
        return;
    }

    for (key, value) in incoming.entries() {
        match (acc.get(&key), value) {
            (Some(Resource::Dict(existing)), Resource::Dict(nested)) => {
                merge_into(&existing, &nested);
            }
            (_, value) => {
                acc.insert(key, value);
            }
        }
    }
}

/// Merges every top-level resource of `tree` into a fresh dictionary, in
/// tree order.
///
/// Unvisited directories and absent values are skipped; directory subtrees
/// count as dictionaries.
///
/// # Errors
///
/// Returns [`ScanError::InvalidAggregateSource`] for the first resource that
/// is not a dictionary.
pub fn aggregate(tree: ScanTree) -> Result<Dictionary, ScanError> {
    let acc = Dictionary::new();

    for (key, entry) in tree.into_entries() {
        let source = match entry {
            ScanEntry::Unvisited | ScanEntry::Loaded(Resource::Absent) => continue,
            ScanEntry::Loaded(Resource::Dict(dict)) => dict,
            ScanEntry::Directory(subtree) => subtree.to_dictionary(),
            other => {
                return Err(ScanError::InvalidAggregateSource {
                    key,
                    kind: other.kind(),
                });
            }
        };

        trace!(key = %key, entries = source.len(), "Merging aggregate source");
        merge_into(&acc, &source);
    }

    Ok(acc)
}
