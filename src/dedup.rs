//! URL-keyed deduplication across a batch.

use std::collections::HashSet;

use crate::models::ProductRecord;

/// Drop every record whose URL was already seen, keeping the first one and
/// the original order. Records without a URL are all kept.
///
/// Returns the number of records removed.
pub fn dedup_by_url(records: &mut Vec<ProductRecord>) -> usize {
    let before = records.len();
    let mut seen: HashSet<String> = HashSet::with_capacity(before);
    records.retain(|record| record.url.is_empty() || seen.insert(record.url.clone()));
    before - records.len()
}
