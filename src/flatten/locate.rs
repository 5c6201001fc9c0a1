//! Heuristics for finding the row set inside an arbitrarily shaped payload.

use crate::payload::{upsert, Payload};

/// Rows are always mappings; a bare item from a list under `key` becomes `{key: item}`.
fn as_row(key: &str, item: &Payload) -> Payload {
    match item {
        Payload::Node(_) => item.clone(),
        Payload::Leaf(_) | Payload::List(_) => Payload::Node(vec![(key.to_string(), item.clone())]),
    }
}

/// Tally reports are often column-major: sibling lists such as `DSPACCNAME` and
/// `DSPACCINFO` hold one entry per row. The longest non-empty sibling lists are
/// zipped positionally; later lists overwrite fields of the same name.
///
/// Returns an empty vector when `payload` is not a mapping or has no non-empty list.
pub fn merge_parallel_lists(payload: &Payload) -> Vec<Payload> {
    let entries = match payload {
        Payload::Node(entries) => entries,
        Payload::Leaf(_) | Payload::List(_) => return Vec::new(),
    };

    let lists: Vec<(&str, &[Payload])> = entries
        .iter()
        .filter_map(|(key, value)| match value {
            Payload::List(items) if !items.is_empty() => Some((key.as_str(), items.as_slice())),
            _ => None,
        })
        .collect();

    let max_len = match lists.iter().map(|(_, items)| items.len()).max() {
        Some(len) => len,
        None => return Vec::new(),
    };
    let selected: Vec<(&str, &[Payload])> = lists
        .into_iter()
        .filter(|(_, items)| items.len() == max_len)
        .collect();

    if let [(key, items)] = selected.as_slice() {
        return items.iter().map(|item| as_row(key, item)).collect();
    }

    (0..max_len)
        .map(|i| {
            let mut merged: Vec<(String, Payload)> = Vec::new();
            for (key, items) in &selected {
                match &items[i] {
                    Payload::Node(fields) => {
                        for (field, value) in fields {
                            upsert(&mut merged, field.clone(), value.clone());
                        }
                    }
                    other @ (Payload::Leaf(_) | Payload::List(_)) => {
                        upsert(&mut merged, *key, other.clone());
                    }
                }
            }
            Payload::Node(merged)
        })
        .collect()
}

fn longest(candidates: impl Iterator<Item = Vec<Payload>>) -> Vec<Payload> {
    candidates.fold(Vec::new(), |best, candidate| {
        if candidate.len() > best.len() {
            candidate
        } else {
            best
        }
    })
}

/// Depth-first search for the largest row set. A list whose first item is a
/// mapping is taken as-is; at a mapping, a parallel merge of more than one row
/// wins over descending further. Ties keep the first one found.
pub fn find_longest_list(payload: &Payload) -> Vec<Payload> {
    match payload {
        Payload::List(items) => {
            if let Some(Payload::Node(_)) = items.first() {
                return items.clone();
            }
            longest(items.iter().map(find_longest_list))
        }
        Payload::Node(entries) => {
            let merged = merge_parallel_lists(payload);
            if merged.len() > 1 {
                return merged;
            }
            longest(entries.iter().map(|(_, value)| find_longest_list(value)))
        }
        Payload::Leaf(_) => Vec::new(),
    }
}
