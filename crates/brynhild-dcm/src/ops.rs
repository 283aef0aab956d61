//! Deferred list operations.
//!
//! A list-op is queued against a path rather than applied to a source layer
//! directly, so it can be replayed on top of whatever the merged value at
//! that path turns out to be once all layers are combined.

use crate::error::{DcmError, Result};
use crate::value::DcmValue;

/// A single deferred mutation against the list living at some path.
#[derive(Debug, Clone, PartialEq)]
pub enum ListOp {
    Append(DcmValue),
    Extend(Vec<DcmValue>),
    Insert(usize, DcmValue),
    SetItem(usize, DcmValue),
    DelItem(usize),
    /// `None` pops the last item, matching Python `list.pop()`.
    Pop(Option<usize>),
    /// Removes the first item equal to the given value.
    Remove(DcmValue),
    Clear,
}

/// Replay a queue of list-ops on top of a merged base sequence.
///
/// Order: any ops at or before the last `Clear` are skipped (the log is
/// truncated there); `Append`/`Extend` run first in queued order, then the
/// positional ops (`Insert`/`SetItem`/`DelItem`/`Pop`/`Remove`) in queued
/// order, matching the reference implementation's two-pass replay so that
/// positional indices are resolved against the post-append length.
pub fn apply_list_ops(base: &[DcmValue], ops: &[ListOp], path: &[String]) -> Result<Vec<DcmValue>> {
    let start = ops
        .iter()
        .rposition(|op| matches!(op, ListOp::Clear))
        .map(|idx| idx + 1)
        .unwrap_or(0);
    let active = &ops[start..];

    let mut items: Vec<DcmValue> = base.to_vec();

    for op in active {
        if matches!(op, ListOp::Append(_) | ListOp::Extend(_)) {
            match op {
                ListOp::Append(v) => items.push(v.clone()),
                ListOp::Extend(vs) => items.extend(vs.iter().cloned()),
                _ => unreachable!(),
            }
        }
    }

    for op in active {
        match op {
            ListOp::Append(_) | ListOp::Extend(_) | ListOp::Clear => {}
            ListOp::Insert(idx, v) => {
                let at = (*idx).min(items.len());
                items.insert(at, v.clone());
            }
            ListOp::SetItem(idx, v) => {
                let slot = items
                    .get_mut(*idx)
                    .ok_or_else(|| DcmError::NotAList(path.to_vec()))?;
                *slot = v.clone();
            }
            ListOp::DelItem(idx) => {
                if *idx >= items.len() {
                    return Err(DcmError::NotAList(path.to_vec()));
                }
                items.remove(*idx);
            }
            ListOp::Pop(idx) => {
                let at = idx.unwrap_or_else(|| items.len().saturating_sub(1));
                if items.is_empty() || at >= items.len() {
                    return Err(DcmError::NotAList(path.to_vec()));
                }
                items.remove(at);
            }
            ListOp::Remove(v) => {
                if let Some(pos) = items.iter().position(|item| item == v) {
                    items.remove(pos);
                }
            }
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: i64) -> DcmValue {
        DcmValue::Number(serde_json::Number::from(n))
    }

    #[test]
    fn append_and_extend_run_before_positional_ops() {
        let base = vec![num(1), num(2)];
        let ops = vec![
            ListOp::Append(num(3)),
            ListOp::Insert(0, num(0)),
            ListOp::Extend(vec![num(4), num(5)]),
        ];
        let result = apply_list_ops(&base, &ops, &["x".into()]).unwrap();
        assert_eq!(result, vec![num(0), num(1), num(2), num(3), num(4), num(5)]);
    }

    #[test]
    fn clear_truncates_everything_before_it() {
        let base = vec![num(1)];
        let ops = vec![ListOp::Append(num(2)), ListOp::Clear, ListOp::Append(num(9))];
        let result = apply_list_ops(&base, &ops, &["x".into()]).unwrap();
        assert_eq!(result, vec![num(9)]);
    }

    #[test]
    fn remove_drops_first_match_only() {
        let base = vec![num(1), num(2), num(1)];
        let ops = vec![ListOp::Remove(num(1))];
        let result = apply_list_ops(&base, &ops, &["x".into()]).unwrap();
        assert_eq!(result, vec![num(2), num(1)]);
    }

    #[test]
    fn pop_without_index_takes_last() {
        let base = vec![num(1), num(2), num(3)];
        let ops = vec![ListOp::Pop(None)];
        let result = apply_list_ops(&base, &ops, &["x".into()]).unwrap();
        assert_eq!(result, vec![num(1), num(2)]);
    }

    #[test]
    fn del_item_out_of_range_errors() {
        let base = vec![num(1)];
        let ops = vec![ListOp::DelItem(5)];
        assert!(apply_list_ops(&base, &ops, &["x".into()]).is_err());
    }
}
