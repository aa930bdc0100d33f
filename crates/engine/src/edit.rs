//! Offset-based edit application.
//!
//! A batch of edits is expressed against one frozen snapshot. Edits
//! are spliced in descending start order so earlier offsets stay
//! valid while later text shifts; overlapping edits within a batch
//! are resolved deterministically (first in batch order wins, the
//! loser is dropped and logged as a conflict).

use std::fmt;

use rules::Edit;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
/// An edit whose offsets do not fit the snapshot (inverted range, out
/// of bounds, or splitting a UTF-8 character). The whole batch is
/// rejected; the producing fixer is at fault.
pub struct MalformedEdit {
    pub edit: Edit,
    pub reason: &'static str,
}

impl fmt::Display for MalformedEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "malformed edit [{}..{}): {}",
            self.edit.start, self.edit.end, self.reason
        )
    }
}

impl std::error::Error for MalformedEdit {}

#[derive(Debug, Clone, Default)]
/// Result of splicing one batch into a snapshot.
pub struct SpliceOutcome {
    pub text: String,
    /// Edits actually applied, in batch order, original coordinates.
    pub applied: Vec<Edit>,
    /// Edits dropped because they overlapped an earlier one.
    pub dropped: Vec<Edit>,
}

/// Applies `edits` to `source` in the snapshot's coordinate space.
///
/// Malformed edits reject the whole batch so a buggy fixer cannot
/// corrupt the text. Overlaps are resolved by batch order: the first
/// edit wins, later conflicting ones are dropped and reported in
/// [`SpliceOutcome::dropped`].
pub fn splice(source: &str, edits: &[Edit]) -> Result<SpliceOutcome, MalformedEdit> {
    for edit in edits {
        if !edit.is_well_formed(source.len()) {
            return Err(MalformedEdit {
                edit: edit.clone(),
                reason: "offsets inverted or out of bounds",
            });
        }
        if !source.is_char_boundary(edit.start) || !source.is_char_boundary(edit.end) {
            return Err(MalformedEdit {
                edit: edit.clone(),
                reason: "offset splits a character",
            });
        }
    }

    let mut applied: Vec<Edit> = Vec::new();
    let mut dropped: Vec<Edit> = Vec::new();
    for edit in edits {
        if applied.iter().any(|kept| kept.overlaps(edit)) {
            warn!(
                start = edit.start,
                end = edit.end,
                "edit conflict: overlapping edit dropped"
            );
            dropped.push(edit.clone());
        } else {
            applied.push(edit.clone());
        }
    }

    // splice in descending start order so remaining offsets stay valid
    let mut order: Vec<&Edit> = applied.iter().collect();
    order.sort_by(|a, b| b.start.cmp(&a.start).then(b.end.cmp(&a.end)));
    let mut text = source.to_string();
    for edit in order {
        text.replace_range(edit.start..edit.end, &edit.replacement);
    }

    Ok(SpliceOutcome {
        text,
        applied,
        dropped,
    })
}

/// Offset shift that edits applied earlier in a pass impose on a
/// position expressed in the pass-start coordinate space.
pub(crate) fn offset_delta(applied: &[Edit], position: usize) -> isize {
    applied
        .iter()
        .filter(|e| e.end <= position)
        .map(|e| e.replacement.len() as isize - (e.end - e.start) as isize)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descending_application_preserves_offsets() {
        // both edits expressed against the original text
        let out = splice(
            "gci; gci",
            &[Edit::replace(0, 3, "Get-ChildItem"), Edit::replace(5, 8, "Get-ChildItem")],
        )
        .unwrap();
        assert_eq!(out.text, "Get-ChildItem; Get-ChildItem");
        assert_eq!(out.applied.len(), 2);
        assert!(out.dropped.is_empty());
    }

    #[test]
    fn overlapping_edit_is_dropped_first_wins() {
        let out = splice(
            "abcdef",
            &[Edit::replace(0, 4, "X"), Edit::replace(2, 6, "Y")],
        )
        .unwrap();
        assert_eq!(out.text, "Xef");
        assert_eq!(out.applied, vec![Edit::replace(0, 4, "X")]);
        assert_eq!(out.dropped, vec![Edit::replace(2, 6, "Y")]);
    }

    #[test]
    fn malformed_edit_rejects_the_batch() {
        let err = splice("abc", &[Edit::replace(2, 1, "x")]).unwrap_err();
        assert_eq!(err.reason, "offsets inverted or out of bounds");
        assert!(splice("abc", &[Edit::replace(0, 9, "x")]).is_err());
    }

    #[test]
    fn char_boundary_is_enforced() {
        // 'é' is two bytes; offset 1 lands inside it
        assert!(splice("é", &[Edit::replace(1, 2, "x")]).is_err());
    }

    #[test]
    fn insertion_and_deletion() {
        let out = splice("ab", &[Edit::insert(1, "X"), Edit::delete(0, 1)]).unwrap();
        assert_eq!(out.text, "Xb");
    }

    #[test]
    fn offset_delta_accounts_for_earlier_edits() {
        let applied = vec![Edit::replace(0, 3, "Get-ChildItem")];
        // an edit at offset 5 shifts right by 13 - 3 = 10
        assert_eq!(offset_delta(&applied, 5), 10);
        assert_eq!(offset_delta(&applied, 0), 0);
    }
}
