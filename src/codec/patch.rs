use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::foundation::error::{FlipbookError, FlipbookResult};

/// Operation kind, inferred from an [`EditOp`] triple rather than stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EditKind {
    /// Remove `[low, high)`.
    Delete,
    /// Insert `data` before position `low`.
    Insert,
    /// Replace `[low, high)` with `data`.
    Replace,
}

/// One edit against the base frame, addressed in base character indices.
///
/// Serialized as the triple `[low, high, data]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EditOp {
    /// Inclusive start of the affected base range.
    pub low: usize,
    /// Exclusive end of the affected base range.
    pub high: usize,
    /// Inserted or replacement characters; empty for deletions.
    pub data: String,
}

impl EditOp {
    /// Build a deletion of `[low, high)`.
    pub fn delete(low: usize, high: usize) -> Self {
        Self {
            low,
            high,
            data: String::new(),
        }
    }

    /// Build an insertion before `at`.
    pub fn insert(at: usize, data: impl Into<String>) -> Self {
        Self {
            low: at,
            high: at,
            data: data.into(),
        }
    }

    /// Build a replacement of `[low, high)`.
    pub fn replace(low: usize, high: usize, data: impl Into<String>) -> Self {
        Self {
            low,
            high,
            data: data.into(),
        }
    }

    /// Infer the operation kind: empty data deletes, an empty range inserts, anything else
    /// replaces.
    pub fn kind(&self) -> EditKind {
        if self.data.is_empty() {
            EditKind::Delete
        } else if self.low == self.high {
            EditKind::Insert
        } else {
            EditKind::Replace
        }
    }
}

impl Serialize for EditOp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (self.low, self.high, &self.data).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EditOp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (low, high, data) = <(usize, usize, String)>::deserialize(deserializer)?;
        Ok(Self { low, high, data })
    }
}

/// Ordered edit operations turning frame `k` into frame `k + 1`.
///
/// Operations come from one non-overlapping partition of the base frame, so each is addressed in
/// original base indices and none needs re-indexing after another is applied.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditScript {
    ops: Vec<EditOp>,
}

impl EditScript {
    /// Wrap an operation list.
    pub fn new(ops: Vec<EditOp>) -> Self {
        Self { ops }
    }

    /// Borrow the operations in ascending base order.
    pub fn ops(&self) -> &[EditOp] {
        &self.ops
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// `true` when the two frames were identical.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Characters carried by the script's insert/replace payloads.
    pub fn payload_chars(&self) -> usize {
        self.ops.iter().map(|op| op.data.chars().count()).sum()
    }

    /// Consume the script into its operations.
    pub fn into_ops(self) -> Vec<EditOp> {
        self.ops
    }
}

impl FromIterator<EditOp> for EditScript {
    fn from_iter<I: IntoIterator<Item = EditOp>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Replay `script` against `base` in a single pass.
///
/// The base is treated as a row of single-character cells. Deletions blank their range,
/// insertions prefix the cell at `low` (or append past the end), and replacements blank their
/// range and place the new data at its start. Cells are concatenated at the end.
///
/// Fails with [`FlipbookError::CorruptPatch`] when an operation addresses positions outside
/// `[0, len(base)]`.
pub fn apply_patch(base: &str, script: &EditScript) -> FlipbookResult<String> {
    let cells: Vec<char> = base.chars().collect();
    let len = cells.len();
    let mut keep = vec![true; len];
    let mut heads = BTreeMap::<usize, String>::new();
    let mut tail = String::new();

    for (idx, op) in script.ops().iter().enumerate() {
        if op.low > op.high || op.high > len {
            return Err(FlipbookError::corrupt_patch(format!(
                "op {idx} addresses [{}, {}) but base has {len} characters",
                op.low, op.high
            )));
        }
        match op.kind() {
            EditKind::Delete => keep[op.low..op.high].fill(false),
            EditKind::Insert => {
                if op.low >= len {
                    tail.push_str(&op.data);
                } else {
                    let head = heads.entry(op.low).or_default();
                    head.insert_str(0, &op.data);
                }
            }
            EditKind::Replace => {
                keep[op.low..op.high].fill(false);
                heads.insert(op.low, op.data.clone());
            }
        }
    }

    let extra: usize = heads.values().map(String::len).sum::<usize>() + tail.len();
    let mut out = String::with_capacity(base.len() + extra);
    for (idx, ch) in cells.iter().enumerate() {
        if let Some(head) = heads.get(&idx) {
            out.push_str(head);
        }
        if keep[idx] {
            out.push(*ch);
        }
    }
    out.push_str(&tail);
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/codec/patch.rs"]
mod tests;
