//! Structural diff: generate add/remove/replace operations that transform
//! a base document into a candidate document.
//!
//! Arrays whose elements all carry a unique `id` are reconciled by identity,
//! so an edited element yields operations on its changed sub-fields instead
//! of a whole-element replace. Everything else is diffed positionally.
//!
//! The emitted order is the order that applies cleanly: applying the
//! operations one after another onto the base yields the candidate.
//! Identity arrays emit changes to matched elements first, at their base
//! index, then removals, then insertions at their candidate index. A change
//! inside an existing element therefore never depends on a structural
//! operation having been applied before it.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};

use crate::patch::types::Operation;

// ── Public API ────────────────────────────────────────────────────────────

/// Generate the operations that transform `base` into `candidate`.
pub fn diff(base: &Value, candidate: &Value) -> Vec<Operation> {
    diff_at(Some(base), Some(candidate), &[])
}

/// Diff two possibly-absent values rooted at `path`.
///
/// An absent candidate yields a single `remove`; an absent base a single
/// `add`.
pub fn diff_at(base: Option<&Value>, candidate: Option<&Value>, path: &[String]) -> Vec<Operation> {
    let mut ops = Vec::new();
    match (base, candidate) {
        (None, None) => {}
        (Some(b), None) => ops.push(Operation::remove(path.to_vec(), Some(b.clone()))),
        (None, Some(c)) => ops.push(Operation::add(path.to_vec(), c.clone())),
        (Some(b), Some(c)) => diff_values(&mut ops, path, b, c),
    }
    ops
}

/// Sort operations by path for display.
///
/// Numeric segments compare numerically. The sorted list is not guaranteed
/// to apply cleanly when it touches the same array more than once.
pub fn sort_by_path(ops: &mut [Operation]) {
    ops.sort_by(|a, b| compare_paths(a.path(), b.path()));
}

fn compare_paths(a: &[String], b: &[String]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        let ord = match (x.parse::<usize>(), y.parse::<usize>()) {
            (Ok(i), Ok(j)) => i.cmp(&j),
            _ => x.cmp(y),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

// ── Core recursive differ ─────────────────────────────────────────────────

fn child(path: &[String], step: impl Into<String>) -> Vec<String> {
    let mut p = Vec::with_capacity(path.len() + 1);
    p.extend_from_slice(path);
    p.push(step.into());
    p
}

fn diff_values(ops: &mut Vec<Operation>, path: &[String], base: &Value, candidate: &Value) {
    if base == candidate {
        return;
    }
    match (base, candidate) {
        (Value::Object(b), Value::Object(c)) => diff_obj(ops, path, b, c),
        (Value::Array(b), Value::Array(c)) => diff_arr(ops, path, b, c),
        _ => ops.push(Operation::replace(
            path.to_vec(),
            candidate.clone(),
            Some(base.clone()),
        )),
    }
}

fn diff_obj(ops: &mut Vec<Operation>, path: &[String], base: &Map<String, Value>, candidate: &Map<String, Value>) {
    for (key, base_val) in base {
        if !candidate.contains_key(key) {
            ops.push(Operation::remove(child(path, key.as_str()), Some(base_val.clone())));
        }
    }
    for (key, cand_val) in candidate {
        let p = child(path, key.as_str());
        match base.get(key) {
            None => ops.push(Operation::add(p, cand_val.clone())),
            Some(base_val) => diff_values(ops, &p, base_val, cand_val),
        }
    }
}

fn diff_arr(ops: &mut Vec<Operation>, path: &[String], base: &[Value], candidate: &[Value]) {
    match (identity_keys(base), identity_keys(candidate)) {
        (Some(base_ids), Some(cand_ids)) if same_relative_order(&base_ids, &cand_ids) => {
            diff_arr_by_identity(ops, path, base, candidate, &base_ids, &cand_ids)
        }
        _ => diff_arr_positional(ops, path, base, candidate),
    }
}

fn diff_arr_positional(ops: &mut Vec<Operation>, path: &[String], base: &[Value], candidate: &[Value]) {
    let common = base.len().min(candidate.len());
    for i in 0..common {
        diff_values(ops, &child(path, i.to_string()), &base[i], &candidate[i]);
    }
    // Trailing removals run from the end so earlier indices stay valid.
    for i in (common..base.len()).rev() {
        ops.push(Operation::remove(child(path, i.to_string()), Some(base[i].clone())));
    }
    for (i, item) in candidate.iter().enumerate().skip(common) {
        ops.push(Operation::add(child(path, i.to_string()), item.clone()));
    }
}

fn diff_arr_by_identity(
    ops: &mut Vec<Operation>,
    path: &[String],
    base: &[Value],
    candidate: &[Value],
    base_ids: &[String],
    cand_ids: &[String],
) {
    let cand_by_id: HashMap<&str, usize> = cand_ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    let base_set: HashSet<&str> = base_ids.iter().map(String::as_str).collect();

    // Matched elements are diffed in place first, so their operations
    // address base indices, the same coordinates lock metadata uses.
    for (i, id) in base_ids.iter().enumerate() {
        if let Some(&ci) = cand_by_id.get(id.as_str()) {
            diff_values(ops, &child(path, i.to_string()), &base[i], &candidate[ci]);
        }
    }
    for (i, id) in base_ids.iter().enumerate().rev() {
        if !cand_by_id.contains_key(id.as_str()) {
            ops.push(Operation::remove(child(path, i.to_string()), Some(base[i].clone())));
        }
    }
    for (i, id) in cand_ids.iter().enumerate() {
        if !base_set.contains(id.as_str()) {
            ops.push(Operation::add(child(path, i.to_string()), candidate[i].clone()));
        }
    }
}

// ── Identity helpers ──────────────────────────────────────────────────────

/// Identity key of an element: its `id` field when it is a string or number.
fn identity_key(v: &Value) -> Option<String> {
    match v.as_object()?.get("id")? {
        Value::String(s) => Some(format!("s:{s}")),
        Value::Number(n) => Some(format!("n:{n}")),
        _ => None,
    }
}

/// Identity keys for every element, or `None` if any element lacks one or
/// two elements share one.
fn identity_keys(items: &[Value]) -> Option<Vec<String>> {
    let keys = items.iter().map(identity_key).collect::<Option<Vec<String>>>()?;
    let unique = keys.iter().collect::<HashSet<_>>().len();
    (unique == keys.len()).then_some(keys)
}

/// Ids present on both sides must appear in the same relative order;
/// identity reconciliation cannot express a move.
fn same_relative_order(base_ids: &[String], cand_ids: &[String]) -> bool {
    let base_set: HashSet<&String> = base_ids.iter().collect();
    let cand_set: HashSet<&String> = cand_ids.iter().collect();
    let base_common = base_ids.iter().filter(|id| cand_set.contains(id));
    let cand_common = cand_ids.iter().filter(|id| base_set.contains(id));
    base_common.eq(cand_common)
}

// ── Tests ─────────────────────────────────────────────────────────────────
