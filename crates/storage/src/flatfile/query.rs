//! Condition evaluation
//!
//! Keys are matched as text. Ordering operators compare numerically when both
//! the key and the operand read as numbers, lexically otherwise. Per-condition
//! id sets are folded left to right: the first condition seeds the result,
//! each later one is intersected (AND) or unioned (OR) according to the
//! combinator before it.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use flatstore_core::{Clause, Combinator, Condition, Operator, Result, Value};

/// Whether key text `key` satisfies `op` against `operand`
pub(crate) fn key_matches(key: &str, op: Operator, operand: &Value) -> bool {
    match op {
        Operator::Eq => equals_any(key, operand),
        Operator::Ne => !equals_any(key, operand),
        Operator::Gt => compare(key, operand) == Some(Ordering::Greater),
        Operator::Ge => matches!(
            compare(key, operand),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Operator::Lt => compare(key, operand) == Some(Ordering::Less),
        Operator::Le => matches!(
            compare(key, operand),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Operator::Range => match operand.as_array() {
            Some([lo, hi]) => {
                matches!(compare(key, lo), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(compare(key, hi), Some(Ordering::Less | Ordering::Equal))
            }
            _ => false,
        },
    }
}

/// Fold the clause sequence into one id set, calling `lookup` per condition
pub(crate) fn evaluate(
    clauses: &[Clause],
    mut lookup: impl FnMut(&Condition) -> Result<BTreeSet<String>>,
) -> Result<BTreeSet<String>> {
    let mut acc: Option<BTreeSet<String>> = None;
    let mut pending = Combinator::And;

    for clause in clauses {
        match clause {
            Clause::Combinator(c) => pending = *c,
            Clause::Condition(condition) => {
                let matched = lookup(condition)?;
                acc = Some(match acc {
                    None => matched,
                    Some(mut ids) => {
                        match pending {
                            Combinator::And => ids.retain(|id| matched.contains(id)),
                            Combinator::Or => ids.extend(matched),
                        }
                        ids
                    }
                });
                pending = Combinator::And;
            }
        }
    }
    Ok(acc.unwrap_or_default())
}

fn equals_any(key: &str, operand: &Value) -> bool {
    match operand {
        Value::Array(items) => items.iter().any(|v| equals_one(key, v)),
        v => equals_one(key, v),
    }
}

fn equals_one(key: &str, operand: &Value) -> bool {
    operand.index_key().map_or(false, |k| k == key)
}

fn compare(key: &str, operand: &Value) -> Option<Ordering> {
    let text = operand.index_key()?;
    match (as_number(key), as_number(&text)) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => Some(key.cmp(text.as_str())),
    }
}

fn as_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}
