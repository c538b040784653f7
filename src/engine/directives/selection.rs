use super::Resolution;
use crate::engine::state::CollectedValue;
use crate::error::DirectiveError;
use crate::pool::OptionPool;
use std::collections::HashSet;

/// 선택 개수, 풀 범위, 중복 여부를 검사하고 선택 항목을 돌려준다.
pub(super) fn resolve_selection(
    cardinality: usize,
    choices: &[usize],
    pool: &OptionPool,
) -> Result<Resolution, DirectiveError> {
    if choices.len() != cardinality {
        return Err(DirectiveError::Cardinality {
            expected: cardinality,
            actual: choices.len(),
        });
    }
    let mut seen = HashSet::with_capacity(choices.len());
    let mut picked = Vec::with_capacity(choices.len());
    for &index in choices {
        let item = pool.get(index).ok_or(DirectiveError::OutOfPool {
            index,
            pool_size: pool.len(),
        })?;
        if !seen.insert(index) {
            return Err(DirectiveError::DuplicateChoice(index));
        }
        picked.push(item.clone());
    }
    let display = picked
        .iter()
        .map(|item| item.label.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    Ok(Resolution {
        value: CollectedValue::Selection(picked),
        display,
    })
}
