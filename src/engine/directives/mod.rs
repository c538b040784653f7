use super::state::CollectedValue;
use crate::error::{DirectiveError, RunError};
use crate::pool::OptionPool;
use crate::script::Directive;

mod attribute;
mod selection;

pub use attribute::{BirthDate, parse_birth_date};

use attribute::resolve_attribute;
use selection::resolve_selection;

/// UI에서 전달되는 지시어 입력 값이다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveInput {
    /// 속성 지시어용 원문 입력.
    Text(String),
    /// 선택 지시어용 풀 인덱스 목록.
    Choices(Vec<usize>),
}

impl From<&str> for DirectiveInput {
    fn from(value: &str) -> Self {
        DirectiveInput::Text(value.to_string())
    }
}

impl From<String> for DirectiveInput {
    fn from(value: String) -> Self {
        DirectiveInput::Text(value)
    }
}

impl From<Vec<usize>> for DirectiveInput {
    fn from(value: Vec<usize>) -> Self {
        DirectiveInput::Choices(value)
    }
}

/// 검증을 통과한 지시어 결과이다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Resolution {
    /// Collected State에 저장될 값.
    pub value: CollectedValue,
    /// 합성될 user 메시지.
    pub display: String,
}

/// 지시어 종류에 맞게 입력을 검증하고 정규화한다. 상태는 건드리지 않는다.
pub(crate) fn resolve_directive(
    directive: &Directive,
    input: &DirectiveInput,
    pool: Option<&OptionPool>,
    step_index: usize,
) -> Result<Resolution, RunError> {
    match (directive, input) {
        (Directive::CaptureAttribute { attribute }, DirectiveInput::Text(raw)) => {
            Ok(resolve_attribute(*attribute, raw)?)
        }
        (Directive::CaptureSelection { cardinality, .. }, DirectiveInput::Choices(choices)) => {
            let pool = pool.ok_or(RunError::MissingOptionPool { index: step_index })?;
            Ok(resolve_selection(*cardinality, choices, pool)?)
        }
        (Directive::CaptureAttribute { .. }, DirectiveInput::Choices(_)) => {
            Err(DirectiveError::WrongInputShape { expected: "텍스트" }.into())
        }
        (Directive::CaptureSelection { .. }, DirectiveInput::Text(_)) => {
            Err(DirectiveError::WrongInputShape {
                expected: "선택 목록",
            }
            .into())
        }
    }
}
