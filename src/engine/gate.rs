use super::state::RunStatus;
use crate::script::{Directive, Step};

/// 노출이 끝난 Step 뒤에 무엇을 기다릴지 결정한다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Gate {
    /// 사용자의 advance 클릭.
    Click,
    /// 지시어 입력.
    Directive(Directive),
}

impl Gate {
    pub(crate) fn for_step(step: &Step) -> Self {
        match &step.directive {
            Some(directive) => Gate::Directive(directive.clone()),
            None => Gate::Click,
        }
    }

    /// 이 게이트에서 머무는 Run 상태이다.
    pub(crate) fn status(&self) -> RunStatus {
        match self {
            Gate::Click => RunStatus::AwaitingClick,
            Gate::Directive(_) => RunStatus::AwaitingDirective,
        }
    }
}
