use super::state::{CollectedState, TranscriptEntry};
use crate::script::Directive;

/// 엔진에서 UI로 전달되는 주요 이벤트 모델이다.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Step 타이핑 연출 시작.
    Revealing { step_index: usize },
    /// Transcript에 메시지가 추가됨.
    MessageAppended { entry: TranscriptEntry },
    /// 클릭을 기다림.
    AwaitingClick { step_index: usize },
    /// 지시어 입력을 기다림.
    AwaitingDirective {
        step_index: usize,
        directive: Directive,
    },
    /// 입력이 거부됨. 상태는 그대로이다.
    Rejected { reason: String },
    /// 전체 스크립트 종료.
    Completed { collected: CollectedState },
    /// 호출자에 의해 종료됨.
    Cancelled,
}
