use super::directives::DirectiveInput;
use super::run::{Run, RunBuilder};
use crate::error::RunError;
use tracing::debug;

/// 호스팅 UI가 엔진으로 전달하는 이벤트이다. 대화 도중에는 이 두 종류만 받는다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// 사용자가 다음으로 넘김.
    Advanced,
    /// 사용자가 지시어 값을 입력함.
    Supplied { key: String, value: DirectiveInput },
}

/// 한 화면에서 진행되는 대화를 호스팅한다. 동시에 살아 있는 Run은 최대 하나이다.
#[derive(Default)]
pub struct IntakeSession {
    current: Option<Run>,
}

impl IntakeSession {
    /// 진행 중인 Run이 없는 세션을 만든다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 이전 Run을 종료하고 새 Run을 만들어 시작한다.
    ///
    /// 이전 Run의 노출 타이머는 취소되므로 이전 Transcript에 늦게 메시지가
    /// 추가되는 일은 없다.
    pub fn begin(&mut self, builder: RunBuilder) -> Result<&Run, RunError> {
        self.end();
        let run = builder.build()?;
        run.start()?;
        Ok(self.current.insert(run))
    }

    /// UI 이벤트를 현재 Run의 `advance`/`resolve`로 전달한다.
    pub fn dispatch(&self, event: UiEvent) -> Result<(), RunError> {
        let run = self.current.as_ref().ok_or(RunError::NoActiveRun)?;
        debug!(?event, "UI 이벤트 수신");
        match event {
            UiEvent::Advanced => run.advance(),
            UiEvent::Supplied { key, value } => run.resolve(&key, value),
        }
    }

    /// 현재 Run을 명시적으로 종료한다. 종료할 Run이 있었으면 `true`를 반환한다.
    pub fn end(&mut self) -> bool {
        match self.current.take() {
            Some(run) => {
                run.cancel();
                true
            }
            None => false,
        }
    }

    /// 진행 중인 Run을 반환한다.
    pub fn run(&self) -> Option<&Run> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineEvent, RevealPolicy, RunStatus};
    use crate::pool::OptionPool;
    use crate::script::{AttributeKind, Script, Step};
    use std::sync::Arc;
    use std::time::Duration;

    fn script() -> Arc<Script> {
        Arc::new(
            Script::new(
                "session",
                vec![
                    Step::say("안녕하세요"),
                    Step::ask_attribute("생년월일?", AttributeKind::DateOfBirth),
                    Step::ask_selection("카드를 골라 주세요", 3),
                ],
            )
            .expect("스크립트 생성 실패"),
        )
    }

    fn builder() -> RunBuilder {
        RunBuilder::new(script())
            .option_pool(Arc::new(OptionPool::tarot_major_arcana()))
            .reveal_policy(RevealPolicy::fixed(Duration::from_millis(100)))
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn ui_events_drive_the_run_to_completion() {
        let mut session = IntakeSession::new();
        assert_eq!(
            session.dispatch(UiEvent::Advanced),
            Err(RunError::NoActiveRun)
        );
        session.begin(builder()).expect("시작 실패");
        settle().await;
        session.dispatch(UiEvent::Advanced).expect("advance 실패");
        settle().await;
        session
            .dispatch(UiEvent::Supplied {
                key: "date-of-birth".into(),
                value: "951225".into(),
            })
            .expect("생년월일 입력 실패");
        settle().await;
        session
            .dispatch(UiEvent::Supplied {
                key: "selection".into(),
                value: vec![3usize, 1, 4].into(),
            })
            .expect("선택 실패");
        let run = session.run().expect("Run 없음");
        assert!(run.is_complete());
    }

    /// 새 대화를 시작하면 이전 Run의 대기 중인 노출이 취소된다.
    #[tokio::test(start_paused = true)]
    async fn beginning_a_new_run_tears_down_the_old_one() {
        let (old_tx, mut old_rx) = tokio::sync::mpsc::unbounded_channel();
        let mut session = IntakeSession::new();
        session.begin(builder().events(old_tx)).expect("시작 실패");
        assert_eq!(
            session.run().map(|r| r.status()),
            Some(RunStatus::Revealing)
        );

        session.begin(builder()).expect("재시작 실패");
        settle().await;

        let mut old_events = Vec::new();
        while let Ok(event) = old_rx.try_recv() {
            old_events.push(event);
        }
        assert!(
            !old_events
                .iter()
                .any(|e| matches!(e, EngineEvent::MessageAppended { .. }))
        );
        assert!(matches!(old_events.last(), Some(EngineEvent::Cancelled)));
        assert_eq!(
            session.run().map(|r| r.transcript().len()),
            Some(1)
        );

        assert!(session.end());
        assert!(!session.end());
    }
}
