//! 스크립트 재생 엔진.
//!
//! Step을 하나씩 타이핑 지연 후 노출하고, 지시어가 붙은 Step에서는 입력을
//! 받을 때까지 멈췄다가 이어서 진행한다.

mod directives;
mod events;
mod gate;
mod reveal;
mod run;
mod session;
mod state;

pub use directives::{BirthDate, DirectiveInput, parse_birth_date};
pub use events::EngineEvent;
pub use reveal::RevealPolicy;
pub use run::{CompletionCallback, Run, RunBuilder};
pub use session::{IntakeSession, UiEvent};
pub use state::{
    CollectedEntry, CollectedState, CollectedValue, RunStatus, Transcript, TranscriptEntry,
};
