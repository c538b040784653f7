use crate::pool::PoolItem;
use crate::script::Sender;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Run의 진행 상태를 표현한다.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RunStatus {
    /// 아직 시작하지 않음.
    Idle,
    /// 타이핑 지연 중.
    Revealing,
    /// 클릭(advance)을 기다리는 중.
    AwaitingClick,
    /// 지시어 입력(resolve)을 기다리는 중.
    AwaitingDirective,
    /// 모든 Step을 마침.
    Complete,
    /// 호출자가 명시적으로 종료함.
    Cancelled,
}

impl RunStatus {
    /// 더 이상 전이가 없는 상태인지 확인한다.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Complete | RunStatus::Cancelled)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunStatus::Idle => "idle",
            RunStatus::Revealing => "revealing",
            RunStatus::AwaitingClick => "awaiting-click",
            RunStatus::AwaitingDirective => "awaiting-directive",
            RunStatus::Complete => "complete",
            RunStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// 화면에 노출된 메시지 한 건이다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub text: String,
    pub sender: Sender,
    /// 메시지가 Transcript에 추가된 시각.
    pub resolved_at: DateTime<Utc>,
}

/// 추가만 가능한 대화 기록이다.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    /// 메시지를 끝에 추가한다.
    pub(crate) fn append(&mut self, sender: Sender, text: impl Into<String>) -> &TranscriptEntry {
        self.entries.push(TranscriptEntry {
            text: text.into(),
            sender,
            resolved_at: Utc::now(),
        });
        &self.entries[self.entries.len() - 1]
    }

    /// 추가된 순서대로 모든 메시지를 반환한다.
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// 메시지 개수.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 아직 노출된 메시지가 없는지 확인한다.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 특정 발신자의 메시지 텍스트만 순서대로 반환한다.
    pub fn texts_from(&self, sender: Sender) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.sender == sender)
            .map(|e| e.text.as_str())
            .collect()
    }
}

/// 지시어로 수집된 값이다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum CollectedValue {
    /// 속성 값(정규화된 코드).
    Attribute(String),
    /// 선택된 항목들(선택 순서).
    Selection(Vec<PoolItem>),
}

/// 수집된 항목 하나와 사람이 읽을 수 있는 표현이다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectedEntry {
    pub key: String,
    pub value: CollectedValue,
    /// Transcript에 노출된 형태.
    pub display: String,
}

/// 키별로 수집된 값을 해결 순서대로 보관한다. 같은 키는 마지막 값이 이긴다.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectedState {
    entries: Vec<CollectedEntry>,
}

impl CollectedState {
    /// 값을 기록한다. 이미 있는 키는 지우고 맨 뒤에 다시 넣어 해결 순서를 유지한다.
    ///
    /// 기존 값을 덮어썼으면 `true`를 반환한다.
    pub(crate) fn record(&mut self, key: &str, value: CollectedValue, display: String) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.key != key);
        let overwritten = self.entries.len() != before;
        self.entries.push(CollectedEntry {
            key: key.to_string(),
            value,
            display,
        });
        overwritten
    }

    /// 키에 해당하는 값을 조회한다.
    pub fn get(&self, key: &str) -> Option<&CollectedValue> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.value)
    }

    /// 속성 값을 문자열로 조회한다.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(CollectedValue::Attribute(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Transcript에 노출된 표현을 조회한다.
    pub fn display(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.display.as_str())
    }

    /// 키가 수집되었는지 확인한다.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    /// 해결 순서대로 모든 항목을 반환한다.
    pub fn entries(&self) -> &[CollectedEntry] {
        &self.entries
    }

    /// 수집된 키 개수.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 수집된 값이 하나도 없는지 확인한다.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collected_state_last_write_wins_in_resolution_order() {
        let mut state = CollectedState::default();
        assert!(!state.record("a", CollectedValue::Attribute("1".into()), "1".into()));
        assert!(!state.record("b", CollectedValue::Attribute("2".into()), "2".into()));
        assert!(state.record("a", CollectedValue::Attribute("3".into()), "3".into()));
        assert_eq!(state.len(), 2);
        assert_eq!(state.attribute("a"), Some("3"));
        assert_eq!(state.display("a"), Some("3"));
        let keys: Vec<&str> = state.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn transcript_filters_by_sender() {
        let mut transcript = Transcript::default();
        transcript.append(Sender::Bot, "질문");
        transcript.append(Sender::User, "답변");
        transcript.append(Sender::Bot, "다음");
        assert_eq!(transcript.texts_from(Sender::Bot), vec!["질문", "다음"]);
        assert_eq!(transcript.texts_from(Sender::User), vec!["답변"]);
    }

    #[test]
    fn status_display_matches_serde() {
        let statuses = [
            RunStatus::Idle,
            RunStatus::Revealing,
            RunStatus::AwaitingClick,
            RunStatus::AwaitingDirective,
            RunStatus::Complete,
            RunStatus::Cancelled,
        ];
        for status in statuses {
            let json = serde_json::to_string(&status).expect("직렬화 실패");
            assert_eq!(format!("\"{status}\""), json);
        }
    }
}
