//! 대화 종료 후 수집 결과를 후속 요청으로 넘기는 경계 타입들.

use crate::engine::{CollectedState, CollectedValue};
use crate::pool::PoolItem;
use crate::variant::ProfileSnapshot;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// 완료 콜백으로 전달되는 결과물이다.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionPayload {
    /// 선택 지시어로 고른 항목들(해결 순서).
    pub selection: Vec<PoolItem>,
    /// 속성 키별 정규화된 값.
    pub attributes: BTreeMap<String, String>,
}

impl CompletionPayload {
    /// Collected State 스냅샷으로부터 결과물을 만든다.
    pub fn from_collected(collected: &CollectedState) -> Self {
        let mut payload = Self::default();
        for entry in collected.entries() {
            match &entry.value {
                CollectedValue::Attribute(value) => {
                    payload.attributes.insert(entry.key.clone(), value.clone());
                }
                CollectedValue::Selection(items) => {
                    payload.selection.extend(items.iter().cloned());
                }
            }
        }
        payload
    }

    /// JSON 문자열로 직렬화한다.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// 운세 세션 생성 요청 본문이다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadingRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_id: Option<String>,
    /// 선택된 카드의 0 기반 인덱스(선택 순서).
    pub card_indices: Vec<usize>,
    pub attributes: BTreeMap<String, String>,
}

impl ReadingRequest {
    /// 저장된 프로필 값 위에 이번 대화에서 수집한 값을 덮어 요청을 만든다.
    pub fn new(payload: &CompletionPayload, profile: &ProfileSnapshot) -> Self {
        let mut attributes = profile.attributes();
        attributes.extend(
            payload
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        Self {
            character_id: profile.character_id.clone(),
            card_indices: payload.selection.iter().map(|item| item.index).collect(),
            attributes,
        }
    }
}

/// 운세 세션을 생성하는 외부 서비스 추상 계층이다.
#[async_trait]
pub trait ReadingService: Send + Sync {
    /// 세션을 만들고 세션 ID를 반환한다.
    async fn create_session(&self, request: &ReadingRequest) -> anyhow::Result<String>;
}

/// ReadingService를 공유하기 위한 Arc 타입 별칭이다.
pub type SharedReadingService = Arc<dyn ReadingService>;

/// 네트워크 없이 요청을 로그로만 남기는 기본 구현이다.
#[derive(Debug, Default)]
pub struct LoggingReadingService {
    next_id: AtomicU64,
}

#[async_trait]
impl ReadingService for LoggingReadingService {
    async fn create_session(&self, request: &ReadingRequest) -> anyhow::Result<String> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let body = serde_json::to_string(request)?;
        info!(session = id, %body, "운세 세션 생성 요청");
        Ok(format!("reading-{id}"))
    }
}

/// 카드 해석 레코드. 필드 이름이 제각각인 응답도 이 한 형태로 정규화한다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardInterpretation {
    #[serde(alias = "name", alias = "title", alias = "cardName")]
    pub card_name: String,
    #[serde(alias = "meaning", alias = "description", alias = "text")]
    pub interpretation: String,
    #[serde(default, alias = "isReversed")]
    pub reversed: bool,
}

/// JSON 배열을 카드 해석 목록으로 파싱한다.
pub fn parse_interpretations(json: &str) -> anyhow::Result<Vec<CardInterpretation>> {
    Ok(serde_json::from_str(json)?)
}

/// 공유용 캡션을 조립한다.
pub fn share_caption(cards: &[CardInterpretation]) -> String {
    let names = cards
        .iter()
        .map(|card| {
            if card.reversed {
                format!("{}(역방향)", card.card_name)
            } else {
                card.card_name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    let mut caption = format!("오늘의 타로: {names}");
    for card in cards {
        caption.push_str(&format!("\n\n[{}] {}", card.card_name, card.interpretation));
    }
    caption
}
