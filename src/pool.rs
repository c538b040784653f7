use serde::{Deserialize, Serialize};

/// 선택 지시어에서 고를 수 있는 항목 하나이다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PoolItem {
    /// 풀 내 0 기반 위치.
    pub index: usize,
    /// 표시 이름.
    pub label: String,
}

/// 호출자가 제공하는 유한한 옵션 집합이다. 엔진은 개수와 중복만 검사한다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OptionPool {
    items: Vec<PoolItem>,
}

const MAJOR_ARCANA: [&str; 22] = [
    "바보",
    "마법사",
    "여사제",
    "여황제",
    "황제",
    "교황",
    "연인",
    "전차",
    "힘",
    "은둔자",
    "운명의 수레바퀴",
    "정의",
    "매달린 사람",
    "죽음",
    "절제",
    "악마",
    "탑",
    "별",
    "달",
    "태양",
    "심판",
    "세계",
];

impl OptionPool {
    /// 라벨 목록으로 풀을 만든다. 인덱스는 순서대로 부여된다.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = labels
            .into_iter()
            .enumerate()
            .map(|(index, label)| PoolItem {
                index,
                label: label.into(),
            })
            .collect();
        Self { items }
    }

    /// 타로 메이저 아르카나 22장 덱이다.
    pub fn tarot_major_arcana() -> Self {
        Self::from_labels(MAJOR_ARCANA)
    }

    /// 항목 개수.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// 항목이 하나도 없는지 확인한다.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 0부터 시작하는 인덱스로 항목을 조회한다.
    pub fn get(&self, index: usize) -> Option<&PoolItem> {
        self.items.get(index)
    }

    /// 인덱스 순서대로 모든 항목을 반환한다.
    pub fn items(&self) -> &[PoolItem] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tarot_deck_has_22_indexed_cards() {
        let pool = OptionPool::tarot_major_arcana();
        assert_eq!(pool.len(), 22);
        assert_eq!(pool.get(0).map(|c| c.label.as_str()), Some("바보"));
        assert_eq!(pool.get(21).map(|c| c.label.as_str()), Some("세계"));
        assert!(pool.items().iter().enumerate().all(|(i, c)| c.index == i));
        assert!(pool.get(22).is_none());
    }
}
