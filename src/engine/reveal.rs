use crate::script::Step;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// 타이핑 연출 지연을 계산하는 정책이다.
///
/// `base_ms + per_char_ms * 글자 수`를 `max_ms`로 자른다. Step에 `delay_ms`가
/// 지정되어 있으면 계산 없이 그 값을 그대로 사용한다.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RevealPolicy {
    /// 모든 메시지에 공통으로 붙는 지연(ms).
    pub base_ms: u64,
    /// 글자당 추가 지연(ms).
    pub per_char_ms: u64,
    /// 계산된 지연의 상한(ms).
    pub max_ms: u64,
}

impl Default for RevealPolicy {
    fn default() -> Self {
        Self {
            base_ms: 400,
            per_char_ms: 30,
            max_ms: 2_500,
        }
    }
}

impl RevealPolicy {
    /// 지연 없이 바로 노출한다.
    pub fn instant() -> Self {
        Self::fixed(Duration::ZERO)
    }

    /// 메시지 길이와 무관한 고정 지연이다.
    pub fn fixed(delay: Duration) -> Self {
        let ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        Self {
            base_ms: ms,
            per_char_ms: 0,
            max_ms: ms,
        }
    }

    /// Step 하나에 적용할 지연을 계산한다.
    pub fn delay_for(&self, step: &Step) -> Duration {
        if let Some(ms) = step.delay_ms {
            return Duration::from_millis(ms);
        }
        let chars = step.text.chars().count() as u64;
        let weighted = self
            .base_ms
            .saturating_add(self.per_char_ms.saturating_mul(chars));
        Duration::from_millis(weighted.min(self.max_ms))
    }
}

/// 지연 후 한 번만 `on_elapsed`를 실행하는 타이머를 예약한다.
///
/// 토큰이 먼저 취소되면 콜백은 호출되지 않는다.
pub(crate) fn schedule_reveal<F>(
    runtime: &Handle,
    token: CancellationToken,
    delay: Duration,
    on_elapsed: F,
) -> JoinHandle<()>
where
    F: FnOnce() + Send + 'static,
{
    runtime.spawn(async move {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                trace!("취소된 노출 타이머");
            }
            _ = sleep(delay) => {
                if !token.is_cancelled() {
                    on_elapsed();
                }
            }
        }
    })
}
