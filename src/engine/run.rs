use super::directives::{DirectiveInput, resolve_directive};
use super::events::EngineEvent;
use super::gate::Gate;
use super::reveal::{RevealPolicy, schedule_reveal};
use super::state::{CollectedState, RunStatus, Transcript};
use crate::error::RunError;
use crate::handoff::CompletionPayload;
use crate::pool::OptionPool;
use crate::script::{Directive, Script, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 완료 시 한 번 호출되는 콜백이다.
pub type CompletionCallback = Box<dyn FnOnce(CompletionPayload) + Send + 'static>;

/// Run 생성 시 필요한 구성 요소를 모은다.
pub struct RunBuilder {
    script: Arc<Script>,
    pool: Option<Arc<OptionPool>>,
    policy: RevealPolicy,
    on_complete: Option<CompletionCallback>,
    events: Option<UnboundedSender<EngineEvent>>,
    runtime: Option<Handle>,
}

impl RunBuilder {
    /// 스크립트 하나로 빌더를 만든다. 나머지 구성 요소는 모두 선택이다.
    pub fn new(script: Arc<Script>) -> Self {
        Self {
            script,
            pool: None,
            policy: RevealPolicy::default(),
            on_complete: None,
            events: None,
            runtime: None,
        }
    }

    /// 선택 지시어에 사용할 옵션 풀을 지정한다.
    pub fn option_pool(mut self, pool: Arc<OptionPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// 타이핑 지연 정책을 지정한다. 기본값은 `RevealPolicy::default()`이다.
    pub fn reveal_policy(mut self, policy: RevealPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 완료 콜백을 등록한다.
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(CompletionPayload) + Send + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// 상태 변화를 받을 이벤트 채널을 지정한다.
    pub fn events(mut self, sender: UnboundedSender<EngineEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// 노출 타이머를 띄울 tokio 런타임을 지정한다.
    ///
    /// 지정하지 않으면 `start`/`advance`/`resolve`를 호출한 시점의 런타임을 사용한다.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// 스크립트와 옵션 풀이 맞는지 확인하고 idle 상태의 Run을 만든다.
    pub fn build(self) -> Result<Run, RunError> {
        self.script
            .validate()
            .map_err(|err| RunError::InvalidScript(err.to_string()))?;
        for (index, step) in self.script.steps.iter().enumerate() {
            if let Some(Directive::CaptureSelection { cardinality, .. }) = &step.directive {
                let pool = self
                    .pool
                    .as_ref()
                    .ok_or(RunError::MissingOptionPool { index })?;
                if pool.len() < *cardinality {
                    return Err(RunError::PoolTooSmall {
                        index,
                        cardinality: *cardinality,
                        pool_size: pool.len(),
                    });
                }
            }
        }
        let cancel = CancellationToken::new();
        let core = RunCore {
            script: self.script,
            pool: self.pool,
            policy: self.policy,
            cursor: 0,
            status: RunStatus::Idle,
            transcript: Transcript::default(),
            collected: CollectedState::default(),
            on_complete: self.on_complete,
            events: self.events,
            runtime: self.runtime,
            cancel: cancel.clone(),
        };
        Ok(Run {
            core: Arc::new(Mutex::new(core)),
            cancel,
        })
    }
}

/// Run 내부 상태. 노출 타이머와 호출자 사이에서 잠금으로 공유된다.
struct RunCore {
    script: Arc<Script>,
    pool: Option<Arc<OptionPool>>,
    policy: RevealPolicy,
    cursor: usize,
    status: RunStatus,
    transcript: Transcript,
    collected: CollectedState,
    on_complete: Option<CompletionCallback>,
    events: Option<UnboundedSender<EngineEvent>>,
    runtime: Option<Handle>,
    cancel: CancellationToken,
}

type SharedCore = Arc<Mutex<RunCore>>;

impl RunCore {
    fn emit(&self, event: EngineEvent) {
        if let Some(sender) = &self.events {
            let _ = sender.send(event);
        }
    }

    /// 상태를 바꾸지 않고 거부 사실만 기록한다.
    fn reject(&self, err: RunError) -> RunError {
        warn!(status = %self.status, cursor = self.cursor, "요청 거부: {err}");
        self.emit(EngineEvent::Rejected {
            reason: err.to_string(),
        });
        err
    }

    fn out_of_phase(&self, operation: &'static str) -> RunError {
        self.reject(RunError::OutOfPhase {
            operation,
            status: self.status,
        })
    }

    /// 타이머를 띄울 런타임을 찾는다. 없으면 상태를 바꾸지 않고 거부한다.
    fn ensure_runtime(&mut self, operation: &'static str) -> Result<Handle, RunError> {
        if let Some(handle) = &self.runtime {
            return Ok(handle.clone());
        }
        match Handle::try_current() {
            Ok(handle) => {
                self.runtime = Some(handle.clone());
                Ok(handle)
            }
            Err(_) => Err(self.reject(RunError::NoRuntime { operation })),
        }
    }

    /// 현재 Step 다음에 노출할 Step이 남아 있는지 확인한다.
    fn has_next(&self) -> bool {
        self.cursor + 1 < self.script.len()
    }

    /// 다음 Step이 있으면 그 Step을 노출할 런타임을 미리 확보한다.
    fn runtime_for_next(&mut self, operation: &'static str) -> Result<Option<Handle>, RunError> {
        if self.has_next() {
            self.ensure_runtime(operation).map(Some)
        } else {
            Ok(None)
        }
    }

    /// 커서를 넘기고 다음 Step 노출을 시작하거나 완료 처리한다.
    ///
    /// `runtime`은 다음 Step이 남아 있을 때만 `Some`이다. 완료되면 잠금 밖에서
    /// 호출할 콜백과 결과물을 돌려준다.
    fn step_forward(
        &mut self,
        shared: &SharedCore,
        runtime: Option<&Handle>,
    ) -> Option<(CompletionCallback, CompletionPayload)> {
        self.cursor += 1;
        if let Some(runtime) = runtime.filter(|_| self.cursor < self.script.len()) {
            self.begin_reveal(shared, runtime);
            return None;
        }
        self.status = RunStatus::Complete;
        info!(script = %self.script.name, collected = self.collected.len(), "대화 완료");
        self.emit(EngineEvent::Completed {
            collected: self.collected.clone(),
        });
        let payload = CompletionPayload::from_collected(&self.collected);
        self.on_complete.take().map(|callback| (callback, payload))
    }

    /// 현재 커서의 Step에 대해 노출 타이머를 건다.
    fn begin_reveal(&mut self, shared: &SharedCore, runtime: &Handle) {
        let index = self.cursor;
        let delay = self.policy.delay_for(&self.script.steps[index]);
        self.status = RunStatus::Revealing;
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        debug!(step = index, delay_ms, "노출 예약");
        self.emit(EngineEvent::Revealing { step_index: index });
        let shared = Arc::clone(shared);
        schedule_reveal(runtime, self.cancel.child_token(), delay, move || {
            finish_reveal(&shared, index);
        });
    }
}

fn lock(core: &SharedCore) -> MutexGuard<'_, RunCore> {
    core.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 노출 지연이 끝났을 때 메시지를 추가하고 다음 게이트로 넘어간다.
fn finish_reveal(shared: &SharedCore, index: usize) {
    let mut core = lock(shared);
    if core.cancel.is_cancelled() || core.status != RunStatus::Revealing || core.cursor != index {
        debug!(step = index, status = %core.status, "지난 노출 타이머 무시");
        return;
    }
    let script = Arc::clone(&core.script);
    let step = &script.steps[index];
    let entry = core.transcript.append(Sender::Bot, step.text.as_str()).clone();
    core.emit(EngineEvent::MessageAppended { entry });
    let gate = Gate::for_step(step);
    core.status = gate.status();
    match gate {
        Gate::Click => core.emit(EngineEvent::AwaitingClick { step_index: index }),
        Gate::Directive(directive) => {
            debug!(step = index, key = directive.key(), "지시어 입력 대기");
            core.emit(EngineEvent::AwaitingDirective {
                step_index: index,
                directive,
            });
        }
    }
}

/// 스크립트 한 벌을 실행하는 대화 세션이다.
///
/// Transcript와 Collected State를 단독으로 소유한다. 노출 타이머는 tokio 태스크로
/// 예약되므로 `RunBuilder::runtime`으로 런타임을 지정하지 않았다면 `start`, `advance`,
/// `resolve`는 tokio 런타임 안에서 호출해야 한다. 런타임이 없으면 `RunError::NoRuntime`.
/// Run을 버리면 취소 토큰이 함께 취소된다.
pub struct Run {
    core: SharedCore,
    cancel: CancellationToken,
}

impl Run {
    /// 첫 Step 노출을 시작한다. idle 상태에서만 허용된다.
    pub fn start(&self) -> Result<(), RunError> {
        let mut core = lock(&self.core);
        if core.status != RunStatus::Idle {
            return Err(core.out_of_phase("start"));
        }
        let runtime = core.ensure_runtime("start")?;
        info!(script = %core.script.name, steps = core.script.len(), "대화 시작");
        core.begin_reveal(&self.core, &runtime);
        Ok(())
    }

    /// 클릭 대기 중인 Step을 넘긴다.
    pub fn advance(&self) -> Result<(), RunError> {
        let completion = {
            let mut core = lock(&self.core);
            if core.status != RunStatus::AwaitingClick {
                return Err(core.out_of_phase("advance"));
            }
            let runtime = core.runtime_for_next("advance")?;
            core.step_forward(&self.core, runtime.as_ref())
        };
        fire_completion(completion);
        Ok(())
    }

    /// 대기 중인 지시어에 값을 넣고 곧바로 다음 Step으로 진행한다.
    ///
    /// 검증에 실패하면 상태를 바꾸지 않고 오류를 반환한다. 호출자는 고친 값으로
    /// 다시 호출하면 된다.
    pub fn resolve(&self, key: &str, input: impl Into<DirectiveInput>) -> Result<(), RunError> {
        let input = input.into();
        let completion = {
            let mut core = lock(&self.core);
            if core.status != RunStatus::AwaitingDirective {
                return Err(core.out_of_phase("resolve"));
            }
            let index = core.cursor;
            let script = Arc::clone(&core.script);
            let Some(directive) = script.steps[index].directive.as_ref() else {
                return Err(core.out_of_phase("resolve"));
            };
            if directive.key() != key {
                return Err(core.reject(RunError::KeyMismatch {
                    expected: directive.key().to_string(),
                    actual: key.to_string(),
                }));
            }
            let resolution =
                match resolve_directive(directive, &input, core.pool.as_deref(), index) {
                    Ok(resolution) => resolution,
                    Err(err) => return Err(core.reject(err)),
                };
            let runtime = core.runtime_for_next("resolve")?;
            let overwritten =
                core.collected
                    .record(key, resolution.value, resolution.display.clone());
            if overwritten {
                info!(key, "이미 수집된 키를 덮어씀");
            }
            let entry = core.transcript.append(Sender::User, resolution.display).clone();
            core.emit(EngineEvent::MessageAppended { entry });
            core.step_forward(&self.core, runtime.as_ref())
        };
        fire_completion(completion);
        Ok(())
    }

    /// 커서가 마지막 Step을 지나 완료되었는지 확인한다.
    pub fn is_complete(&self) -> bool {
        lock(&self.core).status == RunStatus::Complete
    }

    /// 현재 Run 상태를 반환한다.
    pub fn status(&self) -> RunStatus {
        lock(&self.core).status
    }

    /// 현재 Step 인덱스. 완료 후에는 Step 수와 같다.
    pub fn cursor(&self) -> usize {
        lock(&self.core).cursor
    }

    /// Transcript 스냅샷을 반환한다.
    pub fn transcript(&self) -> Transcript {
        lock(&self.core).transcript.clone()
    }

    /// Collected State 스냅샷을 반환한다.
    pub fn collected(&self) -> CollectedState {
        lock(&self.core).collected.clone()
    }

    /// 입력을 기다리는 지시어가 있으면 반환한다.
    pub fn pending_directive(&self) -> Option<Directive> {
        let core = lock(&self.core);
        if core.status != RunStatus::AwaitingDirective {
            return None;
        }
        core.script.steps[core.cursor].directive.clone()
    }

    /// 이 Run이 재생하는 스크립트를 반환한다.
    pub fn script(&self) -> Arc<Script> {
        Arc::clone(&lock(&self.core).script)
    }

    /// Run을 명시적으로 종료한다. 대기 중인 노출 타이머는 더 이상 메시지를 추가하지
    /// 않으며 완료 콜백도 호출되지 않는다. 이미 끝난 Run이면 `false`를 반환한다.
    pub fn cancel(&self) -> bool {
        let mut core = lock(&self.core);
        if core.status.is_terminal() {
            return false;
        }
        self.cancel.cancel();
        core.status = RunStatus::Cancelled;
        core.on_complete = None;
        info!(cursor = core.cursor, "대화 종료 요청");
        core.emit(EngineEvent::Cancelled);
        true
    }
}

impl Drop for Run {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn fire_completion(completion: Option<(CompletionCallback, CompletionPayload)>) {
    if let Some((callback, payload)) = completion {
        callback(payload);
    }
}
