use crate::engine::RunStatus;

/// 스크립트 로딩/검증 중 발생 가능한 오류를 표현한다.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// Step 목록이 비어 있는 경우이다.
    #[error("스크립트 '{0}'에 Step이 없습니다.")]
    EmptyScript(String),
    /// 메시지가 비어 있는 Step이다.
    #[error("{index}번째 Step의 메시지가 비어 있습니다.")]
    EmptyText { index: usize },
    /// 사용자 발화는 스크립트에 직접 작성할 수 없다.
    #[error("{index}번째 Step은 user 발신자로 작성되었습니다. 스크립트 Step은 bot만 허용됩니다.")]
    ScriptedUserStep { index: usize },
    /// 선택 개수가 0인 선택 지시어이다.
    #[error("{index}번째 Step의 선택 개수는 1 이상이어야 합니다.")]
    ZeroCardinality { index: usize },
    /// 선택 지시어의 키가 비어 있는 경우이다.
    #[error("{index}번째 Step의 선택 키가 비어 있습니다.")]
    EmptySelectionKey { index: usize },
}

/// 지시어 입력 검증 실패를 표현한다. 모두 재입력으로 복구 가능하다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectiveError {
    /// 자릿수가 맞지 않는 입력이다.
    #[error("{expected}자리로 입력해 주세요. (입력: {actual}자리)")]
    WrongLength { expected: usize, actual: usize },
    /// 숫자가 아닌 문자가 섞인 입력이다.
    #[error("숫자만 입력해 주세요: {0}")]
    NonNumeric(String),
    /// 존재할 수 없는 월/일이다.
    #[error("올바르지 않은 날짜입니다: {0}")]
    InvalidDate(String),
    /// 허용 목록에 없는 범주 값이다.
    #[error("'{value}'은(는) {attribute} 항목에서 선택할 수 없는 값입니다.")]
    UnknownCategory { attribute: String, value: String },
    /// 선택 개수가 맞지 않는다.
    #[error("정확히 {expected}개를 선택해야 합니다. (선택: {actual}개)")]
    Cardinality { expected: usize, actual: usize },
    /// 같은 항목을 두 번 선택했다.
    #[error("같은 항목을 중복 선택할 수 없습니다: {0}")]
    DuplicateChoice(usize),
    /// 옵션 풀 범위를 벗어난 선택이다.
    #[error("존재하지 않는 항목입니다: {index} (전체 {pool_size}개)")]
    OutOfPool { index: usize, pool_size: usize },
    /// 지시어 종류와 입력 형태가 맞지 않는다.
    #[error("{expected} 형태의 입력이 필요합니다.")]
    WrongInputShape { expected: &'static str },
}

/// Run 호출 경계에서 거부된 요청을 표현한다. Run 상태는 변경되지 않는다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunError {
    /// 현재 상태에서 허용되지 않는 호출이다.
    #[error("{operation}은(는) {status} 상태에서 호출할 수 없습니다.")]
    OutOfPhase {
        operation: &'static str,
        status: RunStatus,
    },
    /// 대기 중인 지시어와 키가 다르다.
    #[error("대기 중인 지시어 키는 '{expected}'입니다. (요청: '{actual}')")]
    KeyMismatch { expected: String, actual: String },
    /// 입력 검증 실패이다.
    #[error("입력 값 오류: {0}")]
    InvalidInput(#[from] DirectiveError),
    /// 스크립트 구성이 잘못되었다.
    #[error("스크립트 오류: {0}")]
    InvalidScript(String),
    /// 노출 타이머를 띄울 tokio 런타임이 없다.
    #[error("{operation}을(를) 처리할 tokio 런타임이 없습니다.")]
    NoRuntime { operation: &'static str },
    /// 세션에 진행 중인 Run이 없다.
    #[error("진행 중인 대화가 없습니다.")]
    NoActiveRun,
    /// 선택 지시어가 있지만 옵션 풀이 주어지지 않았다.
    #[error("{index}번째 Step은 옵션 풀이 필요하지만 제공되지 않았습니다.")]
    MissingOptionPool { index: usize },
    /// 옵션 풀이 선택 개수보다 작다.
    #[error("{index}번째 Step은 {cardinality}개 선택이 필요하지만 옵션 풀은 {pool_size}개뿐입니다.")]
    PoolTooSmall {
        index: usize,
        cardinality: usize,
        pool_size: usize,
    },
}

/// 설정 파일 처리 오류이다.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 파일 읽기 실패이다.
    #[error("설정 파일을 읽을 수 없습니다: {0}")]
    Io(#[from] std::io::Error),
    /// YAML 파싱 실패이다.
    #[error("설정 파일 형식 오류: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// 값 범위 오류이다.
    #[error("잘못된 설정 값 {key}: {message}")]
    InvalidValue { key: String, message: String },
}
