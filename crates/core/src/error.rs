//! 에러 타입 — 도메인별 에러 정의

/// floodmail 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum FloodmailError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 필터 설정 에러
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),

    /// 알림 발송 에러
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 필터 설정 에러
///
/// 모든 필터 에러는 로드 시점에 발생합니다. 매칭 시점에는 에러가 없습니다.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// 필터 파일 읽기/파싱 실패
    #[error("failed to load filter config {path}: {reason}")]
    Load { path: String, reason: String },

    /// 필수 필드 누락 등 규칙 구조 오류
    #[error("invalid filter rule #{index}: {reason}")]
    InvalidRule { index: usize, reason: String },

    /// 정규식 컴파일 실패
    #[error("invalid regex in filter rule #{index}: {reason}")]
    InvalidRegex { index: usize, reason: String },

    /// 정의되지 않은 변수 참조
    #[error("undefined variable(s): {names}")]
    UndefinedVariable { names: String },

    /// 변수 중복 정의
    #[error("duplicate variable definition: {0}")]
    DuplicateVariable(String),

    /// `${name}` 토큰으로 참조할 수 없는 변수 이름
    #[error("invalid variable name '{0}': expected [A-Za-z_][A-Za-z0-9_.-]*")]
    InvalidVariableName(String),
}

/// 알림 발송 에러
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// 전송 계층 실패 (연결, 인증 등)
    #[error("transport failed: {0}")]
    Transport(String),

    /// 모든 수신자 필드가 비었거나 파싱에 실패함
    #[error("no valid recipients")]
    NoRecipients,

    /// 발송 큐가 가득 참
    #[error("dispatch queue full (capacity {capacity})")]
    QueueFull { capacity: usize },

    /// 발송 큐가 닫힘
    #[error("dispatch queue closed")]
    QueueClosed,
}
