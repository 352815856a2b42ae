//! 알림 채널 에러 타입
//!
//! [`NotifierError`]는 알림 채널 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<NotifierError> for FloodmailError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use floodmail_core::error::{ConfigError, DispatchError, FilterError, FloodmailError};

/// 알림 채널 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 필터 로딩/검증 에러
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// 발송 에러
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// 주소 파싱 실패
    #[error("invalid address '{input}': {reason}")]
    Address {
        /// 원본 입력
        input: String,
        /// 실패 사유
        reason: String,
    },

    /// 채널이 이미 닫힘
    #[error("notification channel is closed")]
    Closed,

    /// tokio 런타임 밖에서 채널을 초기화함
    #[error("runtime error: {0}")]
    Runtime(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<NotifierError> for FloodmailError {
    fn from(err: NotifierError) -> Self {
        match err {
            NotifierError::Config { field, reason } => {
                FloodmailError::Config(ConfigError::InvalidValue { field, reason })
            }
            NotifierError::Filter(e) => FloodmailError::Filter(e),
            NotifierError::Dispatch(e) => FloodmailError::Dispatch(e),
            NotifierError::Io(e) => FloodmailError::Io(e),
            other @ (NotifierError::Address { .. }
            | NotifierError::Closed
            | NotifierError::Runtime(_)) => {
                FloodmailError::Dispatch(DispatchError::Transport(other.to_string()))
            }
        }
    }
}
