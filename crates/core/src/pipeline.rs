//! 파이프라인 trait — 모듈 확장 포인트 정의
//!
//! 알림 채널이 외부 협력자에게 위임하는 두 지점을 정의합니다.
//! - [`Transport`]: 완성된 [`Envelope`]의 실제 전달
//! - [`EventLayout`]: 버퍼링된 이벤트의 본문 포맷

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::error::DispatchError;
use crate::types::{Envelope, LogEvent};

/// dyn-compatible trait에서 사용하는 boxed future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 메시지 전송 trait
///
/// SMTP, 웹훅 등 새로운 전송 방식을 지원하려면 이 trait을 구현합니다.
/// 타임아웃 정책은 구현체의 책임입니다.
pub trait Transport: Send + Sync {
    /// 전송 방식 이름 (로깅용)
    fn name(&self) -> &str;

    /// 메시지를 한 번 전송합니다. 재시도하지 않습니다.
    fn send<'a>(&'a self, envelope: &'a Envelope) -> BoxFuture<'a, Result<(), DispatchError>>;
}

/// 본문 포맷 trait
pub trait EventLayout: Send + Sync {
    /// 본문 MIME 타입
    fn content_type(&self) -> &str;

    /// 본문 앞에 붙는 헤더
    fn header(&self) -> Option<String> {
        None
    }

    /// 본문 뒤에 붙는 푸터
    fn footer(&self) -> Option<String> {
        None
    }

    /// 이벤트 하나를 포맷합니다.
    fn format(&self, event: &LogEvent) -> String;

    /// `true`이면 스택 트레이스를 `format`이 출력하지 않으므로
    /// 호출자가 라인 단위로 덧붙입니다.
    fn ignores_stack_trace(&self) -> bool {
        true
    }
}

/// 모듈 건강 상태
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// 정상 동작
    Healthy,
    /// 동작하지만 주의 필요
    Degraded(String),
    /// 동작 불가
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 상태인지 확인합니다.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 동작 불가 상태인지 확인합니다.
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded(reason) => write!(f, "degraded: {reason}"),
            Self::Unhealthy(reason) => write!(f, "unhealthy: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullTransport;

    impl Transport for NullTransport {
        fn name(&self) -> &str {
            "null"
        }

        fn send<'a>(&'a self, envelope: &'a Envelope) -> BoxFuture<'a, Result<(), DispatchError>> {
            Box::pin(async move {
                if envelope.has_recipients() {
                    Ok(())
                } else {
                    Err(DispatchError::NoRecipients)
                }
            })
        }
    }

    #[tokio::test]
    async fn transport_is_object_safe() {
        let transport: Box<dyn Transport> = Box::new(NullTransport);
        let result = transport.send(&Envelope::default()).await;
        assert!(matches!(result, Err(DispatchError::NoRecipients)));
        assert_eq!(transport.name(), "null");
    }

    #[test]
    fn health_status_display() {
        assert_eq!(HealthStatus::Healthy.to_string(), "healthy");
        assert!(
            HealthStatus::Degraded("flooding".to_owned())
                .to_string()
                .contains("flooding")
        );
        assert!(HealthStatus::Unhealthy("closed".to_owned()).is_unhealthy());
    }
}
