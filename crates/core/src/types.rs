//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 로깅 프레임워크가 만든 [`LogEvent`]와 전송 계층에 넘기는 [`Envelope`]를 정의합니다.
//! 알림 모듈과 데몬은 이 타입들로 이벤트와 메시지를 교환합니다.

use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 로그 이벤트
///
/// 외부 로깅 프레임워크가 생성하며, 이 시스템에서는 읽기 전용입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    /// 발생 시각 (JSON에서는 RFC 3339 문자열)
    #[serde(with = "rfc3339", default = "SystemTime::now")]
    pub timestamp: SystemTime,
    /// 로그 레벨
    pub level: Level,
    /// 로거(카테고리) 이름
    #[serde(default)]
    pub logger: String,
    /// 렌더링된 메시지
    pub message: String,
    /// 스택 트레이스 라인
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stack_trace: Vec<String>,
    /// 스레드 이름
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread: Option<String>,
    /// 컨텍스트 태그 (key-value 쌍)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<(String, String)>,
}

impl LogEvent {
    /// 현재 시각으로 이벤트를 생성합니다.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            level,
            logger: String::new(),
            message: message.into(),
            stack_trace: Vec::new(),
            thread: None,
            context: Vec::new(),
        }
    }

    /// 로거 이름을 지정합니다.
    pub fn with_logger(mut self, logger: impl Into<String>) -> Self {
        self.logger = logger.into();
        self
    }

    /// 스레드 이름을 지정합니다.
    pub fn with_thread(mut self, thread: impl Into<String>) -> Self {
        self.thread = Some(thread.into());
        self
    }

    /// 스택 트레이스를 지정합니다.
    pub fn with_stack_trace(mut self, lines: Vec<String>) -> Self {
        self.stack_trace = lines;
        self
    }

    /// 컨텍스트 태그를 추가합니다.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.push((key.into(), value.into()));
        self
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.logger, self.message)
    }
}

/// 로그 레벨
///
/// `Ord` 구현으로 비교가 가능합니다 (`Trace < Debug < Info < Warn < Error < Fatal`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// 추적
    Trace,
    /// 디버그
    Debug,
    /// 정보
    #[default]
    Info,
    /// 경고
    Warn,
    /// 에러
    Error,
    /// 치명적 에러
    Fatal,
}

impl Level {
    /// 문자열에서 레벨을 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" | "information" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" | "err" => Some(Self::Error),
            "fatal" | "critical" | "crit" => Some(Self::Fatal),
            _ => None,
        }
    }

    /// 대문자 레벨 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_loose(s).ok_or_else(|| format!("unknown level '{s}'"))
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// 메일 주소
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// 표시 이름 (`"Ops" <ops@example.com>` 형식일 때)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// 실제 주소 (`local@domain`)
    pub email: String,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "\"{}\" <{}>", name, self.email),
            None => f.write_str(&self.email),
        }
    }
}

/// 전송 계층에 넘기는 완성된 메시지
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// 발신자
    pub from: Option<Address>,
    /// 회신 주소
    pub reply_to: Vec<Address>,
    /// 수신자
    pub to: Vec<Address>,
    /// 참조
    pub cc: Vec<Address>,
    /// 숨은 참조
    pub bcc: Vec<Address>,
    /// 제목
    pub subject: String,
    /// 본문
    pub body: String,
    /// 본문 MIME 타입 (예: `text/plain`)
    pub content_type: String,
}

impl Envelope {
    /// to/cc/bcc 중 하나라도 수신자가 있는지 확인합니다.
    pub fn has_recipients(&self) -> bool {
        !(self.to.is_empty() && self.cc.is_empty() && self.bcc.is_empty())
    }

    /// 전체 수신자 수
    pub fn recipient_count(&self) -> usize {
        self.to.len() + self.cc.len() + self.bcc.len()
    }
}

/// `SystemTime` <-> RFC 3339 문자열 변환
pub mod rfc3339 {
    use std::time::SystemTime;

    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// RFC 3339 문자열로 직렬화합니다 (밀리초, UTC).
    pub fn serialize<S: Serializer>(ts: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(*ts))
    }

    /// RFC 3339 문자열을 역직렬화합니다. 오프셋은 UTC로 정규화됩니다.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SystemTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(SystemTime::from)
            .map_err(serde::de::Error::custom)
    }

    /// 로그/본문 출력용 포맷
    pub fn format(ts: SystemTime) -> String {
        DateTime::<Utc>::from(ts).to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
