//! 설정 관리 — floodmail.toml 파싱 및 런타임 설정
//!
//! [`FloodmailConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//! 로드 후에는 변경하지 않으며, 재로드는 전체 재구성으로 처리합니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`FLOODMAIL_NOTIFIER_TO=ops@example.com` 형식)
//! 3. 설정 파일 (`floodmail.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), floodmail_core::error::FloodmailError> {
//! use floodmail_core::config::FloodmailConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = FloodmailConfig::load("floodmail.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = FloodmailConfig::parse("[notifier]\nto = \"ops@example.com\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, FloodmailError};
use crate::types::Level;

/// 버퍼 용량 상한
pub const MAX_BUFFER_SIZE: usize = 100_000;
/// 발송 큐 용량 상한
pub const MAX_DISPATCH_QUEUE_CAPACITY: usize = 10_000;

/// 평가기 설정값: 속도 제한 + 필터
pub const EVALUATOR_FLOOD_FILTER: &str = "flood_filter";
/// 평가기 설정값: 레벨 임계값만
pub const EVALUATOR_LEVEL_THRESHOLD: &str = "level_threshold";

/// floodmail 통합 설정
///
/// `floodmail.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FloodmailConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 알림 채널 설정
    #[serde(default)]
    pub notifier: NotifierConfig,
    /// 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl FloodmailConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, FloodmailError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, FloodmailError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FloodmailError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                FloodmailError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, FloodmailError> {
        toml::from_str(toml_str).map_err(|e| {
            FloodmailError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `FLOODMAIL_{SECTION}_{FIELD}`
    /// 예: `FLOODMAIL_NOTIFIER_FLOOD_FREQUENCY=10`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "FLOODMAIL_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "FLOODMAIL_GENERAL_LOG_FORMAT");

        // Notifier
        let n = &mut self.notifier;
        override_string(&mut n.to, "FLOODMAIL_NOTIFIER_TO");
        override_string(&mut n.cc, "FLOODMAIL_NOTIFIER_CC");
        override_string(&mut n.bcc, "FLOODMAIL_NOTIFIER_BCC");
        override_string(&mut n.from, "FLOODMAIL_NOTIFIER_FROM");
        override_string(&mut n.reply_to, "FLOODMAIL_NOTIFIER_REPLY_TO");
        override_string(&mut n.subject, "FLOODMAIL_NOTIFIER_SUBJECT");
        override_usize(&mut n.buffer_size, "FLOODMAIL_NOTIFIER_BUFFER_SIZE");
        override_u32(&mut n.flood_frequency, "FLOODMAIL_NOTIFIER_FLOOD_FREQUENCY");
        override_u64(&mut n.flood_window_ms, "FLOODMAIL_NOTIFIER_FLOOD_WINDOW_MS");
        override_string(&mut n.flood_message, "FLOODMAIL_NOTIFIER_FLOOD_MESSAGE");
        override_bool(&mut n.send_on_close, "FLOODMAIL_NOTIFIER_SEND_ON_CLOSE");
        override_string(&mut n.evaluator, "FLOODMAIL_NOTIFIER_EVALUATOR");
        override_opt_string(&mut n.min_level, "FLOODMAIL_NOTIFIER_MIN_LEVEL");
        override_string(&mut n.route_by, "FLOODMAIL_NOTIFIER_ROUTE_BY");
        override_string(&mut n.layout, "FLOODMAIL_NOTIFIER_LAYOUT");
        override_string(&mut n.filter_config, "FLOODMAIL_NOTIFIER_FILTER_CONFIG");
        override_usize(
            &mut n.dispatch_queue_capacity,
            "FLOODMAIL_NOTIFIER_DISPATCH_QUEUE_CAPACITY",
        );

        // Metrics
        override_bool(&mut self.metrics.enabled, "FLOODMAIL_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "FLOODMAIL_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "FLOODMAIL_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), FloodmailError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        self.notifier.validate()?;

        if self.metrics.enabled && self.metrics.endpoint != "/metrics" {
            return Err(invalid(
                "metrics.endpoint",
                "only '/metrics' is supported".to_owned(),
            ));
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 알림 채널 설정
///
/// 주소 필드는 쉼표로 구분된 목록이며, 빈 문자열은 "설정 안 함"을 뜻합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// 기본 수신자
    pub to: String,
    /// 참조
    pub cc: String,
    /// 숨은 참조
    pub bcc: String,
    /// 발신자
    pub from: String,
    /// 회신 주소
    pub reply_to: String,
    /// 메시지 제목
    pub subject: String,
    /// 이벤트 버퍼 용량 (가득 차면 플러시)
    pub buffer_size: usize,
    /// 홍수 판정 이벤트 수 N (0이면 속도 제한 비활성화)
    pub flood_frequency: u32,
    /// 홍수 판정 윈도우 W (밀리초, 0이면 속도 제한 비활성화)
    pub flood_window_ms: u64,
    /// 홍수 시작 시 마지막으로 보내는 안내 본문
    pub flood_message: String,
    /// 종료 시 버퍼 플러시 여부
    pub send_on_close: bool,
    /// 트리거 평가기 (flood_filter, level_threshold)
    pub evaluator: String,
    /// 최소 로그 레벨 (없으면 레벨 게이트 비활성화)
    pub min_level: Option<String>,
    /// 수신자 라우팅 기준 (body, trigger_event)
    pub route_by: String,
    /// 본문 레이아웃 (text, json)
    pub layout: String,
    /// 필터 설정 파일 경로 (YAML)
    pub filter_config: String,
    /// 발송 큐 용량
    pub dispatch_queue_capacity: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            to: String::new(),
            cc: String::new(),
            bcc: String::new(),
            from: String::new(),
            reply_to: String::new(),
            subject: "floodmail notification".to_owned(),
            buffer_size: 512,
            flood_frequency: 5,
            flood_window_ms: 60_000,
            flood_message: "Notification flood detected; further notifications are \
                            suppressed until the event rate drops."
                .to_owned(),
            send_on_close: false,
            evaluator: EVALUATOR_FLOOD_FILTER.to_owned(),
            min_level: None,
            route_by: "body".to_owned(),
            layout: "text".to_owned(),
            filter_config: "/etc/floodmail/filter-config.yml".to_owned(),
            dispatch_queue_capacity: 64,
        }
    }
}

impl NotifierConfig {
    /// 알림 채널 설정을 검증합니다.
    pub fn validate(&self) -> Result<(), FloodmailError> {
        if self.buffer_size == 0 || self.buffer_size > MAX_BUFFER_SIZE {
            return Err(invalid(
                "notifier.buffer_size",
                format!("must be 1-{MAX_BUFFER_SIZE}"),
            ));
        }

        if self.dispatch_queue_capacity == 0
            || self.dispatch_queue_capacity > MAX_DISPATCH_QUEUE_CAPACITY
        {
            return Err(invalid(
                "notifier.dispatch_queue_capacity",
                format!("must be 1-{MAX_DISPATCH_QUEUE_CAPACITY}"),
            ));
        }

        let valid_evaluators = [EVALUATOR_FLOOD_FILTER, EVALUATOR_LEVEL_THRESHOLD];
        if !valid_evaluators.contains(&self.evaluator.as_str()) {
            return Err(invalid(
                "notifier.evaluator",
                format!("must be one of: {}", valid_evaluators.join(", ")),
            ));
        }

        if let Some(level) = &self.min_level
            && Level::from_str_loose(level).is_none()
        {
            return Err(invalid(
                "notifier.min_level",
                format!("unknown level '{level}'"),
            ));
        }

        let valid_routes = ["body", "trigger_event"];
        if !valid_routes.contains(&self.route_by.as_str()) {
            return Err(invalid(
                "notifier.route_by",
                format!("must be one of: {}", valid_routes.join(", ")),
            ));
        }

        let valid_layouts = ["text", "json"];
        if !valid_layouts.contains(&self.layout.as_str()) {
            return Err(invalid(
                "notifier.layout",
                format!("must be one of: {}", valid_layouts.join(", ")),
            ));
        }

        Ok(())
    }

    /// 속도 제한이 활성화되어 있는지 확인합니다.
    pub fn flood_protection_enabled(&self) -> bool {
        self.flood_frequency > 0 && self.flood_window_ms > 0
    }
}

/// 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus 엔드포인트 활성화 여부
    pub enabled: bool,
    /// 바인드 주소
    pub listen_addr: String,
    /// 포트
    pub port: u16,
    /// 엔드포인트 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9102,
            endpoint: "/metrics".to_owned(),
        }
    }
}

fn invalid(field: &str, reason: String) -> FloodmailError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_opt_string(target: &mut Option<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = if val.trim().is_empty() { None } else { Some(val) };
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    override_parsed(target, env_key, "usize");
}

fn override_u16(target: &mut u16, env_key: &str) {
    override_parsed(target, env_key, "u16");
}

fn override_u32(target: &mut u32, env_key: &str) {
    override_parsed(target, env_key, "u32");
}

fn override_u64(target: &mut u64, env_key: &str) {
    override_parsed(target, env_key, "u64");
}

fn override_parsed<T: std::str::FromStr>(target: &mut T, env_key: &str, type_name: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                expected = type_name,
                "failed to parse env var, ignoring"
            ),
        }
    }
}
