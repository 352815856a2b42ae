//! 알림 채널 설정
//!
//! [`ChannelConfig`]는 core의 [`NotifierConfig`](floodmail_core::config::NotifierConfig)를
//! 기반으로 문자열 설정값을 타입이 있는 값으로 변환한 채널 전용 설정입니다.
//!
//! # 사용 예시
//! ```ignore
//! use floodmail_core::config::FloodmailConfig;
//! use floodmail_notifier::config::ChannelConfig;
//!
//! let core_config = FloodmailConfig::default();
//! let config = ChannelConfig::from_core(&core_config.notifier)?;
//! ```

use std::time::Duration;

use floodmail_core::config::{
    EVALUATOR_FLOOD_FILTER, EVALUATOR_LEVEL_THRESHOLD, MAX_BUFFER_SIZE,
    MAX_DISPATCH_QUEUE_CAPACITY, NotifierConfig,
};
use floodmail_core::types::Level;

use crate::error::NotifierError;

/// 트리거 평가기 종류
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EvaluatorKind {
    /// 레벨 게이트(선택) + 홍수 보호 + 필터
    #[default]
    FloodFilter,
    /// 레벨 임계값만 (홍수 보호 없음)
    LevelThreshold,
}

impl EvaluatorKind {
    /// 설정 문자열에서 변환합니다.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            EVALUATOR_FLOOD_FILTER => Some(Self::FloodFilter),
            EVALUATOR_LEVEL_THRESHOLD => Some(Self::LevelThreshold),
            _ => None,
        }
    }
}

/// 수신자 라우팅 기준
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RouteTarget {
    /// 포맷된 배치 본문 전체
    #[default]
    Body,
    /// 배치의 마지막(트리거) 이벤트 메시지
    TriggerEvent,
}

/// 본문 레이아웃 종류
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LayoutKind {
    /// 사람이 읽는 텍스트
    #[default]
    Text,
    /// 이벤트당 JSON 한 줄
    Json,
}

/// 알림 채널 설정
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// 기본 수신자 (쉼표 구분)
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
    /// 버퍼 용량
    pub buffer_size: usize,
    /// 홍수 판정 이벤트 수 N
    pub flood_frequency: usize,
    /// 홍수 판정 윈도우 W
    pub flood_window: Duration,
    /// 홍수 시작 안내 본문
    pub flood_message: String,
    /// 종료 시 버퍼 플러시 여부
    pub send_on_close: bool,
    /// 트리거 평가기
    pub evaluator: EvaluatorKind,
    /// 레벨 게이트 (`LevelThreshold`에서는 없으면 Error)
    pub min_level: Option<Level>,
    /// 라우팅 기준
    pub route_by: RouteTarget,
    /// 본문 레이아웃
    pub layout: LayoutKind,
    /// 발송 큐 용량
    pub dispatch_queue_capacity: usize,
}

impl Default for ChannelConfig {
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
            flood_window: Duration::from_millis(60_000),
            flood_message: "Notification flood detected; further notifications are \
                            suppressed until the event rate drops."
                .to_owned(),
            send_on_close: false,
            evaluator: EvaluatorKind::FloodFilter,
            min_level: None,
            route_by: RouteTarget::Body,
            layout: LayoutKind::Text,
            dispatch_queue_capacity: 64,
        }
    }
}

impl ChannelConfig {
    /// core의 `NotifierConfig`에서 채널 설정을 생성합니다.
    ///
    /// 문자열 값을 해석할 수 없으면 에러를 반환합니다.
    pub fn from_core(core: &NotifierConfig) -> Result<Self, NotifierError> {
        let evaluator = EvaluatorKind::parse(&core.evaluator)
            .ok_or_else(|| config_error("evaluator", format!("unknown '{}'", core.evaluator)))?;

        let min_level = match &core.min_level {
            Some(raw) => Some(
                Level::from_str_loose(raw)
                    .ok_or_else(|| config_error("min_level", format!("unknown level '{raw}'")))?,
            ),
            None => None,
        };

        let route_by = match core.route_by.as_str() {
            "body" => RouteTarget::Body,
            "trigger_event" => RouteTarget::TriggerEvent,
            other => return Err(config_error("route_by", format!("unknown '{other}'"))),
        };

        let layout = match core.layout.as_str() {
            "text" => LayoutKind::Text,
            "json" => LayoutKind::Json,
            other => return Err(config_error("layout", format!("unknown '{other}'"))),
        };

        let flood_frequency = usize::try_from(core.flood_frequency)
            .map_err(|_| config_error("flood_frequency", "out of range".to_owned()))?;

        let config = Self {
            to: core.to.clone(),
            cc: core.cc.clone(),
            bcc: core.bcc.clone(),
            from: core.from.clone(),
            reply_to: core.reply_to.clone(),
            subject: core.subject.clone(),
            buffer_size: core.buffer_size,
            flood_frequency,
            flood_window: Duration::from_millis(core.flood_window_ms),
            flood_message: core.flood_message.clone(),
            send_on_close: core.send_on_close,
            evaluator,
            min_level,
            route_by,
            layout,
            dispatch_queue_capacity: core.dispatch_queue_capacity,
        };
        config.validate()?;
        Ok(config)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), NotifierError> {
        if self.buffer_size == 0 || self.buffer_size > MAX_BUFFER_SIZE {
            return Err(config_error(
                "buffer_size",
                format!("must be 1-{MAX_BUFFER_SIZE}"),
            ));
        }

        if self.dispatch_queue_capacity == 0
            || self.dispatch_queue_capacity > MAX_DISPATCH_QUEUE_CAPACITY
        {
            return Err(config_error(
                "dispatch_queue_capacity",
                format!("must be 1-{MAX_DISPATCH_QUEUE_CAPACITY}"),
            ));
        }

        Ok(())
    }

    /// 속도 제한이 활성화되어 있는지 확인합니다.
    pub fn flood_protection_enabled(&self) -> bool {
        self.flood_frequency > 0 && !self.flood_window.is_zero()
    }
}

fn config_error(field: &str, reason: String) -> NotifierError {
    NotifierError::Config {
        field: field.to_owned(),
        reason,
    }
}

/// 채널 설정 빌더
#[derive(Default)]
pub struct ChannelConfigBuilder {
    config: ChannelConfig,
}

impl ChannelConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 기본 수신자를 설정합니다.
    pub fn to(mut self, to: impl Into<String>) -> Self {
        self.config.to = to.into();
        self
    }

    /// 참조 수신자를 설정합니다.
    pub fn cc(mut self, cc: impl Into<String>) -> Self {
        self.config.cc = cc.into();
        self
    }

    /// 숨은 참조 수신자를 설정합니다.
    pub fn bcc(mut self, bcc: impl Into<String>) -> Self {
        self.config.bcc = bcc.into();
        self
    }

    /// 발신자를 설정합니다.
    pub fn from_address(mut self, from: impl Into<String>) -> Self {
        self.config.from = from.into();
        self
    }

    /// 회신 주소를 설정합니다.
    pub fn reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.config.reply_to = reply_to.into();
        self
    }

    /// 제목을 설정합니다.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.config.subject = subject.into();
        self
    }

    /// 버퍼 용량을 설정합니다.
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.config.buffer_size = size;
        self
    }

    /// 홍수 판정 기준(N, W)을 설정합니다.
    pub fn flood(mut self, frequency: usize, window: Duration) -> Self {
        self.config.flood_frequency = frequency;
        self.config.flood_window = window;
        self
    }

    /// 홍수 시작 안내 본문을 설정합니다.
    pub fn flood_message(mut self, message: impl Into<String>) -> Self {
        self.config.flood_message = message.into();
        self
    }

    /// 종료 시 플러시 여부를 설정합니다.
    pub fn send_on_close(mut self, enabled: bool) -> Self {
        self.config.send_on_close = enabled;
        self
    }

    /// 트리거 평가기를 설정합니다.
    pub fn evaluator(mut self, kind: EvaluatorKind) -> Self {
        self.config.evaluator = kind;
        self
    }

    /// 레벨 게이트를 설정합니다.
    pub fn min_level(mut self, level: Level) -> Self {
        self.config.min_level = Some(level);
        self
    }

    /// 라우팅 기준을 설정합니다.
    pub fn route_by(mut self, target: RouteTarget) -> Self {
        self.config.route_by = target;
        self
    }

    /// 본문 레이아웃을 설정합니다.
    pub fn layout(mut self, layout: LayoutKind) -> Self {
        self.config.layout = layout;
        self
    }

    /// 발송 큐 용량을 설정합니다.
    pub fn dispatch_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.dispatch_queue_capacity = capacity;
        self
    }

    /// 설정을 검증하고 `ChannelConfig`를 생성합니다.
    pub fn build(self) -> Result<ChannelConfig, NotifierError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
