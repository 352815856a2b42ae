//! 트리거 평가기 -- 이벤트를 버퍼에 넣을지 결정하는 전략
//!
//! 설정값 `evaluator`로 구현체를 선택합니다.
//! - [`FloodFilterEvaluator`] (`flood_filter`, 기본값): 레벨 게이트(선택) -> 홍수 보호 -> 필터
//! - [`LevelThresholdEvaluator`] (`level_threshold`): 레벨 임계값만

use std::sync::Arc;
use std::time::{Duration, Instant};

use floodmail_core::types::{Level, LogEvent};

use crate::config::{ChannelConfig, EvaluatorKind};
use crate::filter::FilterEngine;
use crate::flood::FloodWindow;

/// 평가 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// 버퍼에 넣을지 여부
    pub accepted: bool,
    /// 이번 이벤트로 홍수 보호가 시작되었는지 여부
    pub flood_began: bool,
    /// 거부 사유
    pub rejection: Option<Rejection>,
}

/// 거부 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// 레벨 게이트 미달
    Level,
    /// 홍수 보호 중
    Flood,
    /// `log: false` 필터 규칙에 일치
    Filter,
}

impl Evaluation {
    fn accept(flood_began: bool) -> Self {
        Self {
            accepted: true,
            flood_began,
            rejection: None,
        }
    }

    fn reject(reason: Rejection, flood_began: bool) -> Self {
        Self {
            accepted: false,
            flood_began,
            rejection: Some(reason),
        }
    }
}

/// 트리거 평가 전략
///
/// 평가기는 채널 락 안에서만 호출되므로 `Sync`가 필요하지 않습니다.
pub trait TriggerEvaluator: Send {
    /// 평가기 이름 (로깅용)
    fn name(&self) -> &str;

    /// `now` 시각에 도착한 이벤트를 평가합니다.
    fn evaluate(&mut self, event: &LogEvent, now: Instant) -> Evaluation;

    /// 현재 홍수 상태인지 확인합니다.
    fn is_flooding(&self) -> bool {
        false
    }
}

/// 레벨 게이트(선택) + 홍수 보호 + 필터 평가기
pub struct FloodFilterEvaluator {
    min_level: Option<Level>,
    window: FloodWindow,
    filters: Arc<FilterEngine>,
}

impl FloodFilterEvaluator {
    /// 새 평가기를 생성합니다.
    pub fn new(
        min_level: Option<Level>,
        frequency: usize,
        window: Duration,
        filters: Arc<FilterEngine>,
    ) -> Self {
        Self {
            min_level,
            window: FloodWindow::new(frequency, window),
            filters,
        }
    }

    /// 내부 홍수 윈도우
    pub fn window(&self) -> &FloodWindow {
        &self.window
    }
}

impl TriggerEvaluator for FloodFilterEvaluator {
    fn name(&self) -> &str {
        "flood_filter"
    }

    fn evaluate(&mut self, event: &LogEvent, now: Instant) -> Evaluation {
        // 게이트에 걸린 이벤트는 홍수 윈도우에 기록하지 않음
        if let Some(min) = self.min_level
            && event.level < min
        {
            return Evaluation::reject(Rejection::Level, false);
        }

        let decision = self.window.add(now);
        let rule = self.filters.find_match(&event.message);
        let loggable = self.filters.is_loggable(rule);

        if !decision.allowed {
            Evaluation::reject(Rejection::Flood, decision.flood_began)
        } else if !loggable {
            Evaluation::reject(Rejection::Filter, decision.flood_began)
        } else {
            Evaluation::accept(decision.flood_began)
        }
    }

    fn is_flooding(&self) -> bool {
        self.window.is_flooding()
    }
}

/// 레벨 임계값 평가기 (홍수 보호 없음)
pub struct LevelThresholdEvaluator {
    threshold: Level,
}

impl LevelThresholdEvaluator {
    /// 새 평가기를 생성합니다. 임계값이 없으면 `Error`를 사용합니다.
    pub fn new(threshold: Option<Level>) -> Self {
        Self {
            threshold: threshold.unwrap_or(Level::Error),
        }
    }
}

impl TriggerEvaluator for LevelThresholdEvaluator {
    fn name(&self) -> &str {
        "level_threshold"
    }

    fn evaluate(&mut self, event: &LogEvent, _now: Instant) -> Evaluation {
        if event.level >= self.threshold {
            Evaluation::accept(false)
        } else {
            Evaluation::reject(Rejection::Level, false)
        }
    }
}

/// 설정에 맞는 평가기를 생성합니다.
pub fn from_config(
    config: &ChannelConfig,
    filters: Arc<FilterEngine>,
) -> Box<dyn TriggerEvaluator> {
    match config.evaluator {
        EvaluatorKind::FloodFilter => Box::new(FloodFilterEvaluator::new(
            config.min_level,
            config.flood_frequency,
            config.flood_window,
            filters,
        )),
        EvaluatorKind::LevelThreshold => Box::new(LevelThresholdEvaluator::new(config.min_level)),
    }
}
