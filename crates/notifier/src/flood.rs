//! 홍수 보호 -- N/W 슬라이딩 윈도우 속도 제한
//!
//! [`FloodWindow`]는 최근 N개 이벤트의 도착 시각만 보관합니다.
//! N개를 넘는 이벤트가 들어오면 가장 오래된 시각을 밀어내고,
//! 밀려난 시각이 W 이내이면 "홍수" 상태로 판단합니다.
//!
//! # 상태 전이
//! ```text
//!   NORMAL --(age <= W)--> FLOODING   (flood_began = true, 에피소드당 한 번)
//!   FLOODING --(age > W)--> NORMAL    (부수 효과 없음)
//! ```
//!
//! 상태 전이의 부수 효과(안내 메시지 발송)는 윈도우가 직접 실행하지 않고
//! [`FloodDecision::flood_began`]으로 호출자에게 돌려줍니다.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// 이벤트 하나에 대한 판정 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloodDecision {
    /// 발송 허용 여부 (`!flooding`)
    pub allowed: bool,
    /// 이번 이벤트로 NORMAL -> FLOODING 전이가 일어났는지 여부
    pub flood_began: bool,
}

impl FloodDecision {
    const ALLOWED: Self = Self {
        allowed: true,
        flood_began: false,
    };
}

/// N/W 슬라이딩 윈도우
#[derive(Debug)]
pub struct FloodWindow {
    /// 최근 이벤트 도착 시각 (최대 `frequency`개)
    history: VecDeque<Instant>,
    /// N
    frequency: usize,
    /// W
    window: Duration,
    /// 현재 홍수 상태
    flooding: bool,
    /// 관측한 전체 이벤트 수
    total_seen: u64,
    /// 홍수로 억제된 이벤트 수
    suppressed: u64,
    /// 홍수 에피소드 수
    episodes: u64,
}

impl FloodWindow {
    /// 새 윈도우를 생성합니다.
    ///
    /// `frequency` 또는 `window`가 0이면 속도 제한이 비활성화됩니다.
    pub fn new(frequency: usize, window: Duration) -> Self {
        Self {
            history: VecDeque::with_capacity(frequency.saturating_add(1).min(10_000)),
            frequency,
            window,
            flooding: false,
            total_seen: 0,
            suppressed: 0,
            episodes: 0,
        }
    }

    /// 속도 제한이 활성화되어 있는지 확인합니다.
    pub fn is_enabled(&self) -> bool {
        self.frequency > 0 && !self.window.is_zero()
    }

    /// `now` 시각에 도착한 이벤트를 기록하고 판정합니다.
    ///
    /// 이력은 항상 시간 순으로 유지됩니다. 이미 기록된 시각보다 이른 `now`가
    /// 들어오면 제자리에 삽입하고, 간격은 가장 최근 시각 기준으로 잽니다.
    pub fn add(&mut self, now: Instant) -> FloodDecision {
        self.total_seen += 1;

        if !self.is_enabled() {
            return FloodDecision::ALLOWED;
        }

        let pos = self.history.partition_point(|seen| *seen <= now);
        self.history.insert(pos, now);
        if self.history.len() <= self.frequency {
            // 아직 N개 이하: 판정 불가, 홍수 아님
            return self.transition(false);
        }

        let oldest = self.history.pop_front();
        let flooding = match (oldest, self.history.back()) {
            (Some(oldest), Some(newest)) => newest.saturating_duration_since(oldest) <= self.window,
            _ => false,
        };
        self.transition(flooding)
    }

    /// 현재 시각으로 이벤트를 기록합니다.
    pub fn add_now(&mut self) -> FloodDecision {
        self.add(Instant::now())
    }

    fn transition(&mut self, flooding: bool) -> FloodDecision {
        let flood_began = flooding && !self.flooding;
        if flood_began {
            self.episodes += 1;
            tracing::warn!(
                frequency = self.frequency,
                window_ms = u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX),
                "flood protection enabled"
            );
        } else if !flooding && self.flooding {
            tracing::debug!(
                suppressed = self.suppressed,
                "flood protection disabled, event rate back to normal"
            );
        }
        self.flooding = flooding;

        if flooding {
            self.suppressed += 1;
        }

        FloodDecision {
            allowed: !flooding,
            flood_began,
        }
    }

    /// 현재 홍수 상태인지 확인합니다.
    pub fn is_flooding(&self) -> bool {
        self.flooding
    }

    /// 보관 중인 도착 시각 수 (최대 N)
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// 관측한 전체 이벤트 수
    pub fn total_seen(&self) -> u64 {
        self.total_seen
    }

    /// 홍수로 억제된 이벤트 수
    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }

    /// 홍수 에피소드 수
    pub fn episodes(&self) -> u64 {
        self.episodes
    }
}
