//! 이벤트 버퍼 -- 고정 용량 링 버퍼
//!
//! [`EventBuffer`]는 발송 대기 중인 이벤트를 도착 순서대로 보관합니다.
//! 가득 찬 상태에서 새 이벤트가 들어오면 가장 오래된 이벤트를 덮어씁니다.
//! 드레인은 오래된 것부터 최신 순으로 모든 이벤트를 꺼냅니다.

use std::collections::VecDeque;

use floodmail_core::types::LogEvent;

/// 고정 용량 이벤트 버퍼
///
/// 불변식: `0 <= len() <= capacity()`
#[derive(Debug)]
pub struct EventBuffer {
    events: VecDeque<LogEvent>,
    capacity: usize,
    /// 덮어쓰여 사라진 이벤트 수
    dropped_count: u64,
}

impl EventBuffer {
    /// 새 버퍼를 생성합니다. 용량은 최소 1입니다.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity.min(10_000)),
            capacity,
            dropped_count: 0,
        }
    }

    /// 이벤트를 추가합니다.
    ///
    /// 가득 찬 상태였다면 가장 오래된 이벤트를 버리고 `true`를 반환합니다.
    pub fn push(&mut self, event: LogEvent) -> bool {
        let evicted = if self.events.len() >= self.capacity {
            self.events.pop_front();
            self.dropped_count += 1;
            true
        } else {
            false
        };
        self.events.push_back(event);
        evicted
    }

    /// 모든 이벤트를 오래된 순서로 꺼냅니다.
    pub fn drain(&mut self) -> Vec<LogEvent> {
        self.events.drain(..).collect()
    }

    /// 가득 찼는지 확인합니다.
    pub fn is_full(&self) -> bool {
        self.events.len() >= self.capacity
    }

    /// 현재 이벤트 수
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// 최대 용량
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 덮어쓰여 사라진 이벤트 수
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count
    }

    /// 버퍼 사용률을 0.0~1.0 범위로 반환합니다.
    pub fn utilization(&self) -> f64 {
        f64::from(u32::try_from(self.events.len()).unwrap_or(u32::MAX))
            / f64::from(u32::try_from(self.capacity).unwrap_or(u32::MAX))
    }
}
