//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `floodmail_`
//! - 접미어: `_total` (counter), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(floodmail_core::metrics::NOTIFIER_EVENTS_RECEIVED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 플러시 사유 레이블 키 (buffer_full, flood_edge, explicit_close)
pub const LABEL_REASON: &str = "reason";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── Notifier 메트릭 ────────────────────────────────────────────────

/// Notifier: 수신된 전체 이벤트 수 (counter)
pub const NOTIFIER_EVENTS_RECEIVED_TOTAL: &str = "floodmail_notifier_events_received_total";

/// Notifier: 버퍼에 채택된 이벤트 수 (counter)
pub const NOTIFIER_EVENTS_ACCEPTED_TOTAL: &str = "floodmail_notifier_events_accepted_total";

/// Notifier: 홍수 보호로 억제된 이벤트 수 (counter)
pub const NOTIFIER_FLOOD_SUPPRESSED_TOTAL: &str = "floodmail_notifier_flood_suppressed_total";

/// Notifier: 필터 규칙으로 억제된 이벤트 수 (counter)
pub const NOTIFIER_FILTER_SUPPRESSED_TOTAL: &str = "floodmail_notifier_filter_suppressed_total";

/// Notifier: 홍수 구간 시작 횟수 (counter)
pub const NOTIFIER_FLOOD_EPISODES_TOTAL: &str = "floodmail_notifier_flood_episodes_total";

/// Notifier: 플러시된 배치 수 (counter, label: reason)
pub const NOTIFIER_BATCHES_FLUSHED_TOTAL: &str = "floodmail_notifier_batches_flushed_total";

/// Notifier: 발송 시도 수 (counter, label: result)
pub const NOTIFIER_SENDS_TOTAL: &str = "floodmail_notifier_sends_total";

/// Notifier: 발송 큐 포화로 버려진 작업 수 (counter)
pub const NOTIFIER_JOBS_DROPPED_TOTAL: &str = "floodmail_notifier_jobs_dropped_total";

/// Notifier: 버퍼 내 이벤트 수 (gauge)
pub const NOTIFIER_BUFFER_SIZE: &str = "floodmail_notifier_buffer_size";

/// Notifier: 현재 홍수 상태 (gauge, 0 또는 1)
pub const NOTIFIER_FLOODING: &str = "floodmail_notifier_flooding";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        NOTIFIER_EVENTS_RECEIVED_TOTAL,
        "Total number of log events offered to the notification channel"
    );
    describe_counter!(
        NOTIFIER_EVENTS_ACCEPTED_TOTAL,
        "Log events accepted into the batch buffer"
    );
    describe_counter!(
        NOTIFIER_FLOOD_SUPPRESSED_TOTAL,
        "Log events rejected while flood protection was active"
    );
    describe_counter!(
        NOTIFIER_FILTER_SUPPRESSED_TOTAL,
        "Log events rejected by a filter rule with log = false"
    );
    describe_counter!(
        NOTIFIER_FLOOD_EPISODES_TOTAL,
        "Number of transitions from normal into flooding"
    );
    describe_counter!(
        NOTIFIER_BATCHES_FLUSHED_TOTAL,
        "Batches drained from the buffer, by flush reason"
    );
    describe_counter!(
        NOTIFIER_SENDS_TOTAL,
        "Transport send attempts, by result"
    );
    describe_counter!(
        NOTIFIER_JOBS_DROPPED_TOTAL,
        "Dispatch jobs dropped because the queue was full or closed"
    );
    describe_gauge!(NOTIFIER_BUFFER_SIZE, "Events currently buffered");
    describe_gauge!(NOTIFIER_FLOODING, "1 while flood protection is active");
}
