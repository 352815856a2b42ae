//! 알림 채널 -- 평가, 버퍼링, 플러시 결정을 하나의 임계 구역으로 묶습니다.
//!
//! [`NotificationChannel`]은 호스트에 세 가지 생명주기 훅을 제공합니다.
//! - [`init`](NotificationChannel::init): 구성 요소 생성 및 발송 워커 기동
//! - [`on_event`](NotificationChannel::on_event): 이벤트 평가 -> 버퍼 추가 -> 플러시 결정
//! - [`close`](NotificationChannel::close): 남은 이벤트 플러시(선택) 후 워커 종료 대기
//!
//! # 동시성
//! 홍수 윈도우, 평가기, 버퍼는 하나의 `std::sync::Mutex` 안에 있습니다.
//! `on_event`는 "평가 -> 추가 -> 플러시 결정 -> 드레인"을 락을 잡은 채 수행하고,
//! 락을 놓은 뒤 발송 작업을 큐에 넣습니다. 락 안에서는 `.await`가 없습니다.
//!
//! ```text
//! producer threads --on_event--> [Mutex<ChannelState>] --try_send--> mpsc --> DispatchWorker
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use floodmail_core::config::NotifierConfig;
use floodmail_core::metrics as m;
use floodmail_core::pipeline::{EventLayout, HealthStatus, Transport};
use floodmail_core::types::LogEvent;

use crate::buffer::EventBuffer;
use crate::config::ChannelConfig;
use crate::dispatch::{BatchDispatcher, DispatchCounters, DispatchJob, DispatchWorker, FlushReason};
use crate::error::NotifierError;
use crate::evaluator::{self, Rejection, TriggerEvaluator};
use crate::filter::{FilterEngine, FilterLoader};
use crate::layout;

/// 버퍼 사용률 경고 임계값
const DEGRADED_UTILIZATION: f64 = 0.9;

/// 채널 생명주기 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    /// 이벤트 수신 중
    Running,
    /// 종료됨, 이후 이벤트는 무시
    Closed,
}

/// 락으로 보호되는 공유 상태
struct ChannelState {
    lifecycle: Lifecycle,
    evaluator: Box<dyn TriggerEvaluator>,
    buffer: EventBuffer,
    tx: Option<mpsc::Sender<DispatchJob>>,
    received: u64,
    accepted: u64,
    suppressed_level: u64,
    suppressed_flood: u64,
    suppressed_filter: u64,
    flood_episodes: u64,
}

/// 채널 통계 스냅샷
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelStats {
    /// 수신한 이벤트 수 (종료 후 무시된 이벤트 제외)
    pub received: u64,
    /// 버퍼에 채택된 이벤트 수
    pub accepted: u64,
    /// 레벨 게이트로 거부된 수
    pub suppressed_level: u64,
    /// 홍수 보호로 거부된 수
    pub suppressed_flood: u64,
    /// 필터 규칙으로 거부된 수
    pub suppressed_filter: u64,
    /// 홍수 에피소드 수
    pub flood_episodes: u64,
    /// 큐에 넣은 발송 작업 수
    pub jobs_queued: u64,
    /// 큐 포화/종료로 버린 작업 수
    pub jobs_dropped: u64,
    /// 전송 성공 수
    pub sent: u64,
    /// 전송 실패 수
    pub send_failures: u64,
    /// 현재 버퍼 길이
    pub buffer_len: usize,
    /// 버퍼 덮어쓰기 수
    pub buffer_overwritten: u64,
    /// 현재 홍수 상태
    pub flooding: bool,
}

/// 알림 채널
///
/// `Send + Sync`이며 `Arc<NotificationChannel>`로 여러 생산자가 공유합니다.
pub struct NotificationChannel {
    state: Mutex<ChannelState>,
    worker: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    counters: Arc<DispatchCounters>,
    jobs_queued: AtomicU64,
    jobs_dropped: AtomicU64,
    queue_capacity: usize,
    send_on_close: bool,
    /// 제목이 비어 있으면 홍수 시작 알림을 보내지 않음
    flood_notice: bool,
    evaluator_name: String,
}

impl NotificationChannel {
    /// 채널을 초기화하고 발송 워커를 띄웁니다. 기본 레이아웃을 사용합니다.
    ///
    /// tokio 런타임 안에서 호출해야 합니다.
    pub fn init(
        config: ChannelConfig,
        filters: Arc<FilterEngine>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, NotifierError> {
        NotificationChannelBuilder::new()
            .config(config)
            .filters(filters)
            .transport(transport)
            .build()
    }

    /// core 설정에서 채널을 만듭니다. 필터 파일도 함께 로드합니다.
    pub async fn from_core(
        core: &NotifierConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, NotifierError> {
        let config = ChannelConfig::from_core(core)?;
        let filters = FilterLoader::load_file(Path::new(&core.filter_config)).await?;
        Self::init(config, Arc::new(filters), transport)
    }

    /// 빌더를 생성합니다.
    pub fn builder() -> NotificationChannelBuilder {
        NotificationChannelBuilder::new()
    }

    /// 이벤트 하나를 처리합니다. I/O를 기다리지 않습니다.
    ///
    /// 도착 시각은 잠금을 잡은 뒤에 읽으므로 홍수 윈도우에는 순서대로 기록됩니다.
    pub fn on_event(&self, event: LogEvent) {
        self.process(event, None);
    }

    /// 도착 시각을 지정하여 이벤트를 처리합니다.
    pub fn on_event_at(&self, event: LogEvent, now: Instant) {
        self.process(event, Some(now));
    }

    fn process(&self, event: LogEvent, at: Option<Instant>) {
        let (jobs, tx) = {
            let Some(mut state) = self.lock_state() else {
                return;
            };
            if state.lifecycle == Lifecycle::Closed {
                tracing::debug!("event received after close, ignoring");
                return;
            }

            let now = at.unwrap_or_else(Instant::now);
            state.received += 1;
            metrics::counter!(m::NOTIFIER_EVENTS_RECEIVED_TOTAL).increment(1);
            let evaluation = state.evaluator.evaluate(&event, now);
            let mut jobs = Vec::new();

            if evaluation.flood_began {
                state.flood_episodes += 1;
                metrics::counter!(m::NOTIFIER_FLOOD_EPISODES_TOTAL).increment(1);
                let pending = state.buffer.drain();
                if !pending.is_empty() {
                    jobs.push(DispatchJob::batch(FlushReason::FloodEdge, pending));
                }
                if self.flood_notice {
                    jobs.push(DispatchJob::flood_notice(event.clone()));
                } else {
                    tracing::debug!("no subject configured, skipping flood notice");
                }
            }

            if evaluation.accepted {
                state.accepted += 1;
                metrics::counter!(m::NOTIFIER_EVENTS_ACCEPTED_TOTAL).increment(1);
                if state.buffer.push(event) {
                    tracing::debug!(
                        capacity = state.buffer.capacity(),
                        "buffer full, overwrote oldest event"
                    );
                }
                if state.buffer.is_full() {
                    let batch = state.buffer.drain();
                    jobs.push(DispatchJob::batch(FlushReason::BufferFull, batch));
                }
            } else {
                match evaluation.rejection {
                    Some(Rejection::Level) => state.suppressed_level += 1,
                    Some(Rejection::Flood) => {
                        state.suppressed_flood += 1;
                        metrics::counter!(m::NOTIFIER_FLOOD_SUPPRESSED_TOTAL).increment(1);
                    }
                    Some(Rejection::Filter) => {
                        state.suppressed_filter += 1;
                        metrics::counter!(m::NOTIFIER_FILTER_SUPPRESSED_TOTAL).increment(1);
                    }
                    None => {}
                }
            }

            record_gauges(&state);

            if jobs.is_empty() {
                return;
            }
            (jobs, state.tx.clone())
        };

        for job in jobs {
            self.enqueue(tx.as_ref(), job);
        }
    }

    /// 채널을 닫습니다.
    ///
    /// `flush_pending`이 `true`이거나 `send_on_close`가 설정되어 있으면 남은 이벤트를
    /// 한 번 더 발송합니다. 큐에 남은 작업이 모두 처리될 때까지 기다립니다.
    pub async fn close(&self, flush_pending: bool) {
        let (pending, tx) = {
            let Some(mut state) = self.lock_state() else {
                return;
            };
            if state.lifecycle == Lifecycle::Closed {
                tracing::debug!("channel already closed");
                return;
            }
            state.lifecycle = Lifecycle::Closed;

            let pending = state.buffer.drain();
            record_gauges(&state);
            (pending, state.tx.take())
        };

        if flush_pending || self.send_on_close {
            if !pending.is_empty() {
                self.enqueue(
                    tx.as_ref(),
                    DispatchJob::batch(FlushReason::ExplicitClose, pending),
                );
            }
        } else if !pending.is_empty() {
            tracing::info!(
                discarded = pending.len(),
                "channel closed without flushing pending events"
            );
        }

        // 마지막 sender를 놓아야 워커가 큐를 비우고 종료됨
        drop(tx);

        let handle = self.worker.lock().await.take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            tracing::error!(error = %e, "dispatch worker terminated abnormally");
        }

        tracing::info!(
            sent = self.counters.sent(),
            failed = self.counters.failed(),
            "notification channel closed"
        );
    }

    /// 통계 스냅샷을 반환합니다.
    pub fn stats(&self) -> ChannelStats {
        let mut stats = ChannelStats {
            jobs_queued: self.jobs_queued.load(Ordering::Relaxed),
            jobs_dropped: self.jobs_dropped.load(Ordering::Relaxed),
            sent: self.counters.sent(),
            send_failures: self.counters.failed(),
            ..Default::default()
        };
        if let Some(state) = self.lock_state() {
            stats.received = state.received;
            stats.accepted = state.accepted;
            stats.suppressed_level = state.suppressed_level;
            stats.suppressed_flood = state.suppressed_flood;
            stats.suppressed_filter = state.suppressed_filter;
            stats.flood_episodes = state.flood_episodes;
            stats.buffer_len = state.buffer.len();
            stats.buffer_overwritten = state.buffer.dropped_count();
            stats.flooding = state.evaluator.is_flooding();
        }
        stats
    }

    /// 채널 건강 상태를 확인합니다.
    pub fn health_check(&self) -> HealthStatus {
        let Some(state) = self.lock_state() else {
            return HealthStatus::Unhealthy("state lock poisoned".to_owned());
        };
        match state.lifecycle {
            Lifecycle::Closed => HealthStatus::Unhealthy("closed".to_owned()),
            Lifecycle::Running => {
                let utilization = state.buffer.utilization();
                if state.evaluator.is_flooding() {
                    HealthStatus::Degraded("flood protection active".to_owned())
                } else if utilization > DEGRADED_UTILIZATION {
                    HealthStatus::Degraded(format!(
                        "buffer utilization high: {:.1}%",
                        utilization * 100.0
                    ))
                } else {
                    HealthStatus::Healthy
                }
            }
        }
    }

    /// 사용 중인 평가기 이름
    pub fn evaluator_name(&self) -> &str {
        &self.evaluator_name
    }

    /// 작업을 발송 큐에 넣습니다. 큐가 가득 차면 버립니다.
    fn enqueue(&self, tx: Option<&mpsc::Sender<DispatchJob>>, job: DispatchJob) {
        let batch_id = job.batch_id();
        let kind = job.kind();
        if let DispatchJob::Batch { reason, .. } = &job {
            metrics::counter!(m::NOTIFIER_BATCHES_FLUSHED_TOTAL, m::LABEL_REASON => reason.as_str())
                .increment(1);
        }

        let Some(tx) = tx else {
            self.drop_job(batch_id, kind, "dispatch queue closed");
            return;
        };

        match tx.try_send(job) {
            Ok(()) => {
                self.jobs_queued.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(batch_id = %batch_id, kind, "dispatch job queued");
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.drop_job(batch_id, kind, "dispatch queue full");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.drop_job(batch_id, kind, "dispatch queue closed");
            }
        }
    }

    fn drop_job(&self, batch_id: uuid::Uuid, kind: &str, reason: &str) {
        self.jobs_dropped.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(m::NOTIFIER_JOBS_DROPPED_TOTAL).increment(1);
        tracing::warn!(
            batch_id = %batch_id,
            kind,
            capacity = self.queue_capacity,
            reason,
            "dropping dispatch job"
        );
    }

    fn lock_state(&self) -> Option<MutexGuard<'_, ChannelState>> {
        match self.state.lock() {
            Ok(guard) => Some(guard),
            Err(e) => {
                tracing::error!(error = %e, "channel state lock poisoned");
                None
            }
        }
    }
}

fn record_gauges(state: &ChannelState) {
    metrics::gauge!(m::NOTIFIER_BUFFER_SIZE).set(state.buffer.len() as f64);
    metrics::gauge!(m::NOTIFIER_FLOODING).set(if state.evaluator.is_flooding() {
        1.0
    } else {
        0.0
    });
}

/// 알림 채널 빌더
pub struct NotificationChannelBuilder {
    config: ChannelConfig,
    filters: Arc<FilterEngine>,
    layout: Option<Arc<dyn EventLayout>>,
    transport: Option<Arc<dyn Transport>>,
}

impl Default for NotificationChannelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationChannelBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: ChannelConfig::default(),
            filters: Arc::new(FilterEngine::empty()),
            layout: None,
            transport: None,
        }
    }

    /// 채널 설정을 지정합니다.
    pub fn config(mut self, config: ChannelConfig) -> Self {
        self.config = config;
        self
    }

    /// 필터 엔진을 지정합니다.
    pub fn filters(mut self, filters: Arc<FilterEngine>) -> Self {
        self.filters = filters;
        self
    }

    /// 레이아웃을 지정합니다. 지정하지 않으면 설정의 `layout`을 따릅니다.
    pub fn layout(mut self, layout: Arc<dyn EventLayout>) -> Self {
        self.layout = Some(layout);
        self
    }

    /// 전송 구현을 지정합니다.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// 채널을 빌드하고 발송 워커를 띄웁니다.
    pub fn build(self) -> Result<NotificationChannel, NotifierError> {
        self.config.validate()?;

        let transport = self.transport.ok_or_else(|| NotifierError::Config {
            field: "transport".to_owned(),
            reason: "a transport is required".to_owned(),
        })?;
        // 발송 워커를 띄울 런타임이 필요함
        tokio::runtime::Handle::try_current()
            .map_err(|e| NotifierError::Runtime(e.to_string()))?;

        let layout = self
            .layout
            .unwrap_or_else(|| layout::from_kind(self.config.layout));
        let dispatcher =
            BatchDispatcher::new(&self.config, Arc::clone(&self.filters), layout, transport);
        let counters = Arc::clone(dispatcher.counters());

        let (tx, rx) = mpsc::channel(self.config.dispatch_queue_capacity);
        let handle = DispatchWorker::new(rx, dispatcher).spawn();

        let evaluator = evaluator::from_config(&self.config, self.filters);
        let evaluator_name = evaluator.name().to_owned();

        tracing::info!(
            evaluator = %evaluator_name,
            buffer_size = self.config.buffer_size,
            flood_frequency = self.config.flood_frequency,
            flood_window_ms = u64::try_from(self.config.flood_window.as_millis()).unwrap_or(u64::MAX),
            queue_capacity = self.config.dispatch_queue_capacity,
            "notification channel initialized"
        );

        Ok(NotificationChannel {
            state: Mutex::new(ChannelState {
                lifecycle: Lifecycle::Running,
                evaluator,
                buffer: EventBuffer::new(self.config.buffer_size),
                tx: Some(tx),
                received: 0,
                accepted: 0,
                suppressed_level: 0,
                suppressed_flood: 0,
                suppressed_filter: 0,
                flood_episodes: 0,
            }),
            worker: tokio::sync::Mutex::new(Some(handle)),
            counters,
            jobs_queued: AtomicU64::new(0),
            jobs_dropped: AtomicU64::new(0),
            queue_capacity: self.config.dispatch_queue_capacity,
            send_on_close: self.config.send_on_close,
            flood_notice: !self.config.subject.is_empty(),
            evaluator_name,
        })
    }
}
