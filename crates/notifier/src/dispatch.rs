//! 배치 발송 -- 버퍼에서 꺼낸 이벤트를 메시지로 만들어 전송합니다.
//!
//! [`BatchDispatcher`]는 작업 하나를 [`Envelope`]로 조립하고 [`Transport`]로 한 번 보냅니다.
//! [`DispatchWorker`]는 bounded mpsc 큐에서 작업을 받아 순서대로 발송하는 태스크입니다.
//!
//! # 메시지 조립 순서
//! 1. 레이아웃으로 본문 포맷 (헤더, 이벤트, 스택 트레이스, 푸터)
//! 2. 본문(또는 트리거 이벤트 메시지)으로 필터 규칙 매칭, 규칙 메시지를 본문 앞에 추가
//! 3. 수신자 결정 (규칙의 `to` 또는 기본 수신자)
//! 4. 주소 필드별 독립 파싱 (실패한 필드만 제외)
//!
//! 전송 실패는 로그와 카운터로만 남기며 재시도하지 않습니다.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use floodmail_core::error::DispatchError;
use floodmail_core::metrics as m;
use floodmail_core::pipeline::{EventLayout, Transport};
use floodmail_core::types::{Address, Envelope, LogEvent};

use crate::address;
use crate::config::{ChannelConfig, RouteTarget};
use crate::filter::FilterEngine;
use crate::layout::format_body;

/// 플러시 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    /// 버퍼가 가득 참
    BufferFull,
    /// 홍수 보호 시작 직전
    FloodEdge,
    /// 채널 종료
    ExplicitClose,
}

impl FlushReason {
    /// 메트릭 레이블 값
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BufferFull => "buffer_full",
            Self::FloodEdge => "flood_edge",
            Self::ExplicitClose => "explicit_close",
        }
    }
}

impl fmt::Display for FlushReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 발송 작업
#[derive(Debug, Clone)]
pub enum DispatchJob {
    /// 버퍼에서 꺼낸 이벤트 묶음
    Batch {
        /// 로그 추적용 ID
        batch_id: Uuid,
        /// 플러시 사유
        reason: FlushReason,
        /// 오래된 순서의 이벤트
        events: Vec<LogEvent>,
    },
    /// 홍수 보호 시작 안내
    FloodNotice {
        /// 로그 추적용 ID
        batch_id: Uuid,
        /// 홍수를 일으킨 이벤트
        trigger: LogEvent,
    },
}

impl DispatchJob {
    /// 배치 작업을 생성합니다.
    pub fn batch(reason: FlushReason, events: Vec<LogEvent>) -> Self {
        Self::Batch {
            batch_id: Uuid::new_v4(),
            reason,
            events,
        }
    }

    /// 홍수 안내 작업을 생성합니다.
    pub fn flood_notice(trigger: LogEvent) -> Self {
        Self::FloodNotice {
            batch_id: Uuid::new_v4(),
            trigger,
        }
    }

    /// 작업 ID
    pub fn batch_id(&self) -> Uuid {
        match self {
            Self::Batch { batch_id, .. } | Self::FloodNotice { batch_id, .. } => *batch_id,
        }
    }

    /// 작업 종류 (로깅용)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Batch { .. } => "batch",
            Self::FloodNotice { .. } => "flood_notice",
        }
    }
}

/// 발송 통계
#[derive(Debug, Default)]
pub struct DispatchCounters {
    sent: AtomicU64,
    failed: AtomicU64,
    no_recipients: AtomicU64,
}

impl DispatchCounters {
    /// 전송 성공 수
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// 전송 실패 수
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// 수신자가 없어 보내지 않은 수
    pub fn no_recipients(&self) -> u64 {
        self.no_recipients.load(Ordering::Relaxed)
    }
}

/// 주소 필드 설정 (쉼표 구분 원문)
#[derive(Debug, Clone)]
struct AddressFields {
    to: String,
    cc: String,
    bcc: String,
    from: String,
    reply_to: String,
}

/// 작업을 메시지로 조립하여 전송하는 발송기
#[derive(Clone)]
pub struct BatchDispatcher {
    fields: AddressFields,
    subject: String,
    flood_message: String,
    route_by: RouteTarget,
    filters: Arc<FilterEngine>,
    layout: Arc<dyn EventLayout>,
    transport: Arc<dyn Transport>,
    counters: Arc<DispatchCounters>,
}

impl BatchDispatcher {
    /// 새 발송기를 생성합니다.
    pub fn new(
        config: &ChannelConfig,
        filters: Arc<FilterEngine>,
        layout: Arc<dyn EventLayout>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            fields: AddressFields {
                to: config.to.clone(),
                cc: config.cc.clone(),
                bcc: config.bcc.clone(),
                from: config.from.clone(),
                reply_to: config.reply_to.clone(),
            },
            subject: config.subject.clone(),
            flood_message: config.flood_message.clone(),
            route_by: config.route_by,
            filters,
            layout,
            transport,
            counters: Arc::new(DispatchCounters::default()),
        }
    }

    /// 발송 통계
    pub fn counters(&self) -> &Arc<DispatchCounters> {
        &self.counters
    }

    /// 작업을 메시지로 조립합니다.
    ///
    /// 빈 배치이거나 수신자가 하나도 남지 않으면 `None`을 반환합니다.
    pub fn build_envelope(&self, job: &DispatchJob) -> Option<Envelope> {
        let (subject, mut body, route_text, with_rule_message) = match job {
            DispatchJob::Batch { events, .. } => {
                let last = events.last()?;
                let body = format_body(self.layout.as_ref(), events);
                let route_text = match self.route_by {
                    RouteTarget::Body => body.clone(),
                    RouteTarget::TriggerEvent => last.message.clone(),
                };
                (self.subject.clone(), body, route_text, true)
            }
            DispatchJob::FloodNotice { trigger, .. } => {
                let route_text = match self.route_by {
                    RouteTarget::Body => self.flood_message.clone(),
                    RouteTarget::TriggerEvent => trigger.message.clone(),
                };
                (
                    format!("{} flood protection enabled", self.subject),
                    self.flood_message.clone(),
                    route_text,
                    false,
                )
            }
        };

        let rule = self.filters.find_match(&route_text);
        if with_rule_message
            && let Some(rule) = rule
            && rule.log
            && !rule.message.is_empty()
        {
            body = format!("{}\n\n{}", rule.message, body);
        }
        let to = self.filters.recipients(rule, &self.fields.to);

        let envelope = Envelope {
            from: parse_field("from", &self.fields.from).into_iter().next(),
            reply_to: parse_field("reply_to", &self.fields.reply_to),
            to: parse_field("to", to),
            cc: parse_field("cc", &self.fields.cc),
            bcc: parse_field("bcc", &self.fields.bcc),
            subject,
            body,
            content_type: self.layout.content_type().to_owned(),
        };

        if envelope.has_recipients() {
            Some(envelope)
        } else {
            None
        }
    }

    /// 작업 하나를 즉시 발송합니다.
    ///
    /// 실패는 로그와 카운터에 남기고 호출자에게도 반환합니다.
    pub async fn dispatch_now(&self, job: DispatchJob) -> Result<(), DispatchError> {
        let batch_id = job.batch_id();
        let event_count = match &job {
            DispatchJob::Batch { events, .. } => events.len(),
            DispatchJob::FloodNotice { .. } => 0,
        };

        if let DispatchJob::Batch { events, .. } = &job
            && events.is_empty()
        {
            tracing::debug!(batch_id = %batch_id, "empty batch, nothing to send");
            return Ok(());
        }

        let Some(envelope) = self.build_envelope(&job) else {
            self.counters.no_recipients.fetch_add(1, Ordering::Relaxed);
            metrics::counter!(m::NOTIFIER_SENDS_TOTAL, m::LABEL_RESULT => "no_recipients")
                .increment(1);
            tracing::error!(
                batch_id = %batch_id,
                kind = job.kind(),
                "no valid recipients, notification not sent"
            );
            return Err(DispatchError::NoRecipients);
        };

        match self.transport.send(&envelope).await {
            Ok(()) => {
                self.counters.sent.fetch_add(1, Ordering::Relaxed);
                metrics::counter!(m::NOTIFIER_SENDS_TOTAL, m::LABEL_RESULT => "success")
                    .increment(1);
                tracing::info!(
                    batch_id = %batch_id,
                    kind = job.kind(),
                    transport = self.transport.name(),
                    events = event_count,
                    recipients = envelope.recipient_count(),
                    "notification sent"
                );
                Ok(())
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                metrics::counter!(m::NOTIFIER_SENDS_TOTAL, m::LABEL_RESULT => "failure")
                    .increment(1);
                tracing::error!(
                    batch_id = %batch_id,
                    kind = job.kind(),
                    transport = self.transport.name(),
                    events = event_count,
                    error = %e,
                    "failed to send notification"
                );
                Err(e)
            }
        }
    }
}

/// 주소 필드를 파싱합니다. 실패하면 경고를 남기고 그 필드만 비웁니다.
fn parse_field(field: &str, raw: &str) -> Vec<Address> {
    match address::parse_list(raw) {
        Ok(list) => list,
        Err(e) => {
            tracing::warn!(field, error = %e, "invalid address field, dropping it");
            Vec::new()
        }
    }
}

/// 발송 큐 소비 태스크
pub struct DispatchWorker {
    rx: mpsc::Receiver<DispatchJob>,
    dispatcher: BatchDispatcher,
}

impl DispatchWorker {
    /// 새 워커를 생성합니다.
    pub fn new(rx: mpsc::Receiver<DispatchJob>, dispatcher: BatchDispatcher) -> Self {
        Self { rx, dispatcher }
    }

    /// 큐가 닫히고 비워질 때까지 작업을 처리합니다.
    pub async fn run(mut self) {
        let mut processed: u64 = 0;
        while let Some(job) = self.rx.recv().await {
            // 실패는 dispatch_now 안에서 이미 기록됨
            let _ = self.dispatcher.dispatch_now(job).await;
            processed += 1;
        }
        tracing::debug!(processed, "dispatch worker stopped");
    }

    /// 현재 tokio 런타임에 워커 태스크를 띄웁니다.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
