//! 기본 전송 구현
//!
//! - [`LogTransport`]: 메시지를 tracing 이벤트로 남김 (기본값)
//! - [`JsonLinesTransport`]: 메시지당 JSON 한 줄을 writer에 기록
//! - [`MemoryTransport`]: 메시지를 메모리에 보관 (임베딩/테스트용)

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncWrite, AsyncWriteExt};

use floodmail_core::error::DispatchError;
use floodmail_core::pipeline::{BoxFuture, Transport};
use floodmail_core::types::Envelope;

/// 메시지를 tracing 로그로 남기는 전송
#[derive(Debug, Default)]
pub struct LogTransport;

impl Transport for LogTransport {
    fn name(&self) -> &str {
        "log"
    }

    fn send<'a>(&'a self, envelope: &'a Envelope) -> BoxFuture<'a, Result<(), DispatchError>> {
        Box::pin(async move {
            let to = join(&envelope.to);
            tracing::info!(
                to = %to,
                cc = envelope.cc.len(),
                bcc = envelope.bcc.len(),
                subject = %envelope.subject,
                body_len = envelope.body.len(),
                content_type = %envelope.content_type,
                "notification"
            );
            tracing::debug!(body = %envelope.body, "notification body");
            Ok(())
        })
    }
}

/// 메시지당 JSON 한 줄을 기록하는 전송
pub struct JsonLinesTransport<W> {
    writer: tokio::sync::Mutex<W>,
}

impl JsonLinesTransport<tokio::io::Stdout> {
    /// 표준 출력으로 기록합니다.
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W> JsonLinesTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// writer를 감싸 전송을 생성합니다.
    pub fn new(writer: W) -> Self {
        Self {
            writer: tokio::sync::Mutex::new(writer),
        }
    }

    /// 내부 writer를 꺼냅니다.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W> Transport for JsonLinesTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn name(&self) -> &str {
        "json_lines"
    }

    fn send<'a>(&'a self, envelope: &'a Envelope) -> BoxFuture<'a, Result<(), DispatchError>> {
        Box::pin(async move {
            let mut line =
                serde_json::to_vec(envelope).map_err(|e| DispatchError::Transport(e.to_string()))?;
            line.push(b'\n');

            let mut writer = self.writer.lock().await;
            writer
                .write_all(&line)
                .await
                .map_err(|e| DispatchError::Transport(e.to_string()))?;
            writer
                .flush()
                .await
                .map_err(|e| DispatchError::Transport(e.to_string()))
        })
    }
}

/// 메시지를 메모리에 보관하는 전송
#[derive(Debug, Default)]
pub struct MemoryTransport {
    sent: Mutex<Vec<Envelope>>,
    failing: AtomicBool,
}

impl MemoryTransport {
    /// 새 전송을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true`이면 이후 모든 전송이 실패합니다.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// 지금까지 전송된 메시지 사본
    pub fn sent(&self) -> Vec<Envelope> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// 전송된 메시지 수
    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|v| v.len()).unwrap_or_default()
    }
}

impl Transport for MemoryTransport {
    fn name(&self) -> &str {
        "memory"
    }

    fn send<'a>(&'a self, envelope: &'a Envelope) -> BoxFuture<'a, Result<(), DispatchError>> {
        Box::pin(async move {
            if self.failing.load(Ordering::SeqCst) {
                return Err(DispatchError::Transport("simulated failure".to_owned()));
            }
            self.sent
                .lock()
                .map_err(|_| DispatchError::Transport("transport lock poisoned".to_owned()))?
                .push(envelope.clone());
            Ok(())
        })
    }
}

fn join(addresses: &[floodmail_core::types::Address]) -> String {
    addresses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use floodmail_core::types::Address;

    fn envelope() -> Envelope {
        Envelope {
            to: vec![Address {
                name: None,
                email: "ops@example.com".to_owned(),
            }],
            subject: "errors".to_owned(),
            body: "line 1\nline 2\n".to_owned(),
            content_type: "text/plain".to_owned(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn log_transport_always_succeeds() {
        LogTransport.send(&envelope()).await.unwrap();
    }

    #[tokio::test]
    async fn json_lines_transport_writes_one_line_per_envelope() {
        let transport = JsonLinesTransport::new(Vec::new());
        transport.send(&envelope()).await.unwrap();
        transport.send(&envelope()).await.unwrap();

        let written = String::from_utf8(transport.into_inner()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: Envelope = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed, envelope());
    }

    #[tokio::test]
    async fn memory_transport_records_and_fails_on_demand() {
        let transport = MemoryTransport::new();
        transport.send(&envelope()).await.unwrap();
        assert_eq!(transport.sent_count(), 1);

        transport.set_failing(true);
        let err = transport.send(&envelope()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Transport(_)));
        assert_eq!(transport.sent().len(), 1);
    }
}
