//! 본문 레이아웃
//!
//! - [`TextLayout`]: `timestamp LEVEL [thread] logger - message` 한 줄 + 스택 트레이스
//! - [`JsonLayout`]: 이벤트당 JSON 한 줄 (스택 트레이스 포함)

use std::sync::Arc;

use floodmail_core::pipeline::EventLayout;
use floodmail_core::types::{LogEvent, rfc3339};

use crate::config::LayoutKind;

/// 줄 구분자
pub const LINE_SEP: &str = "\n";

/// 사람이 읽는 텍스트 레이아웃
#[derive(Debug, Clone, Default)]
pub struct TextLayout {
    header: Option<String>,
    footer: Option<String>,
}

impl TextLayout {
    /// 헤더/푸터 없는 레이아웃
    pub fn new() -> Self {
        Self::default()
    }

    /// 헤더와 푸터를 지정합니다.
    pub fn with_frame(header: impl Into<String>, footer: impl Into<String>) -> Self {
        Self {
            header: Some(header.into()),
            footer: Some(footer.into()),
        }
    }
}

impl EventLayout for TextLayout {
    fn content_type(&self) -> &str {
        "text/plain"
    }

    fn header(&self) -> Option<String> {
        self.header.clone()
    }

    fn footer(&self) -> Option<String> {
        self.footer.clone()
    }

    fn format(&self, event: &LogEvent) -> String {
        let mut line = format!(
            "{} {:<5} ",
            rfc3339::format(event.timestamp),
            event.level.as_str()
        );
        if let Some(thread) = &event.thread {
            line.push_str(&format!("[{thread}] "));
        }
        if !event.logger.is_empty() {
            line.push_str(&event.logger);
            line.push_str(" - ");
        }
        line.push_str(&event.message);
        for (key, value) in &event.context {
            line.push_str(&format!(" {key}={value}"));
        }
        line.push_str(LINE_SEP);
        line
    }
}

/// 이벤트당 JSON 한 줄 레이아웃
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLayout;

impl EventLayout for JsonLayout {
    fn content_type(&self) -> &str {
        "application/x-ndjson"
    }

    fn format(&self, event: &LogEvent) -> String {
        match serde_json::to_string(event) {
            Ok(mut json) => {
                json.push_str(LINE_SEP);
                json
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize event, falling back to text");
                format!("{event}{LINE_SEP}")
            }
        }
    }

    fn ignores_stack_trace(&self) -> bool {
        false
    }
}

/// 설정에 맞는 레이아웃을 생성합니다.
pub fn from_kind(kind: LayoutKind) -> Arc<dyn EventLayout> {
    match kind {
        LayoutKind::Text => Arc::new(TextLayout::new()),
        LayoutKind::Json => Arc::new(JsonLayout),
    }
}

/// 레이아웃으로 배치 본문을 만듭니다.
///
/// 헤더, 각 이벤트(레이아웃이 스택 트레이스를 무시하면 그 라인들도), 푸터 순서입니다.
pub fn format_body(layout: &dyn EventLayout, events: &[LogEvent]) -> String {
    let mut body = String::new();
    if let Some(header) = layout.header() {
        body.push_str(&header);
    }
    for event in events {
        body.push_str(&layout.format(event));
        if layout.ignores_stack_trace() {
            for line in &event.stack_trace {
                body.push_str(line);
                body.push_str(LINE_SEP);
            }
        }
    }
    if let Some(footer) = layout.footer() {
        body.push_str(&footer);
    }
    body
}
