#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`channel`]: 알림 채널 생명주기 (init / on_event / close)
//! - [`evaluator`]: 트리거 평가 전략 (홍수 보호 + 필터, 레벨 임계값)
//! - [`flood`]: N/W 슬라이딩 윈도우 홍수 보호
//! - [`filter`]: YAML 필터 규칙 로딩, 변수 치환, 정규식 매칭
//! - [`buffer`]: 고정 용량 이벤트 버퍼
//! - [`dispatch`]: 배치 -> 메시지 변환 및 비동기 발송 워커
//! - [`layout`]: 본문 레이아웃 (text, json)
//! - [`address`]: 주소 목록 파싱
//! - [`transport`]: 기본 전송 구현 (log, json lines, memory)
//! - [`config`]: 채널 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입

pub mod address;
pub mod buffer;
pub mod channel;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod evaluator;
pub mod filter;
pub mod flood;
pub mod layout;
pub mod transport;

// --- 주요 타입 re-export ---

// 채널
pub use channel::{ChannelStats, NotificationChannel, NotificationChannelBuilder};

// 설정
pub use config::{ChannelConfig, ChannelConfigBuilder, EvaluatorKind, LayoutKind, RouteTarget};

// 에러
pub use error::NotifierError;

// 평가기
pub use evaluator::{
    Evaluation, FloodFilterEvaluator, LevelThresholdEvaluator, Rejection, TriggerEvaluator,
};

// 필터
pub use filter::{FilterEngine, FilterLoader, FilterRule};

// 홍수 보호
pub use flood::{FloodDecision, FloodWindow};

// 발송
pub use dispatch::{BatchDispatcher, DispatchJob, DispatchWorker, FlushReason};

// 버퍼
pub use buffer::EventBuffer;

// 레이아웃, 전송
pub use layout::{JsonLayout, TextLayout};
pub use transport::{JsonLinesTransport, LogTransport, MemoryTransport};
