//! 필터 설정 타입
//!
//! YAML 원본 구조([`FilterConfig`], [`FilterEntry`], [`VarDef`])와
//! 로드 시 컴파일된 규칙([`FilterRule`])을 정의합니다.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// 필터 설정 파일의 최상위 구조
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// 치환 변수 정의
    #[serde(default)]
    pub vars: Vec<VarDef>,
    /// 순서가 있는 필터 규칙
    #[serde(default)]
    pub filters: Vec<FilterEntry>,
}

/// 치환 변수 정의
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarDef {
    /// 변수 이름 (`${name}`으로 참조)
    pub name: String,
    /// 치환 값
    pub value: String,
}

/// 필터 규칙 원본 (치환 전)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterEntry {
    /// 메시지 전체와 일치해야 하는 정규식
    #[serde(default)]
    pub regex: Option<String>,
    /// 일치 시 수신자 (쉼표 구분)
    #[serde(default)]
    pub to: Option<String>,
    /// 일치 시 본문 앞에 붙는 메시지
    #[serde(default)]
    pub message: Option<String>,
    /// `false`이면 일치한 이벤트를 억제
    #[serde(default = "default_log")]
    pub log: bool,
}

fn default_log() -> bool {
    true
}

/// 컴파일된 필터 규칙
///
/// 로드 이후에는 변경되지 않습니다.
#[derive(Debug, Clone)]
pub struct FilterRule {
    /// 설정 파일 내 순서 (0부터)
    pub index: usize,
    /// 치환 완료된 원본 패턴
    pub pattern: String,
    /// 수신자 (없거나 빈 문자열이면 기본 수신자 사용)
    pub to: Option<String>,
    /// 본문 앞에 붙는 메시지
    pub message: String,
    /// 알림 여부
    pub log: bool,
    /// 전체 일치용으로 앵커가 붙은 정규식
    pub(crate) regex: Regex,
}

impl FilterRule {
    /// 메시지 전체가 패턴과 일치하는지 확인합니다.
    pub fn matches(&self, message: &str) -> bool {
        self.regex.is_match(message)
    }
}
