//! 필터/라우터 엔진 -- 메시지 내용으로 알림 여부와 수신자를 결정합니다.
//!
//! 규칙은 설정 파일 순서대로 평가되며, 메시지 **전체**와 일치하는
//! 첫 번째 규칙이 적용됩니다.
//!
//! # 규칙 형식 (YAML)
//! ```yaml
//! vars:
//!   - name: host
//!     value: db01.example.com
//! filters:
//!   - regex: ".*${host}.*"
//!     to: dba@example.com
//!     message: "Database host ${host} reported errors."
//!   - regex: "Heartbeat missed.*"
//!     message: ""
//!     log: false
//! ```

pub mod loader;
pub mod types;
pub mod vars;

pub use loader::FilterLoader;
pub use types::{FilterConfig, FilterEntry, FilterRule, VarDef};

/// 필터 엔진
///
/// 로드 후에는 읽기 전용이므로 `Arc`로 공유합니다.
#[derive(Debug, Default)]
pub struct FilterEngine {
    rules: Vec<FilterRule>,
}

impl FilterEngine {
    /// 컴파일된 규칙 목록으로 엔진을 생성합니다.
    pub(crate) fn new(rules: Vec<FilterRule>) -> Self {
        Self { rules }
    }

    /// 규칙이 없는 엔진 (항상 알림, 기본 수신자)
    pub fn empty() -> Self {
        Self::default()
    }

    /// 메시지 전체와 일치하는 첫 번째 규칙을 찾습니다.
    pub fn find_match(&self, message: &str) -> Option<&FilterRule> {
        self.rules.iter().find(|rule| rule.matches(message))
    }

    /// 일치 규칙 기준으로 알림 여부를 판단합니다.
    ///
    /// 일치 규칙이 없으면 항상 `true`입니다.
    pub fn is_loggable(&self, rule: Option<&FilterRule>) -> bool {
        rule.is_none_or(|r| r.log)
    }

    /// 일치 규칙 기준으로 수신자를 결정합니다.
    ///
    /// 일치 규칙의 `to`가 비어 있지 않으면 그 값을, 아니면 `default`를 반환합니다.
    pub fn recipients<'a>(&self, rule: Option<&'a FilterRule>, default: &'a str) -> &'a str {
        match rule.and_then(|r| r.to.as_deref()) {
            Some(to) if !to.trim().is_empty() => to,
            _ => default,
        }
    }

    /// 규칙 수
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// 규칙이 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 규칙 목록
    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> FilterEngine {
        let yaml = r#"
filters:
  - regex: "Disk .* full"
    to: storage@example.com
    message: "Storage alert"
  - regex: "Disk .*"
    to: ""
    message: ""
  - regex: "Heartbeat.*"
    message: "ignored"
    log: false
"#;
        FilterLoader::parse_yaml(yaml, "test.yml").unwrap()
    }

    #[test]
    fn empty_engine_matches_nothing() {
        let engine = FilterEngine::empty();
        assert!(engine.find_match("anything").is_none());
        assert!(engine.is_loggable(None));
        assert_eq!(engine.recipients(None, "ops@example.com"), "ops@example.com");
    }

    #[test]
    fn first_match_wins() {
        let engine = engine();
        let rule = engine.find_match("Disk /var full").unwrap();
        assert_eq!(rule.index, 0);

        let rule = engine.find_match("Disk /var at 80%").unwrap();
        assert_eq!(rule.index, 1);
    }

    #[test]
    fn match_requires_entire_message() {
        let engine = engine();
        // 부분 일치는 인정하지 않음
        assert!(engine.find_match("WARN: Heartbeat missed").is_none());
        assert!(engine.find_match("Disk /var full!").is_some_and(|r| r.index == 1));
    }

    #[test]
    fn log_false_rule_is_not_loggable() {
        let engine = engine();
        let rule = engine.find_match("Heartbeat missed from node-3");
        assert!(rule.is_some());
        assert!(!engine.is_loggable(rule));
    }

    #[test]
    fn recipients_prefer_rule_then_default() {
        let engine = engine();
        let full = engine.find_match("Disk /var full");
        assert_eq!(
            engine.recipients(full, "ops@example.com"),
            "storage@example.com"
        );

        // 빈 to는 기본 수신자로 대체
        let partial = engine.find_match("Disk /var at 80%");
        assert_eq!(engine.recipients(partial, "ops@example.com"), "ops@example.com");
    }
}
