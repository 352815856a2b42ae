//! 필터 설정 로더 -- YAML 필터 파일을 디스크에서 로드합니다.
//!
//! 로드 시점에 변수 치환, 규칙 검증, 정규식 컴파일을 모두 수행하므로
//! 매칭 시점에는 에러가 발생하지 않습니다.
//! 필터 파일이 없으면 경고 로그를 남기고 빈 엔진을 반환합니다.

use std::collections::BTreeSet;
use std::path::Path;

use regex::RegexBuilder;

use floodmail_core::error::FilterError;

use super::FilterEngine;
use super::types::{FilterConfig, FilterEntry, FilterRule};
use super::vars::{Substitutor, undefined};

/// 필터 파일 최대 크기
const MAX_FILTER_FILE_SIZE: u64 = 1024 * 1024; // 1MB
/// 최대 규칙 수
const MAX_FILTER_COUNT: usize = 10_000;
/// 컴파일된 정규식 최대 크기
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// 필터 설정 로더
pub struct FilterLoader;

impl FilterLoader {
    /// 파일에서 필터 엔진을 로드합니다.
    ///
    /// 파일이 존재하지 않으면 경고를 남기고 빈 엔진을 반환합니다.
    ///
    /// # Errors
    /// - 파일을 읽을 수 없거나 크기가 상한을 넘는 경우
    /// - YAML 파싱, 변수 치환, 규칙 검증, 정규식 컴파일이 실패한 경우
    pub async fn load_file(path: impl AsRef<Path>) -> Result<FilterEngine, FilterError> {
        let path = path.as_ref();

        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    path = %path.display(),
                    "filter config not found, running without filters"
                );
                return Ok(FilterEngine::empty());
            }
            Err(e) => {
                return Err(FilterError::Load {
                    path: path.display().to_string(),
                    reason: format!("failed to read file metadata: {e}"),
                });
            }
        };

        if metadata.len() > MAX_FILTER_FILE_SIZE {
            return Err(FilterError::Load {
                path: path.display().to_string(),
                reason: format!(
                    "file too large: {} bytes (max: {MAX_FILTER_FILE_SIZE})",
                    metadata.len()
                ),
            });
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| FilterError::Load {
                path: path.display().to_string(),
                reason: format!("failed to read file: {e}"),
            })?;

        let engine = Self::parse_yaml(&content, &path.display().to_string())?;

        tracing::info!(
            path = %path.display(),
            count = engine.len(),
            "loaded filter rules"
        );

        Ok(engine)
    }

    /// YAML 문자열을 파싱하여 필터 엔진을 생성합니다.
    pub fn parse_yaml(yaml_str: &str, source: &str) -> Result<FilterEngine, FilterError> {
        // 빈 문서는 serde_yaml에서 null로 파싱되므로 따로 처리
        if yaml_str.trim().is_empty() {
            return Ok(FilterEngine::empty());
        }

        let config: FilterConfig =
            serde_yaml::from_str(yaml_str).map_err(|e| FilterError::Load {
                path: source.to_owned(),
                reason: format!("YAML parse error: {e}"),
            })?;

        Self::compile(config)
    }

    /// 원본 설정을 치환, 검증, 컴파일합니다.
    pub fn compile(config: FilterConfig) -> Result<FilterEngine, FilterError> {
        if config.filters.len() > MAX_FILTER_COUNT {
            return Err(FilterError::Load {
                path: "<filters>".to_owned(),
                reason: format!("too many filters: max {MAX_FILTER_COUNT}"),
            });
        }

        let substitutor = Substitutor::new(&config.vars)?;

        // 누락 변수는 모든 규칙을 훑은 뒤 한 번에 보고
        let mut missing = BTreeSet::new();
        let substituted: Vec<FilterEntry> = config
            .filters
            .into_iter()
            .map(|entry| FilterEntry {
                regex: entry
                    .regex
                    .map(|v| substitutor.substitute(&v, &mut missing)),
                to: entry.to.map(|v| substitutor.substitute(&v, &mut missing)),
                message: entry
                    .message
                    .map(|v| substitutor.substitute(&v, &mut missing)),
                log: entry.log,
            })
            .collect();

        if !missing.is_empty() {
            return Err(undefined(&missing));
        }

        let rules = substituted
            .into_iter()
            .enumerate()
            .map(|(index, entry)| compile_rule(index, entry))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FilterEngine::new(rules))
    }
}

/// 규칙 하나를 검증하고 정규식을 컴파일합니다.
fn compile_rule(index: usize, entry: FilterEntry) -> Result<FilterRule, FilterError> {
    let pattern = match entry.regex {
        Some(p) if !p.is_empty() => p,
        _ => {
            return Err(FilterError::InvalidRule {
                index,
                reason: "regex is required".to_owned(),
            });
        }
    };

    let Some(message) = entry.message else {
        return Err(FilterError::InvalidRule {
            index,
            reason: "message is required".to_owned(),
        });
    };

    if entry.log && entry.to.is_none() {
        return Err(FilterError::InvalidRule {
            index,
            reason: "to is required when log is true".to_owned(),
        });
    }

    // 메시지 전체 일치를 위해 앵커를 붙여 컴파일
    let regex = RegexBuilder::new(&format!("^(?:{pattern})$"))
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
        .map_err(|e| FilterError::InvalidRegex {
            index,
            reason: e.to_string(),
        })?;

    Ok(FilterRule {
        index,
        pattern,
        to: entry.to,
        message,
        log: entry.log,
        regex,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_yaml() {
        let yaml = r#"
vars:
  - name: host
    value: db01.example.com
filters:
  - regex: ".*${host}.*"
    to: dba@example.com
    message: "Problem on ${host}"
  - regex: "Heartbeat.*"
    message: ""
    log: false
"#;
        let engine = FilterLoader::parse_yaml(yaml, "test.yml").unwrap();
        assert_eq!(engine.len(), 2);
        let rule = engine.find_match("lost db01.example.com").unwrap();
        assert_eq!(rule.message, "Problem on db01.example.com");
        assert_eq!(rule.pattern, ".*db01.example.com.*");
    }

    #[test]
    fn parse_invalid_yaml_returns_error() {
        let result = FilterLoader::parse_yaml("filters: [regex: {{{", "bad.yml");
        assert!(matches!(result, Err(FilterError::Load { .. })));
    }

    #[test]
    fn empty_document_yields_empty_engine() {
        let engine = FilterLoader::parse_yaml("  \n", "empty.yml").unwrap();
        assert!(engine.is_empty());
    }

    #[test]
    fn missing_regex_is_rejected() {
        let yaml = "filters:\n  - message: m\n    to: a@b\n";
        let err = FilterLoader::parse_yaml(yaml, "t.yml").unwrap_err();
        assert!(matches!(err, FilterError::InvalidRule { index: 0, .. }));
    }

    #[test]
    fn empty_regex_is_rejected() {
        let yaml = "filters:\n  - regex: \"\"\n    message: m\n    to: a@b\n";
        assert!(FilterLoader::parse_yaml(yaml, "t.yml").is_err());
    }

    #[test]
    fn missing_message_is_rejected() {
        let yaml = "filters:\n  - regex: a\n    to: a@b\n";
        let err = FilterLoader::parse_yaml(yaml, "t.yml").unwrap_err();
        assert!(err.to_string().contains("message"));
    }

    #[test]
    fn missing_to_is_rejected_only_when_logging() {
        let yaml = "filters:\n  - regex: a\n    message: m\n";
        let err = FilterLoader::parse_yaml(yaml, "t.yml").unwrap_err();
        assert!(err.to_string().contains("to is required"));

        let yaml = "filters:\n  - regex: a\n    message: m\n    log: false\n";
        assert!(FilterLoader::parse_yaml(yaml, "t.yml").is_ok());
    }

    #[test]
    fn invalid_regex_names_rule_index() {
        let yaml = r#"
filters:
  - regex: "ok.*"
    message: m
    to: a@b
  - regex: "([unclosed"
    message: m
    to: a@b
"#;
        let err = FilterLoader::parse_yaml(yaml, "t.yml").unwrap_err();
        assert!(matches!(err, FilterError::InvalidRegex { index: 1, .. }));
    }

    #[test]
    fn undefined_variables_across_rules_reported_together() {
        let yaml = r#"
filters:
  - regex: ".*${host}.*"
    message: m
    to: ${dba}
  - regex: "${other}"
    message: m
    log: false
"#;
        let err = FilterLoader::parse_yaml(yaml, "t.yml").unwrap_err();
        assert_eq!(err.to_string(), "undefined variable(s): dba, host, other");
    }

    #[tokio::test]
    async fn missing_file_yields_empty_engine() {
        let engine = FilterLoader::load_file("/nonexistent/floodmail/filters.yml")
            .await
            .unwrap();
        assert!(engine.is_empty());
    }

    #[tokio::test]
    async fn load_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filters.yml");
        tokio::fs::write(
            &path,
            "filters:\n  - regex: \"Timeout.*\"\n    message: \"\"\n    log: false\n",
        )
        .await
        .unwrap();

        let engine = FilterLoader::load_file(&path).await.unwrap();
        assert_eq!(engine.len(), 1);
        assert!(!engine.is_loggable(engine.find_match("Timeout after 30s")));
    }
}
