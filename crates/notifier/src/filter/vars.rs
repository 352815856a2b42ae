//! 변수 치환 -- `${name}` 토큰을 로드 시점에 한 번 치환합니다.
//!
//! - `${name}`: 정의된 변수 값으로 치환
//! - `$${name}`: 치환하지 않고 리터럴 `${name}`으로 남김
//! - 정의되지 않은 변수: 누락된 이름을 모두 모아 에러로 보고

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use floodmail_core::error::FilterError;

use super::types::VarDef;

static VAR_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(\$)?\{([A-Za-z_][A-Za-z0-9_.\-]*)\}").expect("static variable regex")
});

/// 토큰 안에 올 수 있는 변수 이름인지 확인합니다.
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// 변수 치환기
#[derive(Debug, Default)]
pub struct Substitutor {
    values: HashMap<String, String>,
}

impl Substitutor {
    /// 변수 정의에서 치환기를 생성합니다.
    ///
    /// 같은 이름이 두 번 정의되거나 `${name}`으로 참조할 수 없는 이름이면
    /// 에러를 반환합니다.
    pub fn new(vars: &[VarDef]) -> Result<Self, FilterError> {
        let mut values = HashMap::with_capacity(vars.len());
        for var in vars {
            if !is_valid_name(&var.name) {
                return Err(FilterError::InvalidVariableName(var.name.clone()));
            }
            if values
                .insert(var.name.clone(), var.value.clone())
                .is_some()
            {
                return Err(FilterError::DuplicateVariable(var.name.clone()));
            }
        }
        Ok(Self { values })
    }

    /// 정의된 변수 수
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 정의된 변수가 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 입력 문자열의 변수를 치환합니다.
    ///
    /// 정의되지 않은 변수는 원문 그대로 두고 `missing`에 이름을 추가합니다.
    pub fn substitute(&self, input: &str, missing: &mut BTreeSet<String>) -> String {
        VAR_TOKEN
            .replace_all(input, |caps: &Captures<'_>| {
                let name = &caps[2];
                if caps.get(1).is_some() {
                    return format!("${{{name}}}");
                }
                match self.values.get(name) {
                    Some(value) => value.clone(),
                    None => {
                        missing.insert(name.to_owned());
                        caps[0].to_owned()
                    }
                }
            })
            .into_owned()
    }

    /// 단일 문자열을 치환하고, 누락된 변수가 있으면 에러를 반환합니다.
    pub fn substitute_strict(&self, input: &str) -> Result<String, FilterError> {
        let mut missing = BTreeSet::new();
        let result = self.substitute(input, &mut missing);
        if missing.is_empty() {
            Ok(result)
        } else {
            Err(undefined(&missing))
        }
    }
}

/// 누락된 변수 이름 목록으로 에러를 만듭니다.
pub(crate) fn undefined(missing: &BTreeSet<String>) -> FilterError {
    FilterError::UndefinedVariable {
        names: missing.iter().cloned().collect::<Vec<_>>().join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<VarDef> {
        pairs
            .iter()
            .map(|(name, value)| VarDef {
                name: (*name).to_owned(),
                value: (*value).to_owned(),
            })
            .collect()
    }

    #[test]
    fn substitutes_defined_variables() {
        let sub = Substitutor::new(&vars(&[("host", "db01"), ("domain", "example.com")])).unwrap();
        let out = sub.substitute_strict("ops@${host}.${domain}").unwrap();
        assert_eq!(out, "ops@db01.example.com");
    }

    #[test]
    fn escaped_token_is_literal() {
        let sub = Substitutor::new(&vars(&[("host", "db01")])).unwrap();
        let out = sub.substitute_strict("cost $${host} on ${host}").unwrap();
        assert_eq!(out, "cost ${host} on db01");
    }

    #[test]
    fn substitution_is_single_pass() {
        let sub = Substitutor::new(&vars(&[("a", "${b}"), ("b", "x")])).unwrap();
        assert_eq!(sub.substitute_strict("${a}").unwrap(), "${b}");
    }

    #[test]
    fn missing_variables_are_all_reported() {
        let sub = Substitutor::new(&[]).unwrap();
        let err = sub.substitute_strict("${zeta} ${alpha} ${zeta}").unwrap_err();
        match err {
            FilterError::UndefinedVariable { names } => assert_eq!(names, "alpha, zeta"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_definition_is_rejected() {
        let err = Substitutor::new(&vars(&[("host", "a"), ("host", "b")])).unwrap_err();
        assert!(matches!(err, FilterError::DuplicateVariable(name) if name == "host"));
    }

    #[test]
    fn unreferenceable_names_are_rejected() {
        for name in ["my host", "", "1st", "a}b", "é"] {
            let err = Substitutor::new(&vars(&[(name, "x")])).unwrap_err();
            assert!(
                matches!(&err, FilterError::InvalidVariableName(n) if n == name),
                "name {name:?} should be rejected, got {err}"
            );
        }
    }

    #[test]
    fn dotted_and_dashed_names_are_accepted() {
        let sub = Substitutor::new(&vars(&[("db.host", "db01"), ("_x-1", "y")])).unwrap();
        assert_eq!(sub.substitute_strict("${db.host}/${_x-1}").unwrap(), "db01/y");
    }

    #[test]
    fn text_without_tokens_is_unchanged() {
        let sub = Substitutor::new(&vars(&[("host", "db01")])).unwrap();
        assert_eq!(sub.substitute_strict("Timeout.* $5 {x}").unwrap(), "Timeout.* $5 {x}");
        assert_eq!(sub.len(), 1);
        assert!(!sub.is_empty());
    }
}
