//! 메일 주소 목록 파싱
//!
//! 쉼표로 구분된 주소 목록을 [`Address`] 목록으로 변환합니다.
//!
//! 지원 형식:
//! - `ops@example.com`
//! - `Ops Team <ops@example.com>`
//! - `"Ops, Team" <ops@example.com>` (따옴표 안의 쉼표는 구분자가 아님)

use floodmail_core::types::Address;

use crate::error::NotifierError;

/// 쉼표로 구분된 주소 목록을 파싱합니다.
///
/// 빈 문자열은 빈 목록입니다. 항목 하나라도 잘못되면 전체가 에러입니다.
pub fn parse_list(input: &str) -> Result<Vec<Address>, NotifierError> {
    split_unquoted(input)
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(parse_one)
        .collect()
}

/// 주소 하나를 파싱합니다.
pub fn parse_one(input: &str) -> Result<Address, NotifierError> {
    let input = input.trim();

    let (name, email) = match input.find('<') {
        Some(open) => {
            let Some(rest) = input[open + 1..].strip_suffix('>') else {
                return Err(invalid(input, "unterminated '<'"));
            };
            let name = input[..open].trim().trim_matches('"').trim();
            let name = (!name.is_empty()).then(|| name.to_owned());
            (name, rest.trim())
        }
        None => (None, input),
    };

    validate_email(input, email)?;

    Ok(Address {
        name,
        email: email.to_owned(),
    })
}

fn validate_email(input: &str, email: &str) -> Result<(), NotifierError> {
    if email.chars().any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '"' | ',')) {
        return Err(invalid(input, "illegal character in address"));
    }

    let Some((local, domain)) = email.rsplit_once('@') else {
        return Err(invalid(input, "missing '@'"));
    };

    if local.is_empty() {
        return Err(invalid(input, "empty local part"));
    }
    if domain.is_empty() || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid(input, "invalid domain"));
    }

    Ok(())
}

/// 따옴표 밖의 쉼표로만 분리합니다.
fn split_unquoted(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn invalid(input: &str, reason: &str) -> NotifierError {
    NotifierError::Address {
        input: input.to_owned(),
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_empty_list() {
        assert!(parse_list("").unwrap().is_empty());
        assert!(parse_list("  ,  ").unwrap().is_empty());
    }

    #[test]
    fn parses_plain_list() {
        let list = parse_list("a@example.com, b@example.com").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].email, "b@example.com");
        assert!(list[0].name.is_none());
    }

    #[test]
    fn parses_named_address() {
        let addr = parse_one("Ops Team <ops@example.com>").unwrap();
        assert_eq!(addr.name.as_deref(), Some("Ops Team"));
        assert_eq!(addr.email, "ops@example.com");
    }

    #[test]
    fn quoted_name_may_contain_comma() {
        let list = parse_list("\"Ops, Night\" <night@example.com>, day@example.com").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name.as_deref(), Some("Ops, Night"));
    }

    #[test]
    fn rejects_missing_at() {
        let err = parse_list("ops.example.com").unwrap_err();
        assert!(err.to_string().contains("missing '@'"));
    }

    #[test]
    fn one_bad_entry_fails_whole_list() {
        assert!(parse_list("ok@example.com, bad@").is_err());
    }

    #[test]
    fn rejects_unterminated_bracket() {
        assert!(parse_one("Ops <ops@example.com").is_err());
    }

    #[test]
    fn rejects_whitespace_in_address() {
        assert!(parse_one("o ps@example.com").is_err());
    }
}
