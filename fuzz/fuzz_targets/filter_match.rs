#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use floodmail_notifier::FilterLoader;
use floodmail_notifier::filter::{FilterConfig, FilterEntry, VarDef};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 변수 정의 (최대 4개로 제한)
    vars: Vec<(String, String)>,
    /// 규칙 목록 (최대 8개로 제한)
    rules: Vec<FuzzRule>,
    /// 매칭 대상 메시지
    message: String,
}

#[derive(Arbitrary, Debug)]
struct FuzzRule {
    regex: String,
    to: Option<String>,
    message: String,
    log: bool,
}

fuzz_target!(|input: FuzzInput| {
    let config = FilterConfig {
        vars: input
            .vars
            .into_iter()
            .take(4)
            .map(|(name, value)| VarDef { name, value })
            .collect(),
        filters: input
            .rules
            .into_iter()
            .take(8)
            .map(|r| FilterEntry {
                regex: Some(r.regex),
                to: r.to,
                message: Some(r.message),
                log: r.log,
            })
            .collect(),
    };

    // 컴파일이 실패해도 크래시는 안 됨
    let Ok(engine) = FilterLoader::compile(config) else {
        return;
    };

    let rule = engine.find_match(&input.message);
    let _ = engine.is_loggable(rule);
    let _ = engine.recipients(rule, "default@example.com");
});
