#![no_main]

use floodmail_core::types::LogEvent;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // 데몬 입력 한 줄과 동일한 경로
    if let Ok(event) = serde_json::from_slice::<LogEvent>(data) {
        // 역직렬화된 이벤트는 다시 직렬화할 수 있어야 함
        let json = serde_json::to_string(&event).expect("serialize parsed event");
        let _ = serde_json::from_str::<LogEvent>(&json);
    }
});
