#![no_main]
use cbstatus_core::decode_event;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(notification) = decode_event(data) {
        // A decoded notification always maps to a commit state
        let _ = notification.status.commit_state();
        if let Some(source) = notification.repo_source() {
            assert!(!source.repo_name.is_empty());
            if let Some(reference) = source.commit_ref() {
                assert!(!reference.as_str().is_empty());
            }
        }
    }
});
