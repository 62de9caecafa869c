#![no_main]
use cbstatus_core::parse_mirror_url;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(repo) = parse_mirror_url(s) {
            assert!(!repo.owner.is_empty());
            assert!(!repo.name.is_empty());
            assert!(!repo.name.contains('/'));
        }
    }
});
