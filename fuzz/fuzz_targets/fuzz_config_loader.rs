#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(mut cfg) = lumen_config::load_toml(data) {
        cfg.resolve_relative_to(std::path::Path::new("/fuzz"));
        let _ = cfg.validate();
    }
});
