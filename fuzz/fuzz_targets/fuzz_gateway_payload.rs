#![no_main]
use libfuzzer_sys::fuzz_target;
use lumen_gateway::payload;

fuzz_target!(|data: &[u8]| {
    // Whatever the gateway sends must decode or fail cleanly.
    let _ = payload::decode_group_ids(data);
    let _ = payload::decode_group(data);
    if let Ok(device) = payload::decode_device(data) {
        if let Some(light) = device.light {
            let body = payload::encode_dimming(light.dimmer);
            assert!(!body.is_empty());
        }
    }
});
