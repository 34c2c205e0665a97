#![no_main]

use libfuzzer_sys::fuzz_target;
use nativize::Backend;
use nativize_model::Assembly;

fuzz_target!(|data: &[u8]| {
    // Only models that deserialize are interesting; the backend must then return a result, never panic
    if let Ok(model) = serde_json::from_slice::<Assembly>(data) {
        let _ = Backend::default().translate_unit(&model);
    }
});
