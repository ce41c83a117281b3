#![no_main]

use libfuzzer_sys::fuzz_target;
use npids::DocnoIndex;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must be rejected with an error, never a panic
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("fuzz.npids");
    std::fs::write(&path, data).expect("Failed to write input");

    if let Ok(index) = DocnoIndex::open(&path) {
        let len = index.len().min(64);
        let _ = index.forward_iter(0..len);
        if index.len() <= 4096 {
            let _ = index.find(b"doc1");
        }
        let _ = index.describe();
    }
});
