#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use npids::{BuildConfig, DocnoIndex};

#[derive(Arbitrary, Debug)]
struct Input {
    min_block_size: u8,
    docnos: Vec<Vec<u8>>,
}

fuzz_target!(|input: Input| {
    // trailing NULs are padding in fixed-width blocks, so they cannot round trip
    let docnos: Vec<Vec<u8>> = input
        .docnos
        .into_iter()
        .filter(|docno| docno.last() != Some(&0))
        .collect();
    let config = BuildConfig::default().with_min_block_size(input.min_block_size.max(1) as usize);

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("fuzz.npids");
    let index = DocnoIndex::build(&docnos, &path, config).expect("build failed");

    let scanned: Vec<Vec<u8>> = index.iter().collect();
    assert_eq!(scanned, docnos);
    for docno in &docnos {
        // duplicates resolve to one of their positions
        let found = index.find(docno).expect("inserted docno not found");
        assert_eq!(index.get_bytes(found).expect("found index out of range"), *docno);
    }
});
