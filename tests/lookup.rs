//! Integration tests for building and reading lookup files.
//!
//! Every test builds into its own temporary directory and reads the result
//! back through the public API only.

use npids::container::{ContainerReader, HeaderLayout, RecordHeader, RecordType};
use npids::{BuildConfig, DocnoIndex, Error, ForwardBuilder, NOT_FOUND};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::TempDir;

static MIXED_DOCNOS: OnceLock<Vec<String>> = OnceLock::new();

/// Docnos drawn from several patterns, in one stream
fn mixed_docnos() -> &'static [String] {
    MIXED_DOCNOS.get_or_init(|| {
        let mut docnos = Vec::new();
        for i in 1..=300 {
            docnos.push(format!("LA010189-{:04}", i));
        }
        for i in 0..50u128 {
            let id = uuid::Uuid::from_u128(i.wrapping_mul(0x9E37_79B9_7F4A_7C15_F39C_C060_5CED_C835));
            docnos.push(id.hyphenated().to_string());
        }
        for i in 0..40u128 {
            docnos.push(format!("sha-{:032x}", i.wrapping_mul(0xD6E8_FEB8_6659_FD93) + 1));
        }
        for i in 0..20 {
            docnos.push(format!("clueweb12-{:02}wb-{}", i % 7, i * 13));
        }
        docnos
    })
}

fn temp_file(name: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join(name);
    (dir, path)
}

fn forward_payload_lens(path: &Path) -> Vec<usize> {
    let reader = ContainerReader::open(path).expect("Failed to open container");
    reader
        .records()
        .expect("Failed to read records")
        .iter()
        .filter(|record| record.record_type == RecordType::Forward)
        .map(|record| record.payload.len())
        .collect()
}

#[test]
fn test_round_trip_mixed_patterns() {
    let (_dir, path) = temp_file("mixed.npids");
    let docnos = mixed_docnos();
    let index = DocnoIndex::build(docnos, &path, BuildConfig::default()).unwrap();

    assert_eq!(index.len(), docnos.len() as u64);
    let scanned: Vec<Vec<u8>> = index.iter().collect();
    let expected: Vec<Vec<u8>> = docnos.iter().map(|d| d.as_bytes().to_vec()).collect();
    assert_eq!(scanned, expected);

    for (i, docno) in docnos.iter().enumerate() {
        assert_eq!(index.get(i as u64).unwrap(), *docno);
        assert_eq!(index.find(docno).unwrap(), i as u64);
    }
    assert_eq!(index.inverse_format(), Some("hash"));
}

#[test]
fn test_reopened_file_matches_built_handle() {
    let (_dir, path) = temp_file("reopen.npids");
    let docnos = mixed_docnos();
    let built = DocnoIndex::build(docnos, &path, BuildConfig::default()).unwrap();
    let reopened = DocnoIndex::open(&path).unwrap();

    assert_eq!(built.describe(), reopened.describe());
    let first: Vec<Vec<u8>> = (&built).into_iter().collect();
    let second: Vec<Vec<u8>> = (&reopened).into_iter().collect();
    assert_eq!(first, second);
    built.close();
    reopened.close();
}

#[test]
fn test_consecutive_docnos_store_no_payload() {
    let (_dir, path) = temp_file("sequence.npids");
    let docnos: Vec<String> = (0..1000).map(|i| format!("doc{}", i)).collect();
    let index = DocnoIndex::build(&docnos, &path, BuildConfig::default()).unwrap();

    assert_eq!(forward_payload_lens(&path), vec![0]);
    assert_eq!(index.get(999).unwrap(), "doc999");
    assert_eq!(index.find("doc512").unwrap(), 512);
    assert_eq!(index.inverse_format(), Some("intsequence"));
    assert!(!index.contains("doc1000").unwrap());
    assert!(!index.contains("doc01").unwrap());
}

#[test]
fn test_mixed_case_pair() {
    let (_dir, path) = temp_file("pair.npids");
    let index = DocnoIndex::build(["ABC", "123"], &path, BuildConfig::default()).unwrap();

    assert_eq!(index.forward(&[0, 1]).unwrap(), vec!["ABC", "123"]);
    assert_eq!(index.inverse(&["123", "ABC"]).unwrap(), vec![1, 0]);
    assert_eq!(index.inverse_format(), Some("hash"));
}

#[test]
fn test_descending_numbers() {
    let (_dir, path) = temp_file("descending.npids");
    let index = DocnoIndex::build(["2", "1"], &path, BuildConfig::default()).unwrap();
    assert_eq!(index.get(0).unwrap(), "2");
    assert_eq!(index.find("1").unwrap(), 1);
    assert_eq!(index.find("2").unwrap(), 0);

    let (_dir, path) = temp_file("descending-prefixed.npids");
    let index = DocnoIndex::build(["D2", "D1"], &path, BuildConfig::default()).unwrap();
    assert_eq!(index.inverse(&["D1", "D2", "D3"]).unwrap(), vec![1, 0, NOT_FOUND]);
}

#[test]
fn test_unknown_keys() {
    let (_dir, path) = temp_file("unknown.npids");
    let index = DocnoIndex::build(["a", "b", "c"], &path, BuildConfig::default()).unwrap();

    assert!(matches!(index.find("-1"), Err(Error::NotFound(_))));
    assert!(!index.contains("-1").unwrap());
    assert_eq!(index.inverse(&["-1", "", "c"]).unwrap(), vec![NOT_FOUND, NOT_FOUND, 2]);

    let err = index.get(3).unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, Error::IndexOutOfRange { index: 3, len: 3 }));
    assert!(index.forward(&[0, 7]).is_err());
}

#[test]
fn test_batch_matches_scalar() {
    let (_dir, path) = temp_file("batch.npids");
    let docnos: Vec<String> = (0..100)
        .map(|i| if i % 3 == 0 { format!("x-{}", i * 11) } else { format!("doc{}", i) })
        .collect();
    let config = BuildConfig::default().with_min_block_size(8);
    let index = DocnoIndex::build(&docnos, &path, config).unwrap();

    let indices: Vec<u64> = (0..100u64).map(|i| (i * 37) % 100).collect();
    let batch = index.forward(&indices).unwrap();
    for (idx, docno) in indices.iter().zip(&batch) {
        assert_eq!(*docno, index.get(*idx).unwrap());
        assert_eq!(*docno, docnos[*idx as usize]);
    }

    let shuffled: Vec<&str> = indices.iter().map(|&i| docnos[i as usize].as_str()).collect();
    let found = index.inverse(&shuffled).unwrap();
    let expected: Vec<i64> = indices.iter().map(|&i| i as i64).collect();
    assert_eq!(found, expected);
    for (docno, &idx) in shuffled.iter().zip(&found) {
        assert_eq!(index.find(docno).unwrap() as i64, idx);
    }

    let from_iter = index.inverse_iter(shuffled.iter()).unwrap();
    assert_eq!(from_iter, found);
    let forward_from_iter = index.forward_iter(indices.iter().copied()).unwrap();
    let expected_bytes: Vec<Vec<u8>> = batch.iter().map(|d| d.as_bytes().to_vec()).collect();
    assert_eq!(forward_from_iter, expected_bytes);

    let packed = index.forward_batch(&indices).unwrap();
    assert_eq!(packed.len(), indices.len());
    assert_eq!(packed.to_vecs(), index.forward_bytes(&indices).unwrap());
}

#[test]
fn test_multiple_sequences_reverse_by_prefix() {
    let (_dir, path) = temp_file("multi.npids");
    let docnos: Vec<String> = (0..10)
        .map(|i| format!("a{}", i))
        .chain((0..10).map(|i| format!("b{}", i)))
        .collect();
    let config = BuildConfig::default().with_min_block_size(4);
    let index = DocnoIndex::build(&docnos, &path, config).unwrap();

    assert_eq!(forward_payload_lens(&path), vec![0, 0]);
    assert_eq!(index.inverse_format(), Some("intsequencemulti"));
    assert_eq!(index.find("b5").unwrap(), 15);
    assert_eq!(index.find("a0").unwrap(), 0);
    assert_eq!(index.inverse(&["a10", "c1", "b9"]).unwrap(), vec![NOT_FOUND, NOT_FOUND, 19]);
}

#[test]
fn test_sorted_stored_numbers_reverse_by_search() {
    let (_dir, path) = temp_file("stored.npids");
    let docnos: Vec<String> = (0..20).map(|i| format!("other-{}", i * 7 + 5)).collect();
    let index = DocnoIndex::build(&docnos, &path, BuildConfig::default()).unwrap();

    assert_eq!(index.inverse_format(), Some("intstored"));
    assert_eq!(forward_payload_lens(&path), vec![20]);
    assert_eq!(index.find("other-138").unwrap(), 19);
    assert_eq!(index.inverse(&["other-6", "other-5"]).unwrap(), vec![NOT_FOUND, 0]);
}

#[test]
fn test_build_inverse_later() {
    let (_dir, path) = temp_file("late.npids");
    let docnos = mixed_docnos();
    let config = BuildConfig::default().with_inverse(false);
    let index = DocnoIndex::build(docnos, &path, config).unwrap();
    assert_eq!(index.inverse_format(), None);
    // answered by an in-memory inverse index
    assert_eq!(index.find(&docnos[310]).unwrap(), 310);
    index.close();

    let inverse = npids::build_inverse(&path, &BuildConfig::default()).unwrap();
    assert_eq!(inverse.name(), "hash");

    let index = DocnoIndex::open(&path).unwrap();
    assert_eq!(index.inverse_format(), Some("hash"));
    assert_eq!(index.find(&docnos[5]).unwrap(), 5);
}

#[test]
fn test_append_without_inverse_stays_readable() {
    let (_dir, path) = temp_file("append.npids");
    DocnoIndex::build(["a", "b"], &path, BuildConfig::default()).unwrap();

    let mut builder = ForwardBuilder::new(&path, BuildConfig::default().with_inverse(false)).unwrap();
    builder.add("c").unwrap();
    builder.finish().unwrap();

    let index = DocnoIndex::open(&path).unwrap();
    assert_eq!(index.len(), 3);
    // the old inverse index no longer covers the file
    assert_eq!(index.inverse_format(), None);
    assert_eq!(index.find("c").unwrap(), 2);
    assert_eq!(index.inverse(&["b", "a", "d"]).unwrap(), vec![1, 0, NOT_FOUND]);
    index.close();

    npids::build_inverse(&path, &BuildConfig::default()).unwrap();
    let index = DocnoIndex::open(&path).unwrap();
    assert_eq!(index.inverse_format(), Some("hash"));
    assert_eq!(index.find("c").unwrap(), 2);
}

#[test]
fn test_repeated_sequence_still_resolves() {
    let (_dir, path) = temp_file("repeat.npids");
    let docnos: Vec<String> = (1..=5).chain(1..=5).map(|i| format!("a{}", i)).collect();
    let config = BuildConfig::default().with_min_block_size(5);
    let index = DocnoIndex::build(&docnos, &path, config).unwrap();

    assert_eq!(forward_payload_lens(&path), vec![0, 0]);
    assert_eq!(index.inverse_format(), Some("intsequencemulti"));
    let found = index.find("a3").unwrap();
    assert!(found == 2 || found == 7);
}

#[test]
fn test_streaming_builder_assigns_indices() {
    let (_dir, path) = temp_file("stream.npids");
    let mut builder = ForwardBuilder::new(&path, BuildConfig::default()).unwrap();
    for (i, docno) in ["q1", "q2", "zz"].iter().enumerate() {
        assert_eq!(builder.add(docno).unwrap(), i as u64);
    }
    assert_eq!(builder.len(), 3);
    let finished = builder.finish().unwrap();
    assert_eq!(finished, path);

    let index = DocnoIndex::open(&path).unwrap();
    assert_eq!(index.forward(&[2, 0]).unwrap(), vec!["zz", "q1"]);
}

#[test]
fn test_empty_lookup() {
    let (_dir, path) = temp_file("empty.npids");
    let index = DocnoIndex::build(Vec::<String>::new(), &path, BuildConfig::default()).unwrap();

    assert!(index.is_empty());
    assert_eq!(index.iter().count(), 0);
    assert_eq!(index.inverse(&["anything"]).unwrap(), vec![NOT_FOUND]);
    assert!(index.get(0).is_err());
}

fn write_legacy_file(path: &Path) {
    let config = br#"{"format":"fixedbytes","length":3,"prefix":""}"#;
    let header = RecordHeader {
        type_id: RecordType::Forward as u32,
        next_ptr: -1,
        doc_count: 2,
        config_len: config.len() as u32,
    };
    let mut bytes = Vec::new();
    HeaderLayout::V0.encode(&mut bytes, &header).unwrap();
    bytes.extend_from_slice(config);
    bytes.extend_from_slice(b"ABC12\0");
    fs::write(path, bytes).unwrap();
}

#[test]
fn test_legacy_file_readable_not_appendable() {
    let (_dir, path) = temp_file("legacy.npids");
    write_legacy_file(&path);

    let index = DocnoIndex::open(&path).unwrap();
    assert_eq!(index.stats().version, 0);
    assert_eq!(index.forward(&[0, 1]).unwrap(), vec!["ABC", "12"]);
    assert_eq!(index.find("12").unwrap(), 1);
    assert_eq!(index.inverse_format(), None);

    assert!(matches!(
        ForwardBuilder::new(&path, BuildConfig::default()),
        Err(Error::LegacyAppend(_))
    ));
}

#[test]
fn test_future_version_rejected() {
    let (_dir, path) = temp_file("future.npids");
    let config = br#"{"version":2}"#;
    let header = RecordHeader {
        type_id: npids::container::MAGIC_TYPE,
        next_ptr: -1,
        doc_count: 0,
        config_len: config.len() as u32,
    };
    let mut bytes = Vec::new();
    HeaderLayout::V1.encode(&mut bytes, &header).unwrap();
    bytes.extend_from_slice(config);
    fs::write(&path, bytes).unwrap();

    match DocnoIndex::open(&path) {
        Err(Error::UnsupportedVersion { found, supported }) => {
            assert_eq!(found, 2);
            assert_eq!(supported, 1);
        }
        other => panic!("expected a version error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_corrupt_chain_rejected() {
    let (_dir, path) = temp_file("corrupt.npids");
    DocnoIndex::build(["a", "b"], &path, BuildConfig::default()).unwrap();

    // point the magic record back at itself
    let mut bytes = fs::read(&path).unwrap();
    let at = HeaderLayout::V1.next_ptr_offset() as usize;
    bytes[at..at + 8].copy_from_slice(&0i64.to_le_bytes());
    fs::write(&path, bytes).unwrap();

    assert!(matches!(DocnoIndex::open(&path), Err(Error::CorruptChain(_))));
}
