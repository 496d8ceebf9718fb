//! Tests for zero-copy optimizations

use casc_storage::LockFreeCache;
use casc_storage::types::EKey;
use std::sync::Arc;
use std::thread;

#[test]
fn test_zero_copy_cache() {
    // Arc-based caching should hand back the same allocation on every hit,
    // across threads, rather than cloning the underlying bytes.
    let cache = LockFreeCache::new(1024 * 1024);
    let test_ekey = EKey::new([
        0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F,
        0x10,
    ]);

    let data1 = Arc::new(vec![42u8; 4096]);
    cache.put(test_ekey, Arc::clone(&data1));

    let data2 = cache.get(&test_ekey).unwrap();
    assert!(
        Arc::ptr_eq(&data1, &data2),
        "Zero-copy cache should return the same Arc"
    );

    let cache = Arc::new(cache);
    let cache_clone = Arc::clone(&cache);
    let handle = thread::spawn(move || cache_clone.get(&test_ekey).unwrap());

    let data3 = handle.join().unwrap();
    assert!(
        Arc::ptr_eq(&data1, &data3),
        "Zero-copy cache should work across threads"
    );
}

#[test]
fn test_archive_reader_zero_copy() {
    use casc_storage::archive::ArchiveReader;

    let temp_dir = tempfile::tempdir().unwrap();
    let test_archive = temp_dir.path().join("test-archive.dat");
    std::fs::write(&test_archive, vec![0u8; 1024]).unwrap();

    let reader = ArchiveReader::open(&test_archive).unwrap();

    // Test that read_at_cow returns borrowed data when memory-mapped
    if reader.is_memory_mapped() {
        let cow_data = reader.read_at_cow(0, 100).unwrap();

        // Cow::Borrowed means zero-copy
        assert!(
            matches!(cow_data, std::borrow::Cow::Borrowed(_)),
            "Memory-mapped reads should be zero-copy"
        );
    }
}

#[test]
fn test_blte_streaming_decode() {
    use casc_blte::BLTEFile;
    use casc_crypto::KeyService;
    use std::io::Cursor;

    // Minimal single-chunk, uncompressed BLTE body.
    let mut test_data = Vec::new();
    test_data.extend_from_slice(&casc_blte::BLTE_MAGIC);
    test_data.extend_from_slice(&0u32.to_be_bytes()); // header_size = 0 (single chunk)
    test_data.push(b'N'); // mode 'N' (no compression)
    test_data.extend_from_slice(b"test data");

    let length = test_data.len() as u64;
    let mut blte = BLTEFile::new(Cursor::new(test_data), 0, length).unwrap();

    assert_eq!(blte.chunk_count(), 1);
    assert_eq!(blte.total_decompressed_size(), 9);

    let keys = KeyService::new();
    let decoded = blte.read_all(&keys, true).unwrap();
    assert_eq!(decoded, b"test data");
}

#[test]
fn test_memory_efficiency() {
    // This test verifies that our zero-copy optimizations
    // reduce memory allocations

    // We can't easily measure allocations directly in Rust tests,
    // but we can verify that our APIs work as expected

    // Test that Arc-based cache values can be shared
    let data = vec![1, 2, 3, 4, 5];
    let arc1 = Arc::new(data);
    let arc2 = Arc::clone(&arc1);

    // Both should point to the same allocation
    assert!(Arc::ptr_eq(&arc1, &arc2));

    // Strong count should be 2
    assert_eq!(Arc::strong_count(&arc1), 2);

    // Drop one reference
    drop(arc2);

    // Strong count should be 1
    assert_eq!(Arc::strong_count(&arc1), 1);
}
