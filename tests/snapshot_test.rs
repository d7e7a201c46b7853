//! Snapshot encoding, round trips and replay failures

use pokemem::memory::snapshot::{self, MAGIC};
use pokemem::memory::{MemoryRegion, SnapshotReader, SnapshotWriter};
use pokemem::{
    Address, AddressSpace, DataType, MemoryAccess, MemoryError, MemoryImage, SearchSession,
    SnapshotFormatError, TypedValue,
};
use pretty_assertions::assert_eq;
use std::io::Cursor;
use tempfile::TempDir;

fn encoded(runs: &[(u64, &[u8])]) -> Vec<u8> {
    let mut writer = SnapshotWriter::new(Vec::new()).unwrap();
    for &(address, bytes) in runs {
        writer.write_run(Address::new(address), bytes).unwrap();
    }
    writer.finish().unwrap().0
}

fn patterned(base: u64, size: u64) -> Vec<u8> {
    (0..size).map(|i| ((i * 31 + base) % 251) as u8).collect()
}

#[test]
fn test_address_encodings() {
    let cases: [(u64, Vec<u8>); 6] = [
        (0, vec![0x00]),
        (63, vec![0x3F]),
        (64, vec![0x40, 0x02]),
        (8191, vec![0x5F, 0xFF]),
        (8192, [vec![0x60], 8192u64.to_le_bytes().to_vec()].concat()),
        (1 << 40, [vec![0x60], (1u64 << 40).to_le_bytes().to_vec()].concat()),
    ];

    for (delta, control) in cases {
        let expected = [MAGIC.to_vec(), control, vec![0x80]].concat();
        assert_eq!(encoded(&[(delta, &[][..])]), expected, "delta {delta}");

        let runs: Vec<_> = SnapshotReader::new(expected.as_slice())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].address, Address::new(delta));
    }
}

#[test]
fn test_deltas_are_from_previous_end() {
    let bytes = encoded(&[(0x1000, &[1, 2, 3, 4][..]), (0x1004, &[5][..]), (0x1045, &[6][..])]);
    let expected = [
        MAGIC.to_vec(),
        vec![0x40, 0x80, 0x84, 1, 2, 3, 4],
        vec![0x00, 0x81, 5],
        vec![0x40, 0x02, 0x81, 6],
    ]
    .concat();
    assert_eq!(bytes, expected);
}

#[test]
fn test_length_encodings() {
    let cases: [(usize, Vec<u8>); 5] = [
        (0, vec![0x80]),
        (63, vec![0xBF]),
        (64, vec![0xC0, 0x40, 0x00]),
        (65535, vec![0xC0, 0xFF, 0xFF]),
        (65536, [vec![0xE0], 65536u64.to_le_bytes().to_vec()].concat()),
    ];

    for (len, control) in cases {
        let payload = vec![0xA5; len];
        let bytes = encoded(&[(0, payload.as_slice())]);
        let header = [MAGIC.to_vec(), vec![0x00], control].concat();
        assert_eq!(&bytes[..header.len()], header.as_slice(), "length {len}");
        assert_eq!(bytes.len(), header.len() + len);
    }
}

#[test]
fn test_dump_and_load_region_sizes() {
    for size in [0u64, 1, 63, 64, 8191, 8192, 70000] {
        let space = AddressSpace::from_regions(vec![
            MemoryRegion::new(Address::new(0x10_0000), size),
            MemoryRegion::new(Address::new(0x7FFF_0000_0000), 64),
        ]);

        let mut source = MemoryImage::new();
        let mut target = MemoryImage::new();
        for region in &space {
            source.map_bytes(region.base, patterned(region.base.as_u64(), region.size));
            target.map_zeroed(region.base, region.size as usize);
        }

        let mut out = Vec::new();
        let dumped = snapshot::dump_all(&mut source, &space, &mut out).unwrap();
        assert_eq!(dumped.bytes, size + 64);

        let loaded = snapshot::load(&mut target, out.as_slice()).unwrap();
        assert_eq!(loaded, dumped);
        assert_eq!(target, source, "region size {size}");
    }
}

#[test]
fn test_dump_zero_fills_unreadable_bytes() {
    let space = AddressSpace::from_regions(vec![MemoryRegion::new(Address::new(0x1000), 512)]);
    let mut source = MemoryImage::new();
    source.map_bytes(Address::new(0x1000), vec![0xEE; 100]);

    let mut out = Vec::new();
    snapshot::dump_all(&mut source, &space, &mut out).unwrap();

    let mut target = MemoryImage::new();
    target.map_bytes(Address::new(0x1000), vec![0x11; 512]);
    snapshot::load(&mut target, out.as_slice()).unwrap();

    let block = target.block(Address::new(0x1000)).unwrap();
    assert!(block[..100].iter().all(|&b| b == 0xEE));
    assert!(block[100..].iter().all(|&b| b == 0));
}

#[test]
fn test_dump_candidates_saves_live_items() {
    let space = AddressSpace::from_regions(vec![MemoryRegion::new(Address::new(0x2000), 512)]);
    let mut image = MemoryImage::new();
    image.map_zeroed(Address::new(0x2000), 512);
    image.write_at(Address::new(0x2008), &7u32.to_ne_bytes());
    image.write_at(Address::new(0x2100), &7u32.to_ne_bytes());

    let mut session = SearchSession::start(space, DataType::U32).unwrap();
    let seven = TypedValue::parse(DataType::U32, "7").unwrap();
    session.apply_value(&mut image, &seven, 4096).unwrap();

    let mut out = Vec::new();
    let summary = snapshot::dump_candidates(&mut image, &session, &mut out, 4096).unwrap();
    assert_eq!(summary.runs, 2);
    assert_eq!(summary.bytes, 8);

    let runs: Vec<_> = SnapshotReader::new(out.as_slice()).unwrap().map(Result::unwrap).collect();
    assert_eq!(runs[0].address, Address::new(0x2008));
    assert_eq!(runs[1].address, Address::new(0x2100));
    assert_eq!(runs[1].bytes, 7u32.to_ne_bytes().to_vec());
}

#[test]
fn test_bad_magic() {
    let mut image = MemoryImage::new();
    for stream in [&b""[..], &b"MEM"[..], &b"\xFFMEX\x00\x80"[..]] {
        let err = snapshot::load(&mut image, stream).unwrap_err();
        match err {
            MemoryError::MalformedSnapshot { offset, source, .. } => {
                assert_eq!(offset, 0);
                assert!(matches!(source, SnapshotFormatError::BadMagic));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

#[test]
fn test_malformed_record_keeps_earlier_writes() {
    let mut stream = encoded(&[(0x1000, &[1, 2][..])]);
    let bad_at = stream.len() as u64;
    stream.push(0x70);

    let mut image = MemoryImage::new();
    image.map_zeroed(Address::new(0x1000), 16);

    match snapshot::load(&mut image, Cursor::new(stream)).unwrap_err() {
        MemoryError::MalformedSnapshot { path, offset, source } => {
            assert_eq!(path, "<stream>");
            assert_eq!(offset, bad_at);
            assert!(matches!(source, SnapshotFormatError::InvalidAddressControl(0x70)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(&image.block(Address::new(0x1000)).unwrap()[..3], &[1u8, 2, 0][..]);
}

#[test]
fn test_truncated_payload() {
    let mut stream = encoded(&[(0x1000, &[9; 10][..])]);
    stream.truncate(stream.len() - 4);

    let mut image = MemoryImage::new();
    image.map_zeroed(Address::new(0x1000), 16);
    let err = snapshot::load(&mut image, stream.as_slice()).unwrap_err();
    assert!(matches!(
        err,
        MemoryError::MalformedSnapshot { source: SnapshotFormatError::Truncated, .. }
    ));
    assert_eq!(image.block(Address::new(0x1000)).unwrap(), &[0u8; 16][..]);
}

#[test]
fn test_load_into_unmapped_memory_is_partial_write() {
    let stream = encoded(&[(0x1000, &[1, 2, 3, 4][..])]);
    let mut image = MemoryImage::new();
    image.map_zeroed(Address::new(0x1000), 2);

    let err = snapshot::load(&mut image, stream.as_slice()).unwrap_err();
    assert!(matches!(err, MemoryError::PartialWrite { expected: 4, actual: 2, .. }));
}

#[test]
fn test_path_errors_name_the_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.mem");
    std::fs::write(&path, b"not a snapshot").unwrap();

    let mut image = MemoryImage::new();
    let err = snapshot::load_from_path(&mut image, &path).unwrap_err();
    assert!(err.to_string().contains("broken.mem"));

    let missing = dir.path().join("missing.mem");
    assert!(matches!(
        snapshot::load_from_path(&mut image, &missing),
        Err(MemoryError::IoError(_))
    ));
}

#[test]
fn test_path_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("space.mem");
    let space = AddressSpace::from_regions(vec![MemoryRegion::new(Address::new(0x4000), 8192)]);

    let mut source = MemoryImage::new();
    source.map_bytes(Address::new(0x4000), patterned(0x4000, 8192));
    let dumped = snapshot::dump_all_to_path(&mut source, &space, &path).unwrap();
    assert_eq!(dumped.runs, 2);

    let mut target = MemoryImage::new();
    target.map_zeroed(Address::new(0x4000), 8192);
    snapshot::load_from_path(&mut target, &path).unwrap();
    assert_eq!(target, source);
}
