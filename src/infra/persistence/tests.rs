//! Persisted image tests: layout, unique-id translation and checksum guard.
use super::*;
use crate::core::{Direction, ParamId};
use crate::protocol::transport::traits::checksum::StmCrc32;
use crate::test_support::{FlashError, TestFlash, TestParams, PARAM_COUNT};

fn sample_map() -> CanMap {
    let mut map = CanMap::new();
    map.add(Direction::Send, ParamId(1), 0x100, 0, 16, 2.0, 5).unwrap();
    map.add(Direction::Send, ParamId(2), 0x100, 16, 8, 0.5, -3).unwrap();
    map.add(Direction::Send, ParamId(3), 0x1800_0001, 32, 32, 1.0, 0).unwrap();
    map.add(Direction::Receive, ParamId(9), 0x200, 8, 12, 0.125, 0).unwrap();
    map
}

#[test]
/// Field records pack into three words and back.
fn test_field_words() {
    let field = StoredField {
        uid: 0x1234,
        translation: -2,
        gain: 1.5,
        offset_bits: 40,
        width_bits: 12,
    };
    let words = field.to_words();
    assert_eq!(words, [0xFFFE_1234, 1.5f32.to_bits(), 0x0C28]);
    assert_eq!(StoredField::from_words(words), field);
}

#[test]
/// Capture stores unique ids, not enumerated indices.
fn test_capture_uses_unique_ids() {
    let params = TestParams::new();
    let image = PersistedImage::capture(&sample_map(), &params);

    assert_eq!(image.send.messages[0].id, 0x100);
    assert_eq!(image.send.messages[0].fields[0].uid, PARAM_COUNT - 1 - 1);
    assert_eq!(image.send.messages[0].fields[1].uid, PARAM_COUNT - 1 - 2);
    assert!(!image.send.messages[0].fields[2].is_used());
    assert_eq!(image.send.messages[1].id, 0x1800_0001);
    assert!(!image.send.messages[2].is_used());
    assert_eq!(image.recv.messages[0].fields[0].uid, PARAM_COUNT - 1 - 9);
}

#[test]
/// Save then load reproduces both tables.
fn test_write_read_round_trip() {
    let params = TestParams::new();
    let map = sample_map();
    let mut flash = TestFlash::new();
    let mut crc = StmCrc32::new();

    let mut image = PersistedImage::capture(&map, &params);
    let written = image.write(&mut flash, &mut crc).expect("write");
    assert_eq!(flash.words[CHECKSUM_INDEX], written);
    assert_eq!(flash.erase_count, 1);

    let loaded = PersistedImage::read(&mut flash, &mut crc).expect("checksum matches");
    assert_eq!(loaded, image);
    assert_eq!(loaded.restore(&params), map);
}

#[test]
/// The checksum covers exactly the table words, in address order.
fn test_checksum_covers_tables() {
    let params = TestParams::new();
    let mut flash = TestFlash::new();
    let mut image = PersistedImage::capture(&sample_map(), &params);
    let written = image.write(&mut flash, &mut StmCrc32::new()).unwrap();

    let mut reference = StmCrc32::new();
    let mut expected = 0;
    for word in &flash.words[..CHECKSUM_INDEX] {
        expected = reference.accumulate(*word);
    }
    assert_eq!(written, expected);
    assert_eq!(flash.words.len(), IMAGE_WORDS);
}

#[test]
/// A corrupted checksum byte rejects the whole image.
fn test_corrupt_checksum_rejected() {
    let params = TestParams::new();
    let mut flash = TestFlash::new();
    let mut crc = StmCrc32::new();
    PersistedImage::capture(&sample_map(), &params)
        .write(&mut flash, &mut crc)
        .unwrap();

    flash.words[CHECKSUM_INDEX] ^= 0x0000_0100;
    assert!(matches!(
        PersistedImage::read(&mut flash, &mut crc),
        Err(PersistError::ChecksumMismatch { .. })
    ));
}

#[test]
/// A corrupted table word rejects the whole image.
fn test_corrupt_table_rejected() {
    let params = TestParams::new();
    let mut flash = TestFlash::new();
    let mut crc = StmCrc32::new();
    PersistedImage::capture(&sample_map(), &params)
        .write(&mut flash, &mut crc)
        .unwrap();

    flash.words[TABLE_WORDS + 1] ^= 1;
    assert!(PersistedImage::read(&mut flash, &mut crc).is_err());
}

#[test]
/// Freshly erased flash never loads.
fn test_erased_flash_rejected() {
    let mut flash = TestFlash::new();
    let result = PersistedImage::read(&mut flash, &mut StmCrc32::new());
    assert!(matches!(result, Err(PersistError::ChecksumMismatch { stored: u32::MAX, .. })));
}

#[test]
/// Storage failures surface as `PersistError::Storage`.
fn test_storage_error_propagates() {
    let mut flash = TestFlash::new();
    flash.words.truncate(10);
    let result = PersistedImage::read(&mut flash, &mut StmCrc32::new());
    assert!(matches!(result, Err(PersistError::Storage(FlashError::OutOfRange(10)))));
}

#[test]
/// Fields whose unique id no longer resolves are dropped on restore.
fn test_restore_drops_unknown_uids() {
    let params = TestParams::new();
    let mut image = PersistedImage::capture(&sample_map(), &params);
    // Point the only inbound field at a uid the store does not know.
    image.recv.messages[0].fields[0].uid = PARAM_COUNT + 5;
    // And one of the two fields of the first outbound message.
    image.send.messages[0].fields[0].uid = PARAM_COUNT + 6;

    let map = image.restore(&params);
    assert!(map.table(Direction::Receive).is_empty());
    let first = &map.table(Direction::Send).messages()[0];
    assert_eq!(first.fields().len(), 1);
    assert_eq!(first.fields()[0].param, ParamId(2));
}
