use pretty_assertions::assert_eq;
use resona_domain_soundbank::{
    decode_connection_blocks, decode_region, encode_connection_blocks, encode_region,
    ArticulationVersion, CodecError, ConnectionBlock, Destination, GeneratorId, GeneratorRegion,
    Source, Transform,
};

#[test]
fn connection_block_bytes_roundtrip() {
    let block = ConnectionBlock::new(
        Source::EG1,
        Source::KEY_NUMBER,
        Destination::EG1_ATTACK_TIME,
        Transform::NONE,
        -12_000,
    );
    let bytes = block.to_bytes();
    assert_eq!(bytes.len(), ConnectionBlock::ENCODED_LEN);
    assert_eq!(&bytes[4..6], &[0x06, 0x02]);

    let decoded = ConnectionBlock::from_bytes(&bytes, ArticulationVersion::Dls1);
    assert_eq!(decoded, block);
    assert_eq!(decoded.scale, -12_000);
    assert_eq!(decoded.destination, Destination(0x206));
}

#[test]
fn unknown_codes_survive_roundtrip() {
    let block = ConnectionBlock::new(Source(0x3FF), Source(0x1), Destination(0x999), Transform(0x7), 1)
        .with_version(ArticulationVersion::Dls2);
    let data = encode_connection_blocks(&[block]);
    let decoded = decode_connection_blocks(&data, ArticulationVersion::Dls2).expect("decode should succeed");
    assert_eq!(decoded, vec![block]);
    assert!(!decoded[0].destination.is_known());
}

#[test]
fn region_roundtrip() {
    let mut region = GeneratorRegion::new();
    region.set_short(GeneratorId::ATTACK_VOL_ENV, -7_973);
    region.set_range(GeneratorId::KEY_RANGE, 36, 72);
    region.set_short(GeneratorId::SAMPLE_ID, 3);
    region.push_modulator(ConnectionBlock::new(
        Source::LFO,
        Source::CC1,
        Destination::PITCH,
        Transform::NONE,
        50 << 16,
    ));

    let data = encode_region(&region);
    assert_eq!(data.len(), 4 + 3 * 4 + 4 + 12);

    let decoded = decode_region(&data, ArticulationVersion::Dls1).expect("decode should succeed");
    assert_eq!(decoded, region);
}

#[test]
fn truncated_region_is_rejected() {
    let mut region = GeneratorRegion::new();
    region.set_short(GeneratorId::PAN, -500);
    let data = encode_region(&region);

    let err = decode_region(&data[..data.len() - 2], ArticulationVersion::Dls1)
        .expect_err("decode should fail");
    assert!(matches!(err, CodecError::Truncated { .. }));
}

#[test]
fn trailing_bytes_are_rejected() {
    let mut data = encode_region(&GeneratorRegion::new());
    data.push(0);
    assert_eq!(
        decode_region(&data, ArticulationVersion::Dls1),
        Err(CodecError::TrailingBytes(1))
    );
}
