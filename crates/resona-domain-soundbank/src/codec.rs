use crate::connection::{ArticulationVersion, ConnectionBlock};
use crate::generator::GeneratorId;
use crate::region::GeneratorRegion;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum CodecError {
    #[error("truncated input: needed {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("{0} trailing bytes after region")]
    TrailingBytes(usize),
}

/// Region layout (all little-endian):
/// `u32` generator count, `(u16 id, i16 value)` pairs ascending by id,
/// `u32` block count, 12-byte connection blocks in order.
pub fn encode_region(region: &GeneratorRegion) -> Vec<u8> {
    let mut out = Vec::with_capacity(
        8 + region.generator_count() * 4 + region.modulators().len() * ConnectionBlock::ENCODED_LEN,
    );
    out.extend_from_slice(&(region.generator_count() as u32).to_le_bytes());
    for (id, value) in region.generators() {
        out.extend_from_slice(&id.0.to_le_bytes());
        out.extend_from_slice(&value.to_le_bytes());
    }
    encode_connection_blocks_into(region.modulators(), &mut out);
    out
}

/// Inverse of [`encode_region`]. Blocks take `version`, which the
/// surrounding container records (art1 vs art2).
pub fn decode_region(data: &[u8], version: ArticulationVersion) -> Result<GeneratorRegion, CodecError> {
    let mut reader = ByteReader::new(data);
    let mut region = GeneratorRegion::new();

    let generator_count = reader.u32()?;
    for _ in 0..generator_count {
        let id = GeneratorId(reader.u16()?);
        let value = i16::from_le_bytes(reader.array::<2>()?);
        region.set_short(id, value);
    }

    let blocks = decode_blocks(&mut reader, version)?;
    region.modulators_mut().extend(blocks);

    if reader.remaining() > 0 {
        return Err(CodecError::TrailingBytes(reader.remaining()));
    }
    Ok(region)
}

/// `u32` count followed by the blocks.
pub fn encode_connection_blocks(blocks: &[ConnectionBlock]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + blocks.len() * ConnectionBlock::ENCODED_LEN);
    encode_connection_blocks_into(blocks, &mut out);
    out
}

pub fn decode_connection_blocks(
    data: &[u8],
    version: ArticulationVersion,
) -> Result<Vec<ConnectionBlock>, CodecError> {
    let mut reader = ByteReader::new(data);
    let blocks = decode_blocks(&mut reader, version)?;
    if reader.remaining() > 0 {
        return Err(CodecError::TrailingBytes(reader.remaining()));
    }
    Ok(blocks)
}

fn encode_connection_blocks_into(blocks: &[ConnectionBlock], out: &mut Vec<u8>) {
    out.extend_from_slice(&(blocks.len() as u32).to_le_bytes());
    for block in blocks {
        out.extend_from_slice(&block.to_bytes());
    }
}

fn decode_blocks(
    reader: &mut ByteReader<'_>,
    version: ArticulationVersion,
) -> Result<Vec<ConnectionBlock>, CodecError> {
    let count = reader.u32()? as usize;
    // Cap the preallocation by what the input can actually hold.
    let mut blocks = Vec::with_capacity(count.min(reader.remaining() / ConnectionBlock::ENCODED_LEN));
    for _ in 0..count {
        let bytes = reader.array::<{ ConnectionBlock::ENCODED_LEN }>()?;
        blocks.push(ConnectionBlock::from_bytes(&bytes, version));
    }
    Ok(blocks)
}

struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        if self.remaining() < N {
            return Err(CodecError::Truncated {
                offset: self.offset,
                needed: N,
                available: self.remaining(),
            });
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.offset..self.offset + N]);
        self.offset += N;
        Ok(out)
    }

    fn u16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_le_bytes(self.array::<2>()?))
    }

    fn u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.array::<4>()?))
    }
}
