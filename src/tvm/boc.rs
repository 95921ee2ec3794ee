//! Bag of Cells (BoC) serialization and deserialization
//!
//! BoC is the byte format cells travel in: code cells arrive as BoC, and built
//! message bodies leave as BoC. Cells are written root first, every cell before
//! the cells it references, each distinct cell exactly once.

use crate::crc::CRC32C;
use crate::tvm::cell::Cell;
use crate::tvm::error::{TvmError, TvmResult};
use base64::Engine;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

/// BoC magic number for standard format
const BOC_GENERIC_MAGIC: u32 = 0xb5ee9c72;

/// BoC magic number for indexed format (with CRC32)
const BOC_INDEXED_MAGIC: u32 = 0x68ff65f3;

/// BoC magic number for indexed format (with CRC32C)
const BOC_INDEXED_CRC32C_MAGIC: u32 = 0xacc3a728;

fn format_err(msg: impl Into<String>) -> TvmError {
    TvmError::Format(msg.into())
}

fn io_err(e: std::io::Error) -> TvmError {
    TvmError::Format(format!("unexpected end of BoC data: {}", e))
}

/// Serializes a cell and its references into a Bag of Cells (BoC) format
pub fn serialize_boc(root: &Arc<Cell>, has_crc32: bool) -> TvmResult<Vec<u8>> {
    let cells = collect_cells(root);
    let index: HashMap<[u8; 32], usize> = cells
        .iter()
        .enumerate()
        .map(|(idx, cell)| (cell.hash(), idx))
        .collect();

    let size_bytes = bytes_needed(cells.len());

    let mut payload = Vec::new();
    for cell in &cells {
        payload.extend_from_slice(&cell.descriptors());
        payload.extend_from_slice(&cell.serialize_data());
        for reference in cell.references() {
            let ref_idx = index
                .get(&reference.hash())
                .ok_or_else(|| format_err("reference not found in cell index"))?;
            payload
                .write_uint::<BigEndian>(*ref_idx as u64, size_bytes)
                .map_err(io_err)?;
        }
    }

    let offset_bytes = bytes_needed(payload.len());

    let mut result = Vec::with_capacity(payload.len() + 32);
    result
        .write_u32::<BigEndian>(BOC_GENERIC_MAGIC)
        .map_err(io_err)?;

    // has_idx:1 has_crc32c:1 has_cache_bits:1 flags:2 size:3
    let flags = if has_crc32 { 0x40u8 } else { 0 };
    result.push(flags | size_bytes as u8);
    result.push(offset_bytes as u8);

    for (value, width) in [
        (cells.len(), size_bytes),
        (1, size_bytes), // roots
        (0, size_bytes), // absent
        (payload.len(), offset_bytes),
        (0, size_bytes), // root index
    ] {
        result
            .write_uint::<BigEndian>(value as u64, width)
            .map_err(io_err)?;
    }

    result.extend_from_slice(&payload);

    if has_crc32 {
        let crc = CRC32C.checksum(&result);
        result.write_u32::<byteorder::LittleEndian>(crc).map_err(io_err)?;
    }

    Ok(result)
}

/// Deserializes a Bag of Cells (BoC) into its first root cell
pub fn deserialize_boc(data: &[u8]) -> TvmResult<Arc<Cell>> {
    let mut reader = Cursor::new(data);
    let magic = reader.read_u32::<BigEndian>().map_err(io_err)?;

    match magic {
        BOC_GENERIC_MAGIC => deserialize_boc_generic(data, reader),
        BOC_INDEXED_MAGIC | BOC_INDEXED_CRC32C_MAGIC => {
            Err(format_err("legacy indexed BoC formats are not supported"))
        }
        _ => Err(format_err(format!("invalid BoC magic number: 0x{:08x}", magic))),
    }
}

fn deserialize_boc_generic(data: &[u8], mut reader: Cursor<&[u8]>) -> TvmResult<Arc<Cell>> {
    let flags_and_size = reader.read_u8().map_err(io_err)?;
    let has_idx = flags_and_size & 0x80 != 0;
    let has_crc32 = flags_and_size & 0x40 != 0;
    let size_bytes = (flags_and_size & 0x07) as usize;

    if size_bytes == 0 || size_bytes > 4 {
        return Err(format_err(format!("invalid size_bytes: {}", size_bytes)));
    }

    let offset_bytes = reader.read_u8().map_err(io_err)? as usize;
    if offset_bytes == 0 || offset_bytes > 8 {
        return Err(format_err(format!("invalid offset_bytes: {}", offset_bytes)));
    }

    let cells_count = reader.read_uint::<BigEndian>(size_bytes).map_err(io_err)? as usize;
    let roots_count = reader.read_uint::<BigEndian>(size_bytes).map_err(io_err)? as usize;
    let _absent_count = reader.read_uint::<BigEndian>(size_bytes).map_err(io_err)?;
    let cells_size = reader.read_uint::<BigEndian>(offset_bytes).map_err(io_err)? as usize;

    if roots_count == 0 {
        return Err(format_err("BoC has no roots"));
    }
    let root_idx = reader.read_uint::<BigEndian>(size_bytes).map_err(io_err)? as usize;
    for _ in 1..roots_count {
        reader.read_uint::<BigEndian>(size_bytes).map_err(io_err)?;
    }

    let overflow = || format_err("BoC header sizes overflow");
    let mut cells_start = reader.position() as usize;
    if has_idx {
        let skip = cells_count.checked_mul(offset_bytes).ok_or_else(overflow)?;
        cells_start = cells_start.checked_add(skip).ok_or_else(overflow)?;
    }

    let cells_end = cells_start.checked_add(cells_size).ok_or_else(overflow)?;
    let crc_len = if has_crc32 { 4 } else { 0 };
    if cells_end.checked_add(crc_len).ok_or_else(overflow)? > data.len() {
        return Err(format_err("BoC cells section exceeds data"));
    }

    // Every cell takes at least its two descriptor bytes
    if cells_count > cells_size / 2 {
        return Err(format_err(format!(
            "BoC declares {} cells in {} bytes",
            cells_count, cells_size
        )));
    }

    if has_crc32 {
        let expected = u32::from_le_bytes([
            data[cells_end],
            data[cells_end + 1],
            data[cells_end + 2],
            data[cells_end + 3],
        ]);
        let actual = CRC32C.checksum(&data[..cells_end]);
        if expected != actual {
            return Err(format_err(format!(
                "CRC32C mismatch: expected 0x{:08x}, got 0x{:08x}",
                expected, actual
            )));
        }
    }

    let cells = parse_cells(&data[cells_start..cells_end], cells_count, size_bytes)?;
    cells
        .get(root_idx)
        .cloned()
        .ok_or_else(|| format_err(format!("invalid root index: {}", root_idx)))
}

struct RawCell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<usize>,
}

fn parse_cells(data: &[u8], count: usize, size_bytes: usize) -> TvmResult<Vec<Arc<Cell>>> {
    let mut reader = Cursor::new(data);
    let mut raw = Vec::with_capacity(count);

    for _ in 0..count {
        let d1 = reader.read_u8().map_err(io_err)?;
        let d2 = reader.read_u8().map_err(io_err)?;

        let ref_count = (d1 & 0x07) as usize;
        if d1 & 0x08 != 0 {
            return Err(format_err("exotic cells are not supported"));
        }
        if d1 & 0x10 != 0 {
            return Err(format_err("cells with stored hashes are not supported"));
        }
        if d1 >> 5 != 0 {
            return Err(format_err("cells with non-zero level are not supported"));
        }
        if ref_count > 4 {
            return Err(format_err(format!("invalid reference count {}", ref_count)));
        }

        // d2 = floor(b/8) + ceil(b/8)
        let data_size = (d2 as usize).div_ceil(2);
        let start = reader.position() as usize;
        if start + data_size > data.len() {
            return Err(format_err("cell data exceeds buffer"));
        }
        let cell_data = data[start..start + data_size].to_vec();
        reader.set_position((start + data_size) as u64);

        let bit_len = if d2 % 2 == 0 {
            data_size * 8
        } else {
            // Partial last byte: the lowest set bit is the completion tag
            let last_byte = cell_data[data_size - 1];
            if last_byte == 0 {
                return Err(format_err("missing completion tag in partial byte"));
            }
            (data_size - 1) * 8 + (7 - last_byte.trailing_zeros() as usize)
        };

        let mut refs = Vec::with_capacity(ref_count);
        for _ in 0..ref_count {
            refs.push(reader.read_uint::<BigEndian>(size_bytes).map_err(io_err)? as usize);
        }

        raw.push(RawCell {
            data: cell_data,
            bit_len,
            refs,
        });
    }

    // References always point forward, so build from the last cell back
    let mut built: Vec<Option<Arc<Cell>>> = vec![None; count];
    for (i, cell) in raw.into_iter().enumerate().rev() {
        let mut references = Vec::with_capacity(cell.refs.len());
        for ref_idx in cell.refs {
            if ref_idx <= i || ref_idx >= count {
                return Err(format_err(format!(
                    "cell {} has invalid reference index {}",
                    i, ref_idx
                )));
            }
            let child = built[ref_idx]
                .clone()
                .ok_or_else(|| format_err(format!("cell {} not yet built", ref_idx)))?;
            references.push(child);
        }
        built[i] = Some(Arc::new(Cell::new_ordinary(
            cell.data,
            cell.bit_len,
            references,
        )?));
    }

    built
        .into_iter()
        .map(|cell| cell.ok_or_else(|| format_err("unresolved cell")))
        .collect()
}

/// Orders distinct cells so that every cell precedes its references
fn collect_cells(root: &Arc<Cell>) -> Vec<Arc<Cell>> {
    let mut post_order = Vec::new();
    let mut visited = HashMap::new();
    collect_cells_recursive(root, &mut post_order, &mut visited);
    post_order.reverse();
    post_order
}

fn collect_cells_recursive(
    cell: &Arc<Cell>,
    cells: &mut Vec<Arc<Cell>>,
    visited: &mut HashMap<[u8; 32], ()>,
) {
    if visited.insert(cell.hash(), ()).is_some() {
        return;
    }

    for reference in cell.references() {
        collect_cells_recursive(reference, cells, visited);
    }

    cells.push(cell.clone());
}

fn bytes_needed(value: usize) -> usize {
    if value == 0 {
        return 1;
    }

    let bits = (usize::BITS - value.leading_zeros()) as usize;
    bits.div_ceil(8)
}

/// Converts a hex string to a cell
pub fn hex_to_boc(hex: &str) -> TvmResult<Arc<Cell>> {
    let hex: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes =
        hex::decode(&hex).map_err(|e| format_err(format!("failed to decode hex: {}", e)))?;
    deserialize_boc(&bytes)
}

/// Converts a cell to a BoC hex string
pub fn boc_to_hex(cell: &Arc<Cell>, has_crc32: bool) -> TvmResult<String> {
    Ok(hex::encode(serialize_boc(cell, has_crc32)?))
}

/// Converts a cell to a BoC base64 string
pub fn boc_to_base64(cell: &Arc<Cell>, has_crc32: bool) -> TvmResult<String> {
    let bytes = serialize_boc(cell, has_crc32)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}

/// Converts a base64 BoC string to a cell
pub fn base64_to_boc(b64: &str) -> TvmResult<Arc<Cell>> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|e| format_err(format!("failed to decode base64: {}", e)))?;
    deserialize_boc(&bytes)
}
