/*
[INPUT]:  Bag-of-cells bytes (base64 or raw) or bits/refs assembled by a builder
[OUTPUT]: Immutable cell trees with representation hashes, slices, serialized BoC
[POS]:    TON layer - cell model used for state-init parsing and address derivation
[UPDATE]: When supporting exotic cells or additional BoC header variants
*/

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use sha2::{Digest, Sha256};

use crate::error::CellError;

pub const MAX_CELL_BITS: usize = 1023;
pub const MAX_CELL_REFS: usize = 4;
/// Deepest reference chain the TVM accepts
pub const MAX_CELL_DEPTH: u16 = 1024;

const BOC_GENERIC_MAGIC: u32 = 0xb5ee_9c72;

/// Ordinary TON cell with a precomputed representation hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Arc<Cell>>,
    hash: [u8; 32],
    depth: u16,
}

impl Cell {
    /// Build a cell from left-aligned data bits and child references
    pub fn new(mut data: Vec<u8>, bit_len: usize, refs: Vec<Arc<Cell>>) -> Result<Self, CellError> {
        if bit_len > MAX_CELL_BITS {
            return Err(CellError::Overflow("more than 1023 data bits"));
        }
        if refs.len() > MAX_CELL_REFS {
            return Err(CellError::Overflow("more than 4 references"));
        }
        if data.len() != bit_len.div_ceil(8) {
            return Err(CellError::InvalidBoc(format!(
                "{} data bytes cannot hold exactly {bit_len} bits",
                data.len()
            )));
        }
        if bit_len % 8 != 0 {
            if let Some(last) = data.last_mut() {
                *last &= 0xffu8 << (8 - bit_len % 8);
            }
        }

        let depth = refs
            .iter()
            .map(|child| child.depth + 1)
            .max()
            .unwrap_or(0);
        if depth > MAX_CELL_DEPTH {
            return Err(CellError::Overflow("cell depth exceeds 1024"));
        }

        let mut cell = Self {
            data,
            bit_len,
            refs,
            hash: [0u8; 32],
            depth,
        };
        cell.hash = cell.compute_hash();
        Ok(cell)
    }

    /// Decode the single root of a base64 bag of cells
    pub fn from_boc_base64(encoded: &str) -> Result<Arc<Cell>, CellError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CellError::Base64(e.to_string()))?;
        Self::from_boc(&bytes)
    }

    /// Decode the first root of a bag of cells
    pub fn from_boc(bytes: &[u8]) -> Result<Arc<Cell>, CellError> {
        let mut roots = deserialize_boc(bytes)?;
        if roots.is_empty() {
            return Err(CellError::InvalidBoc("no root cells".to_string()));
        }
        Ok(roots.swap_remove(0))
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn refs(&self) -> &[Arc<Cell>] {
        &self.refs
    }

    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// Representation hash (sha256 over descriptors, data, child depths and hashes)
    pub fn hash(&self) -> [u8; 32] {
        self.hash
    }

    pub fn parse(&self) -> CellSlice<'_> {
        CellSlice::new(self)
    }

    /// Serialize this cell tree as a single-root BoC with a crc32c trailer
    pub fn to_boc(&self) -> Vec<u8> {
        let mut order: Vec<(&Cell, Vec<usize>)> = Vec::new();
        collect_cells(self, &mut order);

        let size_bytes = bytes_for(order.len());
        let mut cells_data = Vec::new();
        for (cell, ref_indices) in &order {
            cells_data.push(cell.d1());
            cells_data.push(cell.d2());
            cells_data.extend_from_slice(&cell.padded_data());
            for index in ref_indices {
                write_be(&mut cells_data, *index, size_bytes);
            }
        }
        let off_bytes = bytes_for(cells_data.len());

        let mut out = Vec::with_capacity(cells_data.len() + 32);
        out.extend_from_slice(&BOC_GENERIC_MAGIC.to_be_bytes());
        out.push(0x40 | size_bytes as u8);
        out.push(off_bytes as u8);
        write_be(&mut out, order.len(), size_bytes);
        write_be(&mut out, 1, size_bytes);
        write_be(&mut out, 0, size_bytes);
        write_be(&mut out, cells_data.len(), off_bytes);
        write_be(&mut out, 0, size_bytes);
        out.extend_from_slice(&cells_data);
        let crc = crc32c(&out);
        out.extend_from_slice(&crc.to_le_bytes());
        out
    }

    pub fn to_boc_base64(&self) -> String {
        STANDARD.encode(self.to_boc())
    }

    fn d1(&self) -> u8 {
        self.refs.len() as u8
    }

    fn d2(&self) -> u8 {
        (self.bit_len / 8 + self.bit_len.div_ceil(8)) as u8
    }

    /// Data bytes with the completion tag appended for partial bytes
    fn padded_data(&self) -> Vec<u8> {
        let mut bytes = self.data.clone();
        let rem = self.bit_len % 8;
        if rem != 0 {
            if let Some(last) = bytes.last_mut() {
                *last |= 1 << (7 - rem);
            }
        }
        bytes
    }

    fn compute_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update([self.d1(), self.d2()]);
        hasher.update(self.padded_data());
        for child in &self.refs {
            hasher.update(child.depth.to_be_bytes());
        }
        for child in &self.refs {
            hasher.update(child.hash);
        }
        hasher.finalize().into()
    }
}

fn collect_cells<'a>(cell: &'a Cell, order: &mut Vec<(&'a Cell, Vec<usize>)>) -> usize {
    let index = order.len();
    order.push((cell, Vec::with_capacity(cell.refs.len())));
    for child in &cell.refs {
        let child_index = collect_cells(child, order);
        order[index].1.push(child_index);
    }
    index
}

fn bytes_for(value: usize) -> usize {
    let mut bytes = 1;
    while bytes < 8 && value >> (bytes * 8) != 0 {
        bytes += 1;
    }
    bytes
}

fn write_be(out: &mut Vec<u8>, value: usize, width: usize) {
    let bytes = (value as u64).to_be_bytes();
    out.extend_from_slice(&bytes[8 - width..]);
}

struct RawCell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<usize>,
}

struct BocReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BocReader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], CellError> {
        let end = self.pos.checked_add(len).ok_or(CellError::Truncated)?;
        let slice = self.bytes.get(self.pos..end).ok_or(CellError::Truncated)?;
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, CellError> {
        Ok(self.take(1)?[0])
    }

    fn read_be(&mut self, width: usize) -> Result<usize, CellError> {
        let bytes = self.take(width)?;
        let mut value: u64 = 0;
        for byte in bytes {
            value = (value << 8) | u64::from(*byte);
        }
        usize::try_from(value).map_err(|_| CellError::InvalidBoc("size overflow".to_string()))
    }
}

fn deserialize_boc(bytes: &[u8]) -> Result<Vec<Arc<Cell>>, CellError> {
    let mut reader = BocReader { bytes, pos: 0 };

    let magic = u32::from_be_bytes(
        reader
            .take(4)?
            .try_into()
            .map_err(|_| CellError::Truncated)?,
    );
    if magic != BOC_GENERIC_MAGIC {
        return Err(CellError::BadMagic(magic));
    }

    let flags = reader.read_u8()?;
    let has_idx = flags & 0x80 != 0;
    let has_crc32c = flags & 0x40 != 0;
    let size_bytes = usize::from(flags & 0x07);
    if size_bytes == 0 || size_bytes > 4 {
        return Err(CellError::InvalidBoc(format!("ref size {size_bytes}")));
    }
    let off_bytes = usize::from(reader.read_u8()?);
    if off_bytes == 0 || off_bytes > 8 {
        return Err(CellError::InvalidBoc(format!("offset size {off_bytes}")));
    }

    let cell_count = reader.read_be(size_bytes)?;
    let root_count = reader.read_be(size_bytes)?;
    let absent_count = reader.read_be(size_bytes)?;
    let total_size = reader.read_be(off_bytes)?;
    if root_count == 0 || root_count > cell_count {
        return Err(CellError::InvalidBoc("bad root count".to_string()));
    }
    if absent_count != 0 {
        return Err(CellError::Unsupported("absent cells"));
    }

    let mut root_indices = Vec::with_capacity(root_count);
    for _ in 0..root_count {
        let index = reader.read_be(size_bytes)?;
        if index >= cell_count {
            return Err(CellError::InvalidBoc("root index out of range".to_string()));
        }
        root_indices.push(index);
    }
    if has_idx {
        reader.take(cell_count.checked_mul(off_bytes).ok_or(CellError::Truncated)?)?;
    }

    let cells_start = reader.pos;
    let mut raw_cells = Vec::with_capacity(cell_count.min(1 << 16));
    for index in 0..cell_count {
        let raw = read_raw_cell(&mut reader, size_bytes)?;
        if raw.refs.iter().any(|child| *child <= index || *child >= cell_count) {
            return Err(CellError::InvalidBoc(
                "cell references must point forward".to_string(),
            ));
        }
        raw_cells.push(raw);
    }
    if reader.pos - cells_start != total_size {
        return Err(CellError::InvalidBoc("cell data size mismatch".to_string()));
    }

    if has_crc32c {
        let body_end = reader.pos;
        let stored = u32::from_le_bytes(
            reader
                .take(4)?
                .try_into()
                .map_err(|_| CellError::Truncated)?,
        );
        if crc32c(&bytes[..body_end]) != stored {
            return Err(CellError::ChecksumMismatch);
        }
    }

    let mut built: Vec<Option<Arc<Cell>>> = vec![None; cell_count];
    for index in (0..cell_count).rev() {
        let raw = &raw_cells[index];
        let mut refs = Vec::with_capacity(raw.refs.len());
        for child in &raw.refs {
            let cell = built[*child]
                .clone()
                .ok_or_else(|| CellError::InvalidBoc("dangling reference".to_string()))?;
            refs.push(cell);
        }
        built[index] = Some(Arc::new(Cell::new(raw.data.clone(), raw.bit_len, refs)?));
    }

    root_indices
        .into_iter()
        .map(|index| {
            built[index]
                .clone()
                .ok_or_else(|| CellError::InvalidBoc("missing root".to_string()))
        })
        .collect()
}

fn read_raw_cell(reader: &mut BocReader<'_>, size_bytes: usize) -> Result<RawCell, CellError> {
    let d1 = reader.read_u8()?;
    let d2 = reader.read_u8()?;

    if d1 & 0x08 != 0 {
        return Err(CellError::Unsupported("exotic cells"));
    }
    if d1 & 0x10 != 0 {
        return Err(CellError::Unsupported("cells with stored hashes"));
    }
    if d1 >> 5 != 0 {
        return Err(CellError::Unsupported("non-zero cell level"));
    }
    let ref_count = usize::from(d1 & 0x07);
    if ref_count > MAX_CELL_REFS {
        return Err(CellError::InvalidBoc(format!("{ref_count} references")));
    }

    let data_len = usize::from(d2).div_ceil(2);
    let mut data = reader.take(data_len)?.to_vec();
    let bit_len = if d2 % 2 == 0 {
        data_len * 8
    } else {
        let last = data
            .last_mut()
            .ok_or_else(|| CellError::InvalidBoc("missing completion tag".to_string()))?;
        if *last == 0 {
            return Err(CellError::InvalidBoc("missing completion tag".to_string()));
        }
        let tag_pos = last.trailing_zeros() as usize;
        *last &= !(1u8 << tag_pos);
        data_len * 8 - tag_pos - 1
    };

    let mut refs = Vec::with_capacity(ref_count);
    for _ in 0..ref_count {
        refs.push(reader.read_be(size_bytes)?);
    }

    Ok(RawCell {
        data,
        bit_len,
        refs,
    })
}

/// CRC-32C (Castagnoli), the checksum BoC trailers use
fn crc32c(bytes: &[u8]) -> u32 {
    let mut crc = !0u32;
    for byte in bytes {
        crc ^= u32::from(*byte);
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0x82f6_3b78 & mask);
        }
    }
    !crc
}

/// BoC whose root (`root_data` under descriptor `root_d2`) heads a chain of `len` empty cells
#[cfg(test)]
pub(crate) fn chain_boc(root_data: &[u8], root_d2: u8, len: usize) -> Vec<u8> {
    let cells = len + 1;
    let mut body = Vec::new();
    for index in 0..cells {
        let last = index + 1 == cells;
        body.push(u8::from(!last));
        if index == 0 {
            body.push(root_d2);
            body.extend_from_slice(root_data);
        } else {
            body.push(0);
        }
        if !last {
            write_be(&mut body, index + 1, 4);
        }
    }

    let mut out = Vec::with_capacity(body.len() + 32);
    out.extend_from_slice(&BOC_GENERIC_MAGIC.to_be_bytes());
    out.push(0x40 | 4);
    out.push(4);
    write_be(&mut out, cells, 4);
    write_be(&mut out, 1, 4);
    write_be(&mut out, 0, 4);
    write_be(&mut out, body.len(), 4);
    write_be(&mut out, 0, 4);
    out.extend_from_slice(&body);
    let crc = crc32c(&out);
    out.extend_from_slice(&crc.to_le_bytes());
    out
}

/// Incremental cell constructor
#[derive(Debug, Clone, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Arc<Cell>>,
}

impl CellBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self, CellError> {
        if self.bit_len >= MAX_CELL_BITS {
            return Err(CellError::Overflow("builder bits exhausted"));
        }
        if self.bit_len % 8 == 0 {
            self.data.push(0);
        }
        if bit {
            let index = self.bit_len / 8;
            self.data[index] |= 1 << (7 - self.bit_len % 8);
        }
        self.bit_len += 1;
        Ok(self)
    }

    /// Store the low `bits` bits of `value`, most significant first
    pub fn store_uint(&mut self, value: u64, bits: usize) -> Result<&mut Self, CellError> {
        if bits > 64 {
            return Err(CellError::Overflow("uint wider than 64 bits"));
        }
        if bits < 64 && value >> bits != 0 {
            return Err(CellError::Overflow("value does not fit in width"));
        }
        for shift in (0..bits).rev() {
            self.store_bit((value >> shift) & 1 == 1)?;
        }
        Ok(self)
    }

    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self, CellError> {
        for byte in bytes {
            self.store_uint(u64::from(*byte), 8)?;
        }
        Ok(self)
    }

    pub fn store_ref(&mut self, cell: Arc<Cell>) -> Result<&mut Self, CellError> {
        if self.refs.len() >= MAX_CELL_REFS {
            return Err(CellError::Overflow("builder refs exhausted"));
        }
        self.refs.push(cell);
        Ok(self)
    }

    /// Store `Maybe ^Cell`
    pub fn store_maybe_ref(&mut self, cell: Option<Arc<Cell>>) -> Result<&mut Self, CellError> {
        match cell {
            Some(cell) => {
                self.store_bit(true)?;
                self.store_ref(cell)
            }
            None => self.store_bit(false),
        }
    }

    pub fn build(&self) -> Result<Cell, CellError> {
        Cell::new(self.data.clone(), self.bit_len, self.refs.clone())
    }
}

/// Read cursor over a cell's bits and references
#[derive(Debug, Clone)]
pub struct CellSlice<'a> {
    cell: &'a Cell,
    bit_pos: usize,
    ref_pos: usize,
}

impl<'a> CellSlice<'a> {
    pub fn new(cell: &'a Cell) -> Self {
        Self {
            cell,
            bit_pos: 0,
            ref_pos: 0,
        }
    }

    pub fn remaining_bits(&self) -> usize {
        self.cell.bit_len - self.bit_pos
    }

    pub fn remaining_refs(&self) -> usize {
        self.cell.refs.len() - self.ref_pos
    }

    pub fn load_bit(&mut self) -> Result<bool, CellError> {
        if self.bit_pos >= self.cell.bit_len {
            return Err(CellError::Underflow("no bits left"));
        }
        let byte = self.cell.data[self.bit_pos / 8];
        let bit = (byte >> (7 - self.bit_pos % 8)) & 1 == 1;
        self.bit_pos += 1;
        Ok(bit)
    }

    pub fn load_uint(&mut self, bits: usize) -> Result<u64, CellError> {
        if bits > 64 {
            return Err(CellError::Overflow("uint wider than 64 bits"));
        }
        if bits > self.remaining_bits() {
            return Err(CellError::Underflow("not enough bits for uint"));
        }
        let mut value = 0u64;
        for _ in 0..bits {
            value = (value << 1) | u64::from(self.load_bit()?);
        }
        Ok(value)
    }

    pub fn load_bytes<const N: usize>(&mut self) -> Result<[u8; N], CellError> {
        if N * 8 > self.remaining_bits() {
            return Err(CellError::Underflow("not enough bits for bytes"));
        }
        let mut out = [0u8; N];
        for byte in out.iter_mut() {
            *byte = self.load_uint(8)? as u8;
        }
        Ok(out)
    }

    pub fn load_ref(&mut self) -> Result<&'a Arc<Cell>, CellError> {
        let cell = self
            .cell
            .refs
            .get(self.ref_pos)
            .ok_or(CellError::Underflow("no references left"))?;
        self.ref_pos += 1;
        Ok(cell)
    }

    /// Load `Maybe ^Cell`
    pub fn load_maybe_ref(&mut self) -> Result<Option<&'a Arc<Cell>>, CellError> {
        if self.load_bit()? {
            self.load_ref().map(Some)
        } else {
            Ok(None)
        }
    }
}
