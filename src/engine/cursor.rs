use crate::layer::LayerError;

/// Bounds-checked big-endian reader over a borrowed buffer.
///
/// Every read either returns the requested bytes or leaves the position
/// untouched and returns `None`, so a decoder can never index past the end.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn with_pos(data: &'a [u8], pos: usize) -> Option<Self> {
        if pos > data.len() {
            return None;
        }
        Some(Self { data, pos })
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn advance(&mut self, bytes: usize) -> bool {
        if bytes > self.remaining() {
            return false;
        }
        self.pos += bytes;
        true
    }

    pub fn read_u8(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    pub fn read_u16_be(&mut self) -> Option<u16> {
        let bytes = self.read_array::<2>()?;
        Some(u16::from_be_bytes(bytes))
    }

    pub fn read_u32_be(&mut self) -> Option<u32> {
        let bytes = self.read_array::<4>()?;
        Some(u32::from_be_bytes(bytes))
    }

    pub fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.read_exact(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Some(out)
    }

    pub fn read_exact(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let out = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(out)
    }

    /// Everything from the current position to the end, consuming it.
    pub fn rest(&mut self) -> &'a [u8] {
        let out = self.data.get(self.pos..).unwrap_or_default();
        self.pos = self.data.len();
        out
    }
}

/// Fails with `TruncatedHeader` unless `data` holds at least `needed` bytes.
pub fn require(protocol: &'static str, data: &[u8], needed: usize) -> Result<(), LayerError> {
    if data.len() < needed {
        return Err(LayerError::TruncatedHeader {
            protocol,
            needed,
            available: data.len(),
        });
    }
    Ok(())
}

/// Single-bit flag at `shift` (0 = least significant).
pub fn bit(value: u16, shift: u32) -> bool {
    (value >> shift) & 1 == 1
}

/// `width`-bit field whose least significant bit sits at `shift`.
pub fn bits(value: u32, shift: u32, width: u32) -> u32 {
    (value >> shift) & ((1u32 << width) - 1)
}
