use std::time::SystemTime;

/// One captured link-layer frame, borrowed from the capture collaborator.
///
/// The dissector only ever reads through this view; every payload slice it
/// hands back points into `data`.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    data: &'a [u8],
    timestamp: SystemTime,
}

impl<'a> Frame<'a> {
    pub fn new(data: &'a [u8], timestamp: SystemTime) -> Self {
        Self { data, timestamp }
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Byte offset of `view` inside this frame, if it is a sub-slice of it.
    pub fn offset_of(&self, view: &[u8]) -> Option<usize> {
        let base = self.data.as_ptr() as usize;
        let start = view.as_ptr() as usize;
        let end = start.checked_add(view.len())?;
        if start < base || end > base + self.data.len() {
            return None;
        }
        Some(start - base)
    }
}
