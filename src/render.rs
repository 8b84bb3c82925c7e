//! Human-readable output sink.
//!
//! Output looks like:
//!
//! ```text
//! - Interface: eth0
//! - Snapshot Length: 65535
//! - Promiscuous Mode: true
//! - Timeout: 5s
//! - Number of Packets: 0
//! - BPF Filter: "ip proto tcp"
//!
//! - Packet: 1 Timestamp: 2023-11-14T22:13:20+0000
//! ==================================================================
//! Ethernet Frame:
//! ...
//! ```

use std::io;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::engine::{Dissection, Dissector};
use crate::error::Error;
use crate::packet::Frame;

const SEPARATOR: &str = "==================================================================";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Capture parameters owned by whoever opened the capture. They are only
/// echoed back in the header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSummary {
    pub interface: String,
    pub snapshot_len: u32,
    pub promiscuous: bool,
    pub timeout: Duration,
    pub packet_count: u64,
    pub filter: String,
}

impl CaptureSummary {
    /// The pseudo interface `any` cannot be put in promiscuous mode.
    pub fn effective_promiscuous(&self) -> bool {
        self.promiscuous && self.interface != "any"
    }
}

impl Default for CaptureSummary {
    fn default() -> Self {
        Self {
            interface: "any".to_owned(),
            snapshot_len: 65535,
            promiscuous: false,
            timeout: Duration::ZERO,
            packet_count: 0,
            filter: String::new(),
        }
    }
}

/// Writes one text block per frame to `W`, numbering frames from 1.
pub struct FrameWriter<W> {
    out: W,
    dissector: Dissector,
    packets: u64,
}

impl<W: io::Write> FrameWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            dissector: Dissector::new(),
            packets: 0,
        }
    }

    pub fn write_header(&mut self, summary: &CaptureSummary) -> io::Result<()> {
        writeln!(self.out, "- Interface: {}", summary.interface)?;
        writeln!(self.out, "- Snapshot Length: {}", summary.snapshot_len)?;
        writeln!(self.out, "- Promiscuous Mode: {}", summary.effective_promiscuous())?;
        writeln!(self.out, "- Timeout: {:?}", summary.timeout)?;
        writeln!(self.out, "- Number of Packets: {}", summary.packet_count)?;
        writeln!(self.out, "- BPF Filter: {:?}", summary.filter)?;
        writeln!(self.out)
    }

    /// Decodes and renders one frame.
    ///
    /// On a decode failure the layers that did decode are still written,
    /// followed by the error line, and the error is returned so the caller
    /// can report it and move on to the next frame.
    pub fn write_frame(&mut self, frame: &Frame<'_>) -> Result<(), Error> {
        self.packets += 1;
        self.write_preamble(frame.timestamp())?;

        match self.dissector.decode_frame(frame) {
            Ok(dissection) => {
                self.write_records(&dissection)?;
                Ok(())
            }
            Err(failure) => {
                debug!(packet = self.packets, error = %failure.error, "frame rendered partially");
                let (error, partial) = failure.into_parts();
                self.write_records(&partial)?;
                writeln!(self.out, "- Decode error: {error}")?;
                writeln!(self.out)?;
                Err(Error::Decode(error))
            }
        }
    }

    /// Convenience over [`FrameWriter::write_frame`] for raw bytes.
    pub fn write_packet(&mut self, timestamp: SystemTime, data: &[u8]) -> Result<(), Error> {
        self.write_frame(&Frame::new(data, timestamp))
    }

    pub fn write_footer(&mut self) -> io::Result<()> {
        writeln!(self.out, "- Packets Captured: {}", self.packets)?;
        self.out.flush()
    }

    /// Frames written so far, including ones that failed to decode.
    pub fn packets(&self) -> u64 {
        self.packets
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_preamble(&mut self, timestamp: SystemTime) -> io::Result<()> {
        let timestamp = DateTime::<Utc>::from(timestamp).format(TIMESTAMP_FORMAT);
        writeln!(self.out, "- Packet: {} Timestamp: {}", self.packets, timestamp)?;
        writeln!(self.out, "{SEPARATOR}")
    }

    fn write_records(&mut self, dissection: &Dissection<'_>) -> io::Result<()> {
        for record in dissection.records() {
            writeln!(self.out, "{record}")?;
        }
        Ok(())
    }
}
