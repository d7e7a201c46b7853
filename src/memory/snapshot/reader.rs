//! Streaming snapshot decoder

use super::format::{decode_address_control, decode_length_control, AddressControl, LengthControl, MAGIC};
use super::SnapshotRun;
use crate::core::types::{Address, SnapshotFormatError};
use std::io::{self, Read};

/// Iterates the runs of a snapshot stream.
///
/// Yields `Err` once on a malformed record and then stops. A stream that
/// ends exactly between records is complete.
pub struct SnapshotReader<R: Read> {
    inner: R,
    prev_end: u64,
    offset: u64,
    record_start: u64,
    failed: bool,
}

impl<R: Read> SnapshotReader<R> {
    /// Checks the magic bytes
    pub fn new(mut inner: R) -> Result<Self, SnapshotFormatError> {
        let mut magic = [0u8; 4];
        match inner.read_exact(&mut magic) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Err(SnapshotFormatError::BadMagic),
            Err(e) => return Err(e.into()),
        }
        if magic != MAGIC {
            return Err(SnapshotFormatError::BadMagic);
        }
        Ok(SnapshotReader {
            inner,
            prev_end: 0,
            offset: MAGIC.len() as u64,
            record_start: MAGIC.len() as u64,
            failed: false,
        })
    }

    /// Stream offset of the record being (or last) decoded
    pub fn record_offset(&self) -> u64 {
        self.record_start
    }

    // None at a clean end of stream.
    fn read_byte(&mut self) -> Result<Option<u8>, SnapshotFormatError> {
        let mut b = [0u8; 1];
        loop {
            match self.inner.read(&mut b) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.offset += 1;
                    return Ok(Some(b[0]));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], SnapshotFormatError> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf).map_err(truncated)?;
        self.offset += N as u64;
        Ok(buf)
    }

    fn read_record(&mut self) -> Result<Option<SnapshotRun>, SnapshotFormatError> {
        self.record_start = self.offset;
        let Some(control) = self.read_byte()? else {
            return Ok(None);
        };

        let address = match decode_address_control(control)? {
            AddressControl::Short(delta) => self.prev_end.wrapping_add(delta),
            AddressControl::Medium(low) => {
                let high = self.read_byte()?.ok_or(SnapshotFormatError::Truncated)?;
                self.prev_end.wrapping_add(u64::from(low) | u64::from(high) << 5)
            }
            AddressControl::Absolute => u64::from_le_bytes(self.read_array()?),
        };

        let control = self.read_byte()?.ok_or(SnapshotFormatError::Truncated)?;
        let len = match decode_length_control(control)? {
            LengthControl::Short(len) => len,
            LengthControl::U16 => u64::from(u16::from_le_bytes(self.read_array()?)),
            LengthControl::U64 => u64::from_le_bytes(self.read_array()?),
        };

        // grows with the data actually present, so a bogus length can't
        // force a huge allocation up front
        let mut bytes = Vec::new();
        let got = (&mut self.inner).take(len).read_to_end(&mut bytes)?;
        self.offset += got as u64;
        if (got as u64) < len {
            return Err(SnapshotFormatError::Truncated);
        }

        self.prev_end = address.wrapping_add(len);
        Ok(Some(SnapshotRun {
            address: Address::new(address),
            bytes,
        }))
    }
}

fn truncated(e: io::Error) -> SnapshotFormatError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        SnapshotFormatError::Truncated
    } else {
        SnapshotFormatError::Io(e)
    }
}

impl<R: Read> Iterator for SnapshotReader<R> {
    type Item = Result<SnapshotRun, SnapshotFormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.read_record() {
            Ok(run) => run.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
