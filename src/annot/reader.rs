use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use csv::{Reader, ReaderBuilder, StringRecordsIter};

use crate::annot::columns::ColumnMap;

const DECODE_BUF_LEN: usize = 8 * 1024;

/// Streaming Latin-1 to UTF-8 transcoder. Every byte value maps to a scalar,
/// so annotation exports open regardless of their actual encoding; bytes that
/// were really UTF-8 come through as the same mojibake the upstream tooling
/// produces.
pub struct Latin1Text<R> {
    inner: R,
    buf: [u8; DECODE_BUF_LEN],
    pos: usize,
    len: usize,
    carry: Option<u8>,
}

impl<R: Read> Latin1Text<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: [0; DECODE_BUF_LEN],
            pos: 0,
            len: 0,
            carry: None,
        }
    }
}

impl<R: Read> Read for Latin1Text<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        let mut written = 0;
        if let Some(byte) = self.carry.take() {
            out[written] = byte;
            written += 1;
        }
        while written < out.len() {
            if self.pos == self.len {
                if written > 0 {
                    break;
                }
                self.len = self.inner.read(&mut self.buf)?;
                self.pos = 0;
                if self.len == 0 {
                    break;
                }
            }
            let byte = self.buf[self.pos];
            self.pos += 1;
            if byte < 0x80 {
                out[written] = byte;
                written += 1;
            } else {
                out[written] = 0xC0 | (byte >> 6);
                written += 1;
                let low = 0x80 | (byte & 0x3F);
                if written < out.len() {
                    out[written] = low;
                    written += 1;
                } else {
                    // no room for the second UTF-8 byte; hand it out next call
                    self.carry = Some(low);
                }
            }
        }
        Ok(written)
    }
}

/// Tab-separated annotation table: one header row, then data rows. Records
/// are streamed one at a time; short rows are tolerated and surface as
/// absent cells.
pub struct TableReader {
    inner: Reader<Latin1Text<File>>,
}

impl TableReader {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let inner = ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_reader(Latin1Text::new(file));
        Ok(Self { inner })
    }

    pub fn columns(&mut self) -> csv::Result<ColumnMap> {
        Ok(ColumnMap::from_header(self.inner.headers()?))
    }

    pub fn records(&mut self) -> StringRecordsIter<'_, Latin1Text<File>> {
        self.inner.records()
    }
}
