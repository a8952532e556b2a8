//! Bounded rewrite buffer
//!
//! Key-file rewrites stream their output into a [`SwapBuffer`]. The first
//! `limit` bytes stay in memory; past that the buffer moves to an anonymous
//! temporary file, so a rewrite never holds more than `limit` bytes.

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom, Write};

pub(crate) struct SwapBuffer {
    limit: usize,
    memory: Vec<u8>,
    disk: Option<File>,
}

impl SwapBuffer {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            limit,
            memory: Vec::new(),
            disk: None,
        }
    }

    /// Write `line` followed by a newline
    pub(crate) fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        self.write_all(line)?;
        self.write_all(b"\n")
    }

    pub(crate) fn is_spilled(&self) -> bool {
        self.disk.is_some()
    }

    /// Reader over everything written so far
    pub(crate) fn into_reader(self) -> io::Result<SwapReader> {
        match self.disk {
            Some(mut file) => {
                file.flush()?;
                file.seek(SeekFrom::Start(0))?;
                Ok(SwapReader::Disk(BufReader::new(file)))
            }
            None => Ok(SwapReader::Memory(Cursor::new(self.memory))),
        }
    }

    fn spill(&mut self) -> io::Result<()> {
        let mut file = tempfile::tempfile()?;
        file.write_all(&self.memory)?;
        self.memory = Vec::new();
        self.disk = Some(file);
        Ok(())
    }
}

impl Write for SwapBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.disk.is_none() && self.memory.len() + buf.len() > self.limit {
            self.spill()?;
        }
        match &mut self.disk {
            Some(file) => file.write(buf),
            None => {
                self.memory.extend_from_slice(buf);
                Ok(buf.len())
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.disk {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

pub(crate) enum SwapReader {
    Memory(Cursor<Vec<u8>>),
    Disk(BufReader<File>),
}

impl Read for SwapReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            SwapReader::Memory(cursor) => cursor.read(buf),
            SwapReader::Disk(reader) => reader.read(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(buffer: SwapBuffer) -> Vec<u8> {
        let mut out = Vec::new();
        buffer.into_reader().unwrap().read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_stays_in_memory_under_limit() {
        let mut buffer = SwapBuffer::new(16);
        buffer.write_line(b"a=[1]").unwrap();
        buffer.write_line(b"b=[2]").unwrap();
        assert!(!buffer.is_spilled());
        assert_eq!(drain(buffer), b"a=[1]\nb=[2]\n");
    }

    #[test]
    fn test_spills_past_limit_without_losing_bytes() {
        let mut buffer = SwapBuffer::new(8);
        buffer.write_line(b"abc").unwrap();
        assert!(!buffer.is_spilled());
        buffer.write_line(b"defghij").unwrap();
        assert!(buffer.is_spilled());
        buffer.write_line(b"k").unwrap();
        assert_eq!(drain(buffer), b"abc\ndefghij\nk\n");
    }

    #[test]
    fn test_exact_limit_stays_in_memory() {
        let mut buffer = SwapBuffer::new(4);
        buffer.write_all(b"abcd").unwrap();
        assert!(!buffer.is_spilled());
        buffer.write_all(b"e").unwrap();
        assert!(buffer.is_spilled());
    }

    #[test]
    fn test_empty_buffer() {
        assert!(drain(SwapBuffer::new(1)).is_empty());
    }
}
