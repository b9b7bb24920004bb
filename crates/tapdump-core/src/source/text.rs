use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{LineSource, SourceError, decode_line};

/// Lines of dump text that was produced earlier (a saved file, stdin, ...).
pub struct TextLineSource<R> {
    reader: R,
    buf: Vec<u8>,
}

impl TextLineSource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> TextLineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> LineSource for TextLineSource<R> {
    fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        self.buf.clear();
        let read = self.reader.read_until(b'\n', &mut self.buf)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(decode_line(&self.buf)))
    }
}
