//! Plain-file byte source, over `std::fs`/`std::io` (no crate needed here).

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::EngineError;

use super::ByteSource;

pub struct FileSource {
    file: File,
    path: PathBuf,
    len: u64,
    position: u64,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>) -> std::result::Result<Self, EngineError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| EngineError::FileOpen { path: path.clone(), source })?;
        let len = file.metadata().map_err(EngineError::Io)?.len();
        Ok(Self { file, path, len, position: 0 })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn seek(&mut self, offset: u64) {
        // Constructing a scan clamps `start_offset < len`, so a failed seek
        // here would indicate a source that shrank underneath us; surface it
        // as an empty read rather than panicking.
        if self.file.seek(SeekFrom::Start(offset)).is_ok() {
            self.position = offset;
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> std::result::Result<usize, EngineError> {
        let n = self.file.read(buf).map_err(EngineError::Io)?;
        self.position += n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_full_file_and_tracks_position() {
        let mut tmp = std::env::temp_dir();
        tmp.push(format!("strex-test-{}.bin", std::process::id()));
        std::fs::write(&tmp, b"hello world").unwrap();

        let mut src = FileSource::open(&tmp).unwrap();
        assert_eq!(src.len(), 11);
        let mut buf = [0u8; 5];
        let n = src.read(&mut buf).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buf, b"hello");
        assert_eq!(src.position(), 5);

        let _ = std::fs::remove_file(&tmp);
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let result = FileSource::open("/nonexistent/path/for/strex/tests");
        assert!(matches!(result, Err(EngineError::FileOpen { .. })));
    }
}
