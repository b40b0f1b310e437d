//! Asynchronous JSONL tail feed with file rotation detection

use super::{FeedAdapter, FeedError};
use async_trait::async_trait;
use std::io::{ErrorKind, SeekFrom};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio::time::sleep;

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

pub struct TailFeed {
    path: PathBuf,
    name: String,
    file: Option<BufReader<File>>,
    inode: Option<u64>,
    /// Bytes of complete lines already taken from the current file
    consumed: u64,
    /// Bytes of the line being assembled. `read_until` appends here and
    /// keeps what it read if the future is dropped mid-line.
    pending: Vec<u8>,
    from_start: bool,
    poll_interval: Duration,
}

impl TailFeed {
    /// Follow `path`, yielding only lines appended after the first read
    pub fn new(path: PathBuf) -> Self {
        let name = format!("tail:{}", path.display());
        Self {
            path,
            name,
            file: None,
            inode: None,
            consumed: 0,
            pending: Vec::new(),
            from_start: false,
            poll_interval: Duration::from_millis(100),
        }
    }

    /// Replay the existing content first, then keep following
    pub fn from_start(path: PathBuf) -> Self {
        Self {
            from_start: true,
            ..Self::new(path)
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Open the file. The first open honours `from_start`; reopening after
    /// rotation always starts at the beginning of the new file.
    pub async fn start(&mut self) -> std::io::Result<()> {
        let rotated = self.file.is_some();
        let file = File::open(&self.path).await?;
        let metadata = file.metadata().await?;

        #[cfg(unix)]
        {
            self.inode = Some(metadata.ino());
        }

        let mut reader = BufReader::new(file);
        self.consumed = if self.from_start || rotated {
            0
        } else {
            reader.seek(SeekFrom::End(0)).await?;
            metadata.len()
        };
        self.pending.clear();
        self.file = Some(reader);

        log::info!("📖 Started tailing: {}", self.path.display());
        Ok(())
    }

    /// `start`, waiting for the path to (re)appear
    async fn open(&mut self) -> std::io::Result<()> {
        loop {
            match self.start().await {
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    log::debug!("Waiting for {} to appear", self.path.display());
                    sleep(self.poll_interval).await;
                }
                result => return result,
            }
        }
    }

    /// Read the next complete line, waiting if necessary
    pub async fn read_line(&mut self) -> std::io::Result<Option<String>> {
        if self.file.is_none() {
            self.open().await?;
        }

        loop {
            let reader = match self.file.as_mut() {
                Some(reader) => reader,
                None => return Err(std::io::Error::new(ErrorKind::NotFound, "File not opened")),
            };

            let read = reader.read_until(b'\n', &mut self.pending).await?;

            if self.pending.ends_with(b"\n") {
                self.consumed += self.pending.len() as u64;
                let line = String::from_utf8_lossy(&self.pending).trim().to_string();
                self.pending.clear();
                if !line.is_empty() {
                    return Ok(Some(line));
                }
                continue;
            }

            if read > 0 {
                // Partially written line; the next read sees EOF or the rest
                continue;
            }

            // At EOF of the current handle: only now look for a new file,
            // so lines written before a rename are not lost
            if self.detect_rotation().await? {
                log::info!("🔄 File rotation detected, reopening: {}", self.path.display());
                self.open().await?;
                continue;
            }

            sleep(self.poll_interval).await;
        }
    }

    /// Inode change on unix, shrinking file everywhere. A missing path is
    /// the gap between rename and re-create, not yet a rotation.
    async fn detect_rotation(&self) -> std::io::Result<bool> {
        if self.file.is_none() {
            return Ok(false);
        }

        let metadata = match tokio::fs::metadata(&self.path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };

        #[cfg(unix)]
        {
            if self.inode.is_some_and(|old| old != metadata.ino()) {
                return Ok(true);
            }
        }

        Ok(metadata.len() < self.consumed + self.pending.len() as u64)
    }
}

#[async_trait]
impl FeedAdapter for TailFeed {
    async fn next_message(&mut self) -> Result<Option<String>, FeedError> {
        Ok(self.read_line().await?)
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}
