use super::{FeedAdapter, FeedError};
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

/// One message per non-blank line of any buffered async reader
pub struct LineFeed<R> {
    lines: Lines<R>,
    name: String,
}

impl<R: AsyncBufRead + Unpin + Send> LineFeed<R> {
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        Self {
            lines: reader.lines(),
            name: name.into(),
        }
    }
}

impl LineFeed<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), "stdin")
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> FeedAdapter for LineFeed<R> {
    async fn next_message(&mut self) -> Result<Option<String>, FeedError> {
        while let Some(line) = self.lines.next_line().await? {
            let line = line.trim();
            if !line.is_empty() {
                return Ok(Some(line.to_string()));
            }
        }
        Ok(None)
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lines_skip_blanks() {
        let input: &[u8] = b"{\"a\":1}\n\n   \n{\"b\":2}\n";
        let mut feed = LineFeed::new(input, "test");

        assert_eq!(feed.next_message().await.unwrap().as_deref(), Some("{\"a\":1}"));
        assert_eq!(feed.next_message().await.unwrap().as_deref(), Some("{\"b\":2}"));
        assert_eq!(feed.next_message().await.unwrap(), None);
        assert_eq!(feed.source_name(), "test");
    }
}
