//! # Scan Sources
//!
//! Handheld barcode scanners in "keyboard wedge" mode type the code and
//! press Enter, so a scan is one line of input. A source yields trimmed,
//! non-empty codes; `None` means the user is done scanning.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

/// Produces scanned codes.
#[async_trait]
pub trait ScanSource: Send {
    /// Next code, or `None` when scanning ended.
    async fn next_code(&mut self) -> std::io::Result<Option<String>>;
}

/// Reads one code per line, skipping blank lines.
pub struct LineScanner<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin + Send> LineScanner<R> {
    pub fn new(reader: R) -> Self {
        LineScanner {
            lines: reader.lines(),
        }
    }
}

impl LineScanner<BufReader<Stdin>> {
    /// Scanner on standard input.
    pub fn stdin() -> Self {
        LineScanner::new(BufReader::new(tokio::io::stdin()))
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> ScanSource for LineScanner<R> {
    async fn next_code(&mut self) -> std::io::Result<Option<String>> {
        while let Some(line) = self.lines.next_line().await? {
            let code = line.trim();
            if !code.is_empty() {
                return Ok(Some(code.to_string()));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_yields_trimmed_codes_until_eof() {
        let input: &[u8] = b"  SN-AX-202401\r\n\n   \nSN-AX-202402\n";
        let mut scanner = LineScanner::new(input);

        assert_eq!(scanner.next_code().await.unwrap().as_deref(), Some("SN-AX-202401"));
        assert_eq!(scanner.next_code().await.unwrap().as_deref(), Some("SN-AX-202402"));
        assert_eq!(scanner.next_code().await.unwrap(), None);
        assert_eq!(scanner.next_code().await.unwrap(), None);
    }
}
