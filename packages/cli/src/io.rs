//! JSON-lines input and output for item batches

use anyhow::{Context, Result};
use encoded_upgrade::{BatchReport, Item};
use serde::Serialize;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{self, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

/// `-` selects stdin/stdout
pub fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// A line that did not decode as an [`Item`]
#[derive(Debug, Clone, Serialize)]
pub struct ParseFailure {
    /// 1-based line number in the input
    pub line: usize,
    pub error: String,
}

/// One non-blank input line, in input order
#[derive(Debug)]
pub enum Entry {
    /// Decoded item; `raw` is the line as read, written back unless upgraded
    Item { index: usize, raw: Vec<u8> },
    /// Undecodable line, passed through verbatim
    Raw(Vec<u8>),
}

/// Decoded input, ready for a batch upgrade
#[derive(Debug, Default)]
pub struct Batch {
    pub entries: Vec<Entry>,
    pub items: Vec<Item>,
    pub parse_failures: Vec<ParseFailure>,
}

pub async fn read_batch(path: &Path) -> Result<Batch> {
    if is_stdio(path) {
        read_from(io::stdin()).await
    } else {
        let file = File::open(path)
            .await
            .with_context(|| format!("Failed to open input {}", path.display()))?;
        read_from(file).await
    }
}

/// Read JSON lines as raw bytes; a line that is not UTF-8 or not an item is
/// recorded as a parse failure instead of ending the read.
pub async fn read_from<R: AsyncRead + Unpin>(reader: R) -> Result<Batch> {
    let mut reader = BufReader::new(reader);
    let mut batch = Batch::default();
    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .context("Failed to read input")?;
        if read == 0 {
            break;
        }

        line_no += 1;
        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        if buf.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        match serde_json::from_slice::<Item>(&buf) {
            Ok(item) => {
                batch.entries.push(Entry::Item {
                    index: batch.items.len(),
                    raw: buf.clone(),
                });
                batch.items.push(item);
            }
            Err(err) => {
                tracing::warn!(line = line_no, error = %err, "Skipping undecodable line");
                batch.parse_failures.push(ParseFailure {
                    line: line_no,
                    error: err.to_string(),
                });
                batch.entries.push(Entry::Raw(buf.clone()));
            }
        }
    }

    Ok(batch)
}

pub async fn write_batch(path: &Path, batch: &Batch, report: &BatchReport) -> Result<()> {
    if is_stdio(path) {
        write_to(io::stdout(), batch, report).await
    } else {
        let file = File::create(path)
            .await
            .with_context(|| format!("Failed to create output {}", path.display()))?;
        write_to(file, batch, report).await
    }
}

/// Write entries in input order. Only upgraded items are re-serialized;
/// every other line goes out byte-for-byte as it came in.
pub async fn write_to<W: AsyncWrite + Unpin>(
    writer: W,
    batch: &Batch,
    report: &BatchReport,
) -> Result<()> {
    let mut out = BufWriter::new(writer);

    for entry in &batch.entries {
        match entry {
            Entry::Item { index, .. } if report.is_upgraded(*index) => {
                let line = serde_json::to_vec(&batch.items[*index])?;
                out.write_all(&line).await?;
            }
            Entry::Item { raw, .. } | Entry::Raw(raw) => out.write_all(raw).await?,
        }
        out.write_all(b"\n").await?;
    }

    out.flush().await.context("Failed to flush output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoded_upgrade::{default_registry, ErrorPolicy, UpgradeConfig};

    fn upgrade(batch: &mut Batch) -> BatchReport {
        let registry = default_registry(UpgradeConfig {
            on_error: ErrorPolicy::Skip,
            ..UpgradeConfig::default()
        });
        registry.upgrade_batch(&mut batch.items)
    }

    #[tokio::test]
    async fn test_read_keeps_order_and_raw_lines() {
        let input = concat!(
            r#"{"item_type": "samtools_stats_quality_metric", "properties": {}}"#,
            "\n\n",
            "not json\n",
            r#"{"item_type": "file"}"#,
            "\n"
        );

        let batch = read_from(input.as_bytes()).await.unwrap();

        assert_eq!(batch.items.len(), 2);
        assert_eq!(batch.entries.len(), 3);
        assert_eq!(batch.parse_failures.len(), 1);
        assert_eq!(batch.parse_failures[0].line, 3);
        assert!(matches!(&batch.entries[1], Entry::Raw(raw) if raw == b"not json"));
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_a_parse_failure() {
        let mut input = b"{\"item_type\": \"file\"}\n".to_vec();
        input.extend_from_slice(b"\xff\xfe garbage\n");

        let batch = read_from(input.as_slice()).await.unwrap();

        assert_eq!(batch.items.len(), 1);
        assert_eq!(batch.parse_failures.len(), 1);
        assert_eq!(batch.parse_failures[0].line, 2);
        assert!(matches!(&batch.entries[1], Entry::Raw(raw) if raw == b"\xff\xfe garbage"));
    }

    #[tokio::test]
    async fn test_write_passes_through_everything_not_upgraded() {
        let mut input = Vec::new();
        // Upgraded: re-serialized
        input.extend_from_slice(
            br#"{"item_type":"samtools_stats_quality_metric","properties":{"schema_version":"1","aliases":["a","a"]}}"#,
        );
        input.push(b'\n');
        // Unknown type: fails, kept byte-for-byte
        input.extend_from_slice(br#"{ "item_type" : "file",  "properties": {"b": 1.50, "a": 1} }"#);
        input.push(b'\n');
        // Already current: kept byte-for-byte
        input.extend_from_slice(
            br#"{"item_type":"samtools_stats_quality_metric","properties":{"schema_version":"2"}}"#,
        );
        input.push(b'\n');
        input.extend_from_slice(b"\xff broken");
        input.push(b'\n');

        let mut batch = read_from(input.as_slice()).await.unwrap();
        let report = upgrade(&mut batch);

        let mut out = Vec::new();
        write_to(&mut out, &batch, &report).await.unwrap();

        let lines: Vec<&[u8]> = out.split(|b| *b == b'\n').collect();
        assert_eq!(lines.len(), 5); // trailing newline leaves an empty tail
        assert_eq!(
            lines[0],
            br#"{"item_type":"samtools_stats_quality_metric","properties":{"schema_version":"2","aliases":["a"]}}"#
        );
        assert_eq!(lines[1], br#"{ "item_type" : "file",  "properties": {"b": 1.50, "a": 1} }"#);
        assert_eq!(
            lines[2],
            br#"{"item_type":"samtools_stats_quality_metric","properties":{"schema_version":"2"}}"#
        );
        assert_eq!(lines[3], b"\xff broken");
        assert!(lines[4].is_empty());
    }
}
