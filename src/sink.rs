//! Destinations for extracted citation edges.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::models::CitationEdges;

/// Errors that can occur while recording edges
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Receives the citations of each processed paper
pub trait CitationSink: Send {
    fn record(&mut self, edges: &CitationEdges) -> Result<(), SinkError>;
}

/// Writes one JSON object per paper, one per line
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Number of records written so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesSink<BufWriter<File>> {
    /// Append to the file at `path`, creating it if needed
    pub fn append_to(path: &Path) -> Result<Self, SinkError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl JsonLinesSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> CitationSink for JsonLinesSink<W> {
    fn record(&mut self, edges: &CitationEdges) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, edges)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }
}

/// Keeps every record in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<CitationEdges>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CitationSink for MemorySink {
    fn record(&mut self, edges: &CitationEdges) -> Result<(), SinkError> {
        self.records.push(edges.clone());
        Ok(())
    }
}
