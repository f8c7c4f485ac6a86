use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use gazelat_core::TimingRecord;
use tracing::debug;

use crate::error::RecorderError;

/// First line of every results log. Column order matches [`TimingRecorder::append`].
pub const HEADER: &str = "e2e (us), eyelink (us), drawing (us)";

/// Append-only CSV log of successful trials, flushed after every row.
pub struct TimingRecorder<W: Write> {
    out: csv::Writer<W>,
    rows: usize,
}

impl TimingRecorder<BufWriter<File>> {
    /// Creates (or truncates) the log file and writes the header.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, RecorderError> {
        let file = File::create(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "results log opened");
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> TimingRecorder<W> {
    pub fn new(mut out: W) -> Result<Self, RecorderError> {
        writeln!(out, "{HEADER}")?;
        out.flush()?;
        // the token is device free text and goes into its column unquoted
        let out = csv::WriterBuilder::new()
            .has_headers(false)
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(out);
        Ok(Self { out, rows: 0 })
    }

    /// Writes `token,sensing_delay_us,drawing_delay_us`.
    pub fn append(&mut self, record: &TimingRecord) -> Result<(), RecorderError> {
        let sensing = record.sensing_delay_us.to_string();
        let drawing = record.drawing_delay_us.to_string();
        self.out
            .write_record([record.e2e_token.as_str(), sensing.as_str(), drawing.as_str()])?;
        self.out.flush()?;
        self.rows += 1;
        Ok(())
    }

    /// Data rows written so far, header excluded.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn get_ref(&self) -> &W {
        self.out.get_ref()
    }
}
