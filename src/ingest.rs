use crate::models::{LogEntry, Rejection};
use crate::parser;
use crate::Error;
use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;
use tracing::debug;

/// Outcome of reading one log file: accepted entries in file order plus a
/// diagnostic per line that failed to parse.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub entries: Vec<LogEntry>,
    pub rejections: Vec<Rejection>,
}

/// Read `path` line by line and parse every line.
///
/// A malformed line is recorded as a [`Rejection`] and skipped; only an I/O
/// failure while opening or reading the file is fatal. Blank lines produce
/// neither an entry nor a diagnostic.
pub fn ingest(path: impl AsRef<Path>) -> Result<IngestReport, Error> {
    let path = path.as_ref();
    let mut report = IngestReport::default();

    for (idx, line) in read_lines(path)
        .map_err(|source| Error::Read { path: path.to_owned(), source })?
        .enumerate()
    {
        let line = line.map_err(|source| Error::Read { path: path.to_owned(), source })?;
        match parser::parse(&line) {
            Ok(Some(entry)) => report.entries.push(entry),
            Ok(None) => {}
            Err(cause) => report.rejections.push(Rejection { line_no: idx + 1, line, cause }),
        }
    }

    debug!(
        path = %path.display(),
        entries = report.entries.len(),
        rejected = report.rejections.len(),
        "ingested log file"
    );
    Ok(report)
}

// Returns an Iterator to the Reader of the lines of the file.
fn read_lines(path: &Path) -> io::Result<io::Lines<io::BufReader<File>>> {
    let file = File::open(path)?;
    Ok(io::BufReader::new(file).lines())
}
