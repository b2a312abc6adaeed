use crate::models::LogEntry;
use crate::Error;
use std::path::Path;
use tracing::debug;

/// Column order of the exported file. Downstream consumers match on this
/// header verbatim, do not reorder it.
const HEADER: [&str; 11] = [
    "ip", "ident", "user", "time", "method", "path", "protocol", "status", "bytes", "referer",
    "userAgent",
];

/// Write `entries` to `path` as CSV, one row per entry in input order,
/// creating or overwriting the file.
///
/// Fields are quoted only when they contain a comma, a quote or a newline,
/// with inner quotes doubled; the timestamp column carries the full
/// offset-aware RFC 3339 form. Any write failure surfaces as
/// [`Error::Export`], never as a partial success.
pub fn export_csv(entries: &[LogEntry], path: impl AsRef<Path>) -> Result<(), Error> {
    let path = path.as_ref();
    let export_err = |source| Error::Export { path: path.to_owned(), source };

    let mut writer = csv::Writer::from_path(path).map_err(export_err)?;
    writer.write_record(HEADER).map_err(export_err)?;
    for entry in entries {
        writer
            .write_record([
                entry.client_address.as_str(),
                &entry.ident,
                &entry.auth_user,
                &entry.timestamp.to_rfc3339(),
                &entry.method,
                &entry.path,
                &entry.protocol,
                &entry.status_code.to_string(),
                &entry.bytes_sent.to_string(),
                &entry.referer,
                &entry.user_agent,
            ])
            .map_err(export_err)?;
    }
    writer.flush().map_err(|source| Error::Export {
        path: path.to_owned(),
        source: csv::Error::from(source),
    })?;

    debug!(path = %path.display(), rows = entries.len(), "exported csv");
    Ok(())
}
