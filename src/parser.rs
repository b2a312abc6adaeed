use crate::models::{LogEntry, RejectCause};
use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::Regex;

/// Datetime layout used inside the `[..]` field, e.g. `10/Oct/2023:13:55:36 -0700`.
/// `%b` matches the fixed English month abbreviations regardless of host locale.
pub const DATETIME_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

// https://httpd.apache.org/docs/2.4/logs.html
// The whole line must match as one unit; the quoted request is captured as a
// single field and split on spaces afterwards, so paths containing spaces or
// a missing protocol token do not break the match. STATUS is structurally
// pinned to exactly three digits.
static COMBINED_LOG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?P<ip>\S+) (?P<ident>\S+) (?P<user>\S+) \[(?P<date>[^\]]+)\] "(?P<request>[^"]*)" (?P<status>[0-9]{3}) (?P<bytes>\S+) "(?P<referer>[^"]*)" "(?P<useragent>[^"]*)"$"#,
    )
    .unwrap()
});

/// Split the quoted request field on its first and last space boundary.
///
/// `GET /a b.html HTTP/1.1` yields a path of `/a b.html`; a request with a
/// single token yields empty path and protocol rather than a rejection.
fn split_request(request: &str) -> (&str, &str, &str) {
    match request.split_once(' ') {
        Some((method, rest)) => match rest.rsplit_once(' ') {
            Some((path, protocol)) => (method, path, protocol),
            None => (method, rest, ""),
        },
        None => (request, "", ""),
    }
}

/// Parse one line of a Combined Log Format file.
///
/// Returns `Ok(None)` for a line that is empty after trimming (a blank line
/// is not malformed data), `Ok(Some(..))` for an accepted line, and a
/// [`RejectCause`] otherwise. Never panics; a corrupt line must not abort
/// ingestion of the rest of the file.
pub fn parse(line: &str) -> Result<Option<LogEntry>, RejectCause> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let captures = COMBINED_LOG_REGEX
        .captures(line)
        .ok_or(RejectCause::Structure)?;

    // The status group is \d{3}, so this parse cannot fail.
    let status_code = captures["status"]
        .parse::<u16>()
        .map_err(|_| RejectCause::Structure)?;

    let bytes = &captures["bytes"];
    let bytes_sent = if bytes == "-" {
        0
    } else {
        bytes.parse::<u64>().map_err(|_| RejectCause::Bytes)?
    };

    let timestamp = DateTime::parse_from_str(&captures["date"], DATETIME_FORMAT)
        .map_err(|_| RejectCause::Timestamp)?;

    let (method, path, protocol) = split_request(&captures["request"]);

    Ok(Some(LogEntry {
        client_address: captures["ip"].to_owned(),
        ident: captures["ident"].to_owned(),
        auth_user: captures["user"].to_owned(),
        timestamp,
        method: method.to_owned(),
        path: path.to_owned(),
        protocol: protocol.to_owned(),
        status_code,
        bytes_sent,
        referer: captures["referer"].to_owned(),
        user_agent: captures["useragent"].to_owned(),
        raw_line: line.to_owned(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"127.0.0.1 - - [10/Oct/2023:13:55:36 -0700] "GET /index.html HTTP/1.1" 200 1024 "-" "Mozilla/5.0""#;

    fn parse_ok(line: &str) -> LogEntry {
        parse(line).unwrap().unwrap()
    }

    #[test]
    fn parses_sample_line() {
        let e = parse_ok(SAMPLE);
        assert_eq!(e.client_address, "127.0.0.1");
        assert_eq!(e.ident, "-");
        assert_eq!(e.auth_user, "-");
        assert_eq!(e.method, "GET");
        assert_eq!(e.path, "/index.html");
        assert_eq!(e.protocol, "HTTP/1.1");
        assert_eq!(e.status_code, 200);
        assert_eq!(e.bytes_sent, 1024);
        assert_eq!(e.referer, "-");
        assert_eq!(e.user_agent, "Mozilla/5.0");
        assert_eq!(e.raw_line, SAMPLE);
    }

    #[test]
    fn timestamp_keeps_source_offset() {
        let e = parse_ok(SAMPLE);
        assert_eq!(e.timestamp.format(DATETIME_FORMAT).to_string(), "10/Oct/2023:13:55:36 -0700");
        assert_eq!(e.timestamp.offset().local_minus_utc(), -7 * 3600);
    }

    #[test]
    fn blank_line_is_no_entry() {
        assert_eq!(parse(""), Ok(None));
        assert_eq!(parse("   \t  "), Ok(None));
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let padded = format!("  {SAMPLE}\t");
        assert_eq!(parse_ok(&padded), parse_ok(SAMPLE));
    }

    #[test]
    fn dash_bytes_maps_to_zero() {
        let line = SAMPLE.replace(" 200 1024 ", " 304 - ");
        let e = parse_ok(&line);
        assert_eq!(e.status_code, 304);
        assert_eq!(e.bytes_sent, 0);
    }

    #[test]
    fn path_with_spaces_is_tolerated() {
        let line = SAMPLE.replace("/index.html", "/my files/report 2023.pdf");
        let e = parse_ok(&line);
        assert_eq!(e.path, "/my files/report 2023.pdf");
        assert_eq!(e.protocol, "HTTP/1.1");
    }

    #[test]
    fn missing_protocol_is_tolerated() {
        let line = SAMPLE.replace("GET /index.html HTTP/1.1", "GET /index.html");
        let e = parse_ok(&line);
        assert_eq!(e.method, "GET");
        assert_eq!(e.path, "/index.html");
        assert_eq!(e.protocol, "");
    }

    #[test]
    fn unterminated_useragent_is_rejected() {
        let line = SAMPLE.strip_suffix('"').unwrap();
        assert_eq!(parse(line), Err(RejectCause::Structure));
    }

    #[test]
    fn reordered_fields_are_rejected() {
        let line = r#"- 127.0.0.1 - [10/Oct/2023:13:55:36 -0700] 200 "GET / HTTP/1.1" 1024 "-" "Mozilla/5.0""#;
        assert_eq!(parse(line), Err(RejectCause::Structure));
    }

    #[test]
    fn wrong_status_width_is_rejected() {
        assert_eq!(
            parse(&SAMPLE.replace(" 200 ", " 20 ")),
            Err(RejectCause::Structure)
        );
        assert_eq!(
            parse(&SAMPLE.replace(" 200 ", " 2000 ")),
            Err(RejectCause::Structure)
        );
        assert_eq!(
            parse(&SAMPLE.replace(" 200 ", " OK ")),
            Err(RejectCause::Structure)
        );
    }

    #[test]
    fn bad_bytes_token_is_rejected() {
        assert_eq!(
            parse(&SAMPLE.replace(" 1024 ", " -1024 ")),
            Err(RejectCause::Bytes)
        );
        assert_eq!(
            parse(&SAMPLE.replace(" 1024 ", " lots ")),
            Err(RejectCause::Bytes)
        );
    }

    #[test]
    fn bad_datetime_is_rejected() {
        // unknown month abbreviation
        assert_eq!(
            parse(&SAMPLE.replace("10/Oct/2023", "10/Okt/2023")),
            Err(RejectCause::Timestamp)
        );
        // malformed offset
        assert_eq!(
            parse(&SAMPLE.replace("-0700", "PDT")),
            Err(RejectCause::Timestamp)
        );
        // out-of-range time component
        assert_eq!(
            parse(&SAMPLE.replace("13:55:36", "13:55:61")),
            Err(RejectCause::Timestamp)
        );
    }
}
