use crate::http::request::RequestRecord;
use crate::http::response::{HttpResponse, ResponseHeader};
use crate::units::{format_duration, pretty_byte_size};

/// Plain text summary of what was received, with the echo set mirrored as headers.
pub fn diagnostic(record: &RequestRecord) -> HttpResponse {
    let mut res = HttpResponse::new();
    res.set_header(ResponseHeader::ContentType, "text/plain");
    for (name, value) in record.headers.echo() {
        res.set_raw(name, value);
    }

    res.body_line(format!("request-start-line: {}", record.start_line));
    res.body_line("request-header-lines:");
    for (name, value) in record.headers.iter() {
        res.body_line(format!("- {name}: {value}"));
    }
    res.body_line(format!(
        "request-body-size: {}",
        pretty_byte_size(record.body_size)
    ));
    res.body_line(format!("request-body-hash: {}", record.body_hash));
    res.body_line(format!(
        "request-read-duration: {}",
        format_duration(record.read_duration)
    ));
    res.body_line(format!(
        "request-sleep-duration: {}",
        format_duration(record.sleep_duration)
    ));
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn summarizes_request() {
        let mut record = RequestRecord::new(false);
        record.set_start_line("POST /upload?rawh-sleep-duration=10ms HTTP/1.1");
        record.headers.add_line("Host: example.com").unwrap();
        record.headers.add_line("Rawh-Echo: X-Trace").unwrap();
        record.resolve_controls();
        record.body_size = 1024;
        record.body_hash = "MD5:abc".to_string();
        record.read_duration = Duration::from_millis(3);

        let lines: Vec<String> = diagnostic(&record).lines().collect();
        assert_eq!(
            lines,
            vec![
                "HTTP/1.1 200 OK",
                "Content-Type: text/plain",
                "X-Trace: X-Trace",
                "",
                "request-start-line: POST /upload?rawh-sleep-duration=10ms HTTP/1.1",
                "request-header-lines:",
                "- Host: example.com",
                "- Rawh-Echo: X-Trace",
                "request-body-size: 1.00 KB",
                "request-body-hash: MD5:abc",
                "request-read-duration: 3ms",
                "request-sleep-duration: 10ms",
            ]
        );
    }

    #[test]
    fn empty_record_uses_defaults() {
        let record = RequestRecord::new(false);
        let lines: Vec<String> = diagnostic(&record).lines().collect();
        assert!(lines.contains(&"request-start-line: ".to_string()));
        assert!(lines.contains(&"request-body-size: 0 B".to_string()));
        assert!(lines.contains(&"request-body-hash: empty".to_string()));
        assert!(lines.contains(&"request-sleep-duration: 0s".to_string()));
    }
}
