//! Line oriented response as written by the diagnostic server.
//!
//! The response is intentionally not framed: there is no Content-Length and
//! the end of the body is signalled by closing the connection.

pub const STATUS_LINE: &str = "HTTP/1.1 200 OK";

pub enum ResponseHeader {
    ContentType,
}

pub struct HttpResponse {
    pub status_line: String,
    headers: Vec<(String, String)>,
    pub body: Vec<String>,
}

impl HttpResponse {
    pub fn new() -> Self {
        Self {
            status_line: STATUS_LINE.to_string(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn set_header(&mut self, h: ResponseHeader, value: &str) {
        let name = match h {
            ResponseHeader::ContentType => "Content-Type",
        };

        self.set_raw(name, value);
    }

    /// Appends a header without any check on its name.
    pub fn set_raw(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    pub fn body_line(&mut self, line: impl Into<String>) {
        self.body.push(line.into());
    }

    /// Every line to put on the wire, without terminators:
    /// status line, header lines, a blank line, then body lines.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(self.status_line.clone())
            .chain(self.headers.iter().map(|(n, v)| format!("{n}: {v}")))
            .chain(std::iter::once(String::new()))
            .chain(self.body.iter().cloned())
    }
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self::new()
    }
}
