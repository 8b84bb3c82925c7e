use std::fmt;

/// An HTTP/1.x message as seen in one segment.
///
/// Headers and body are not parsed; the start line is split off as a
/// summary and the rest is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpMessage<'a> {
    pub text: &'a str,
}

impl<'a> HttpMessage<'a> {
    /// `None` when the payload is not UTF-8 text (TLS on port 80, a
    /// compressed body continuation, ...).
    pub fn from_payload(data: &'a [u8]) -> Option<Self> {
        std::str::from_utf8(data).ok().map(|text| Self { text })
    }

    /// Request or status line: everything before the first line break.
    pub fn start_line(&self) -> &'a str {
        self.text
            .split_once('\n')
            .map_or(self.text, |(line, _)| line)
            .trim_end_matches('\r')
    }
}

impl fmt::Display for HttpMessage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "HTTP Message:")?;
        writeln!(f, "- Start Line: {}", self.start_line())?;
        f.write_str(self.text)?;
        if !self.text.ends_with('\n') {
            writeln!(f)?;
        }
        Ok(())
    }
}
