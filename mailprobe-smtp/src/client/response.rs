//! SMTP reply parsing (RFC 5321 section 4.2).

use super::error::{ClientError, Result};

/// One line of a possibly multi-line reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseLine {
    pub code: u16,
    /// `false` for `250-` continuation lines
    pub is_last: bool,
    pub message: String,
}

/// A complete reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub code: u16,
    pub lines: Vec<String>,
}

impl Response {
    #[must_use]
    pub const fn new(code: u16, lines: Vec<String>) -> Self {
        Self { code, lines }
    }

    /// All lines joined with a single space, for error messages.
    #[must_use]
    pub fn message(&self) -> String {
        self.lines.join(" ")
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code >= 200 && self.code < 300
    }

    /// `354`, the go-ahead after `DATA`.
    #[must_use]
    pub const fn is_intermediate(&self) -> bool {
        self.code >= 300 && self.code < 400
    }

    /// Whether an EHLO reply advertises `keyword`.
    ///
    /// The first line is the server's greeting and is skipped. Matching is
    /// case insensitive and only considers the keyword, so `AUTH` matches
    /// `AUTH PLAIN LOGIN`.
    #[must_use]
    pub fn has_extension(&self, keyword: &str) -> bool {
        self.lines.iter().skip(1).any(|line| {
            line.split_whitespace()
                .next()
                .is_some_and(|word| word.eq_ignore_ascii_case(keyword))
        })
    }

    /// Parameters of an advertised extension, e.g. the mechanisms of `AUTH`.
    #[must_use]
    pub fn extension_params(&self, keyword: &str) -> Vec<String> {
        self.lines
            .iter()
            .skip(1)
            .filter_map(|line| {
                let mut words = line.split_whitespace();
                words
                    .next()
                    .filter(|word| word.eq_ignore_ascii_case(keyword))
                    .map(|_| words.map(str::to_ascii_uppercase).collect::<Vec<_>>())
            })
            .flatten()
            .collect()
    }

    /// # Errors
    ///
    /// The line does not start with a three digit code followed by a space,
    /// a dash or nothing.
    pub fn parse_line(line: &str) -> Result<ResponseLine> {
        let code = line
            .get(..3)
            .filter(|digits| digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse::<u16>().ok())
            .ok_or_else(|| ClientError::ParseError(format!("Invalid status code in '{line}'")))?;

        let (is_last, message) = match line.as_bytes().get(3) {
            None => (true, String::new()),
            Some(b' ') => (true, line[4..].to_string()),
            Some(b'-') => (false, line[4..].to_string()),
            Some(other) => {
                return Err(ClientError::ParseError(format!(
                    "Invalid separator '{}' in '{line}'",
                    char::from(*other)
                )));
            }
        };

        Ok(ResponseLine {
            code,
            is_last,
            message,
        })
    }

    /// Parse one reply from the front of `buffer`.
    ///
    /// Returns `None` while the reply is incomplete, otherwise the reply and
    /// how many bytes it occupied.
    ///
    /// # Errors
    ///
    /// A line is malformed, or a continuation line carries a different code.
    pub fn parse_response(buffer: &[u8]) -> Result<Option<(Self, usize)>> {
        let mut consumed = 0;
        let mut code = None;
        let mut lines = Vec::new();

        while let Some(end) = buffer[consumed..].iter().position(|&b| b == b'\n') {
            let raw = &buffer[consumed..consumed + end];
            consumed += end + 1;

            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            if raw.is_empty() {
                continue;
            }

            let parsed = Self::parse_line(std::str::from_utf8(raw)?)?;

            match code {
                Some(expected) if expected != parsed.code => {
                    return Err(ClientError::ParseError(format!(
                        "Status code mismatch in multi-line response: expected {expected}, got {}",
                        parsed.code
                    )));
                }
                Some(_) => {}
                None => code = Some(parsed.code),
            }

            lines.push(parsed.message);

            if parsed.is_last {
                return Ok(code.map(|code| (Self::new(code, lines), consumed)));
            }
        }

        Ok(None)
    }
}
