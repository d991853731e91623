//! SMTP response, containing a mandatory return code and an optional text
//! message

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use nom::{
    bytes::complete::take_while_m_n,
    character::complete::one_of,
    combinator::{map_res, opt},
    IResult, Parser,
};

use crate::smtp::error::{self, Error};

/// Contains an SMTP reply, with separated code and message
///
/// A response block is one or more lines. Every line but the last carries a
/// `-` after the code; the last one carries a space.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Response {
    /// Response code, read from the first three characters of the block
    code: u16,
    /// Server response string (one entry per line)
    message: Vec<String>,
}

impl FromStr for Response {
    type Err = Error;

    fn from_str(s: &str) -> Result<Response, Error> {
        parse_response(s)
    }
}

impl Display for Response {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let last = self.message.len().saturating_sub(1);
        for (idx, line) in self.message.iter().enumerate() {
            let separator = if idx == last { ' ' } else { '-' };
            write!(f, "{:03}{}{}\r\n", self.code, separator, line)?;
        }
        if self.message.is_empty() {
            write!(f, "{:03}\r\n", self.code)?;
        }
        Ok(())
    }
}

impl Response {
    /// Creates a new `Response`
    pub fn new(code: u16, message: Vec<String>) -> Response {
        Response { code, message }
    }

    /// Tells if the response is positive (2yz or 3yz)
    pub fn is_positive(&self) -> bool {
        (200..400).contains(&self.code)
    }

    /// Tests code equality
    pub fn has_code(&self, code: u16) -> bool {
        self.code == code
    }

    /// Returns only the first word of the message if possible
    pub fn first_word(&self) -> Option<&str> {
        self.message
            .first()
            .and_then(|line| line.split_whitespace().next())
    }

    /// Returns only the line of the message if possible
    pub fn first_line(&self) -> Option<&str> {
        self.message.first().map(String::as_str)
    }

    /// Response code
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Server response string (array of lines)
    pub fn message(&self) -> impl Iterator<Item = &str> {
        self.message.iter().map(String::as_str)
    }
}

/// Whether `line` closes a response block
///
/// The fourth character of the last line of a block is a space.
pub(crate) fn is_last_line(line: &str) -> bool {
    line.as_bytes().get(3) == Some(&b' ')
}

fn parse_code(i: &str) -> IResult<&str, u16> {
    map_res(take_while_m_n(3, 3, |c: char| c.is_ascii_digit()), |code: &str| {
        code.parse::<u16>()
    })
    .parse(i)
}

fn parse_line(i: &str) -> IResult<&str, Option<u16>> {
    let (i, code) = opt(parse_code).parse(i)?;
    let (i, _) = opt(one_of(" -")).parse(i)?;
    Ok((i, code))
}

/// Parses a complete response block
///
/// The code is the numeric value of the first three characters of the block;
/// a block that does not start with three digits gets code `0`, which never
/// satisfies a checkpoint.
pub(crate) fn parse_response(i: &str) -> Result<Response, Error> {
    if i.is_empty() {
        return Err(error::response("empty response"));
    }

    let mut code = None;
    let mut message = Vec::new();

    for line in i.lines() {
        let line = line.trim_end_matches('\r');
        let (text, line_code) = parse_line(line).map_err(|e| error::response(e.to_string()))?;
        code.get_or_insert(line_code.unwrap_or(0));
        message.push(text.to_owned());
    }

    Ok(Response {
        code: code.unwrap_or(0),
        message,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_response_from_str() {
        let raw_response = "250-me\r\n250-8BITMIME\r\n250-SIZE 42\r\n250 AUTH PLAIN LOGIN\r\n";
        assert_eq!(
            raw_response.parse::<Response>().unwrap(),
            Response {
                code: 250,
                message: vec![
                    "me".to_owned(),
                    "8BITMIME".to_owned(),
                    "SIZE 42".to_owned(),
                    "AUTH PLAIN LOGIN".to_owned(),
                ],
            }
        );
    }

    #[test]
    fn test_response_code_from_first_line() {
        let response = "220-first\r\n250 last\r\n".parse::<Response>().unwrap();
        assert_eq!(response.code(), 220);
        assert!(response.has_code(220));
    }

    #[test]
    fn test_response_without_numeric_code() {
        let response = "hello there\r\n".parse::<Response>().unwrap();
        assert_eq!(response.code(), 0);
        assert!(!response.is_positive());
        assert_eq!(response.first_line(), Some("hello there"));
    }

    #[test]
    fn test_response_empty() {
        assert!("".parse::<Response>().unwrap_err().is_response());
    }

    #[test]
    fn test_response_is_positive() {
        assert!(Response::new(250, vec!["ok".to_owned()]).is_positive());
        assert!(Response::new(334, vec!["VXNlcm5hbWU6".to_owned()]).is_positive());
        assert!(!Response::new(451, vec!["later".to_owned()]).is_positive());
    }

    #[test]
    fn test_response_first_word() {
        assert_eq!(
            Response::new(334, vec!["VXNlcm5hbWU6 extra".to_owned()]).first_word(),
            Some("VXNlcm5hbWU6")
        );
        assert_eq!(Response::new(250, vec![]).first_word(), None);
        assert_eq!(Response::new(250, vec!["  ".to_owned()]).first_word(), None);
    }

    #[test]
    fn test_response_display() {
        let response = Response::new(250, vec!["me".to_owned(), "STARTTLS".to_owned()]);
        assert_eq!(response.to_string(), "250-me\r\n250 STARTTLS\r\n");
    }

    #[test]
    fn test_is_last_line() {
        assert!(is_last_line("250 ok\r\n"));
        assert!(!is_last_line("250-ok\r\n"));
        assert!(!is_last_line("250"));
        assert!(is_last_line("abc def"));
    }
}
