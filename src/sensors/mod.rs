use {
    anyhow::Result,
    chrono::{DateTime, Utc},
    thiserror::Error,
};

mod cozir;

pub use cozir::{Cozir, SerialLink};

#[allow(async_fn_in_trait)]
pub trait Sensor {
    /// Takes one reading. `Ok(None)` means the sensor produced nothing usable
    /// this cycle; `Err` is reserved for failures of the link itself.
    async fn measure(&mut self) -> Result<Option<Measurement>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    pub time: DateTime<Utc>,
    pub co2_ppm: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplyError {
    #[error("expected at least 2 tokens, got {0}")]
    TooFewTokens(usize),
    #[error("unexpected leading token {0:?}")]
    WrongPrefix(String),
    #[error("invalid concentration {0:?}")]
    NotANumber(String),
    #[error("reply is not valid UTF-8")]
    NotUtf8,
}

/// Parses a `Z <ppm>` reply, e.g. `"Z 00018\r\n"` is 18 ppm.
///
/// When several replies are buffered only the last line counts, older lines
/// are late answers to earlier queries.
pub fn parse_reply(reply: &str) -> Result<u32, ReplyError> {
    let latest = reply
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("");
    let tokens: Vec<&str> = latest.split_whitespace().collect();

    if tokens.len() < 2 {
        return Err(ReplyError::TooFewTokens(tokens.len()));
    }
    if tokens[0] != "Z" {
        return Err(ReplyError::WrongPrefix(tokens[0].to_string()));
    }

    // `u32::from_str` would accept a leading '+'
    let value = tokens[1];
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ReplyError::NotANumber(value.to_string()));
    }
    value
        .parse()
        .map_err(|_| ReplyError::NotANumber(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_zero_padded_reply() {
        assert_eq!(parse_reply("Z 00018"), Ok(18));
        assert_eq!(parse_reply("Z 10500\r\n"), Ok(10500));
    }

    #[test]
    fn ignores_trailing_tokens() {
        assert_eq!(parse_reply(" Z 00420 z 00419\r\n"), Ok(420));
    }

    #[test]
    fn uses_newest_of_buffered_replies() {
        assert_eq!(parse_reply("Z 00018\r\nZ 12000\r\n"), Ok(12000));
        assert_eq!(parse_reply("Z 00018\r\n\r\nZ 00420\r\n\r\n"), Ok(420));
        assert_eq!(
            parse_reply("Z 00018\r\ngarbage"),
            Err(ReplyError::TooFewTokens(1))
        );
    }

    #[test]
    fn rejects_malformed_replies() {
        assert_eq!(parse_reply("garbage"), Err(ReplyError::TooFewTokens(1)));
        assert_eq!(parse_reply(""), Err(ReplyError::TooFewTokens(0)));
        assert_eq!(
            parse_reply("T 01234"),
            Err(ReplyError::WrongPrefix("T".to_string()))
        );
        assert_eq!(
            parse_reply("Z abc"),
            Err(ReplyError::NotANumber("abc".to_string()))
        );
        assert_eq!(
            parse_reply("Z -5"),
            Err(ReplyError::NotANumber("-5".to_string()))
        );
        assert_eq!(
            parse_reply("Z +5"),
            Err(ReplyError::NotANumber("+5".to_string()))
        );
    }

    #[test]
    fn rejects_overflowing_value() {
        assert!(matches!(
            parse_reply("Z 99999999999"),
            Err(ReplyError::NotANumber(_))
        ));
    }
}
