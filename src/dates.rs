use chrono::{Datelike, NaiveDate};

use crate::error::{ConvertError, Result};

/// Output date formats YNAB accepts.
pub const ALLOWED_OUTPUT_FORMATS: &[&str] = &[
    "DD/MM/YYYY",
    "YYYY/MM/DD",
    "YYYY-MM-DD",
    "DD-MM-YYYY",
    "DD.MM.YYYY",
    "MM/DD/YYYY",
    "YYYY.MM.DD",
];

pub const DEFAULT_OUTPUT_FORMAT: &str = "DD/MM/YYYY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Year4,
    Year2,
    Month2,
    Month,
    Day2,
    Day,
    Literal(char),
}

impl Token {
    fn width(&self) -> usize {
        match self {
            Self::Year4 => 4,
            _ => 2,
        }
    }
}

/// A date layout written with `YYYY`/`YY`/`MM`/`M`/`DD`/`D` tokens,
/// e.g. `DD-MM-YYYY`. Anything else is a literal separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePattern {
    source: String,
    tokens: Vec<Token>,
}

impl DatePattern {
    pub fn new(pattern: &str) -> Self {
        let chars: Vec<char> = pattern.chars().collect();
        let mut tokens = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            let run = chars[i..].iter().take_while(|&&x| x == c).count();
            match c {
                'Y' if run >= 4 => {
                    tokens.push(Token::Year4);
                    i += 4;
                }
                'Y' if run >= 2 => {
                    tokens.push(Token::Year2);
                    i += 2;
                }
                'M' | 'D' => {
                    let (two, one) = if c == 'M' {
                        (Token::Month2, Token::Month)
                    } else {
                        (Token::Day2, Token::Day)
                    };
                    if run >= 2 {
                        tokens.push(two);
                        i += 2;
                    } else {
                        tokens.push(one);
                        i += 1;
                    }
                }
                other => {
                    tokens.push(Token::Literal(other));
                    i += 1;
                }
            }
        }
        Self {
            source: pattern.to_string(),
            tokens,
        }
    }

    /// Validate against the output allow-list.
    pub fn output(pattern: &str) -> Result<Self> {
        if !ALLOWED_OUTPUT_FORMATS.contains(&pattern) {
            return Err(ConvertError::InvalidDateFormat {
                format: pattern.to_string(),
                allowed: ALLOWED_OUTPUT_FORMATS.join(","),
            });
        }
        Ok(Self::new(pattern))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn format(&self, date: NaiveDate) -> String {
        let mut out = String::with_capacity(self.source.len());
        for token in &self.tokens {
            match token {
                Token::Year4 => out.push_str(&format!("{:04}", date.year())),
                Token::Year2 => out.push_str(&format!("{:02}", date.year().rem_euclid(100))),
                Token::Month2 => out.push_str(&format!("{:02}", date.month())),
                Token::Month => out.push_str(&date.month().to_string()),
                Token::Day2 => out.push_str(&format!("{:02}", date.day())),
                Token::Day => out.push_str(&date.day().to_string()),
                Token::Literal(c) => out.push(*c),
            }
        }
        out
    }

    /// Forgiving parse: separators are ignored, each numeric token takes the
    /// next run of up to `width` digits.
    pub fn parse_lenient(&self, raw: &str) -> Option<NaiveDate> {
        let chars: Vec<char> = raw.chars().collect();
        let mut pos = 0;
        let (mut year, mut month, mut day) = (None, None, None);

        for token in &self.tokens {
            if let Token::Literal(_) = token {
                continue;
            }
            while pos < chars.len() && !chars[pos].is_ascii_digit() {
                pos += 1;
            }
            let start = pos;
            while pos < chars.len() && chars[pos].is_ascii_digit() && pos - start < token.width() {
                pos += 1;
            }
            if start == pos {
                return None;
            }
            let digits: String = chars[start..pos].iter().collect();
            let value: i32 = digits.parse().ok()?;
            match token {
                Token::Year4 => year = Some(value),
                Token::Year2 => year = Some(expand_two_digit_year(value)),
                Token::Month2 | Token::Month => month = Some(value as u32),
                Token::Day2 | Token::Day => day = Some(value as u32),
                Token::Literal(_) => {}
            }
        }

        NaiveDate::from_ymd_opt(year?, month?, day?)
    }

    /// Exact parse: the value must format back to itself.
    pub fn parse_strict(&self, raw: &str) -> Option<NaiveDate> {
        let date = self.parse_lenient(raw)?;
        if self.format(date) == raw {
            Some(date)
        } else {
            None
        }
    }
}

fn expand_two_digit_year(yy: i32) -> i32 {
    if yy > 68 {
        1900 + yy
    } else {
        2000 + yy
    }
}
