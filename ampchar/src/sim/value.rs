use core::fmt;
use core::str::FromStr;
use nom::branch::alt;
use nom::bytes::complete::{tag, tag_no_case};
use nom::combinator::{map, opt};
use nom::number::complete::double;
use nom::{IResult, Parser};

/// A SPICE numeric literal such as `"1k"`, `"5p"` or `"2.2meg"`.
///
/// The original text is kept so netlists reproduce what the user typed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpiceValue {
    text: String,
    value: f64,
}

/// Error returned when a string is not a SPICE numeric literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSpiceValueError {
    /// The rejected text.
    pub text: String,
}

impl fmt::Display for ParseSpiceValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid SPICE value: {:?}", self.text)
    }
}

impl std::error::Error for ParseSpiceValueError {}

impl SpiceValue {
    /// Numeric value in base units.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Text as written in the netlist.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl FromStr for SpiceValue {
    type Err = ParseSpiceValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let err = || ParseSpiceValueError {
            text: s.to_string(),
        };
        let (rest, value) = eng_value(text).map_err(|_| err())?;
        // Unit letters may trail the scale suffix ("5pF", "1kOhm").
        if !rest.chars().all(char::is_alphabetic) {
            return Err(err());
        }
        Ok(Self {
            text: text.to_string(),
            value,
        })
    }
}

impl From<f64> for SpiceValue {
    fn from(value: f64) -> Self {
        Self {
            text: format!("{value}"),
            value,
        }
    }
}

impl fmt::Display for SpiceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Mantissa with an optional scale suffix; whatever follows is returned unparsed.
fn eng_value(input: &str) -> IResult<&str, f64> {
    let (rest, mantissa) = double(input)?;
    let (rest, scale) = opt(eng_suffix).parse(rest)?;
    Ok((rest, mantissa * scale.unwrap_or(1.0)))
}

// SPICE scale suffixes are case-insensitive. MEG and MIL must precede M.
fn eng_suffix(input: &str) -> IResult<&str, f64> {
    alt((
        map(tag_no_case("MEG"), |_: &str| 1e6),
        map(tag_no_case("MIL"), |_: &str| 25.4e-6),
        map(tag_no_case("T"), |_: &str| 1e12),
        map(tag_no_case("G"), |_: &str| 1e9),
        map(tag_no_case("K"), |_: &str| 1e3),
        map(tag_no_case("M"), |_: &str| 1e-3),
        map(alt((tag_no_case("U"), tag("µ"))), |_: &str| 1e-6),
        map(tag_no_case("N"), |_: &str| 1e-9),
        map(tag_no_case("P"), |_: &str| 1e-12),
        map(tag_no_case("F"), |_: &str| 1e-15),
    ))
    .parse(input)
}
