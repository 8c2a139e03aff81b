//! Parsers for the free-form values typed into the property inspector.
//!
//! Built on `winnow` 0.7. Accepts the color notations a browser color
//! input or a hand-typed CSS value produces, and stroke dash patterns in
//! the `"5,5"` / `"[4 2]"` forms.

use crate::error::CoreError;
use crate::model::{Color, DashPattern};
use winnow::ascii::{float, multispace0, multispace1};
use winnow::combinator::{alt, delimited, preceded, separated, terminated};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take_while;

/// Parse a color literal: `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`,
/// `rgb(r, g, b)`, `rgba(r, g, b, a)` or `transparent`.
pub fn parse_color(input: &str) -> Result<Color, CoreError> {
    color
        .parse(input.trim())
        .map_err(|_| CoreError::InvalidColor(input.to_string()))
}

/// Parse a stroke dash pattern. An empty string means a solid stroke.
pub fn parse_dash(input: &str) -> Result<DashPattern, CoreError> {
    let values = dash_pattern
        .parse(input.trim())
        .map_err(|_| CoreError::InvalidDash(input.to_string()))?;
    if values.iter().any(|v| *v < 0.0 || !v.is_finite()) {
        return Err(CoreError::InvalidDash(input.to_string()));
    }
    // An all-zero pattern would draw nothing; treat it as solid.
    if values.iter().all(|v| *v == 0.0) {
        return Ok(DashPattern::new());
    }
    Ok(values.into_iter().collect())
}

fn color(input: &mut &str) -> ModalResult<Color> {
    alt((
        hex_color,
        rgb_function,
        "transparent".value(Color::TRANSPARENT),
    ))
    .parse_next(input)
}

fn hex_color(input: &mut &str) -> ModalResult<Color> {
    preceded('#', take_while(1..=8, |c: char| c.is_ascii_hexdigit()))
        .verify_map(color_from_hex_digits)
        .parse_next(input)
}

fn rgb_function(input: &mut &str) -> ModalResult<Color> {
    let name = alt(("rgba", "rgb")).parse_next(input)?;
    let args: Vec<f32> =
        delimited('(', separated(3..=4, number, comma), (multispace0, ')')).parse_next(input)?;
    match (name, args.as_slice()) {
        ("rgb", [r, g, b]) => Ok(Color::from_rgb8(channel(*r), channel(*g), channel(*b))),
        ("rgba", [r, g, b, a]) => Ok(Color::rgba(
            channel(*r) as f32 / 255.0,
            channel(*g) as f32 / 255.0,
            channel(*b) as f32 / 255.0,
            a.clamp(0.0, 1.0),
        )),
        _ => Err(ErrMode::Backtrack(ContextError::new())),
    }
}

fn dash_pattern(input: &mut &str) -> ModalResult<Vec<f32>> {
    alt((
        delimited('[', terminated(dash_values, multispace0), ']'),
        dash_values,
    ))
    .parse_next(input)
}

/// Values split by commas or bare whitespace: `5,5`, `5, 5` or `4 2`.
fn dash_values(input: &mut &str) -> ModalResult<Vec<f32>> {
    separated(0.., number, alt((comma, multispace1.void()))).parse_next(input)
}

// `separated` requires a separator that consumes input.
fn comma(input: &mut &str) -> ModalResult<()> {
    (multispace0, ',').void().parse_next(input)
}

fn number(input: &mut &str) -> ModalResult<f32> {
    preceded(multispace0, float).parse_next(input)
}

fn channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

fn hex_val(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => 0,
    }
}

/// Expand 3/4/6/8 hex digits into a color. Input is already hex-only.
fn color_from_hex_digits(hex: &str) -> Option<Color> {
    let b = hex.as_bytes();
    let short = |i: usize| hex_val(b[i]) * 17;
    let long = |i: usize| (hex_val(b[i]) << 4) | hex_val(b[i + 1]);
    let (r, g, bl, a) = match b.len() {
        3 => (short(0), short(1), short(2), 255),
        4 => (short(0), short(1), short(2), short(3)),
        6 => (long(0), long(2), long(4), 255),
        8 => (long(0), long(2), long(4), long(6)),
        _ => return None,
    };
    Some(Color::rgba(
        r as f32 / 255.0,
        g as f32 / 255.0,
        bl as f32 / 255.0,
        a as f32 / 255.0,
    ))
}
