//! printf-style message interpolation
//!
//! A message passed together with arguments is treated as a C `printf`
//! template: `%d %i %u %o %x %X %e %E %f %F %g %G %s %c` and `%%`, with the
//! usual flags (`-`, `+`, space, `0`, `#`), width and precision (`*` takes the
//! value from the argument list). Length modifiers (`h`, `l`, `ll`, `z`, ...)
//! are accepted and ignored.
//!
//! A message logged without arguments is never passed through here.

use super::error::{LoggerError, Result};
use std::fmt;

/// A positional argument for a printf-style template
#[derive(Debug, Clone, PartialEq)]
pub enum FormatArg {
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Char(char),
    Bool(bool),
}

impl fmt::Display for FormatArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatArg::Int(i) => write!(f, "{}", i),
            FormatArg::UInt(u) => write!(f, "{}", u),
            FormatArg::Float(fl) => write!(f, "{}", fl),
            FormatArg::Str(s) => write!(f, "{}", s),
            FormatArg::Char(c) => write!(f, "{}", c),
            FormatArg::Bool(b) => write!(f, "{}", b),
        }
    }
}

macro_rules! impl_from_int {
    ($variant:ident, $target:ty, $($t:ty),+) => {
        $(
            impl From<$t> for FormatArg {
                fn from(value: $t) -> Self {
                    FormatArg::$variant(value as $target)
                }
            }
        )+
    };
}

impl_from_int!(Int, i64, i8, i16, i32, i64, isize);
impl_from_int!(UInt, u64, u8, u16, u32, u64, usize);

impl From<f32> for FormatArg {
    fn from(value: f32) -> Self {
        FormatArg::Float(value as f64)
    }
}

impl From<f64> for FormatArg {
    fn from(value: f64) -> Self {
        FormatArg::Float(value)
    }
}

impl From<String> for FormatArg {
    fn from(value: String) -> Self {
        FormatArg::Str(value)
    }
}

impl From<&str> for FormatArg {
    fn from(value: &str) -> Self {
        FormatArg::Str(value.to_string())
    }
}

impl From<&String> for FormatArg {
    fn from(value: &String) -> Self {
        FormatArg::Str(value.clone())
    }
}

impl From<char> for FormatArg {
    fn from(value: char) -> Self {
        FormatArg::Char(value)
    }
}

impl From<bool> for FormatArg {
    fn from(value: bool) -> Self {
        FormatArg::Bool(value)
    }
}

/// Largest accepted field width or precision
pub const MAX_FIELD_WIDTH: usize = u16::MAX as usize;

#[derive(Debug, Default, Clone, Copy)]
struct Spec {
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
    alternate: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

struct Args<'a> {
    template: &'a str,
    values: &'a [FormatArg],
    next: usize,
}

impl<'a> Args<'a> {
    fn take(&mut self) -> Result<&'a FormatArg> {
        let value = self.values.get(self.next).ok_or_else(|| {
            LoggerError::interpolation(self.template, "not enough arguments for format string")
        })?;
        self.next += 1;
        Ok(value)
    }

    fn take_count(&mut self) -> Result<usize> {
        let count = match self.take()? {
            FormatArg::Int(i) if *i >= 0 => u64::try_from(*i).unwrap_or(u64::MAX),
            FormatArg::UInt(u) => *u,
            other => {
                return Err(LoggerError::interpolation(
                    self.template,
                    format!("'*' expects a non-negative integer, got {:?}", other),
                ))
            }
        };
        check_field(count, self.template)
    }
}

/// Substitute `args` into a printf-style `template`
///
/// Fails when the number of directives and arguments differ or when an
/// argument cannot be converted as its directive requires.
pub fn interpolate(template: &str, args: &[FormatArg]) -> Result<String> {
    let mut out = String::with_capacity(template.len() + args.len() * 8);
    let mut args = Args {
        template,
        values: args,
        next: 0,
    };
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }

        let mut spec = Spec::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => spec.left = true,
                '+' => spec.plus = true,
                ' ' => spec.space = true,
                '0' => spec.zero = true,
                '#' => spec.alternate = true,
                _ => break,
            }
            chars.next();
        }

        if chars.peek() == Some(&'*') {
            chars.next();
            spec.width = Some(args.take_count()?);
        } else {
            spec.width = read_number(&mut chars, template)?;
        }

        if chars.peek() == Some(&'.') {
            chars.next();
            if chars.peek() == Some(&'*') {
                chars.next();
                spec.precision = Some(args.take_count()?);
            } else {
                spec.precision = Some(read_number(&mut chars, template)?.unwrap_or(0));
            }
        }

        while matches!(chars.peek(), Some('h' | 'l' | 'L' | 'q' | 'j' | 'z' | 't')) {
            chars.next();
        }

        let conversion = chars.next().ok_or_else(|| {
            LoggerError::interpolation(template, "incomplete format directive at end of template")
        })?;

        let rendered = match conversion {
            'd' | 'i' | 'u' | 'o' | 'x' | 'X' => {
                let value = to_integer(args.take()?, conversion, template)?;
                let radix = match conversion {
                    'o' => 8,
                    'x' | 'X' => 16,
                    _ => 10,
                };
                format_integer(value, radix, conversion == 'X', &spec)
            }
            'e' | 'E' | 'f' | 'F' | 'g' | 'G' => {
                format_float(to_float(args.take()?, conversion, template)?, conversion, &spec)
            }
            's' => {
                let text = args.take()?.to_string();
                let text = match spec.precision {
                    Some(max) => text.chars().take(max).collect(),
                    None => text,
                };
                pad(String::new(), text, &Spec { zero: false, ..spec })
            }
            'c' => {
                let ch = to_char(args.take()?, template)?;
                pad(String::new(), ch.to_string(), &Spec { zero: false, ..spec })
            }
            other => {
                return Err(LoggerError::interpolation(
                    template,
                    format!("unsupported format character '{}'", other),
                ))
            }
        };
        out.push_str(&rendered);
    }

    if args.next < args.values.len() {
        return Err(LoggerError::interpolation(
            template,
            "not all arguments converted during string formatting",
        ));
    }
    Ok(out)
}

fn read_number(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    template: &str,
) -> Result<Option<usize>> {
    let mut value: Option<u64> = None;
    while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
        chars.next();
        value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(u64::from(digit)));
    }
    value.map(|count| check_field(count, template)).transpose()
}

fn check_field(count: u64, template: &str) -> Result<usize> {
    usize::try_from(count)
        .ok()
        .filter(|count| *count <= MAX_FIELD_WIDTH)
        .ok_or_else(|| {
            LoggerError::interpolation(
                template,
                format!(
                    "field width or precision {} exceeds {}",
                    count, MAX_FIELD_WIDTH
                ),
            )
        })
}

fn to_integer(arg: &FormatArg, conversion: char, template: &str) -> Result<i128> {
    match arg {
        FormatArg::Int(i) => Ok(*i as i128),
        FormatArg::UInt(u) => Ok(*u as i128),
        FormatArg::Bool(b) => Ok(*b as i128),
        FormatArg::Char(c) => Ok(*c as u32 as i128),
        FormatArg::Float(f) if f.is_finite() => Ok(f.trunc() as i128),
        other => Err(LoggerError::interpolation(
            template,
            format!("%{} format: a number is required, not {:?}", conversion, other),
        )),
    }
}

fn to_float(arg: &FormatArg, conversion: char, template: &str) -> Result<f64> {
    match arg {
        FormatArg::Float(f) => Ok(*f),
        FormatArg::Int(i) => Ok(*i as f64),
        FormatArg::UInt(u) => Ok(*u as f64),
        FormatArg::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        other => Err(LoggerError::interpolation(
            template,
            format!("%{} format: a number is required, not {:?}", conversion, other),
        )),
    }
}

fn to_char(arg: &FormatArg, template: &str) -> Result<char> {
    let invalid = || {
        LoggerError::interpolation(
            template,
            format!("%c requires a single character, not {:?}", arg),
        )
    };
    match arg {
        FormatArg::Char(c) => Ok(*c),
        FormatArg::Int(i) => u32::try_from(*i).ok().and_then(char::from_u32).ok_or_else(invalid),
        FormatArg::UInt(u) => u32::try_from(*u).ok().and_then(char::from_u32).ok_or_else(invalid),
        FormatArg::Str(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(invalid()),
            }
        }
        _ => Err(invalid()),
    }
}

fn sign_for(negative: bool, spec: &Spec) -> &'static str {
    if negative {
        "-"
    } else if spec.plus {
        "+"
    } else if spec.space {
        " "
    } else {
        ""
    }
}

fn format_integer(value: i128, radix: u32, upper: bool, spec: &Spec) -> String {
    let magnitude = value.unsigned_abs();
    let mut digits = match radix {
        8 => format!("{:o}", magnitude),
        16 if upper => format!("{:X}", magnitude),
        16 => format!("{:x}", magnitude),
        _ => magnitude.to_string(),
    };
    if let Some(min_digits) = spec.precision {
        if min_digits == 0 && magnitude == 0 {
            digits.clear();
        } else if digits.len() < min_digits {
            digits = format!("{}{}", "0".repeat(min_digits - digits.len()), digits);
        }
    }
    let prefix = match (spec.alternate, radix) {
        (true, 8) if !digits.starts_with('0') => "0",
        (true, 16) if magnitude != 0 && upper => "0X",
        (true, 16) if magnitude != 0 => "0x",
        _ => "",
    };
    let head = format!("{}{}", sign_for(value < 0, spec), prefix);
    // Zero padding is ignored when a precision is given
    let zero = spec.zero && spec.precision.is_none();
    pad(head, digits, &Spec { zero, ..*spec })
}

fn format_float(value: f64, conversion: char, spec: &Spec) -> String {
    let upper = conversion.is_ascii_uppercase();
    let negative = value.is_sign_negative() && !value.is_nan();
    let head = sign_for(negative, spec).to_string();

    if !value.is_finite() {
        let text = if value.is_nan() { "nan" } else { "inf" };
        let text = if upper { text.to_uppercase() } else { text.to_string() };
        return pad(head, text, &Spec { zero: false, ..*spec });
    }

    let magnitude = value.abs();
    let precision = spec.precision.unwrap_or(6);
    let body = match conversion.to_ascii_lowercase() {
        'e' => format_exponent(magnitude, precision, upper),
        'g' => format_general(magnitude, precision, spec.alternate, upper),
        _ => {
            let fixed = format!("{:.*}", precision, magnitude);
            if spec.alternate && precision == 0 {
                format!("{}.", fixed)
            } else {
                fixed
            }
        }
    };
    pad(head, body, spec)
}

/// C-style exponent notation: at least two exponent digits with explicit sign
fn format_exponent(magnitude: f64, precision: usize, upper: bool) -> String {
    let rust = format!("{:.*e}", precision, magnitude);
    let (mantissa, exponent) = rust.split_once('e').unwrap_or((rust.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    format!(
        "{}{}{}{:02}",
        mantissa,
        if upper { 'E' } else { 'e' },
        if exponent < 0 { '-' } else { '+' },
        exponent.abs()
    )
}

fn strip_fraction_zeros(number: &str) -> String {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        number.to_string()
    }
}

fn format_general(magnitude: f64, precision: usize, alternate: bool, upper: bool) -> String {
    let significant = precision.max(1);
    let exponent = if magnitude == 0.0 {
        0
    } else {
        let rounded = format!("{:.*e}", significant - 1, magnitude);
        rounded
            .split_once('e')
            .and_then(|(_, exp)| exp.parse::<i32>().ok())
            .unwrap_or(0)
    };

    if exponent < -4 || exponent >= significant as i32 {
        let text = format_exponent(magnitude, significant - 1, upper);
        if alternate {
            return text;
        }
        let marker = if upper { 'E' } else { 'e' };
        match text.split_once(marker) {
            Some((mantissa, exp)) => {
                format!("{}{}{}", strip_fraction_zeros(mantissa), marker, exp)
            }
            None => text,
        }
    } else {
        let decimals = (significant as i32 - 1 - exponent).max(0) as usize;
        let text = format!("{:.*}", decimals, magnitude);
        if alternate {
            text
        } else {
            strip_fraction_zeros(&text)
        }
    }
}

/// Apply width padding; zero padding goes between the sign/prefix and the digits
fn pad(head: String, body: String, spec: &Spec) -> String {
    let len = head.chars().count() + body.chars().count();
    let width = spec.width.unwrap_or(0);
    if len >= width {
        return head + &body;
    }
    let fill = width - len;
    if spec.left {
        format!("{}{}{}", head, body, " ".repeat(fill))
    } else if spec.zero {
        format!("{}{}{}", head, "0".repeat(fill), body)
    } else {
        format!("{}{}{}", " ".repeat(fill), head, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_conversions() {
        let result =
            interpolate("Format %d %g %s", &[3.into(), 2.71828.into(), "foo".into()]).unwrap();
        assert_eq!(result, "Format 3 2.71828 foo");
    }

    #[test]
    fn test_integer_flags() {
        assert_eq!(interpolate("[%5d]", &[42.into()]).unwrap(), "[   42]");
        assert_eq!(interpolate("[%-5d]", &[42.into()]).unwrap(), "[42   ]");
        assert_eq!(interpolate("[%05d]", &[(-42).into()]).unwrap(), "[-0042]");
        assert_eq!(interpolate("[%+d]", &[7.into()]).unwrap(), "[+7]");
        assert_eq!(interpolate("[%.3d]", &[7.into()]).unwrap(), "[007]");
        assert_eq!(interpolate("[%ld]", &[7u64.into()]).unwrap(), "[7]");
    }

    #[test]
    fn test_radix_conversions() {
        let result = interpolate("%x %X %o", &[255.into(), 255.into(), 8.into()]).unwrap();
        assert_eq!(result, "ff FF 10");
        assert_eq!(interpolate("%#x %#o", &[255.into(), 8.into()]).unwrap(), "0xff 010");
    }

    #[test]
    fn test_float_conversions() {
        assert_eq!(interpolate("%f", &[1.5.into()]).unwrap(), "1.500000");
        assert_eq!(interpolate("%.2f", &[3.25159.into()]).unwrap(), "3.25");
        assert_eq!(interpolate("%e", &[12345.678.into()]).unwrap(), "1.234568e+04");
        assert_eq!(interpolate("%E", &[0.00012.into()]).unwrap(), "1.200000E-04");
        assert_eq!(interpolate("%g", &[100000.0.into()]).unwrap(), "100000");
        assert_eq!(interpolate("%g", &[1000000.0.into()]).unwrap(), "1e+06");
        assert_eq!(interpolate("%g", &[0.0001.into()]).unwrap(), "0.0001");
        assert_eq!(interpolate("%g", &[0.0.into()]).unwrap(), "0");
        assert_eq!(interpolate("%8.3f|", &[(-2.5).into()]).unwrap(), "  -2.500|");
        assert_eq!(interpolate("%f", &[5.into()]).unwrap(), "5.000000");
    }

    #[test]
    fn test_special_floats() {
        assert_eq!(interpolate("%f", &[f64::INFINITY.into()]).unwrap(), "inf");
        assert_eq!(interpolate("%F", &[f64::NAN.into()]).unwrap(), "NAN");
        assert_eq!(interpolate("%f", &[f64::NEG_INFINITY.into()]).unwrap(), "-inf");
    }

    #[test]
    fn test_strings_and_chars() {
        assert_eq!(interpolate("[%-6s]", &["ab".into()]).unwrap(), "[ab    ]");
        assert_eq!(interpolate("[%.2s]", &["abcdef".into()]).unwrap(), "[ab]");
        assert_eq!(interpolate("%c%c", &['o'.into(), 107.into()]).unwrap(), "ok");
        assert_eq!(interpolate("%s", &[true.into()]).unwrap(), "true");
        assert_eq!(interpolate("%s", &[3.into()]).unwrap(), "3");
    }

    #[test]
    fn test_star_width() {
        assert_eq!(interpolate("[%*d]", &[4.into(), 1.into()]).unwrap(), "[   1]");
        assert_eq!(interpolate("[%.*f]", &[1.into(), 2.26.into()]).unwrap(), "[2.3]");
    }

    #[test]
    fn test_percent_literal() {
        assert_eq!(interpolate("%d%%", &[50.into()]).unwrap(), "50%");
    }

    #[test]
    fn test_float_for_integer_truncates() {
        assert_eq!(interpolate("%d", &[2.9.into()]).unwrap(), "2");
    }

    #[test]
    fn test_argument_count_mismatch() {
        let err = interpolate("%d and %d", &[1.into()]).unwrap_err();
        assert!(err.to_string().contains("not enough arguments"));

        let err = interpolate("%d", &[1.into(), 2.into()]).unwrap_err();
        assert!(err.to_string().contains("not all arguments converted"));
    }

    #[test]
    fn test_type_mismatch() {
        let err = interpolate("%d", &["three".into()]).unwrap_err();
        assert!(matches!(err, LoggerError::InterpolationError { .. }));
    }

    #[test]
    fn test_oversized_fields_are_rejected() {
        let err = interpolate("[%*d]", &[i64::MAX.into(), 1.into()]).unwrap_err();
        assert!(matches!(err, LoggerError::InterpolationError { .. }));
        assert!(interpolate("%.*f", &[70000.into(), 1.5.into()]).is_err());
        assert!(interpolate("[%99999999999999999999d]", &[1.into()]).is_err());
        assert!(interpolate("%.70000f", &[1.5.into()]).is_err());
        assert!(interpolate("%*s", &[u64::MAX.into(), "x".into()]).is_err());
    }

    #[test]
    fn test_largest_field_is_accepted() {
        let padded = interpolate("%*d", &[(MAX_FIELD_WIDTH as u64).into(), 1.into()]).unwrap();
        assert_eq!(padded.len(), MAX_FIELD_WIDTH);
        assert!(padded.ends_with(" 1"));

        let precise = interpolate("%.*f", &[(MAX_FIELD_WIDTH as u64).into(), 0.5.into()]).unwrap();
        assert_eq!(precise.len(), MAX_FIELD_WIDTH + 2);
    }

    #[test]
    fn test_bad_directives() {
        assert!(interpolate("%q", &[1.into()]).is_err());
        assert!(interpolate("trailing %", &[1.into()]).is_err());
    }
}
