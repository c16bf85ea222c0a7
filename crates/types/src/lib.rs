use std::{cmp::Ordering, fmt, str::FromStr};

use thiserror::Error;

/// Widest fixed-length string attribute a relation may declare.
pub const MAX_STRING_LEN: usize = 255;

/// Scalar type of a relation attribute.
///
/// Each variant owns its coercion rules: how request text becomes a typed
/// [`Value`], and how a value is packed into (and read back from) the fixed
/// byte range an attribute occupies inside a tuple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AttrType {
    Integer,
    Float,
    String,
}

/// Typed scalar decoded from, or destined for, a tuple's byte range.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Value {
    Int(i64),
    Float(f64),
    /// String bytes up to (not including) the first NUL.
    Text(Vec<u8>),
}

/// Comparison operator applied by a single-attribute scan predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CompOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    #[error("{ty} attributes cannot be {width} bytes wide")]
    UnsupportedWidth { ty: AttrType, width: usize },
    #[error("unknown attribute type '{0}'")]
    UnknownType(String),
    #[error("{ty} value cannot be stored as {value:?}")]
    Mismatch { ty: AttrType, value: Value },
    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
}

impl AttrType {
    /// Byte width used when a schema does not name one.
    pub fn default_width(self) -> usize {
        match self {
            AttrType::Integer | AttrType::Float => 4,
            AttrType::String => 32,
        }
    }

    pub fn check_width(self, width: usize) -> Result<(), TypeError> {
        let ok = match self {
            AttrType::Integer => matches!(width, 1 | 2 | 4 | 8),
            AttrType::Float => matches!(width, 4 | 8),
            AttrType::String => (1..=MAX_STRING_LEN).contains(&width),
        };
        if ok {
            Ok(())
        } else {
            Err(TypeError::UnsupportedWidth { ty: self, width })
        }
    }

    /// Convert raw request bytes into a typed value for an attribute `width` bytes wide.
    ///
    /// Numbers use C-style prefix parsing: leading whitespace and a sign are
    /// accepted, the longest numeric prefix wins, and text without one is 0.
    /// Integers saturate at the bounds of the attribute width. Strings keep
    /// their bytes up to the first NUL, truncated to `width`.
    pub fn parse_text(self, raw: &[u8], width: usize) -> Result<Value, TypeError> {
        self.check_width(width)?;
        match self {
            AttrType::Integer => {
                let text = String::from_utf8_lossy(raw);
                let parsed = parse_int_prefix(&text).unwrap_or_else(|| {
                    tracing::warn!(value = %text, "no integer prefix, coercing to 0");
                    0
                });
                let (min, max) = int_bounds(width);
                Ok(Value::Int(parsed.clamp(min, max)))
            }
            AttrType::Float => {
                let text = String::from_utf8_lossy(raw);
                let parsed = parse_float_prefix(&text).unwrap_or_else(|| {
                    tracing::warn!(value = %text, "no float prefix, coercing to 0");
                    0.0
                });
                // Single-precision attributes compare against the stored f32.
                let parsed = if width == 4 {
                    f64::from(parsed as f32)
                } else {
                    parsed
                };
                Ok(Value::Float(parsed))
            }
            AttrType::String => {
                let raw = until_nul(raw);
                Ok(Value::Text(raw[..raw.len().min(width)].to_vec()))
            }
        }
    }

    /// Pack `value` into `out`, which must be exactly the attribute's width.
    ///
    /// Numbers are little-endian; strings are zero-padded.
    pub fn encode_into(self, value: &Value, out: &mut [u8]) -> Result<(), TypeError> {
        let width = out.len();
        self.check_width(width)?;
        match (self, value) {
            (AttrType::Integer, Value::Int(v)) => {
                let (min, max) = int_bounds(width);
                let v = (*v).clamp(min, max);
                match width {
                    1 => out.copy_from_slice(&(v as i8).to_le_bytes()),
                    2 => out.copy_from_slice(&(v as i16).to_le_bytes()),
                    4 => out.copy_from_slice(&(v as i32).to_le_bytes()),
                    _ => out.copy_from_slice(&v.to_le_bytes()),
                }
            }
            (AttrType::Float, Value::Float(v)) => match width {
                4 => out.copy_from_slice(&(*v as f32).to_le_bytes()),
                _ => out.copy_from_slice(&v.to_le_bytes()),
            },
            (AttrType::String, Value::Text(bytes)) => {
                let n = bytes.len().min(width);
                out[..n].copy_from_slice(&bytes[..n]);
                out[n..].fill(0);
            }
            (ty, value) => {
                return Err(TypeError::Mismatch {
                    ty,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    /// Parse request text and pack it straight into the attribute's byte range.
    pub fn coerce_into(self, raw: &[u8], out: &mut [u8]) -> Result<(), TypeError> {
        let value = self.parse_text(raw, out.len())?;
        self.encode_into(&value, out)
    }

    /// Read a typed value back out of an attribute's byte range.
    pub fn decode(self, bytes: &[u8]) -> Result<Value, TypeError> {
        let width = bytes.len();
        self.check_width(width)?;
        let value = match self {
            AttrType::Integer => Value::Int(match width {
                1 => i8::from_le_bytes([bytes[0]]) as i64,
                2 => i16::from_le_bytes(fixed(bytes)?) as i64,
                4 => i32::from_le_bytes(fixed(bytes)?) as i64,
                _ => i64::from_le_bytes(fixed(bytes)?),
            }),
            AttrType::Float => Value::Float(match width {
                4 => f32::from_le_bytes(fixed(bytes)?) as f64,
                _ => f64::from_le_bytes(fixed(bytes)?),
            }),
            AttrType::String => Value::Text(until_nul(bytes).to_vec()),
        };
        Ok(value)
    }

    /// Map the numeric type codes used by legacy callers.
    pub fn from_code(code: i32) -> Result<Self, TypeError> {
        match code {
            0 => Ok(AttrType::String),
            1 => Ok(AttrType::Integer),
            2 => Ok(AttrType::Float),
            other => Err(TypeError::UnknownType(other.to_string())),
        }
    }
}

impl FromStr for AttrType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "integer" | "int" | "i" => Ok(AttrType::Integer),
            "float" | "f" => Ok(AttrType::Float),
            "string" | "str" | "s" => Ok(AttrType::String),
            _ => Err(TypeError::UnknownType(s.to_string())),
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttrType::Integer => "INTEGER",
            AttrType::Float => "FLOAT",
            AttrType::String => "STRING",
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn text(s: &str) -> Self {
        Value::Text(s.as_bytes().to_vec())
    }

    pub fn cmp_same_type(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
        }
    }
}

impl CompOp {
    /// True when `ordering` (field compared to the predicate value) satisfies the operator.
    pub fn matches(self, ordering: Ordering) -> bool {
        match self {
            CompOp::Eq => ordering == Ordering::Equal,
            CompOp::Ne => ordering != Ordering::Equal,
            CompOp::Lt => ordering == Ordering::Less,
            CompOp::Lte => ordering != Ordering::Greater,
            CompOp::Gt => ordering == Ordering::Greater,
            CompOp::Gte => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for CompOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CompOp::Eq => "=",
            CompOp::Ne => "<>",
            CompOp::Lt => "<",
            CompOp::Lte => "<=",
            CompOp::Gt => ">",
            CompOp::Gte => ">=",
        };
        f.write_str(symbol)
    }
}

fn int_bounds(width: usize) -> (i64, i64) {
    match width {
        1 => (i8::MIN as i64, i8::MAX as i64),
        2 => (i16::MIN as i64, i16::MAX as i64),
        4 => (i32::MIN as i64, i32::MAX as i64),
        _ => (i64::MIN, i64::MAX),
    }
}

fn fixed<const N: usize>(bytes: &[u8]) -> Result<[u8; N], TypeError> {
    bytes.try_into().map_err(|_| TypeError::Length {
        expected: N,
        actual: bytes.len(),
    })
}

fn until_nul(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}

fn sign_and_rest(text: &str) -> (bool, &str) {
    let text = text.trim_start();
    match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    }
}

fn digit_run(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

fn parse_int_prefix(text: &str) -> Option<i64> {
    let (negative, rest) = sign_and_rest(text);
    let digits = &rest.as_bytes()[..digit_run(rest.as_bytes())];
    if digits.is_empty() {
        return None;
    }
    let mut acc: i64 = 0;
    for &d in digits {
        let d = i64::from(d - b'0');
        acc = acc.saturating_mul(10);
        acc = if negative {
            acc.saturating_sub(d)
        } else {
            acc.saturating_add(d)
        };
    }
    Some(acc)
}

fn parse_float_prefix(text: &str) -> Option<f64> {
    let start = text.len() - text.trim_start().len();
    let text = &text[start..];
    let bytes = text.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'-' | b'+')));

    let int_digits = digit_run(&bytes[end..]);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digit_run(&bytes[end + 1..]);
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'-' | b'+')) {
            exp_end += 1;
        }
        let exp_digits = digit_run(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }
    text[..end].parse().ok()
}
