use std::fmt;

use crate::error::WireError;

/// Byte order marker of an element type, numpy-style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
    /// Single-byte types have no meaningful order and use `|`.
    NotApplicable,
}

/// Element kind of an array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DtypeKind {
    Int,
    Uint,
    Float,
}

impl DtypeKind {
    fn code(self) -> char {
        match self {
            DtypeKind::Int => 'i',
            DtypeKind::Uint => 'u',
            DtypeKind::Float => 'f',
        }
    }
}

/// Element-type descriptor carried on the wire as a short UTF-8 string such
/// as `<i8`, `<f4` or `|u1`: byte order, kind, width in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dtype {
    order: ByteOrder,
    kind: DtypeKind,
    width: usize,
}

impl Dtype {
    /// Little-endian signed 64-bit integer (`<i8`).
    pub const INT64: Dtype = Dtype {
        order: ByteOrder::Little,
        kind: DtypeKind::Int,
        width: 8,
    };

    /// Little-endian 32-bit float (`<f4`).
    pub const FLOAT32: Dtype = Dtype {
        order: ByteOrder::Little,
        kind: DtypeKind::Float,
        width: 4,
    };

    /// Unsigned byte (`|u1`), the element type of raw RGB images.
    pub const UINT8: Dtype = Dtype {
        order: ByteOrder::NotApplicable,
        kind: DtypeKind::Uint,
        width: 1,
    };

    /// Parse a descriptor string received from the wire.
    pub fn parse(descriptor: &str) -> Result<Self, WireError> {
        let mut chars = descriptor.chars();
        let order = match chars.next() {
            Some('<') => ByteOrder::Little,
            Some('>') => ByteOrder::Big,
            Some('|') => ByteOrder::NotApplicable,
            // Native order on every platform this protocol targets.
            Some('=') => ByteOrder::Little,
            _ => {
                return Err(WireError::protocol(format!(
                    "unparseable dtype descriptor {descriptor:?}"
                )))
            }
        };
        let kind = match chars.next() {
            Some('i') => DtypeKind::Int,
            Some('u') => DtypeKind::Uint,
            Some('f') => DtypeKind::Float,
            _ => {
                return Err(WireError::protocol(format!(
                    "unsupported dtype kind in {descriptor:?}"
                )))
            }
        };
        let width: usize = chars.as_str().parse().map_err(|_| {
            WireError::protocol(format!("bad dtype width in {descriptor:?}"))
        })?;
        let valid = match kind {
            DtypeKind::Float => matches!(width, 4 | 8),
            _ => matches!(width, 1 | 2 | 4 | 8),
        };
        if !valid {
            return Err(WireError::protocol(format!(
                "unsupported dtype width in {descriptor:?}"
            )));
        }
        // Normalise: single-byte types carry no byte order.
        let order = if width == 1 {
            ByteOrder::NotApplicable
        } else {
            order
        };
        Ok(Dtype { order, kind, width })
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn kind(&self) -> DtypeKind {
        self.kind
    }

    /// Element width in bytes.
    pub fn width(&self) -> usize {
        self.width
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let order = match self.order {
            ByteOrder::Little => '<',
            ByteOrder::Big => '>',
            ByteOrder::NotApplicable => '|',
        };
        write!(f, "{order}{}{}", self.kind.code(), self.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_descriptors() {
        assert_eq!(Dtype::parse("<i8").unwrap(), Dtype::INT64);
        assert_eq!(Dtype::parse("<f4").unwrap(), Dtype::FLOAT32);
        assert_eq!(Dtype::parse("|u1").unwrap(), Dtype::UINT8);
        assert_eq!(Dtype::INT64.kind(), DtypeKind::Int);
        assert_eq!(Dtype::FLOAT32.kind(), DtypeKind::Float);
    }

    #[test]
    fn native_order_normalises_to_little() {
        let dt = Dtype::parse("=i8").unwrap();
        assert_eq!(dt, Dtype::INT64);
        assert_eq!(dt.to_string(), "<i8");
    }

    #[test]
    fn single_byte_order_is_not_applicable() {
        let dt = Dtype::parse("<u1").unwrap();
        assert_eq!(dt.order(), ByteOrder::NotApplicable);
        assert_eq!(dt.to_string(), "|u1");
    }

    #[test]
    fn display_round_trips() {
        for s in ["<i8", "<i4", ">u2", "<f8", "|u1"] {
            assert_eq!(Dtype::parse(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn rejects_malformed_descriptors() {
        for s in ["", "i8", "<x4", "<f3", "<i16", "<f", "?u1"] {
            assert!(Dtype::parse(s).is_err(), "accepted {s:?}");
        }
    }
}
