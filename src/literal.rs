//! The literal value domain pooled into ROM (§3) and the direct-encoding primitive (§4.1).

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_FIXNUM, MIN_FIXNUM, MIN_FIXNUM_ENCODING};

/// A literal value as produced by the front-end. Characters are a distinct variant from
/// `SmallInt`/`BigInt` so that the pre-translation step in [`Literal::to_direct_form`] stays
/// explicit, matching §4.1's insistence that characters are not directly encodable until
/// translated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Literal {
    False,
    True,
    Nil,
    SmallInt(i32),
    BigInt(i64),
    Char(char),
    Symbol(String),
    Pair(Box<Literal>, Box<Literal>),
    Str(String),
    Vector(Vec<Literal>),
    ByteVector(Vec<u8>),
}

impl Literal {
    /// Translate characters to their code point, as small or big integers. Every other variant
    /// passes through unchanged. This is the "pre-translation" referred to throughout §4.
    pub fn to_direct_form(&self) -> Literal {
        match self {
            Literal::Char(c) => Literal::from_i64(*c as i64),
            other => other.clone(),
        }
    }

    /// Build the narrowest integer literal for a raw value, used both for code-point translation
    /// and for the recursive `hi`-part pooling of big integers (§4.2).
    pub fn from_i64(n: i64) -> Literal {
        if (MIN_FIXNUM as i64..=MAX_FIXNUM as i64).contains(&n) {
            Literal::SmallInt(n as i32)
        } else {
            Literal::BigInt(n)
        }
    }

    /// `true` if this is an integer literal (small or big), after pre-translation.
    pub fn is_integer(&self) -> bool {
        matches!(self, Literal::SmallInt(_) | Literal::BigInt(_))
    }
}

/// §4.1: `encode_direct`. Returns `Some` for every value that needs no pool entry.
pub fn encode_direct(obj: &Literal) -> Option<u16> {
    let translated = obj.to_direct_form();
    match translated {
        Literal::False => Some(0),
        Literal::True => Some(1),
        Literal::Nil => Some(2),
        Literal::SmallInt(n) if (MIN_FIXNUM..=MAX_FIXNUM).contains(&n) => {
            Some((n - MIN_FIXNUM) as u16 + MIN_FIXNUM_ENCODING)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_and_nil_encode_directly() {
        assert_eq!(encode_direct(&Literal::False), Some(0));
        assert_eq!(encode_direct(&Literal::True), Some(1));
        assert_eq!(encode_direct(&Literal::Nil), Some(2));
    }

    #[test]
    fn fixnum_boundaries() {
        assert_eq!(encode_direct(&Literal::SmallInt(-1)), Some(3));
        assert_eq!(encode_direct(&Literal::SmallInt(0)), Some(4));
        assert_eq!(encode_direct(&Literal::SmallInt(256)), Some(260));
        assert_eq!(encode_direct(&Literal::SmallInt(257)), None);
        assert_eq!(encode_direct(&Literal::SmallInt(-2)), None);
    }

    #[test]
    fn characters_are_translated_before_the_check() {
        assert_eq!(encode_direct(&Literal::Char('\0')), Some(4));
        assert_eq!(
            encode_direct(&Literal::Char('\u{1F600}')),
            None // 128512, far outside the fixnum range
        );
    }

    #[test]
    fn strings_vectors_and_symbols_never_encode_directly() {
        assert_eq!(encode_direct(&Literal::Str("hi".into())), None);
        assert_eq!(encode_direct(&Literal::Symbol("x".into())), None);
        assert_eq!(encode_direct(&Literal::Vector(vec![])), None);
        assert_eq!(encode_direct(&Literal::ByteVector(vec![1, 2])), None);
        assert_eq!(encode_direct(&Literal::BigInt(70_000)), None);
    }
}
