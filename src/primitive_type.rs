//! Primitive JSON types as referenced by the `type` keyword.
use crate::numeric;
use serde_json::Value;
use std::{convert::TryFrom, fmt, ops::BitOrAssign};

/// A JSON type name that may appear in the `type` keyword.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum PrimitiveType {
    Array,
    Boolean,
    Integer,
    Null,
    Number,
    Object,
    String,
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveType::Array => f.write_str("array"),
            PrimitiveType::Boolean => f.write_str("boolean"),
            PrimitiveType::Integer => f.write_str("integer"),
            PrimitiveType::Null => f.write_str("null"),
            PrimitiveType::Number => f.write_str("number"),
            PrimitiveType::Object => f.write_str("object"),
            PrimitiveType::String => f.write_str("string"),
        }
    }
}

impl TryFrom<&str> for PrimitiveType {
    type Error = ();

    #[inline]
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "array" => Ok(PrimitiveType::Array),
            "boolean" => Ok(PrimitiveType::Boolean),
            "integer" => Ok(PrimitiveType::Integer),
            "null" => Ok(PrimitiveType::Null),
            "number" => Ok(PrimitiveType::Number),
            "object" => Ok(PrimitiveType::Object),
            "string" => Ok(PrimitiveType::String),
            _ => Err(()),
        }
    }
}

impl From<&Value> for PrimitiveType {
    fn from(instance: &Value) -> Self {
        match instance {
            Value::Null => PrimitiveType::Null,
            Value::Bool(_) => PrimitiveType::Boolean,
            Value::Number(_) => PrimitiveType::Number,
            Value::String(_) => PrimitiveType::String,
            Value::Array(_) => PrimitiveType::Array,
            Value::Object(_) => PrimitiveType::Object,
        }
    }
}

const fn to_bit(primitive_type: PrimitiveType) -> u8 {
    match primitive_type {
        PrimitiveType::Array => 1,
        PrimitiveType::Boolean => 2,
        PrimitiveType::Integer => 4,
        PrimitiveType::Null => 8,
        PrimitiveType::Number => 16,
        PrimitiveType::Object => 32,
        PrimitiveType::String => 64,
    }
}

fn from_bit(bit: u8) -> PrimitiveType {
    match bit {
        1 => PrimitiveType::Array,
        2 => PrimitiveType::Boolean,
        4 => PrimitiveType::Integer,
        8 => PrimitiveType::Null,
        16 => PrimitiveType::Number,
        32 => PrimitiveType::Object,
        64 => PrimitiveType::String,
        _ => unreachable!("Invalid bit representation"),
    }
}

/// Compact representation of multiple [`PrimitiveType`] values.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TypeSet {
    inner: u8,
}

impl TypeSet {
    pub(crate) const fn new() -> Self {
        Self { inner: 0 }
    }

    #[inline]
    pub(crate) const fn add_type(mut self, primitive_type: PrimitiveType) -> Self {
        self.inner |= to_bit(primitive_type);
        self
    }

    pub(crate) const fn contains_type(self, primitive_type: PrimitiveType) -> bool {
        to_bit(primitive_type) & self.inner != 0
    }

    pub(crate) const fn is_empty(self) -> bool {
        self.inner == 0
    }

    /// Whether `instance` matches at least one type in the set.
    ///
    /// `integer` matches any numeric value whose fractional part is zero,
    /// so `1.0` is an integer. `number` matches any numeric value.
    pub(crate) fn matches(self, instance: &Value) -> bool {
        match instance {
            Value::Number(number) => {
                self.contains_type(PrimitiveType::Number)
                    || (self.contains_type(PrimitiveType::Integer) && numeric::is_integer(number))
            }
            _ => self.contains_type(PrimitiveType::from(instance)),
        }
    }
}

impl BitOrAssign<PrimitiveType> for TypeSet {
    #[inline]
    fn bitor_assign(&mut self, rhs: PrimitiveType) {
        *self = self.add_type(rhs);
    }
}

impl IntoIterator for TypeSet {
    type Item = PrimitiveType;
    type IntoIter = TypeSetIterator;
    fn into_iter(self) -> Self::IntoIter {
        TypeSetIterator { set: self }
    }
}

/// Iterator over all [`PrimitiveType`] present in a [`TypeSet`].
#[derive(Debug)]
pub struct TypeSetIterator {
    set: TypeSet,
}

impl Iterator for TypeSetIterator {
    type Item = PrimitiveType;

    fn next(&mut self) -> Option<Self::Item> {
        if self.set.inner == 0 {
            None
        } else {
            let least_significant = self.set.inner & self.set.inner.wrapping_neg();
            self.set.inner &= self.set.inner - 1;
            Some(from_bit(least_significant))
        }
    }
}

impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for primitive_type in self.into_iter() {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{primitive_type}")?;
        }
        Ok(())
    }
}
