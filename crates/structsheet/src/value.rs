//! Cell values and the traits that move record fields in and out of them.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;

/// Target type of a column's cells.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CellKind {
    Text,
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Optional(Box<CellKind>),
    List(Box<CellKind>),
    /// A field type with no conversion; reading into it always fails.
    Unsupported(&'static str),
}

impl CellKind {
    pub fn is_list(&self) -> bool {
        match self {
            CellKind::List(_) => true,
            CellKind::Optional(inner) => inner.is_list(),
            _ => false,
        }
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellKind::Text => f.write_str("text"),
            CellKind::Bool => f.write_str("bool"),
            CellKind::I8 => f.write_str("i8"),
            CellKind::I16 => f.write_str("i16"),
            CellKind::I32 => f.write_str("i32"),
            CellKind::I64 => f.write_str("i64"),
            CellKind::U8 => f.write_str("u8"),
            CellKind::U16 => f.write_str("u16"),
            CellKind::U32 => f.write_str("u32"),
            CellKind::U64 => f.write_str("u64"),
            CellKind::F32 => f.write_str("f32"),
            CellKind::F64 => f.write_str("f64"),
            CellKind::Optional(inner) => write!(f, "optional {inner}"),
            CellKind::List(inner) => write!(f, "list of {inner}"),
            CellKind::Unsupported(name) => f.write_str(name),
        }
    }
}

/// A logical cell value, independent of any file format.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    /// Absent value (`None`); written as a blank cell.
    Empty,
    Text(String),
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    List(Vec<CellValue>),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Natural text form; list items are joined with `sep`.
    pub fn to_text(&self, sep: &str) -> String {
        match self {
            CellValue::List(items) => items
                .iter()
                .map(|item| item.to_text(sep))
                .collect::<Vec<_>>()
                .join(sep),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::UInt(u) => write!(f, "{u}"),
            CellValue::Float(x) => write!(f, "{x}"),
            CellValue::List(_) => f.write_str(&self.to_text(",")),
        }
    }
}

/// What a record hands the writer for one field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Scalar(CellValue),
    Map(Vec<(String, CellValue)>),
}

impl FieldValue {
    /// `None` scalars and empty maps count as absent for `allowempty`.
    pub fn is_absent(&self) -> bool {
        match self {
            FieldValue::Scalar(v) => v.is_empty(),
            FieldValue::Map(entries) => entries.is_empty(),
        }
    }
}

/// A field type that occupies one cell.
pub trait CellType: Sized {
    fn kind() -> CellKind;
    fn to_cell(&self) -> CellValue;
    /// Accepts the value produced by coercing to [`CellType::kind`].
    fn from_cell(value: CellValue) -> Option<Self>;
}

impl CellType for String {
    fn kind() -> CellKind {
        CellKind::Text
    }

    fn to_cell(&self) -> CellValue {
        CellValue::Text(self.clone())
    }

    fn from_cell(value: CellValue) -> Option<Self> {
        match value {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl CellType for bool {
    fn kind() -> CellKind {
        CellKind::Bool
    }

    fn to_cell(&self) -> CellValue {
        CellValue::Bool(*self)
    }

    fn from_cell(value: CellValue) -> Option<Self> {
        match value {
            CellValue::Bool(b) => Some(b),
            _ => None,
        }
    }
}

macro_rules! signed_cell {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl CellType for $ty {
            fn kind() -> CellKind {
                CellKind::$kind
            }

            fn to_cell(&self) -> CellValue {
                CellValue::Int(*self as i64)
            }

            fn from_cell(value: CellValue) -> Option<Self> {
                match value {
                    CellValue::Int(i) => <$ty>::try_from(i).ok(),
                    _ => None,
                }
            }
        }
    )*};
}

macro_rules! unsigned_cell {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl CellType for $ty {
            fn kind() -> CellKind {
                CellKind::$kind
            }

            fn to_cell(&self) -> CellValue {
                CellValue::UInt(*self as u64)
            }

            fn from_cell(value: CellValue) -> Option<Self> {
                match value {
                    CellValue::UInt(u) => <$ty>::try_from(u).ok(),
                    _ => None,
                }
            }
        }
    )*};
}

signed_cell!(i8 => I8, i16 => I16, i32 => I32, i64 => I64);
unsigned_cell!(u8 => U8, u16 => U16, u32 => U32, u64 => U64);

impl CellType for f32 {
    fn kind() -> CellKind {
        CellKind::F32
    }

    fn to_cell(&self) -> CellValue {
        CellValue::Float(f64::from(*self))
    }

    fn from_cell(value: CellValue) -> Option<Self> {
        match value {
            CellValue::Float(x) => Some(x as f32),
            _ => None,
        }
    }
}

impl CellType for f64 {
    fn kind() -> CellKind {
        CellKind::F64
    }

    fn to_cell(&self) -> CellValue {
        CellValue::Float(*self)
    }

    fn from_cell(value: CellValue) -> Option<Self> {
        match value {
            CellValue::Float(x) => Some(x),
            _ => None,
        }
    }
}

impl<T: CellType> CellType for Option<T> {
    fn kind() -> CellKind {
        CellKind::Optional(Box::new(T::kind()))
    }

    fn to_cell(&self) -> CellValue {
        match self {
            Some(v) => v.to_cell(),
            None => CellValue::Empty,
        }
    }

    fn from_cell(value: CellValue) -> Option<Self> {
        match value {
            CellValue::Empty => Some(None),
            other => T::from_cell(other).map(Some),
        }
    }
}

impl<T: CellType> CellType for Vec<T> {
    fn kind() -> CellKind {
        CellKind::List(Box::new(T::kind()))
    }

    fn to_cell(&self) -> CellValue {
        CellValue::List(self.iter().map(CellType::to_cell).collect())
    }

    fn from_cell(value: CellValue) -> Option<Self> {
        match value {
            CellValue::List(items) => items.into_iter().map(T::from_cell).collect(),
            _ => None,
        }
    }
}

/// A map-valued field whose keys become expand columns.
pub trait CellMap {
    fn value_kind() -> CellKind;
    fn cell_entries(&self) -> Vec<(String, CellValue)>;
    /// Insert one converted cell under `key`; false if the value is rejected.
    fn insert_cell(&mut self, key: &str, value: CellValue) -> bool;
}

impl<V: CellType, S: BuildHasher> CellMap for HashMap<String, V, S> {
    fn value_kind() -> CellKind {
        V::kind()
    }

    fn cell_entries(&self) -> Vec<(String, CellValue)> {
        self.iter().map(|(k, v)| (k.clone(), v.to_cell())).collect()
    }

    fn insert_cell(&mut self, key: &str, value: CellValue) -> bool {
        match V::from_cell(value) {
            Some(v) => {
                self.insert(key.to_string(), v);
                true
            }
            None => false,
        }
    }
}

impl<V: CellType> CellMap for BTreeMap<String, V> {
    fn value_kind() -> CellKind {
        V::kind()
    }

    fn cell_entries(&self) -> Vec<(String, CellValue)> {
        self.iter().map(|(k, v)| (k.clone(), v.to_cell())).collect()
    }

    fn insert_cell(&mut self, key: &str, value: CellValue) -> bool {
        match V::from_cell(value) {
            Some(v) => {
                self.insert(key.to_string(), v);
                true
            }
            None => false,
        }
    }
}
