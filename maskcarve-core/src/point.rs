//! Point types and scalar attribute values

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// Storage type of one point attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Float,
    Double,
}

impl ScalarKind {
    /// Size of one value in bytes
    pub fn size(self) -> usize {
        match self {
            ScalarKind::Char | ScalarKind::UChar => 1,
            ScalarKind::Short | ScalarKind::UShort => 2,
            ScalarKind::Int | ScalarKind::UInt | ScalarKind::Float => 4,
            ScalarKind::Double => 8,
        }
    }

    /// Decode a value of this kind from native-endian bytes.
    ///
    /// `bytes` must be exactly [`ScalarKind::size`] long.
    pub fn decode(self, bytes: &[u8]) -> ScalarValue {
        use bytemuck::pod_read_unaligned as read;
        match self {
            ScalarKind::Char => ScalarValue::Char(read(bytes)),
            ScalarKind::UChar => ScalarValue::UChar(bytes[0]),
            ScalarKind::Short => ScalarValue::Short(read(bytes)),
            ScalarKind::UShort => ScalarValue::UShort(read(bytes)),
            ScalarKind::Int => ScalarValue::Int(read(bytes)),
            ScalarKind::UInt => ScalarValue::UInt(read(bytes)),
            ScalarKind::Float => ScalarValue::Float(read(bytes)),
            ScalarKind::Double => ScalarValue::Double(read(bytes)),
        }
    }
}

/// One attribute value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScalarValue {
    Char(i8),
    UChar(u8),
    Short(i16),
    UShort(u16),
    Int(i32),
    UInt(u32),
    Float(f32),
    Double(f64),
}

impl ScalarValue {
    pub fn kind(&self) -> ScalarKind {
        match self {
            ScalarValue::Char(_) => ScalarKind::Char,
            ScalarValue::UChar(_) => ScalarKind::UChar,
            ScalarValue::Short(_) => ScalarKind::Short,
            ScalarValue::UShort(_) => ScalarKind::UShort,
            ScalarValue::Int(_) => ScalarKind::Int,
            ScalarValue::UInt(_) => ScalarKind::UInt,
            ScalarValue::Float(_) => ScalarKind::Float,
            ScalarValue::Double(_) => ScalarKind::Double,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            ScalarValue::Char(v) => v as f64,
            ScalarValue::UChar(v) => v as f64,
            ScalarValue::Short(v) => v as f64,
            ScalarValue::UShort(v) => v as f64,
            ScalarValue::Int(v) => v as f64,
            ScalarValue::UInt(v) => v as f64,
            ScalarValue::Float(v) => v as f64,
            ScalarValue::Double(v) => v,
        }
    }

    /// Append the native-endian bytes of this value to `out`
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        use bytemuck::bytes_of;
        match self {
            ScalarValue::Char(v) => out.extend_from_slice(bytes_of(v)),
            ScalarValue::UChar(v) => out.push(*v),
            ScalarValue::Short(v) => out.extend_from_slice(bytes_of(v)),
            ScalarValue::UShort(v) => out.extend_from_slice(bytes_of(v)),
            ScalarValue::Int(v) => out.extend_from_slice(bytes_of(v)),
            ScalarValue::UInt(v) => out.extend_from_slice(bytes_of(v)),
            ScalarValue::Float(v) => out.extend_from_slice(bytes_of(v)),
            ScalarValue::Double(v) => out.extend_from_slice(bytes_of(v)),
        }
    }
}
