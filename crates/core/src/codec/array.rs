//! Dense n-dimensional arrays carried as raw little-endian bytes.

use std::fmt;

use crate::error::CodecError;

/// Element type of an [`NdArray`]: byte width plus signed/unsigned/float class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Bool,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
}

impl DType {
    /// Canonical dtype name, as written on the wire.
    pub fn name(self) -> &'static str {
        match self {
            DType::Bool => "bool",
            DType::Int8 => "int8",
            DType::UInt8 => "uint8",
            DType::Int16 => "int16",
            DType::UInt16 => "uint16",
            DType::Int32 => "int32",
            DType::UInt32 => "uint32",
            DType::Int64 => "int64",
            DType::UInt64 => "uint64",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
        }
    }

    /// Size of one element in bytes.
    pub fn itemsize(self) -> usize {
        match self {
            DType::Bool | DType::Int8 | DType::UInt8 => 1,
            DType::Int16 | DType::UInt16 => 2,
            DType::Int32 | DType::UInt32 | DType::Float32 => 4,
            DType::Int64 | DType::UInt64 | DType::Float64 => 8,
        }
    }

    /// Parse a canonical name or a little-endian/native typestr
    /// (`<i2`, `|u1`, `=f8`, `i4`).
    ///
    /// Big-endian typestrs are rejected since element bytes are always
    /// little-endian.
    pub fn parse(value: &str) -> Option<DType> {
        let by_name = match value {
            "bool" => Some(DType::Bool),
            "int8" => Some(DType::Int8),
            "uint8" => Some(DType::UInt8),
            "int16" => Some(DType::Int16),
            "uint16" => Some(DType::UInt16),
            "int32" => Some(DType::Int32),
            "uint32" => Some(DType::UInt32),
            "int64" => Some(DType::Int64),
            "uint64" => Some(DType::UInt64),
            "float32" => Some(DType::Float32),
            "float64" => Some(DType::Float64),
            _ => None,
        };
        if by_name.is_some() {
            return by_name;
        }

        let code = value
            .strip_prefix('<')
            .or_else(|| value.strip_prefix('|'))
            .or_else(|| value.strip_prefix('='))
            .unwrap_or(value);
        match code {
            "b1" | "?" => Some(DType::Bool),
            "i1" => Some(DType::Int8),
            "u1" => Some(DType::UInt8),
            "i2" => Some(DType::Int16),
            "u2" => Some(DType::UInt16),
            "i4" => Some(DType::Int32),
            "u4" => Some(DType::UInt32),
            "i8" => Some(DType::Int64),
            "u8" => Some(DType::UInt64),
            "f4" => Some(DType::Float32),
            "f8" => Some(DType::Float64),
            _ => None,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rust scalar types that map one-to-one onto a [`DType`].
pub trait Element: Copy {
    const DTYPE: DType;

    fn write_le(self, out: &mut Vec<u8>);

    /// `bytes.len()` is always `Self::DTYPE.itemsize()`.
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_element {
    ($($ty:ty => $dtype:ident),+ $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = DType::$dtype;

                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn read_le(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$ty>()];
                    buf.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(buf)
                }
            }
        )+
    };
}

impl_element! {
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
}

impl Element for bool {
    const DTYPE: DType = DType::Bool;

    fn write_le(self, out: &mut Vec<u8>) {
        out.push(u8::from(self));
    }

    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

/// Row-major dense array.
///
/// Invariant: `data.len() == product(shape) * dtype.itemsize()`, and every
/// dimension is positive. An empty shape is a 0-d scalar holding one element.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    shape: Vec<usize>,
    dtype: DType,
    data: Vec<u8>,
}

impl NdArray {
    /// Wrap raw bytes, validating them against `shape` and `dtype`.
    pub fn new(shape: Vec<usize>, dtype: DType, data: Vec<u8>) -> Result<Self, CodecError> {
        let itemsize = dtype.itemsize();
        if data.len() % itemsize != 0 {
            return Err(CodecError::ShapeMismatch(format!(
                "{} bytes is not a multiple of the {dtype} itemsize {itemsize}",
                data.len()
            )));
        }
        let expected = element_count(&shape)?;
        let actual = data.len() / itemsize;
        if actual != expected {
            return Err(CodecError::ShapeMismatch(format!(
                "shape {shape:?} needs {expected} {dtype} elements, got {actual}"
            )));
        }
        Ok(Self { shape, dtype, data })
    }

    /// Build an array from typed elements.
    pub fn from_elements<T: Element>(shape: Vec<usize>, elements: &[T]) -> Result<Self, CodecError> {
        let mut data = Vec::with_capacity(elements.len() * T::DTYPE.itemsize());
        for element in elements {
            element.write_le(&mut data);
        }
        Self::new(shape, T::DTYPE, data)
    }

    /// Read the elements back as `T`. Fails if `T` does not match the dtype.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>, CodecError> {
        if T::DTYPE != self.dtype {
            return Err(CodecError::malformed(
                "ndarray",
                format!("requested {} elements from a {} array", T::DTYPE, self.dtype),
            ));
        }
        Ok(self
            .data
            .chunks_exact(self.dtype.itemsize())
            .map(T::read_le)
            .collect())
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len() / self.dtype.itemsize()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn element_count(shape: &[usize]) -> Result<usize, CodecError> {
    shape.iter().try_fold(1usize, |acc, &dim| {
        if dim == 0 {
            return Err(CodecError::ShapeMismatch(format!(
                "shape {shape:?} has a zero dimension"
            )));
        }
        acc.checked_mul(dim).ok_or_else(|| {
            CodecError::ShapeMismatch(format!("shape {shape:?} overflows the element count"))
        })
    })
}
