//! Core data types for DVID volumes

use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Element types a DVID volume channel can hold
///
/// Serialized with the numpy-style names DVID uses in its schema documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    #[serde(rename = "uint8")]
    U8,
    #[serde(rename = "uint16")]
    U16,
    #[serde(rename = "uint32")]
    U32,
    #[serde(rename = "uint64")]
    U64,
    #[serde(rename = "int8")]
    I8,
    #[serde(rename = "int16")]
    I16,
    #[serde(rename = "int32")]
    I32,
    #[serde(rename = "int64")]
    I64,
    #[serde(rename = "float32")]
    F32,
    #[serde(rename = "float64")]
    F64,
}

impl DataType {
    /// Size in bytes of this data type
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DataType::U8 | DataType::I8 => 1,
            DataType::U16 | DataType::I16 => 2,
            DataType::U32 | DataType::I32 | DataType::F32 => 4,
            DataType::U64 | DataType::I64 | DataType::F64 => 8,
        }
    }

    /// Name used on the wire, e.g. `"uint8"`
    pub fn name(&self) -> &'static str {
        match self {
            DataType::U8 => "uint8",
            DataType::U16 => "uint16",
            DataType::U32 => "uint32",
            DataType::U64 => "uint64",
            DataType::I8 => "int8",
            DataType::I16 => "int16",
            DataType::I32 => "int32",
            DataType::I64 => "int64",
            DataType::F32 => "float32",
            DataType::F64 => "float64",
        }
    }

    /// Parse a wire name back into a data type
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "uint8" => Some(DataType::U8),
            "uint16" => Some(DataType::U16),
            "uint32" => Some(DataType::U32),
            "uint64" => Some(DataType::U64),
            "int8" => Some(DataType::I8),
            "int16" => Some(DataType::I16),
            "int32" => Some(DataType::I32),
            "int64" => Some(DataType::I64),
            "float32" => Some(DataType::F32),
            "float64" => Some(DataType::F64),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A Rust scalar that can live in a volume channel.
///
/// DVID streams are little-endian regardless of host byte order.
pub trait Element: Copy + Send + Sync + Zero + fmt::Debug + 'static {
    /// The wire type this scalar corresponds to
    const DATA_TYPE: DataType;

    /// Read one value from exactly `DATA_TYPE.size_in_bytes()` bytes
    fn read_le(bytes: &[u8]) -> Self;

    /// Append the little-endian encoding of `self`
    fn write_le(self, out: &mut Vec<u8>);
}

macro_rules! impl_element {
    ($($ty:ty => $data_type:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DATA_TYPE: DataType = DataType::$data_type;

                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }

                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_element!(
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
);

/// One spatial axis as described by the `Axes` list of a schema document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AxisDescriptor {
    /// Axis name, e.g. "X"
    pub label: String,
    /// Physical size of one voxel along this axis
    #[serde(default)]
    pub resolution: f64,
    /// Unit of `resolution`, e.g. "nanometers"
    #[serde(default)]
    pub units: String,
    /// Number of voxels along this axis
    pub size: usize,
    /// Fields this client does not interpret, kept for round trips
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AxisDescriptor {
    /// Create a new axis descriptor
    pub fn new(
        label: impl Into<String>,
        size: usize,
        resolution: f64,
        units: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            resolution,
            units: units.into(),
            size,
            extra: serde_json::Map::new(),
        }
    }

    /// Key used in axis orders: the lower-cased label
    pub fn key(&self) -> String {
        self.label.to_lowercase()
    }

    /// Physical extent of the whole axis
    pub fn physical_extent(&self) -> f64 {
        self.resolution * self.size as f64
    }
}

/// One channel as described by the `Values` list of a schema document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChannelDescriptor {
    pub data_type: DataType,
    #[serde(default)]
    pub label: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ChannelDescriptor {
    pub fn new(data_type: DataType, label: impl Into<String>) -> Self {
        Self {
            data_type,
            label: label.into(),
            extra: serde_json::Map::new(),
        }
    }
}
