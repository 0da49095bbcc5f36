//! Volume metadata: shape, element type and axis ordering
//!
//! A DVID schema document lists the spatial `Axes` and one `Values` entry per
//! channel. The byte stream on the wire varies fastest along the channel, then
//! along the axes in document order. That fastest-first sequence is the
//! *storage order*. Callers index arrays in *client order*, which starts out
//! identical to the storage order (`cxyz...`) but may move the channel elsewhere.

use crate::error::{DvidError, Result};
use crate::types::{AxisDescriptor, ChannelDescriptor, DataType};
use serde::{Deserialize, Serialize};

/// Key of the channel axis in every axis order
pub const CHANNEL_KEY: &str = "c";

/// The schema document exchanged with the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(rename = "Axes")]
    pub axes: Vec<AxisDescriptor>,
    #[serde(rename = "Values")]
    pub values: Vec<ChannelDescriptor>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Storage and client orderings of a volume's axes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisOrder {
    storage_keys: Vec<String>,
    client_keys: Vec<String>,
    channel_storage_index: usize,
    channel_client_index: usize,
    /// `storage_to_client[s]` is the client position of storage axis `s`
    storage_to_client: Vec<usize>,
    /// `client_to_storage[c]` is the storage position of client axis `c`
    client_to_storage: Vec<usize>,
}

impl AxisOrder {
    /// Build an order from the storage keys (fastest varying first) and the
    /// keys in the order callers will use.
    pub fn new(storage_keys: Vec<String>, client_keys: Vec<String>) -> Result<Self> {
        if storage_keys.len() != client_keys.len() {
            return Err(DvidError::Schema(format!(
                "axis orders differ in length: {:?} vs {:?}",
                storage_keys, client_keys
            )));
        }
        for keys in [&storage_keys, &client_keys] {
            for (i, key) in keys.iter().enumerate() {
                if keys[..i].contains(key) {
                    return Err(DvidError::Schema(format!("duplicate axis key '{}'", key)));
                }
            }
        }

        let client_to_storage = client_keys
            .iter()
            .map(|key| {
                storage_keys.iter().position(|k| k == key).ok_or_else(|| {
                    DvidError::Schema(format!(
                        "axis '{}' is not one of {:?}",
                        key, storage_keys
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let mut storage_to_client = vec![0; storage_keys.len()];
        for (client, &storage) in client_to_storage.iter().enumerate() {
            storage_to_client[storage] = client;
        }

        let channel_storage_index = storage_keys
            .iter()
            .position(|k| k == CHANNEL_KEY)
            .ok_or_else(|| DvidError::Schema("axis order has no channel axis".to_string()))?;
        let channel_client_index = storage_to_client[channel_storage_index];

        Ok(Self {
            storage_keys,
            client_keys,
            channel_storage_index,
            channel_client_index,
            storage_to_client,
            client_to_storage,
        })
    }

    /// Number of axes, channel included
    pub fn ndim(&self) -> usize {
        self.storage_keys.len()
    }

    pub fn storage_keys(&self) -> &[String] {
        &self.storage_keys
    }

    pub fn client_keys(&self) -> &[String] {
        &self.client_keys
    }

    pub fn channel_storage_index(&self) -> usize {
        self.channel_storage_index
    }

    pub fn channel_client_index(&self) -> usize {
        self.channel_client_index
    }

    pub fn storage_to_client(&self) -> &[usize] {
        &self.storage_to_client
    }

    pub fn client_to_storage(&self) -> &[usize] {
        &self.client_to_storage
    }

    /// Reorder a per-axis vector from client order to storage order
    pub fn to_storage<T: Copy>(&self, client: &[T]) -> Vec<T> {
        self.storage_to_client.iter().map(|&c| client[c]).collect()
    }

    /// Reorder a per-axis vector from storage order to client order
    pub fn to_client<T: Copy>(&self, storage: &[T]) -> Vec<T> {
        self.client_to_storage.iter().map(|&s| storage[s]).collect()
    }

    /// Client keys joined into one string, e.g. `"cxyz"`
    pub fn client_key_string(&self) -> String {
        self.client_keys.concat()
    }
}

/// Complete description of a remote volume
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeMetadata {
    /// Extent of every axis in client order
    shape: Vec<usize>,
    data_type: DataType,
    axis_order: AxisOrder,
    document: SchemaDocument,
}

impl VolumeMetadata {
    /// Parse a schema document as returned by the server
    pub fn from_schema(bytes: &[u8]) -> Result<Self> {
        let document: SchemaDocument =
            serde_json::from_slice(bytes).map_err(|e| DvidError::Schema(e.to_string()))?;
        Self::from_document(document)
    }

    /// Build metadata from an already parsed schema document
    pub fn from_document(document: SchemaDocument) -> Result<Self> {
        if document.axes.is_empty() {
            return Err(DvidError::Schema("schema lists no axes".to_string()));
        }
        let data_type = match document.values.first() {
            Some(channel) => channel.data_type,
            None => return Err(DvidError::Schema("schema lists no channels".to_string())),
        };
        if let Some(other) = document.values.iter().find(|v| v.data_type != data_type) {
            return Err(DvidError::Schema(format!(
                "heterogeneous channel types are not supported: {} and {}",
                data_type, other.data_type
            )));
        }
        if let Some(axis) = document.axes.iter().find(|a| a.size == 0) {
            return Err(DvidError::Schema(format!(
                "axis '{}' has zero size",
                axis.label
            )));
        }

        let mut storage_keys = vec![CHANNEL_KEY.to_string()];
        storage_keys.extend(document.axes.iter().map(AxisDescriptor::key));
        let axis_order = AxisOrder::new(storage_keys.clone(), storage_keys)?;

        let mut shape = vec![document.values.len()];
        shape.extend(document.axes.iter().map(|a| a.size));

        Ok(Self {
            shape,
            data_type,
            axis_order,
            document,
        })
    }

    /// Create metadata from scratch, ready to be customized and sent to
    /// [`create_volume`](crate::general::create_volume).
    ///
    /// `axis_keys` has one character per axis in client order and must
    /// contain exactly one `c`; e.g. `create_default(&[3, 100, 200, 300],
    /// DataType::U8, "cxyz", 1.5, "micrometers")`.
    pub fn create_default(
        shape: &[usize],
        data_type: DataType,
        axis_keys: &str,
        resolution: f64,
        units: &str,
    ) -> Result<Self> {
        let axis_keys = axis_keys.to_lowercase();
        let keys: Vec<String> = axis_keys.chars().map(|c| c.to_string()).collect();
        if keys.len() != shape.len() {
            return Err(DvidError::Schema(format!(
                "shape/axis keys mismatch: {:?} doesn't match '{}'",
                shape, axis_keys
            )));
        }
        if keys.iter().filter(|k| k.as_str() == CHANNEL_KEY).count() != 1 {
            return Err(DvidError::Schema(format!(
                "axis keys '{}' must contain exactly one channel axis 'c'",
                axis_keys
            )));
        }

        let mut channels = 0;
        let mut axes = Vec::with_capacity(shape.len() - 1);
        for (key, &size) in keys.iter().zip(shape) {
            if key == CHANNEL_KEY {
                channels = size;
            } else {
                axes.push(AxisDescriptor::new(key.to_uppercase(), size, resolution, units));
            }
        }
        let values = (0..channels)
            .map(|_| ChannelDescriptor::new(data_type, ""))
            .collect();

        let document = SchemaDocument {
            axes,
            values,
            extra: serde_json::Map::new(),
        };
        Self::from_document(document)?.with_client_order(&axis_keys)
    }

    /// The same volume, indexed by callers in a different axis order.
    ///
    /// Spatial axes must keep their relative schema order; only the channel
    /// axis may move.
    pub fn with_client_order(&self, axis_keys: &str) -> Result<Self> {
        let client_keys: Vec<String> = axis_keys
            .to_lowercase()
            .chars()
            .map(|c| c.to_string())
            .collect();
        let storage_keys = self.axis_order.storage_keys().to_vec();

        let spatial = |keys: &[String]| -> Vec<String> {
            keys.iter()
                .filter(|k| k.as_str() != CHANNEL_KEY)
                .cloned()
                .collect()
        };
        if spatial(&client_keys) != spatial(&storage_keys) {
            return Err(DvidError::Schema(format!(
                "client order '{}' must list the spatial axes as the server does: {:?}",
                axis_keys,
                spatial(&storage_keys)
            )));
        }

        let axis_order = AxisOrder::new(storage_keys, client_keys)?;
        let storage_shape = self.axis_order.to_storage(&self.shape);
        let shape = axis_order.to_client(&storage_shape);

        Ok(Self {
            shape,
            data_type: self.data_type,
            axis_order,
            document: self.document.clone(),
        })
    }

    /// Serialize back to the schema document format
    pub fn to_schema_document(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.document).map_err(|e| DvidError::Schema(e.to_string()))
    }

    /// The server's type name for volumes like this one
    pub fn server_type_token(&self) -> Result<&'static str> {
        let channels = self.channel_count();
        match (self.data_type, channels) {
            (DataType::U8, 1) => Ok("grayscale8"),
            (DataType::U32, 1) => Ok("labels32"),
            (DataType::U64, 1) => Ok("labels64"),
            (DataType::U8, 4) => Ok("rgba8"),
            (data_type, channels) => Err(DvidError::UnsupportedType {
                data_type,
                channels,
            }),
        }
    }

    /// Extent of every axis in client order
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn axis_order(&self) -> &AxisOrder {
        &self.axis_order
    }

    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn channel_count(&self) -> usize {
        self.shape[self.axis_order.channel_client_index()]
    }

    pub fn channel_storage_index(&self) -> usize {
        self.axis_order.channel_storage_index()
    }

    pub fn channel_client_index(&self) -> usize {
        self.axis_order.channel_client_index()
    }

    pub fn channel_labels(&self) -> Vec<&str> {
        self.document.values.iter().map(|v| v.label.as_str()).collect()
    }

    /// Size in bytes of the whole volume
    pub fn total_size_bytes(&self) -> usize {
        self.shape.iter().product::<usize>() * self.data_type.size_in_bytes()
    }
}
