//! Volume access - main API for reading/writing one remote DVID volume

use crate::codec::{VolumeCodec, VOLUME_MIMETYPE};
use crate::error::{DvidError, Result};
use crate::io::{Connection, Request};
use crate::layout::Subvolume;
use crate::metadata::VolumeMetadata;
use crate::rest;
use crate::types::Element;
use crate::utils::format_bytes;
use ndarray::{ArrayBase, ArrayD, Axis, Data, Dimension, Slice};
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

#[cfg(feature = "http-client")]
use crate::{config::ClientConfig, general, io::HttpConnection};

/// Client over plain HTTP, the usual way to talk to a DVID server
#[cfg(feature = "http-client")]
pub type HttpVolumeClient = VolumeClient<HttpConnection>;

/// The connection plus what we know about its state
struct Channel<C> {
    connection: C,
    /// Set once a response didn't carry the byte count we expected
    faulted: bool,
}

/// Reads and writes subvolumes of one volume over one connection.
///
/// The client is `Sync`: any number of threads may call
/// [`retrieve_subvolume`](Self::retrieve_subvolume) and
/// [`modify_subvolume`](Self::modify_subvolume) concurrently. Requests are
/// serialized; each one holds the connection from the moment it is sent until
/// its response has been read to the end.
pub struct VolumeClient<C: Connection> {
    node_id: String,
    data_name: String,
    api_root: String,

    /// Volume metadata, fetched once at construction
    metadata: Arc<VolumeMetadata>,
    codec: VolumeCodec,

    channel: Mutex<Channel<C>>,
}

impl<C: Connection> VolumeClient<C> {
    /// Fetch the schema of `node_id/data_name` over `connection` and keep the
    /// connection for later reads and writes.
    pub fn with_connection(
        mut connection: C,
        node_id: &str,
        data_name: &str,
        api_root: &str,
    ) -> Result<Self> {
        let path = rest::schema_path(api_root, node_id, data_name);
        log::debug!("GET {}", path);
        let metadata = {
            let mut response = connection.send(Request::get(&path))?;
            if response.status != 200 {
                return Err(response.into_error("metadata query"));
            }
            VolumeMetadata::from_schema(&response.read_body()?)?
        };
        log::info!(
            "opened volume {}/{}: {:?} {} ({})",
            node_id,
            data_name,
            metadata.shape(),
            metadata.data_type(),
            format_bytes(metadata.total_size_bytes())
        );

        let metadata = Arc::new(metadata);
        Ok(Self {
            node_id: node_id.to_string(),
            data_name: data_name.to_string(),
            api_root: api_root.to_string(),
            codec: VolumeCodec::new(Arc::clone(&metadata)),
            metadata,
            channel: Mutex::new(Channel {
                connection,
                faulted: false,
            }),
        })
    }

    /// The same client, indexed in a different axis order (e.g. `"xyzc"`).
    ///
    /// See [`VolumeMetadata::with_client_order`].
    pub fn into_client_order(self, axis_keys: &str) -> Result<Self> {
        let metadata = Arc::new(self.metadata.with_client_order(axis_keys)?);
        Ok(Self {
            codec: VolumeCodec::new(Arc::clone(&metadata)),
            metadata,
            ..self
        })
    }

    /// Get the volume metadata
    pub fn metadata(&self) -> &VolumeMetadata {
        &self.metadata
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn data_name(&self) -> &str {
        &self.data_name
    }

    /// Whether an earlier response left the connection unusable
    pub fn is_faulted(&self) -> bool {
        self.channel.lock().faulted
    }

    /// Read the region `[start, stop)` (client order).
    ///
    /// The server always sends every channel; the result holds only the
    /// channels in `start[c]..stop[c]`.
    pub fn retrieve_subvolume<T: Element>(&self, start: &[usize], stop: &[usize]) -> Result<ArrayD<T>> {
        let region = Subvolume::new(start, stop);
        region.validate(self.metadata.shape())?;
        self.check_element::<T>()?;

        let path = self.subvolume_path(&region);
        let full_shape = region.full_channel_shape(&self.metadata);
        log::debug!(
            "GET {} ({})",
            path,
            format_bytes(self.codec.buffer_len(&full_shape))
        );

        let data = self.with_channel(|connection| {
            let mut response = connection.send(Request::get(&path))?;
            if response.status != 200 {
                return Err(response.into_error("subvolume query"));
            }
            let data = match self.codec.decode::<T, _>(&mut response, &full_shape) {
                Ok(data) => data,
                Err(DvidError::Decode { expected, received }) => {
                    return Err(DvidError::Protocol(format!(
                        "response shorter than expected: {} of {} bytes",
                        received, expected
                    )))
                }
                Err(e) => return Err(e),
            };
            let residue = io::copy(&mut response, &mut io::sink())?;
            if residue > 0 {
                return Err(DvidError::Protocol(format!(
                    "response longer than expected: {} extra bytes",
                    residue
                )));
            }
            Ok(data)
        })?;

        if region.covers_all_channels(&self.metadata) {
            return Ok(data);
        }
        let channel_axis = Axis(self.metadata.channel_client_index());
        let channels = region.channel_range(&self.metadata);
        Ok(data
            .slice_axis(channel_axis, Slice::from(channels))
            .to_owned())
    }

    /// Overwrite the region `[start, stop)` (client order) with `data`.
    ///
    /// The region must cover every channel and `data` must have its shape.
    pub fn modify_subvolume<T, S, D>(
        &self,
        start: &[usize],
        stop: &[usize],
        data: &ArrayBase<S, D>,
    ) -> Result<()>
    where
        T: Element,
        S: Data<Elem = T>,
        D: Dimension,
    {
        let region = Subvolume::new(start, stop);
        region.validate(self.metadata.shape())?;
        if !region.covers_all_channels(&self.metadata) {
            return Err(DvidError::InvalidRange(format!(
                "modifications must include all channels: channel range {:?} of {}",
                region.channel_range(&self.metadata),
                self.metadata.channel_count()
            )));
        }
        let expected_shape = region.shape();
        if data.shape() != expected_shape.as_slice() {
            return Err(DvidError::Encode(format!(
                "data shape {:?} doesn't match the region {:?}..{:?}",
                data.shape(),
                start,
                stop
            )));
        }

        let payload = self.codec.encode_to_bytes(data)?;
        let path = self.subvolume_path(&region);
        log::debug!("POST {} ({})", path, format_bytes(payload.len()));

        self.with_channel(|connection| {
            let mut response = connection.send(Request::post(path, VOLUME_MIMETYPE, payload))?;
            if response.status != 204 {
                return Err(response.into_error("subvolume post"));
            }
            io::copy(&mut response, &mut io::sink())?;
            Ok(())
        })
    }

    fn subvolume_path(&self, region: &Subvolume) -> String {
        rest::subvolume_path(
            &self.api_root,
            &self.node_id,
            &self.data_name,
            self.metadata.axis_order(),
            region,
        )
    }

    fn check_element<T: Element>(&self) -> Result<()> {
        if T::DATA_TYPE != self.metadata.data_type() {
            return Err(DvidError::DataTypeMismatch {
                expected: self.metadata.data_type(),
                actual: T::DATA_TYPE,
            });
        }
        Ok(())
    }

    /// Run one request/response cycle with exclusive use of the connection.
    ///
    /// The response must be consumed and dropped inside `cycle`.
    fn with_channel<R>(&self, cycle: impl FnOnce(&mut C) -> Result<R>) -> Result<R> {
        let mut channel = self.channel.lock();
        if channel.faulted {
            return Err(DvidError::Protocol(format!(
                "connection for {}/{} is in an unknown state after an earlier protocol error",
                self.node_id, self.data_name
            )));
        }
        let result = cycle(&mut channel.connection);
        if let Err(e) = &result {
            if e.is_protocol_fault() {
                log::warn!("{}/{}: {}", self.node_id, self.data_name, e);
                channel.faulted = true;
            }
        }
        result
    }
}

#[cfg(feature = "http-client")]
impl VolumeClient<HttpConnection> {
    /// Connect to `hostname` (e.g. `localhost:8000`) and open a volume
    pub fn open(hostname: &str, node_id: &str, data_name: &str) -> Result<Self> {
        Self::open_with_config(hostname, node_id, data_name, &ClientConfig::default())
    }

    pub fn open_with_config(
        hostname: &str,
        node_id: &str,
        data_name: &str,
        config: &ClientConfig,
    ) -> Result<Self> {
        let connection = HttpConnection::connect(hostname, config)?;
        Self::with_connection(connection, node_id, data_name, &config.api_root)
    }

    /// Create a new volume on the server, over a connection of its own
    pub fn create_volume(
        hostname: &str,
        node_id: &str,
        data_name: &str,
        metadata: &VolumeMetadata,
    ) -> Result<()> {
        Self::create_volume_with_config(hostname, node_id, data_name, metadata, &ClientConfig::default())
    }

    pub fn create_volume_with_config(
        hostname: &str,
        node_id: &str,
        data_name: &str,
        metadata: &VolumeMetadata,
        config: &ClientConfig,
    ) -> Result<()> {
        let mut connection = HttpConnection::connect(hostname, config)?;
        general::create_volume(&mut connection, &config.api_root, node_id, data_name, metadata)
    }

    /// The server's `/datasets/info` document, over a connection of its own
    pub fn query_datasets_info(hostname: &str) -> Result<serde_json::Value> {
        Self::query_datasets_info_with_config(hostname, &ClientConfig::default())
    }

    pub fn query_datasets_info_with_config(
        hostname: &str,
        config: &ClientConfig,
    ) -> Result<serde_json::Value> {
        let mut connection = HttpConnection::connect(hostname, config)?;
        general::get_datasets_info(&mut connection, &config.api_root)
    }
}
