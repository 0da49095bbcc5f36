//! Binary transcoding between arrays and the raw voxel stream

use crate::error::{DvidError, Result};
use crate::metadata::VolumeMetadata;
use crate::types::Element;
use bytes::Bytes;
use ndarray::{ArrayBase, ArrayD, Data, Dimension, IxDyn};
use num_traits::Zero;
use std::io::{ErrorKind, Read, Write};
use std::sync::Arc;

/// Content type of uploaded voxel payloads
pub const VOLUME_MIMETYPE: &str = "application/octet-stream";

/// Bytes handed to the sink per `write_all` call
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Transcoder bound to one volume's metadata.
///
/// Arrays on the caller's side are indexed in client order; the byte stream is
/// laid out in storage order, channel varying fastest.
#[derive(Debug, Clone)]
pub struct VolumeCodec {
    metadata: Arc<VolumeMetadata>,
}

impl VolumeCodec {
    /// Content type of uploaded voxel payloads
    pub const VOLUME_MIMETYPE: &'static str = VOLUME_MIMETYPE;

    pub fn new(metadata: Arc<VolumeMetadata>) -> Self {
        Self { metadata }
    }

    pub fn metadata(&self) -> &VolumeMetadata {
        &self.metadata
    }

    /// Number of bytes in a stream holding an array of `shape`
    pub fn buffer_len(&self, shape: &[usize]) -> usize {
        shape.iter().product::<usize>() * self.metadata.data_type().size_in_bytes()
    }

    /// Read exactly the bytes for `full_shape` (client order, all channels)
    /// from `stream` and return them as an array in client order.
    ///
    /// The stream is not read past the expected length.
    pub fn decode<T: Element, R: Read + ?Sized>(
        &self,
        stream: &mut R,
        full_shape: &[usize],
    ) -> Result<ArrayD<T>> {
        self.check_element::<T>()?;
        let order = self.metadata.axis_order();
        if full_shape.len() != order.ndim() {
            return Err(DvidError::InvalidRange(format!(
                "expected {} axes, got shape {:?}",
                order.ndim(),
                full_shape
            )));
        }

        let expected = self.buffer_len(full_shape);
        let mut buf = vec![0u8; expected];
        let mut received = 0;
        while received < expected {
            match stream.read(&mut buf[received..]) {
                Ok(0) => break,
                Ok(n) => received += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        if received < expected {
            return Err(DvidError::Decode { expected, received });
        }

        let element_size = self.metadata.data_type().size_in_bytes();
        let mut values = vec![T::zero(); expected / element_size];
        for (value, raw) in values.iter_mut().zip(buf.chunks_exact(element_size)) {
            *value = T::read_le(raw);
        }

        // Row-major over the reversed storage shape is the same memory as
        // column-major over the storage shape.
        let mut c_order_shape = order.to_storage(full_shape);
        c_order_shape.reverse();
        let array = ArrayD::from_shape_vec(IxDyn(&c_order_shape), values)
            .map_err(|e| DvidError::Protocol(e.to_string()))?;
        Ok(array
            .reversed_axes()
            .permuted_axes(order.client_to_storage()))
    }

    /// Write `array` (client order, all channels) to `sink` in storage order.
    pub fn encode<T, S, D, W>(&self, sink: &mut W, array: &ArrayBase<S, D>) -> Result<()>
    where
        T: Element,
        S: Data<Elem = T>,
        D: Dimension,
        W: Write + ?Sized,
    {
        let bytes = self.encode_to_vec(array)?;
        for chunk in bytes.chunks(STREAM_CHUNK_SIZE) {
            sink.write_all(chunk)?;
        }
        Ok(())
    }

    /// Encode `array` into an owned payload
    pub fn encode_to_bytes<T, S, D>(&self, array: &ArrayBase<S, D>) -> Result<Bytes>
    where
        T: Element,
        S: Data<Elem = T>,
        D: Dimension,
    {
        self.encode_to_vec(array).map(Bytes::from)
    }

    fn encode_to_vec<T, S, D>(&self, array: &ArrayBase<S, D>) -> Result<Vec<u8>>
    where
        T: Element,
        S: Data<Elem = T>,
        D: Dimension,
    {
        self.check_element::<T>()?;
        let order = self.metadata.axis_order();
        if array.ndim() != order.ndim() {
            return Err(DvidError::Encode(format!(
                "array has {} axes, volume has {} ({})",
                array.ndim(),
                order.ndim(),
                order.client_key_string()
            )));
        }
        let channels = array.shape()[order.channel_client_index()];
        if channels != self.metadata.channel_count() {
            return Err(DvidError::Encode(format!(
                "array has {} channels, volume has {}",
                channels,
                self.metadata.channel_count()
            )));
        }

        let storage_view = array
            .view()
            .into_dyn()
            .permuted_axes(order.storage_to_client())
            .reversed_axes();

        let mut out = Vec::with_capacity(self.buffer_len(array.shape()));
        for &value in storage_view.iter() {
            value.write_le(&mut out);
        }
        Ok(out)
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
}
