//! Subvolume geometry: the rectangular region a read or write addresses

use crate::error::{DvidError, Result};
use crate::metadata::VolumeMetadata;
use std::ops::Range;

/// A rectangular region in client order, `start` inclusive, `stop` exclusive
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subvolume {
    start: Vec<usize>,
    stop: Vec<usize>,
}

impl Subvolume {
    pub fn new(start: impl Into<Vec<usize>>, stop: impl Into<Vec<usize>>) -> Self {
        Self {
            start: start.into(),
            stop: stop.into(),
        }
    }

    /// The whole volume
    pub fn full(metadata: &VolumeMetadata) -> Self {
        Self::new(vec![0; metadata.ndim()], metadata.shape().to_vec())
    }

    pub fn start(&self) -> &[usize] {
        &self.start
    }

    pub fn stop(&self) -> &[usize] {
        &self.stop
    }

    /// Check `0 <= start < stop <= shape` on every axis
    pub fn validate(&self, shape: &[usize]) -> Result<()> {
        if self.start.len() != shape.len() || self.stop.len() != shape.len() {
            return Err(DvidError::InvalidRange(format!(
                "start/stop/shape mismatch: {:?}/{:?}/{:?}",
                self.start, self.stop, shape
            )));
        }
        for axis in 0..shape.len() {
            if self.start[axis] >= self.stop[axis] {
                return Err(DvidError::InvalidRange(format!(
                    "invalid start/stop: {:?}/{:?}",
                    self.start, self.stop
                )));
            }
            if self.stop[axis] > shape[axis] {
                return Err(DvidError::InvalidRange(format!(
                    "invalid stop/shape: {:?}/{:?}",
                    self.stop, shape
                )));
            }
        }
        Ok(())
    }

    /// Extent along every axis
    pub fn shape(&self) -> Vec<usize> {
        self.start
            .iter()
            .zip(&self.stop)
            .map(|(start, stop)| stop - start)
            .collect()
    }

    /// Shape of the region with the channel axis widened to every channel,
    /// which is what the server sends back for it.
    pub fn full_channel_shape(&self, metadata: &VolumeMetadata) -> Vec<usize> {
        let mut shape = self.shape();
        shape[metadata.channel_client_index()] = metadata.channel_count();
        shape
    }

    pub fn channel_range(&self, metadata: &VolumeMetadata) -> Range<usize> {
        let c = metadata.channel_client_index();
        self.start[c]..self.stop[c]
    }

    /// Whether the region covers `[0, channel_count)` on the channel axis
    pub fn covers_all_channels(&self, metadata: &VolumeMetadata) -> bool {
        self.channel_range(metadata) == (0..metadata.channel_count())
    }

    /// Number of voxels, channels included
    pub fn num_elements(&self) -> usize {
        self.shape().iter().product()
    }
}
