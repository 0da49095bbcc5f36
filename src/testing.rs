//! In-memory stand-ins for a DVID server, used by the unit tests

use crate::codec::VolumeCodec;
use crate::error::{DvidError, Result};
use crate::io::{Connection, Method, Request, Response};
use crate::metadata::VolumeMetadata;
use crate::types::Element;
use ndarray::{ArrayD, Axis, IxDyn, Slice};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// One-shot misbehavior applied to the next cutout request
#[derive(Debug, Clone)]
pub enum Fault {
    /// Send one byte less than the cutout needs
    ShortBody,
    /// Send one byte more than the cutout needs
    ExtraByte,
    /// Answer with this status line and body instead
    Status(u16, &'static str, String),
}

#[derive(Default)]
struct Counters {
    requests: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Response body that counts itself as in flight until dropped
struct TrackedBody {
    inner: Cursor<Vec<u8>>,
    counters: Arc<Counters>,
}

impl TrackedBody {
    fn new(body: Vec<u8>, counters: Arc<Counters>) -> Self {
        let now = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        counters.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self {
            inner: Cursor::new(body),
            counters,
        }
    }
}

impl Read for TrackedBody {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        // Widen the window in which an overlapping request would be seen.
        std::thread::yield_now();
        self.inner.read(buf)
    }
}

impl Drop for TrackedBody {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A single volume served from memory.
///
/// Clones share the volume, counters and fault queue, so a test can keep one
/// handle for inspection while the client owns another.
#[derive(Clone)]
pub struct InMemoryVolume<T: Element> {
    api_root: String,
    node_id: String,
    data_name: String,
    codec: VolumeCodec,
    /// Contents in the metadata's client order
    volume: Arc<Mutex<ArrayD<T>>>,
    counters: Arc<Counters>,
    faults: Arc<Mutex<VecDeque<Fault>>>,
}

impl<T: Element> InMemoryVolume<T> {
    pub fn new(metadata: VolumeMetadata, node_id: &str, data_name: &str) -> Self {
        let volume = ArrayD::zeros(IxDyn(metadata.shape()));
        Self::with_data(metadata, node_id, data_name, volume)
    }

    /// Serve `volume`, which must be indexed in the metadata's client order
    pub fn with_data(
        metadata: VolumeMetadata,
        node_id: &str,
        data_name: &str,
        volume: ArrayD<T>,
    ) -> Self {
        assert_eq!(volume.shape(), metadata.shape());
        Self {
            api_root: "/api".to_string(),
            node_id: node_id.to_string(),
            data_name: data_name.to_string(),
            codec: VolumeCodec::new(Arc::new(metadata)),
            volume: Arc::new(Mutex::new(volume)),
            counters: Arc::default(),
            faults: Arc::default(),
        }
    }

    pub fn inject(&self, fault: Fault) {
        self.faults.lock().push_back(fault);
    }

    /// Requests received so far, schema fetch included
    pub fn requests(&self) -> usize {
        self.counters.requests.load(Ordering::SeqCst)
    }

    /// Largest number of response bodies alive at the same time
    pub fn max_in_flight(&self) -> usize {
        self.counters.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> ArrayD<T> {
        self.volume.lock().clone()
    }

    fn respond(&self, status: u16, reason: &str, body: Vec<u8>) -> Response {
        Response::new(status, reason, TrackedBody::new(body, self.counters.clone()))
    }

    fn bad_request(&self, message: impl Into<String>) -> Response {
        self.respond(400, "Bad Request", message.into().into_bytes())
    }

    /// Client-order bounds of the cutout named by a wire path, all channels
    fn cutout_bounds(&self, extents: &str, offsets: &str) -> Option<(Vec<usize>, Vec<usize>)> {
        let parse = |segment: &str| -> Option<Vec<usize>> {
            segment.split('_').map(|v| v.parse().ok()).collect()
        };
        let extents = parse(extents)?;
        let offsets = parse(offsets)?;
        let metadata = self.codec.metadata();
        let order = metadata.axis_order();
        if extents.len() != order.ndim() - 1 || offsets.len() != extents.len() {
            return None;
        }

        let mut start = vec![0; order.ndim()];
        let mut stop = vec![0; order.ndim()];
        let mut spatial = extents.iter().zip(&offsets);
        for (storage_axis, &client_axis) in order.storage_to_client().iter().enumerate() {
            if storage_axis == order.channel_storage_index() {
                stop[client_axis] = metadata.channel_count();
            } else {
                let (&extent, &offset) = spatial.next()?;
                start[client_axis] = offset;
                stop[client_axis] = offset + extent;
            }
        }
        if stop.iter().zip(metadata.shape()).any(|(stop, size)| stop > size) {
            return None;
        }
        Some((start, stop))
    }

    fn read_cutout(&self, start: &[usize], stop: &[usize]) -> Result<Vec<u8>> {
        let volume = self.volume.lock();
        let mut view = volume.view();
        for axis in 0..start.len() {
            view.slice_axis_inplace(Axis(axis), Slice::from(start[axis]..stop[axis]));
        }
        Ok(self.codec.encode_to_bytes(&view)?.to_vec())
    }

    fn write_cutout(&self, start: &[usize], stop: &[usize], body: &[u8]) -> Result<()> {
        let shape: Vec<usize> = start.iter().zip(stop).map(|(a, b)| b - a).collect();
        let mut reader = body;
        let data: ArrayD<T> = self.codec.decode(&mut reader, &shape)?;
        if !reader.is_empty() {
            return Err(DvidError::Protocol(format!(
                "{} bytes past the end of the cutout",
                reader.len()
            )));
        }
        let mut volume = self.volume.lock();
        let mut view = volume.view_mut();
        for axis in 0..start.len() {
            view.slice_axis_inplace(Axis(axis), Slice::from(start[axis]..stop[axis]));
        }
        view.assign(&data);
        Ok(())
    }
}

impl<T: Element> Connection for InMemoryVolume<T> {
    fn send(&mut self, request: Request) -> Result<Response> {
        self.counters.requests.fetch_add(1, Ordering::SeqCst);

        let route = match request.path.strip_prefix(&self.api_root) {
            Some(route) => route,
            None => return Ok(self.respond(404, "Not Found", Vec::new())),
        };
        let parts: Vec<&str> = route.split('/').collect();
        if parts.len() < 5 || parts[1] != "node" || parts[2] != self.node_id || parts[3] != self.data_name
        {
            return Ok(self.respond(404, "Not Found", b"no such data".to_vec()));
        }

        if parts.len() == 5 && parts[4] == "schema" && request.method == Method::Get {
            let schema = self.codec.metadata().to_schema_document()?;
            return Ok(self.respond(200, "OK", schema));
        }
        if parts.len() != 7 {
            return Ok(self.bad_request(format!("unknown endpoint {}", request.path)));
        }
        let (start, stop) = match self.cutout_bounds(parts[5], parts[6]) {
            Some(bounds) => bounds,
            None => return Ok(self.bad_request(format!("bad cutout {}", request.path))),
        };

        let fault = self.faults.lock().pop_front();
        if let Some(Fault::Status(status, reason, body)) = fault {
            return Ok(self.respond(status, reason, body.into_bytes()));
        }

        match request.method {
            Method::Get => {
                let mut body = self.read_cutout(&start, &stop)?;
                match fault {
                    Some(Fault::ShortBody) => {
                        body.pop();
                    }
                    Some(Fault::ExtraByte) => body.push(0),
                    _ => {}
                }
                Ok(self.respond(200, "OK", body))
            }
            Method::Post => {
                let body = request.body.unwrap_or_default();
                match self.write_cutout(&start, &stop, &body) {
                    Ok(()) => Ok(self.respond(204, "No Content", Vec::new())),
                    Err(e) => Ok(self.bad_request(e.to_string())),
                }
            }
        }
    }
}

/// Connection that answers with a fixed list of canned responses and records
/// every request it was sent.
#[derive(Clone, Default)]
pub struct ScriptedConnection {
    replies: Arc<Mutex<VecDeque<(u16, &'static str, Vec<u8>)>>>,
    sent: Arc<Mutex<Vec<Request>>>,
}

impl ScriptedConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next response
    pub fn reply(self, status: u16, reason: &'static str, body: impl Into<Vec<u8>>) -> Self {
        self.replies.lock().push_back((status, reason, body.into()));
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.sent.lock().clone()
    }

    /// `"METHOD path"` for every request so far
    pub fn paths(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }
}

impl Connection for ScriptedConnection {
    fn send(&mut self, request: Request) -> Result<Response> {
        self.sent.lock().push(request);
        match self.replies.lock().pop_front() {
            Some((status, reason, body)) => Ok(Response::new(status, reason, Cursor::new(body))),
            None => Err(DvidError::Connection("no scripted reply left".to_string())),
        }
    }
}
