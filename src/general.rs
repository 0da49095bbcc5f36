//! Server-wide queries that don't belong to one volume
//!
//! Everything here runs over a caller-supplied [`Connection`], so a
//! presentation layer can list what a server offers before it builds a
//! [`VolumeClient`](crate::VolumeClient).

use crate::error::{DvidError, Result};
use crate::io::{Connection, Request};
use crate::metadata::VolumeMetadata;
use crate::rest;
use crate::utils::body_text;
use bytes::Bytes;
use serde_json::Value;
use std::collections::BTreeMap;

/// Content type of schema documents sent to the server
pub const SCHEMA_MIMETYPE: &str = "text/json";

/// GET `path` and parse the 200 response body as JSON
pub fn get_json_generic<C: Connection + ?Sized>(
    connection: &mut C,
    path: &str,
    action: &str,
) -> Result<Value> {
    let mut response = connection.send(Request::get(path))?;
    if response.status != 200 {
        return Err(response.into_error(action));
    }
    let body = response.read_body()?;
    serde_json::from_slice(&body).map_err(|e| {
        DvidError::Parse(format!(
            "couldn't parse the {} response as json: {}",
            action, e
        ))
    })
}

/// The `/datasets/info` document
pub fn get_datasets_info<C: Connection + ?Sized>(connection: &mut C, api_root: &str) -> Result<Value> {
    get_json_generic(connection, &rest::datasets_info_path(api_root), "query datasets info")
}

/// The `/datasets/list` document
pub fn get_datasets_list<C: Connection + ?Sized>(connection: &mut C, api_root: &str) -> Result<Value> {
    get_json_generic(connection, &rest::datasets_list_path(api_root), "query datasets list")
}

/// The `/server/info` document
pub fn get_server_info<C: Connection + ?Sized>(connection: &mut C, api_root: &str) -> Result<Value> {
    get_json_generic(connection, &rest::server_info_path(api_root), "query server info")
}

/// The `/server/types` document
pub fn get_server_types<C: Connection + ?Sized>(connection: &mut C, api_root: &str) -> Result<Value> {
    get_json_generic(connection, &rest::server_types_path(api_root), "query server types")
}

/// Create a new volume described by `metadata` at `node_id`
pub fn create_volume<C: Connection + ?Sized>(
    connection: &mut C,
    api_root: &str,
    node_id: &str,
    data_name: &str,
    metadata: &VolumeMetadata,
) -> Result<()> {
    let type_token = metadata.server_type_token()?;
    let path = rest::create_volume_path(api_root, node_id, type_token, data_name);
    let document = metadata.to_schema_document()?;

    let mut response =
        connection.send(Request::post(path, SCHEMA_MIMETYPE, Bytes::from(document)))?;
    if response.status != 204 {
        return Err(response.into_error("create new data"));
    }
    let body = response.read_body()?;
    if !body.is_empty() {
        return Err(DvidError::UnexpectedResponse(format!(
            "expected an empty response from the server, got: {}",
            body_text(&body)
        )));
    }
    log::info!("created {} volume {}/{}", type_token, node_id, data_name);
    Ok(())
}

/// What each dataset on a server holds: data item names and node ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetListing {
    /// Dataset id to the names of its data items, sorted
    pub data_items: BTreeMap<String, Vec<String>>,
    /// Dataset id to the ids of its nodes, sorted
    pub node_ids: BTreeMap<String, Vec<String>>,
}

impl DatasetListing {
    /// Extract the listing from a `/datasets/info` document
    pub fn from_info(info: &Value) -> Result<Self> {
        let datasets = info
            .get("Datasets")
            .and_then(Value::as_array)
            .ok_or_else(|| DvidError::Schema("datasets info has no \"Datasets\" list".to_string()))?;

        let mut listing = Self::default();
        for dataset in datasets {
            let id = match dataset.get("DatasetID") {
                Some(Value::String(id)) => id.clone(),
                Some(Value::Number(id)) => id.to_string(),
                _ => {
                    return Err(DvidError::Schema(
                        "dataset entry without a \"DatasetID\"".to_string(),
                    ))
                }
            };
            let data_items = object_keys(dataset, "DataMap", &id)?;
            let node_ids = object_keys(dataset, "Nodes", &id)?;
            listing.data_items.insert(id.clone(), data_items);
            listing.node_ids.insert(id, node_ids);
        }
        Ok(listing)
    }

    pub fn dataset_ids(&self) -> impl Iterator<Item = &str> {
        self.data_items.keys().map(String::as_str)
    }
}

fn object_keys(dataset: &Value, field: &str, id: &str) -> Result<Vec<String>> {
    let object = dataset.get(field).and_then(Value::as_object).ok_or_else(|| {
        DvidError::Schema(format!("dataset {} has no \"{}\" object", id, field))
    })?;
    let mut keys: Vec<String> = object.keys().cloned().collect();
    keys.sort();
    Ok(keys)
}

/// Query `/datasets/info` and reduce it to a [`DatasetListing`]
pub fn list_datasets<C: Connection + ?Sized>(
    connection: &mut C,
    api_root: &str,
) -> Result<DatasetListing> {
    DatasetListing::from_info(&get_datasets_info(connection, api_root)?)
}
