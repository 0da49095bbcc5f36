//! REST path grammar of the DVID API
//!
//! Every function takes the API root (e.g. `/api`) so the prefix stays a
//! configuration concern.

use crate::layout::Subvolume;
use crate::metadata::AxisOrder;
use crate::utils::join_underscore;

/// `{api}/node/{node}/{data}/schema`
pub fn schema_path(api_root: &str, node_id: &str, data_name: &str) -> String {
    format!("{}/node/{}/{}/schema", api_root, node_id, data_name)
}

/// `{api}/node/{node}/{data}/{dims}/{extents}/{offsets}`
///
/// The channel axis is dropped; the remaining axes are listed in storage
/// order, so the path is the same whatever order the caller indexes in.
pub fn subvolume_path(
    api_root: &str,
    node_id: &str,
    data_name: &str,
    axis_order: &AxisOrder,
    region: &Subvolume,
) -> String {
    let channel = axis_order.channel_storage_index();
    let mut extents = Vec::with_capacity(axis_order.ndim() - 1);
    let mut offsets = Vec::with_capacity(axis_order.ndim() - 1);
    for (storage_axis, &client_axis) in axis_order.storage_to_client().iter().enumerate() {
        if storage_axis == channel {
            continue;
        }
        let start = region.start()[client_axis];
        extents.push(region.stop()[client_axis] - start);
        offsets.push(start);
    }
    let dims: Vec<usize> = (0..extents.len()).collect();

    format!(
        "{}/node/{}/{}/{}/{}/{}",
        api_root,
        node_id,
        data_name,
        join_underscore(&dims),
        join_underscore(&extents),
        join_underscore(&offsets)
    )
}

/// `{api}/dataset/{node}/new/{type}/{data}`
pub fn create_volume_path(api_root: &str, node_id: &str, type_token: &str, data_name: &str) -> String {
    format!("{}/dataset/{}/new/{}/{}", api_root, node_id, type_token, data_name)
}

pub fn datasets_info_path(api_root: &str) -> String {
    format!("{}/datasets/info", api_root)
}

pub fn datasets_list_path(api_root: &str) -> String {
    format!("{}/datasets/list", api_root)
}

pub fn server_info_path(api_root: &str) -> String {
    format!("{}/server/info", api_root)
}

pub fn server_types_path(api_root: &str) -> String {
    format!("{}/server/types", api_root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::VolumeMetadata;
    use crate::types::DataType;

    #[test]
    fn test_subvolume_path_drops_channel() {
        let metadata =
            VolumeMetadata::create_default(&[3, 200, 100, 10, 4], DataType::U32, "cxyzt", 1.0, "")
                .unwrap();
        let region = Subvolume::new([0, 50, 5, 9, 0], [3, 150, 20, 10, 4]);
        assert_eq!(
            subvolume_path("/api", "abcde", "indices_data", metadata.axis_order(), &region),
            "/api/node/abcde/indices_data/0_1_2_3/100_15_1_4/50_5_9_0"
        );
    }

    #[test]
    fn test_subvolume_path_three_spatial_axes() {
        let metadata =
            VolumeMetadata::create_default(&[4, 10, 100, 200], DataType::U8, "cxyz", 1.0, "")
                .unwrap();
        let region = Subvolume::new([1, 2, 30, 40], [3, 10, 31, 200]);
        assert_eq!(
            subvolume_path("/api", "n1", "gray", metadata.axis_order(), &region),
            "/api/node/n1/gray/0_1_2/8_1_160/2_30_40"
        );
    }

    #[test]
    fn test_subvolume_path_independent_of_client_order() {
        let channel_first =
            VolumeMetadata::create_default(&[4, 10, 100, 200], DataType::U8, "cxyz", 1.0, "")
                .unwrap();
        let channel_last = channel_first.with_client_order("xyzc").unwrap();
        let first = Subvolume::new([0, 2, 30, 40], [4, 10, 31, 200]);
        let last = Subvolume::new([2, 30, 40, 0], [10, 31, 200, 4]);
        assert_eq!(
            subvolume_path("/api", "n1", "gray", channel_first.axis_order(), &first),
            subvolume_path("/api", "n1", "gray", channel_last.axis_order(), &last)
        );
    }

    #[test]
    fn test_fixed_paths() {
        assert_eq!(schema_path("/api", "abc", "grayscale"), "/api/node/abc/grayscale/schema");
        assert_eq!(
            create_volume_path("/api", "abc", "rgba8", "colors"),
            "/api/dataset/abc/new/rgba8/colors"
        );
        assert_eq!(datasets_info_path("/api"), "/api/datasets/info");
        assert_eq!(datasets_list_path(""), "/datasets/list");
        assert_eq!(server_info_path("/api"), "/api/server/info");
        assert_eq!(server_types_path("/api"), "/api/server/types");
    }
}
