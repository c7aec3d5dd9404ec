//! Tile key resolution.
//!
//! Turns a client [`TileRequest`] into the two locations a tile can live:
//!
//! - the **canonical key** addressing the object in the remote store
//! - the **cache path**, relative to the local cache root
//!
//! ```text
//! request   SkyCover_Tiles / 2025062818 / z=3 / x=2 / y=5 (TMS)
//!                                                   │
//!                                      row = 2^3 - 1 - 5 = 2
//!                                                   ▼
//! key       data-layer-tiles/SkyCover_Tiles/2025062818/3/2/2.png
//! path      SkyCover_Tiles/2025062818/3/2/2.png
//! ```
//!
//! Both are pure functions of the request. The cache path always contains
//! the timestamp segment; the key drops it only for the registry's static
//! layer when the timestamp is `"static"`.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::coord::{is_valid_index, translate_row, MAX_ZOOM};
use crate::layer::LayerRegistry;
use crate::tile::TileRequest;

/// File extension of every tile object.
pub const TILE_EXTENSION: &str = "png";

/// Errors produced while resolving a request.
///
/// All of them mean "this tile does not exist" to a client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Layer is not in the registry.
    #[error("Unknown layer: {0}")]
    UnknownLayer(String),

    /// Zoom, column or row outside the tile grid.
    #[error("Tile {zoom}/{x}/{y} is outside the tile grid")]
    CoordinateOutOfRange { zoom: u8, x: u32, y: u32 },

    /// Timestamp cannot be used as a path segment.
    #[error("Invalid timestamp: {0:?}")]
    InvalidTimestamp(String),
}

/// Locations derived from a valid tile request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTile {
    /// Object key in the remote store.
    pub key: String,
    /// Path relative to the local cache root.
    pub cache_path: PathBuf,
    /// Row in storage (XYZ) convention.
    pub row: u32,
}

/// Builds canonical keys and cache paths from tile requests.
#[derive(Debug, Clone)]
pub struct KeyResolver {
    registry: Arc<LayerRegistry>,
}

impl KeyResolver {
    /// Create a resolver over the given layer registry.
    pub fn new(registry: Arc<LayerRegistry>) -> Self {
        Self { registry }
    }

    /// Get the layer registry.
    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    /// Resolve a request into its remote key and local cache path.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::UnknownLayer`] if the layer is not registered
    /// - [`ResolveError::InvalidTimestamp`] if the timestamp is not a safe path segment
    /// - [`ResolveError::CoordinateOutOfRange`] if zoom, x or y is off the grid
    pub fn resolve(&self, request: &TileRequest) -> Result<ResolvedTile, ResolveError> {
        let prefix = self
            .registry
            .prefix(request.layer())
            .ok_or_else(|| ResolveError::UnknownLayer(request.layer().to_string()))?;

        if !is_safe_segment(request.timestamp()) {
            return Err(ResolveError::InvalidTimestamp(
                request.timestamp().to_string(),
            ));
        }

        let (zoom, x, y) = (request.zoom(), request.x(), request.y());
        if zoom > MAX_ZOOM || !is_valid_index(zoom, x) || !is_valid_index(zoom, y) {
            return Err(ResolveError::CoordinateOutOfRange { zoom, x, y });
        }

        let row = translate_row(zoom, y);
        let file_name = format!("{}.{}", row, TILE_EXTENSION);

        let key = if request.is_static() && self.registry.is_static_layer(request.layer()) {
            format!("{}/{}/{}/{}", prefix, zoom, x, file_name)
        } else {
            format!(
                "{}/{}/{}/{}/{}",
                prefix,
                request.timestamp(),
                zoom,
                x,
                file_name
            )
        };

        let cache_path = PathBuf::from(request.layer())
            .join(request.timestamp())
            .join(zoom.to_string())
            .join(x.to_string())
            .join(file_name);

        Ok(ResolvedTile {
            key,
            cache_path,
            row,
        })
    }
}

/// Timestamps become directory names, so they are restricted to a
/// conservative character set and may not be `.` or `..`.
fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn resolver() -> KeyResolver {
        KeyResolver::new(Arc::new(LayerRegistry::default()))
    }

    #[test]
    fn test_resolve_timestamped_layer() {
        let request = TileRequest::new("SkyCover_Tiles", "2025062818", 3, 2, 5);
        let resolved = resolver().resolve(&request).unwrap();

        assert_eq!(resolved.row, 2);
        assert_eq!(
            resolved.key,
            "data-layer-tiles/SkyCover_Tiles/2025062818/3/2/2.png"
        );
        assert_eq!(
            resolved.cache_path,
            PathBuf::from("SkyCover_Tiles/2025062818/3/2/2.png")
        );
    }

    #[test]
    fn test_static_layer_omits_timestamp_in_key() {
        let request = TileRequest::static_tile("LightPollution_Tiles", 4, 3, 9);
        let resolved = resolver().resolve(&request).unwrap();

        // 2^4 - 1 - 9 = 6
        assert_eq!(
            resolved.key,
            "light-pollution-data/zenith_ConUSA_colored_tiles/4/3/6.png"
        );
        // Local layout keeps the timestamp segment
        assert_eq!(
            resolved.cache_path,
            PathBuf::from("LightPollution_Tiles/static/4/3/6.png")
        );
    }

    #[test]
    fn test_static_layer_with_real_timestamp_keeps_segment() {
        let request = TileRequest::new("LightPollution_Tiles", "2025062818", 4, 3, 9);
        let resolved = resolver().resolve(&request).unwrap();
        assert_eq!(
            resolved.key,
            "light-pollution-data/zenith_ConUSA_colored_tiles/2025062818/4/3/6.png"
        );
    }

    #[test]
    fn test_other_layer_keeps_static_segment() {
        let request = TileRequest::static_tile("Temp_Tiles", 1, 0, 0);
        let resolved = resolver().resolve(&request).unwrap();
        assert_eq!(resolved.key, "data-layer-tiles/Temp_Tiles/static/1/0/1.png");
    }

    #[test]
    fn test_unknown_layer() {
        let request = TileRequest::new("unknown_layer", "2025062818", 3, 2, 5);
        assert_eq!(
            resolver().resolve(&request),
            Err(ResolveError::UnknownLayer("unknown_layer".to_string()))
        );
    }

    #[test]
    fn test_row_out_of_range() {
        let request = TileRequest::new("Temp_Tiles", "t", 3, 2, 8);
        assert!(matches!(
            resolver().resolve(&request),
            Err(ResolveError::CoordinateOutOfRange { zoom: 3, x: 2, y: 8 })
        ));
    }

    #[test]
    fn test_column_out_of_range() {
        let request = TileRequest::new("Temp_Tiles", "t", 3, 8, 0);
        assert!(matches!(
            resolver().resolve(&request),
            Err(ResolveError::CoordinateOutOfRange { .. })
        ));
    }

    #[test]
    fn test_zoom_out_of_range() {
        let request = TileRequest::new("Temp_Tiles", "t", MAX_ZOOM + 1, 0, 0);
        assert!(matches!(
            resolver().resolve(&request),
            Err(ResolveError::CoordinateOutOfRange { .. })
        ));
    }

    #[test]
    fn test_path_traversal_timestamp_rejected() {
        for bad in ["..", ".", "", "a/b", "a\\b", "2025 06"] {
            let request = TileRequest::new("Temp_Tiles", bad, 1, 0, 0);
            assert_eq!(
                resolver().resolve(&request),
                Err(ResolveError::InvalidTimestamp(bad.to_string())),
                "timestamp {:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_unknown_layer_checked_before_timestamp() {
        let request = TileRequest::new("nope", "..", 1, 0, 0);
        assert!(matches!(
            resolver().resolve(&request),
            Err(ResolveError::UnknownLayer(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_resolve_is_deterministic(
            layer_idx in 0usize..5,
            timestamp in "[0-9]{10}|static",
            zoom in 0u8..=20,
            x_seed in any::<u32>(),
            y_seed in any::<u32>(),
        ) {
            let (layer, _) = crate::layer::DEFAULT_LAYERS[layer_idx];
            let n = 1u32 << zoom;
            let request = TileRequest::new(layer, timestamp, zoom, x_seed % n, y_seed % n);

            let first = resolver().resolve(&request).unwrap();
            let second = resolver().resolve(&request.clone()).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_cache_path_mirrors_request(
            timestamp in "[0-9]{10}",
            zoom in 0u8..=20,
            x_seed in any::<u32>(),
            y_seed in any::<u32>(),
        ) {
            let n = 1u32 << zoom;
            let (x, y) = (x_seed % n, y_seed % n);
            let request = TileRequest::new("Stargazing_Tiles", timestamp.clone(), zoom, x, y);
            let resolved = resolver().resolve(&request).unwrap();

            let expected = PathBuf::from("Stargazing_Tiles")
                .join(&timestamp)
                .join(zoom.to_string())
                .join(x.to_string())
                .join(format!("{}.png", n - 1 - y));
            prop_assert_eq!(resolved.cache_path, expected);
        }
    }
}
