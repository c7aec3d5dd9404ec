//! Tile request value object.

use std::fmt;

/// Timestamp bucket used by layers without time variation.
pub const STATIC_TIMESTAMP: &str = "static";

/// Request for a single map tile.
///
/// Holds the layer name, the time bucket and the tile coordinates exactly
/// as the client sent them. The row (`y`) is in the client's TMS convention;
/// it is flipped to the storage convention during key resolution.
///
/// A request is not validated on construction: whether the layer exists
/// depends on the configured [`LayerRegistry`](crate::layer::LayerRegistry),
/// so validation is the resolver's job.
///
/// # Example
///
/// ```
/// use tileproxy::tile::TileRequest;
///
/// let request = TileRequest::new("SkyCover_Tiles", "2025062818", 3, 2, 5);
/// assert_eq!(request.layer(), "SkyCover_Tiles");
/// assert_eq!(request.timestamp(), "2025062818");
/// assert_eq!((request.zoom(), request.x(), request.y()), (3, 2, 5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileRequest {
    layer: String,
    timestamp: String,
    zoom: u8,
    x: u32,
    y: u32,
}

impl TileRequest {
    /// Create a new tile request.
    ///
    /// # Arguments
    ///
    /// * `layer` - Layer name as sent by the client
    /// * `timestamp` - Time bucket identifier, or `"static"`
    /// * `zoom` - Zoom level
    /// * `x` - Tile column
    /// * `y` - Tile row in TMS convention
    pub fn new(
        layer: impl Into<String>,
        timestamp: impl Into<String>,
        zoom: u8,
        x: u32,
        y: u32,
    ) -> Self {
        Self {
            layer: layer.into(),
            timestamp: timestamp.into(),
            zoom,
            x,
            y,
        }
    }

    /// Create a request for a tile without a time bucket.
    ///
    /// Equivalent to `TileRequest::new(layer, "static", zoom, x, y)`.
    pub fn static_tile(layer: impl Into<String>, zoom: u8, x: u32, y: u32) -> Self {
        Self::new(layer, STATIC_TIMESTAMP, zoom, x, y)
    }

    /// Get the layer name.
    pub fn layer(&self) -> &str {
        &self.layer
    }

    /// Get the time bucket identifier.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Returns true if this request targets the static time bucket.
    pub fn is_static(&self) -> bool {
        self.timestamp == STATIC_TIMESTAMP
    }

    /// Get the zoom level.
    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Get the tile column.
    pub fn x(&self) -> u32 {
        self.x
    }

    /// Get the tile row (TMS convention).
    pub fn y(&self) -> u32 {
        self.y
    }
}

impl fmt::Display for TileRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.layer, self.timestamp, self.zoom, self.x, self.y
        )
    }
}
