//! Layer and legend registries.
//!
//! Both registries are immutable once built. They are constructed at
//! startup from configuration and shared by `Arc` with every component
//! that needs them; there is no process-wide mutable table.

use std::collections::BTreeMap;

/// Default layer table: layer name → object-store prefix.
pub const DEFAULT_LAYERS: &[(&str, &str)] = &[
    ("SkyCover_Tiles", "data-layer-tiles/SkyCover_Tiles"),
    ("PrecipProb_Tiles", "data-layer-tiles/PrecipProb_Tiles"),
    ("Temp_Tiles", "data-layer-tiles/Temp_Tiles"),
    ("Stargazing_Tiles", "data-layer-tiles/Stargazing_Tiles"),
    (
        "LightPollution_Tiles",
        "light-pollution-data/zenith_ConUSA_colored_tiles",
    ),
];

/// Layer whose `static` tiles are stored without a timestamp segment.
pub const DEFAULT_STATIC_LAYER: &str = "LightPollution_Tiles";

/// Default legend table: public filename → object key.
pub const DEFAULT_LEGENDS: &[(&str, &str)] = &[
    ("Temp_Dark.png", "plots/Temp_Legend_Dark.png"),
    ("Temp_Light.png", "plots/Temp_Legend_Light.png"),
    ("Stargazing_Dark.png", "plots/Stargazing_Legend_Dark.png"),
    ("Stargazing_Light.png", "plots/Stargazing_Legend_Light.png"),
    ("SkyCover_Dark.png", "plots/SkyCover_Legend_Dark.png"),
    ("SkyCover_Light.png", "plots/SkyCover_Legend_Light.png"),
    ("PrecipProb_Dark.png", "plots/PrecipProb_Legend_Dark.png"),
    ("PrecipProb_Light.png", "plots/PrecipProb_Legend_Light.png"),
    (
        "LightPollution_Dark.png",
        "plots/LightPollution_Legend_Dark.png",
    ),
    (
        "LightPollution_Light.png",
        "plots/LightPollution_Legend_Light.png",
    ),
];

/// Mapping from layer name to the remote path prefix of its tiles.
///
/// One layer may be designated as the static layer: for that layer a
/// request with timestamp `"static"` resolves to a key without the
/// timestamp segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerRegistry {
    layers: BTreeMap<String, String>,
    static_layer: Option<String>,
}

impl LayerRegistry {
    /// Create a registry from `(name, prefix)` pairs.
    ///
    /// Trailing slashes on prefixes are removed.
    pub fn new<I, N, P>(layers: I, static_layer: Option<String>) -> Self
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: Into<String>,
    {
        let layers = layers
            .into_iter()
            .map(|(name, prefix)| {
                let prefix: String = prefix.into();
                (name.into(), prefix.trim_end_matches('/').to_string())
            })
            .collect();
        Self {
            layers,
            static_layer,
        }
    }

    /// Look up the remote prefix for a layer.
    pub fn prefix(&self, layer: &str) -> Option<&str> {
        self.layers.get(layer).map(String::as_str)
    }

    /// Returns true if the layer is registered.
    pub fn contains(&self, layer: &str) -> bool {
        self.layers.contains_key(layer)
    }

    /// Returns true if `layer` is the designated static layer.
    pub fn is_static_layer(&self, layer: &str) -> bool {
        self.static_layer.as_deref() == Some(layer)
    }

    /// Get the designated static layer, if any.
    pub fn static_layer(&self) -> Option<&str> {
        self.static_layer.as_deref()
    }

    /// Iterate over `(name, prefix)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.layers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of registered layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns true if no layers are registered.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Default for LayerRegistry {
    fn default() -> Self {
        Self::new(
            DEFAULT_LAYERS.iter().copied(),
            Some(DEFAULT_STATIC_LAYER.to_string()),
        )
    }
}

/// Mapping from public legend filename to its object key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendRegistry {
    legends: BTreeMap<String, String>,
}

impl LegendRegistry {
    /// Create a registry from `(filename, key)` pairs.
    pub fn new<I, N, K>(legends: I) -> Self
    where
        I: IntoIterator<Item = (N, K)>,
        N: Into<String>,
        K: Into<String>,
    {
        Self {
            legends: legends
                .into_iter()
                .map(|(n, k)| (n.into(), k.into()))
                .collect(),
        }
    }

    /// Look up the object key for a legend filename.
    pub fn key(&self, filename: &str) -> Option<&str> {
        self.legends.get(filename).map(String::as_str)
    }

    /// Iterate over `(filename, key)` pairs in filename order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.legends.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of registered legends.
    pub fn len(&self) -> usize {
        self.legends.len()
    }

    /// Returns true if no legends are registered.
    pub fn is_empty(&self) -> bool {
        self.legends.is_empty()
    }
}

impl Default for LegendRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_LEGENDS.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layers() {
        let registry = LayerRegistry::default();
        assert_eq!(registry.len(), 5);
        assert_eq!(
            registry.prefix("SkyCover_Tiles"),
            Some("data-layer-tiles/SkyCover_Tiles")
        );
        assert_eq!(
            registry.prefix("LightPollution_Tiles"),
            Some("light-pollution-data/zenith_ConUSA_colored_tiles")
        );
        assert!(registry.is_static_layer("LightPollution_Tiles"));
        assert!(!registry.is_static_layer("SkyCover_Tiles"));
    }

    #[test]
    fn test_unknown_layer() {
        let registry = LayerRegistry::default();
        assert!(!registry.contains("unknown_layer"));
        assert_eq!(registry.prefix("unknown_layer"), None);
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let registry = LayerRegistry::new([("a", "prefix/a/")], None);
        assert_eq!(registry.prefix("a"), Some("prefix/a"));
        assert_eq!(registry.static_layer(), None);
    }

    #[test]
    fn test_default_legends() {
        let legends = LegendRegistry::default();
        assert_eq!(legends.len(), 10);
        assert_eq!(
            legends.key("Temp_Dark.png"),
            Some("plots/Temp_Legend_Dark.png")
        );
        assert_eq!(legends.key("Nope.png"), None);
    }
}
