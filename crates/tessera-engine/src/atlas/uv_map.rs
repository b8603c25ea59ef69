use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::AtlasError;

/// Texture-space sub-rectangle `(u0, v0)-(u1, v1)`.
///
/// On the wire this is a plain 4-element array. Values keep the JSON
/// number's full precision; they narrow to `f32` only for the uniform.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct UvRect {
    pub u0: f64,
    pub v0: f64,
    pub u1: f64,
    pub v1: f64,
}

impl UvRect {
    pub const fn new(u0: f64, v0: f64, u1: f64, v1: f64) -> Self {
        Self { u0, v0, u1, v1 }
    }

    /// Packed as a `vec4<f32>` uniform: min in `xy`, max in `zw`.
    pub fn to_array(self) -> [f32; 4] {
        [self.u0 as f32, self.v0 as f32, self.u1 as f32, self.v1 as f32]
    }

    pub fn is_normalized(self) -> bool {
        <[f64; 4]>::from(self).iter().all(|c| (0.0..=1.0).contains(c))
    }
}

impl From<[f64; 4]> for UvRect {
    fn from([u0, v0, u1, v1]: [f64; 4]) -> Self {
        Self::new(u0, v0, u1, v1)
    }
}

impl From<UvRect> for [f64; 4] {
    fn from(r: UvRect) -> Self {
        [r.u0, r.v0, r.u1, r.v1]
    }
}

/// Sprite name → UV rectangle, as stored in `atlas.json`:
///
/// ```json
/// { "sprite_0": [0.0, 0.0, 0.25, 0.25] }
/// ```
///
/// Read-only once loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AtlasUvMap {
    entries: BTreeMap<String, UvRect>,
}

impl AtlasUvMap {
    /// Parses the JSON mapping. Rectangles outside `[0, 1]` are kept and
    /// reported at `warn`; sampling clamps them to the edge.
    pub fn from_json(json: &str) -> Result<Self, AtlasError> {
        Self::from_slice(json.as_bytes())
    }

    /// Same as [`Self::from_json`] on raw file bytes; invalid UTF-8 is a
    /// JSON error.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AtlasError> {
        let map: Self = serde_json::from_slice(bytes)?;
        for (name, uv) in &map.entries {
            if !uv.is_normalized() {
                log::warn!("UV for sprite '{name}' is outside [0, 1]: {:?}", <[f64; 4]>::from(*uv));
            }
        }
        Ok(map)
    }

    pub fn to_json(&self) -> Result<String, AtlasError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn get(&self, name: &str) -> Option<UvRect> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl FromIterator<(String, UvRect)> for AtlasUvMap {
    fn from_iter<I: IntoIterator<Item = (String, UvRect)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_to_four_floats() {
        let map = AtlasUvMap::from_json(r#"{"a": [0.0, 0.5, 0.25, 1.0], "b": [0, 0, 1, 1]}"#).unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a"), Some(UvRect::new(0.0, 0.5, 0.25, 1.0)));
        assert_eq!(map.get("b"), Some(UvRect::new(0.0, 0.0, 1.0, 1.0)));
        assert_eq!(map.get("c"), None);
    }

    #[test]
    fn serializes_back_to_arrays() {
        let json = r#"{"sprite_0":[0.0,0.0,0.25,0.25],"sprite_1":[0.25,0.0,0.5,0.25]}"#;
        let map = AtlasUvMap::from_json(json).unwrap();
        assert_eq!(map.to_json().unwrap(), json);
    }

    #[test]
    fn round_trip_keeps_full_precision() {
        let json = r#"{"a":[0.123456789,0.0,0.3333333333333333,1.0]}"#;
        let map = AtlasUvMap::from_json(json).unwrap();

        assert_eq!(map.to_json().unwrap(), json);
        assert_eq!(map.get("a").unwrap().u0, 0.123456789);
        assert_eq!(map.get("a").unwrap().to_array()[2], 0.33333334_f32);
    }

    #[test]
    fn invalid_utf8_is_a_json_error() {
        let bytes = b"{\"a\xff\": [0, 0, 1, 1]}";
        assert!(matches!(AtlasUvMap::from_slice(bytes), Err(AtlasError::Json(_))));
    }

    #[test]
    fn rejects_wrong_arity() {
        assert!(matches!(
            AtlasUvMap::from_json(r#"{"a": [0.0, 0.5, 0.25]}"#),
            Err(AtlasError::Json(_))
        ));
        assert!(AtlasUvMap::from_json(r#"{"a": [0, 0, 1, 1, 1]}"#).is_err());
        assert!(AtlasUvMap::from_json(r#"{"a": "0,0,1,1"}"#).is_err());
    }

    #[test]
    fn out_of_range_rect_is_kept() {
        let map = AtlasUvMap::from_json(r#"{"wide": [-0.5, 0, 1.5, 1]}"#).unwrap();
        let uv = map.get("wide").unwrap();
        assert!(!uv.is_normalized());
    }
}
