use crate::*;
use aeromesh_geometry::collision::point_in_polygon_2d;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A 2D polygon (or open polyline) in a surface's (u, w) rectangle that tags
/// the triangles whose centroids fall inside it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubSurface {
    /// geometry the subsurface belongs to
    pub geom_id: String,
    /// tag added to covered triangles
    pub tag: u32,
    /// display name
    pub name: String,
    /// the polygon in (u, w)
    pub polygon: Vec<Point2>,
    /// closed polygon (tags and splits as a loop) vs open polyline
    pub poly_flag: bool,
}

impl SubSurface {
    /// Whether a parameter point is covered.
    pub fn contains(&self, uw: Point2) -> bool {
        self.poly_flag && self.polygon.len() >= 3 && point_in_polygon_2d(uw, &self.polygon)
    }

    /// The polygon's edges as parameter segments.
    pub fn line_segs(&self) -> Vec<(Point2, Point2)> {
        let n = self.polygon.len();
        if n < 2 {
            return Vec::new();
        }
        let count = match self.poly_flag {
            true => n,
            false => n - 1,
        };
        (0..count)
            .map(|i| (self.polygon[i], self.polygon[(i + 1) % n]))
            .collect()
    }
}

/// Registry resolving each distinct tag combination to one final export tag.
#[derive(Clone, Debug, Default)]
pub struct TagRegistry {
    combos: FxHashMap<Vec<u32>, u32>,
    names: FxHashMap<u32, String>,
    base_names: FxHashMap<u32, String>,
}

impl TagRegistry {
    /// Clears the registry between runs.
    pub fn clear(&mut self) {
        self.combos.clear();
        self.names.clear();
        self.base_names.clear();
    }

    /// Names a base (per-surface) tag.
    pub fn set_base_name(&mut self, tag: u32, name: String) {
        self.base_names.insert(tag, name);
    }

    /// Registers one triangle's sorted tag list and returns the final tag.
    pub fn register(&mut self, tags: &[u32]) -> u32 {
        match self.combos.get(tags) {
            Some(t) => *t,
            None => {
                let t = self.combos.len() as u32 + 1;
                self.combos.insert(tags.to_vec(), t);
                let name = tags
                    .iter()
                    .map(|tag| {
                        self.base_names
                            .get(tag)
                            .cloned()
                            .unwrap_or_else(|| format!("Tag_{tag}"))
                    })
                    .collect::<Vec<_>>()
                    .join(",");
                self.names.insert(t, name);
                t
            }
        }
    }

    /// Final tag of an already-registered combination.
    pub fn resolve(&self, tags: &[u32]) -> Option<u32> { self.combos.get(tags).copied() }

    /// All final tags, ascending.
    pub fn all_tags(&self) -> Vec<u32> {
        let mut tags: Vec<u32> = self.combos.values().copied().collect();
        tags.sort_unstable();
        tags
    }

    /// Display name of a final tag.
    pub fn tag_name(&self, tag: u32) -> String {
        self.names.get(&tag).cloned().unwrap_or_else(|| format!("Tag_{tag}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_ss() -> SubSurface {
        SubSurface {
            geom_id: "geom0".to_string(),
            tag: 7,
            name: "panel".to_string(),
            polygon: vec![
                Point2::new(0.25, 0.25),
                Point2::new(0.75, 0.25),
                Point2::new(0.75, 0.75),
                Point2::new(0.25, 0.75),
            ],
            poly_flag: true,
        }
    }

    #[test]
    fn containment_and_segments() {
        let ss = rect_ss();
        assert!(ss.contains(Point2::new(0.5, 0.5)));
        assert!(!ss.contains(Point2::new(0.9, 0.5)));
        assert_eq!(ss.line_segs().len(), 4);
    }

    #[test]
    fn registry_resolves_combinations() {
        let mut reg = TagRegistry::default();
        reg.set_base_name(1, "wing".to_string());
        let plain = reg.register(&[1]);
        let tagged = reg.register(&[1, 7]);
        assert_ne!(plain, tagged);
        assert_eq!(reg.register(&[1]), plain);
        assert_eq!(reg.resolve(&[1, 7]), Some(tagged));
        assert_eq!(reg.all_tags().len(), 2);
        assert!(reg.tag_name(plain).contains("wing"));
    }
}
