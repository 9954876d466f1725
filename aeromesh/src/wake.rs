use crate::surf::Surf;
use crate::*;

/// Endpoints must sit this close to the leading-edge polyline to attach.
const LE_MATCH_TOL: f64 = 1.0e-8;

/// One trailing-edge wake: the shedding polyline, the border pairings it
/// matched, and the wake surfaces it generated.
#[derive(Clone, Debug, Default)]
pub struct Wake {
    /// trailing-edge polyline the wake sheds from
    pub leading_edge: Vec<Point3>,
    /// matched border pairing ids
    pub leading_curves: Vec<usize>,
    /// generated wake surface ids
    pub surf_ids: Vec<usize>,
    /// component the wake belongs to
    pub comp_id: usize,
}

impl Wake {
    /// Distance from `pnt` to the closest polyline vertex.
    pub fn dist_to_leading_edge(&self, pnt: Point3) -> f64 {
        self.leading_edge
            .iter()
            .map(|p| p.distance(pnt))
            .fold(f64::INFINITY, f64::min)
    }

    /// Whether both curve endpoints lie on the leading-edge polyline.
    pub fn matches_curve(&self, p0: Point3, p1: Point3) -> bool {
        self.dist_to_leading_edge(p0) < LE_MATCH_TOL && self.dist_to_leading_edge(p1) < LE_MATCH_TOL
    }
}

/// Owns the wakes and the sweep parameters shared by all of them.
#[derive(Clone, Debug, Default)]
pub struct WakeMgr {
    /// collected leading-edge polylines, one wake each
    pub leading_edges: Vec<Vec<Point3>>,
    /// x where the downstream stretch begins
    pub start_stretch_x: f64,
    /// x where every wake ends
    pub end_x: f64,
    /// sweep angle in degrees
    pub angle: f64,
    /// x-stretch factor applied after remeshing
    pub scale: f64,
    /// the built wakes
    pub wakes: Vec<Wake>,
}

impl WakeMgr {
    /// Resets wakes between runs.
    pub fn clear(&mut self) {
        self.wakes.clear();
        self.leading_edges.clear();
    }

    /// Derives the stretch span from the configuration bounding box.
    pub fn set_extents(&mut self, bbox: &BoundingBox<Point3>, angle: f64, scale: f64) {
        let d = bbox.largest_dist();
        self.start_stretch_x = bbox.max().x + 0.01 * d;
        self.end_x = bbox.max().x + 0.5 * d;
        self.angle = angle;
        self.scale = scale;
    }

    /// All wake surface ids.
    pub fn wake_surf_ids(&self) -> Vec<usize> {
        self.wakes.iter().flat_map(|w| w.surf_ids.clone()).collect()
    }

    /// Stretches every wake mesh downstream of `start_stretch_x`.
    pub fn stretch_wakes(&self, surfs: &mut [Surf]) {
        for id in self.wake_surf_ids() {
            surfs[id]
                .simp
                .stretch_x(self.start_stretch_x, self.end_x, self.scale, self.angle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn le_matching_tolerance() {
        let wake = Wake {
            leading_edge: vec![Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)],
            ..Default::default()
        };
        assert!(wake.matches_curve(
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0e-9)
        ));
        assert!(!wake.matches_curve(
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0e-3)
        ));
    }

    #[test]
    fn extents_follow_bbox() {
        let bbox: BoundingBox<Point3> =
            [Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0)]
                .into_iter()
                .collect();
        let mut mgr = WakeMgr::default();
        mgr.set_extents(&bbox, 5.0, 2.0);
        assert!((mgr.start_stretch_x - 2.02).abs() < 1.0e-12);
        assert!((mgr.end_x - 3.0).abs() < 1.0e-12);
    }
}
