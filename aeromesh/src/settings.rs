use crate::source::MeshSource;
use crate::*;
use aeromesh_geometry::BezierSurface;
use serde::{Deserialize, Serialize};

/// How a surface participates in trimming decisions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CfdType {
    /// ordinary solid skin
    #[default]
    Normal,
    /// subtracts material where it overlaps normal components
    Negative,
    /// wakes and disks: intersected but never closes a volume
    Transparent,
    /// internal structural element, excluded from intersection trims
    Structure,
}

/// What kind of component a surface came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfKind {
    /// generic surface
    #[default]
    Normal,
    /// lifting surface: sheds a wake when wakes are enabled
    Wing,
    /// actuator disk
    Disk,
}

/// One transferred surface record from the geometry collaborator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct XferSurf {
    /// the piecewise bezier skin
    pub surface: BezierSurface,
    /// owning geometry id
    pub geom_id: String,
    /// display name
    pub name: String,
    /// split index within the geometry
    pub split_num: usize,
    /// component index before merging
    pub comp_index: usize,
    /// surface kind
    pub kind: SurfKind,
    /// CFD participation type
    pub cfd_type: CfdType,
    /// whether the natural normal points into the body
    pub flip_normal: bool,
}

/// Density configuration snapshot, copied from the editor once per run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GridDensity {
    /// enable rigorous cross-surface 3D limiting
    pub rigor_limit: bool,
    /// global target edge length
    pub base_len: f64,
    /// target length on far-field surfaces
    pub far_max_len: f64,
    /// hard lower bound on edge length
    pub min_len: f64,
    /// circle-segment count controlling curvature refinement
    pub n_circ_seg: f64,
    /// circle-segment count on far-field surfaces
    pub far_n_circ_seg: f64,
    /// largest allowed chordal gap
    pub max_gap: f64,
    /// largest allowed chordal gap on far-field surfaces
    pub far_max_gap: f64,
    /// maximum ratio of neighboring target lengths
    pub grow_ratio: f64,
    /// user point/line/box sources
    pub sources: Vec<MeshSource>,
}

impl Default for GridDensity {
    fn default() -> Self {
        GridDensity {
            rigor_limit: false,
            base_len: 0.5,
            far_max_len: 2.0,
            min_len: 0.1,
            n_circ_seg: 16.0,
            far_n_circ_seg: 16.0,
            max_gap: 0.005,
            far_max_gap: 0.02,
            grow_ratio: 1.3,
            sources: Vec::new(),
        }
    }
}

impl GridDensity {
    /// Base length, switched to the far-field value by `far_flag`.
    pub fn base_len(&self, far_flag: bool) -> f64 {
        match far_flag {
            true => self.far_max_len,
            false => self.base_len,
        }
    }

    /// Max chordal gap, switched to the far-field value by `far_flag`.
    pub fn max_gap(&self, far_flag: bool) -> f64 {
        match far_flag {
            true => self.far_max_gap,
            false => self.max_gap,
        }
    }

    /// Radius fraction from the circle-segment count: `2 sin(π/n)`, switched
    /// to `4/n` below the well-defined range.
    pub fn rad_frac(&self, far_flag: bool) -> f64 {
        let n = match far_flag {
            true => self.far_n_circ_seg,
            false => self.n_circ_seg,
        };
        match n > 2.0 {
            true => 2.0 * f64::sin(std::f64::consts::PI / n),
            false => 4.0 / n,
        }
    }

    /// Smallest source-limited target length at `pos`, bounded above by the
    /// base length.
    pub fn target_len(&self, pos: Point3, far_flag: bool) -> f64 {
        let base = self.base_len(far_flag);
        self.sources
            .iter()
            .map(|s| s.target_len(base, pos))
            .fold(base, f64::min)
    }
}

/// Which export files to write.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExportOptions {
    /// plain ASCII STL
    pub stl: Option<String>,
    /// one STL solid per resolved tag
    pub tagged_stl: Option<String>,
    /// TetGen `.poly`
    pub poly: Option<String>,
    /// Cart3D `.tri`
    pub tri: Option<String>,
    /// NASCART `.dat`
    pub nascart: Option<String>,
    /// Wavefront OBJ
    pub obj: Option<String>,
    /// Gmsh 2.2
    pub gmsh: Option<String>,
    /// native surface/curve dump
    pub srf: Option<String>,
}

/// The settings bundle handed to the mesher.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MeshSettings {
    /// density snapshot
    pub grid: GridDensity,
    /// generate a far-field domain box
    pub far_mesh_flag: bool,
    /// use a geometry component as the far field instead of a box
    pub far_comp_flag: bool,
    /// geometry id of the far-field component
    pub far_geom_id: String,
    /// mesh only y ≥ 0 and close with the symmetry plane
    pub half_mesh_flag: bool,
    /// subdivide the symmetry plane around the body box
    pub sym_splitting_flag: bool,
    /// intersect subsurface line segments into the mesh
    pub intersect_subsurfs: bool,
    /// far-field box sized in absolute units instead of scales
    pub far_abs_size_flag: bool,
    /// far-field box placed manually
    pub far_man_loc_flag: bool,
    /// per-axis far-field scale factors
    pub far_scale: Vector3,
    /// absolute far-field dimensions
    pub far_size: Vector3,
    /// manual far-field minimum-x corner location
    pub far_location: Point3,
    /// wake trailing-edge sweep angle in degrees
    pub wake_angle: f64,
    /// wake x-stretch factor applied after remeshing
    pub wake_scale: f64,
    /// which files to write after meshing
    pub export: ExportOptions,
}

impl Default for MeshSettings {
    fn default() -> Self {
        MeshSettings {
            grid: GridDensity::default(),
            far_mesh_flag: false,
            far_comp_flag: false,
            far_geom_id: String::new(),
            half_mesh_flag: false,
            sym_splitting_flag: false,
            intersect_subsurfs: false,
            far_abs_size_flag: false,
            far_man_loc_flag: false,
            far_scale: Vector3::new(4.0, 4.0, 4.0),
            far_size: Vector3::new(10.0, 10.0, 10.0),
            far_location: Point3::new(0.0, 0.0, 0.0),
            wake_angle: 0.0,
            wake_scale: 2.0,
            export: ExportOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rad_frac_switches_below_two_segments() {
        let mut grid = GridDensity::default();
        grid.n_circ_seg = 16.0;
        assert!((grid.rad_frac(false) - 2.0 * f64::sin(std::f64::consts::PI / 16.0)).abs() < 1e-12);
        grid.n_circ_seg = 1.5;
        assert!((grid.rad_frac(false) - 4.0 / 1.5).abs() < 1e-12);
    }

    #[test]
    fn target_len_takes_smallest_source() {
        let mut grid = GridDensity::default();
        grid.base_len = 1.0;
        grid.sources.push(MeshSource::point(
            Point3::new(0.0, 0.0, 0.0),
            0.1,
            0.5,
        ));
        assert!((grid.target_len(Point3::new(0.0, 0.0, 0.0), false) - 0.1).abs() < 1e-12);
        assert!((grid.target_len(Point3::new(10.0, 0.0, 0.0), false) - 1.0).abs() < 1e-12);
    }
}
