use crate::settings::{CfdType, MeshSettings};
use crate::surf::Surf;
use crate::*;
use aeromesh_geometry::BezierSurface;

/// Grows or sizes the far-field box from the configuration bounding box and
/// the settings (scales, absolute dimensions, optional manual placement).
/// Without a far mesh the box is only padded; a half mesh clamps y ≥ 0.
pub fn update_domain(settings: &MeshSettings, vehicle_box: &BoundingBox<Point3>) -> BoundingBox<Point3> {
    let mut domain = *vehicle_box;
    if settings.far_mesh_flag && !settings.far_comp_flag {
        let lwh0 = Vector3::new(
            vehicle_box.max().x - vehicle_box.min().x,
            vehicle_box.max().y - vehicle_box.min().y,
            vehicle_box.max().z - vehicle_box.min().z,
        );
        let lwh = match settings.far_abs_size_flag {
            true => settings.far_size,
            false => Vector3::new(
                lwh0.x * settings.far_scale.x,
                lwh0.y * settings.far_scale.y,
                lwh0.z * settings.far_scale.z,
            ),
        };
        let center = match settings.far_man_loc_flag {
            true => settings.far_location + Vector3::new(lwh.x / 2.0, 0.0, 0.0),
            false => vehicle_box.center(),
        };
        domain = BoundingBox::new();
        domain.push(center + (-lwh) / 2.0);
        domain.push(center + lwh / 2.0);
    } else {
        domain.expand(1.0);
    }
    if settings.half_mesh_flag {
        domain.set_min_y(0.0);
    }
    domain
}

fn plane_surf(p0: Point3, p1: Point3, p2: Point3, p3: Point3) -> BezierSurface {
    BezierSurface::plane(p0, p1, p2, p3)
}

/// Builds the far-field / symmetry domain surfaces: one symmetry plane for a
/// plain half mesh, six box planes for a far-field box, or, with symmetry
/// splitting, the symmetry plane partitioned into five panels around the
/// body so its density map refines near the configuration.
///
/// Every domain surface is transparent; symmetry panels carry the
/// symmetry-plane flag, the rest the far flag. Normals point into the
/// domain.
pub fn create_domain_surfs(
    settings: &MeshSettings,
    domain: &BoundingBox<Point3>,
    vehicle_box: &BoundingBox<Point3>,
) -> Vec<Surf> {
    let (dmin, dmax) = (domain.min(), domain.max());

    // inner rectangle of the symmetry plane around the body
    let mut inner = *vehicle_box;
    let min_scale = f64::min(settings.far_scale.x, settings.far_scale.z);
    let scale = match min_scale < 2.0 {
        true => (min_scale + 1.0) / 2.0,
        false => 2.0,
    };
    let center = inner.center();
    let half = Vector3::new(
        (inner.max().x - inner.min().x) * scale / 2.0,
        0.0,
        (inner.max().z - inner.min().z) * scale / 2.0,
    );
    inner = BoundingBox::new();
    inner.push(Point3::new(center.x - half.x, 0.0, center.z - half.z));
    inner.push(Point3::new(center.x + half.x, 0.0, center.z + half.z));

    let is_inside = inner.min().x > dmin.x
        && inner.max().x < dmax.x
        && inner.min().z > dmin.z
        && inner.max().z < dmax.z;
    let split_sym =
        settings.half_mesh_flag && settings.sym_splitting_flag && is_inside;

    // symmetry plane panels live at y = domain min (0 for a half mesh)
    let y = dmin.y;
    let sym_quad = |x0: f64, x1: f64, z0: f64, z1: f64| {
        // +y normal: u along z, w along x
        plane_surf(
            Point3::new(x0, y, z0),
            Point3::new(x0, y, z1),
            Point3::new(x1, y, z0),
            Point3::new(x1, y, z1),
        )
    };

    let mut sym_panels: Vec<BezierSurface> = Vec::new();
    let mut far_panels: Vec<BezierSurface> = Vec::new();

    if split_sym {
        let (ix0, ix1) = (inner.min().x, inner.max().x);
        let (iz0, iz1) = (inner.min().z, inner.max().z);
        sym_panels.push(sym_quad(ix0, ix1, iz0, iz1)); // around the body
        sym_panels.push(sym_quad(dmin.x, ix0, dmin.z, dmax.z)); // upstream strip
        sym_panels.push(sym_quad(ix1, dmax.x, dmin.z, dmax.z)); // downstream strip
        sym_panels.push(sym_quad(ix0, ix1, dmin.z, iz0)); // below
        sym_panels.push(sym_quad(ix0, ix1, iz1, dmax.z)); // above
    } else if settings.half_mesh_flag {
        sym_panels.push(sym_quad(dmin.x, dmax.x, dmin.z, dmax.z));
    }

    if settings.far_mesh_flag && !settings.far_comp_flag {
        // right wall, -y normal into the domain
        far_panels.push(plane_surf(
            Point3::new(dmin.x, dmax.y, dmin.z),
            Point3::new(dmax.x, dmax.y, dmin.z),
            Point3::new(dmin.x, dmax.y, dmax.z),
            Point3::new(dmax.x, dmax.y, dmax.z),
        ));
        // upstream wall, +x normal
        far_panels.push(plane_surf(
            Point3::new(dmin.x, dmin.y, dmin.z),
            Point3::new(dmin.x, dmax.y, dmin.z),
            Point3::new(dmin.x, dmin.y, dmax.z),
            Point3::new(dmin.x, dmax.y, dmax.z),
        ));
        // downstream wall, -x normal
        far_panels.push(plane_surf(
            Point3::new(dmax.x, dmin.y, dmin.z),
            Point3::new(dmax.x, dmin.y, dmax.z),
            Point3::new(dmax.x, dmax.y, dmin.z),
            Point3::new(dmax.x, dmax.y, dmax.z),
        ));
        // floor, +z normal
        far_panels.push(plane_surf(
            Point3::new(dmin.x, dmin.y, dmin.z),
            Point3::new(dmax.x, dmin.y, dmin.z),
            Point3::new(dmin.x, dmax.y, dmin.z),
            Point3::new(dmax.x, dmax.y, dmin.z),
        ));
        // ceiling, -z normal
        far_panels.push(plane_surf(
            Point3::new(dmin.x, dmin.y, dmax.z),
            Point3::new(dmin.x, dmax.y, dmax.z),
            Point3::new(dmax.x, dmin.y, dmax.z),
            Point3::new(dmax.x, dmax.y, dmax.z),
        ));
        // left wall becomes part of the box on a full mesh
        if !settings.half_mesh_flag {
            far_panels.push(plane_surf(
                Point3::new(dmin.x, dmin.y, dmin.z),
                Point3::new(dmin.x, dmin.y, dmax.z),
                Point3::new(dmax.x, dmin.y, dmin.z),
                Point3::new(dmax.x, dmin.y, dmax.z),
            ));
        }
    } else {
        // without a far mesh only the symmetry plane survives
        far_panels.clear();
    }

    if !settings.half_mesh_flag && !(settings.far_mesh_flag && !settings.far_comp_flag) {
        return Vec::new();
    }

    let mut domain_surfs = Vec::new();
    let mut idx = 0;
    for geom in sym_panels {
        let mut surf = Surf::from_geom(geom, idx, idx);
        surf.cfd_type = CfdType::Transparent;
        surf.sym_plane_flag = true;
        domain_surfs.push(surf);
        idx += 1;
    }
    if settings.far_mesh_flag && !settings.far_comp_flag {
        for geom in far_panels {
            let mut surf = Surf::from_geom(geom, idx, idx);
            surf.cfd_type = CfdType::Transparent;
            surf.far_flag = true;
            domain_surfs.push(surf);
            idx += 1;
        }
    }
    domain_surfs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_vehicle() -> BoundingBox<Point3> {
        [Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0)]
            .into_iter()
            .collect()
    }

    #[test]
    fn no_domain_without_flags() {
        let settings = MeshSettings::default();
        let domain = update_domain(&settings, &unit_vehicle());
        assert!(create_domain_surfs(&settings, &domain, &unit_vehicle()).is_empty());
        // padded box
        assert!((domain.min().x + 2.0).abs() < 1.0e-12);
    }

    #[test]
    fn half_mesh_gets_one_sym_plane() {
        let settings = MeshSettings {
            half_mesh_flag: true,
            ..Default::default()
        };
        let domain = update_domain(&settings, &unit_vehicle());
        assert!((domain.min().y - 0.0).abs() < 1.0e-12);
        let surfs = create_domain_surfs(&settings, &domain, &unit_vehicle());
        assert_eq!(surfs.len(), 1);
        assert!(surfs[0].sym_plane_flag);
        assert_eq!(surfs[0].cfd_type, CfdType::Transparent);
        // normal points into the +y half space
        assert!(surfs[0].normal(0.5, 0.5).y > 0.0);
    }

    #[test]
    fn far_box_full_mesh_gets_six_planes() {
        let settings = MeshSettings {
            far_mesh_flag: true,
            ..Default::default()
        };
        let domain = update_domain(&settings, &unit_vehicle());
        // 4x scale of a 2-unit box
        assert!((domain.max().x - 4.0).abs() < 1.0e-12);
        let surfs = create_domain_surfs(&settings, &domain, &unit_vehicle());
        assert_eq!(surfs.len(), 6);
        assert!(surfs.iter().all(|s| s.far_flag));
    }

    #[test]
    fn sym_split_half_far_gets_ten_planes() {
        let settings = MeshSettings {
            far_mesh_flag: true,
            half_mesh_flag: true,
            sym_splitting_flag: true,
            ..Default::default()
        };
        let domain = update_domain(&settings, &unit_vehicle());
        let surfs = create_domain_surfs(&settings, &domain, &unit_vehicle());
        assert_eq!(surfs.len(), 10);
        assert_eq!(surfs.iter().filter(|s| s.sym_plane_flag).count(), 5);
        assert_eq!(surfs.iter().filter(|s| s.far_flag).count(), 5);
    }
}
