//! End-to-end scenarios over the whole meshing pipeline.

mod common;

use aeromesh::settings::{CfdType, MeshSettings, SurfKind};
use aeromesh::subsurface::SubSurface;
use aeromesh::Mesher;
use aeromesh_base::cgmath64::*;

fn quiet_settings() -> MeshSettings {
    MeshSettings::default()
}

#[test]
fn sphere_is_watertight_and_round() {
    let mut settings = quiet_settings();
    settings.grid.base_len = 0.1;
    settings.grid.min_len = 0.01;
    settings.grid.n_circ_seg = 16.0;

    let mut mesher = Mesher::new(settings);
    let result = mesher.generate_mesh(common::sphere_xfers());
    assert_eq!(result, "Is Water Tight\n");

    let mut num_tris = 0;
    for surf in &mesher.surfs {
        num_tris += surf.simp.tris.len();
        for p in &surf.simp.pnts {
            let r = p.to_vec().magnitude();
            assert!((0.999..=1.001).contains(&r), "vertex off the sphere: r = {r}");
        }
    }
    assert!(num_tris >= 2000, "too coarse: {num_tris} triangles");
}

#[test]
fn sphere_triangles_face_outward() {
    let mut settings = quiet_settings();
    settings.grid.base_len = 0.2;
    settings.grid.min_len = 0.02;

    let mut mesher = Mesher::new(settings);
    mesher.generate_mesh(common::sphere_xfers());

    let mut good = 0;
    let mut total = 0;
    for surf in &mesher.surfs {
        let simp = &surf.simp;
        for tri in &simp.tris {
            let (p0, p1, p2) = (simp.pnts[tri.ind0], simp.pnts[tri.ind1], simp.pnts[tri.ind2]);
            let n = (p1 - p0).cross(p2 - p0);
            let center = Point3::from_vec((p0.to_vec() + p1.to_vec() + p2.to_vec()) / 3.0);
            // outward on a sphere means along the radius
            total += 1;
            if n.dot(center.to_vec()) > 0.0 {
                good += 1;
            }
        }
    }
    assert!(total > 0);
    assert!(good * 20 >= total * 19, "{good}/{total} triangles outward");
}

#[test]
fn intersecting_boxes_trim_and_close() {
    let mut settings = quiet_settings();
    settings.grid.base_len = 0.25;
    settings.grid.min_len = 0.02;

    let mut xfers = common::box_xfers(
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 1.0),
        0,
        "box_a",
        CfdType::Normal,
    );
    xfers.extend(common::box_xfers(
        Point3::new(0.5, 0.5, 0.5),
        Point3::new(1.5, 1.5, 1.5),
        1,
        "box_b",
        CfdType::Normal,
    ));

    let mut mesher = Mesher::new(settings);
    let result = mesher.generate_mesh(xfers);

    // the intersection loop produced non-border chains
    assert!(mesher.chains.iter().any(|c| !c.border_flag));

    let num_tris: usize = mesher.surfs.iter().map(|s| s.simp.tris.len()).sum();
    assert!(num_tris > 24, "only {num_tris} triangles");

    // triangles deep inside the other box are gone
    for surf in &mesher.surfs {
        for tri in &surf.simp.tris {
            let c = surf.simp.tri_center(&tri.clone());
            let inside_a = c.x < 0.95 && c.y < 0.95 && c.z < 0.95 && c.x > 0.05 && c.y > 0.05 && c.z > 0.05;
            let inside_b = c.x > 0.55 && c.y > 0.55 && c.z > 0.55 && c.x < 1.45 && c.y < 1.45 && c.z < 1.45;
            assert!(
                !(inside_a && inside_b),
                "triangle centroid {c:?} survived inside both boxes"
            );
        }
    }

    assert_eq!(result, "Is Water Tight\n");
}

#[test]
fn negative_component_carves_a_cavity() {
    let mut settings = quiet_settings();
    settings.grid.base_len = 0.25;
    settings.grid.min_len = 0.02;

    let mut xfers = common::box_xfers(
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(2.0, 2.0, 2.0),
        0,
        "solid",
        CfdType::Normal,
    );
    xfers.extend(common::box_xfers(
        Point3::new(1.0, 0.5, 0.5),
        Point3::new(3.0, 1.5, 1.5),
        1,
        "cutter",
        CfdType::Negative,
    ));

    let mut mesher = Mesher::new(settings);
    let result = mesher.generate_mesh(xfers);

    // negative skin survives only inside the solid (the cavity wall)
    for surf in &mesher.surfs {
        if surf.cfd_type != CfdType::Negative {
            continue;
        }
        for tri in &surf.simp.tris {
            let c = surf.simp.tri_center(&tri.clone());
            assert!(
                c.x < 2.0 + 1.0e-6,
                "negative triangle centroid {c:?} kept outside the solid"
            );
        }
    }
    // solid skin does not survive inside the cutter
    for surf in &mesher.surfs {
        if surf.cfd_type != CfdType::Normal {
            continue;
        }
        for tri in &surf.simp.tris {
            let c = surf.simp.tri_center(&tri.clone());
            let inside_cutter = c.x > 1.05 && c.x < 2.95
                && c.y > 0.55 && c.y < 1.45
                && c.z > 0.55 && c.z < 1.45;
            assert!(!inside_cutter, "carved region still carries solid skin at {c:?}");
        }
    }
    assert_eq!(result, "Is Water Tight\n");
}

#[test]
fn wing_sheds_a_matching_wake() {
    let mut settings = quiet_settings();
    settings.grid.base_len = 0.25;
    settings.grid.min_len = 0.02;
    settings.wake_angle = 5.0;

    // flat rectangular wing: chord along x, span along y
    let wing = common::plate_xfer(
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 2.0, 0.0),
        Point3::new(1.0, 2.0, 0.0),
        SurfKind::Wing,
        "wing",
    );

    let mut mesher = Mesher::new(settings);
    mesher.set_wake_leading_edges(vec![vec![
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(1.0, 2.0, 0.0),
    ]]);
    mesher.generate_mesh(vec![wing]);

    // a wake surface was produced and meshed
    let wake_ids = mesher.wake_mgr.wake_surf_ids();
    assert_eq!(wake_ids.len(), 1);
    let wake = &mesher.surfs[wake_ids[0]];
    assert!(wake.wake_flag);
    assert_eq!(wake.cfd_type, CfdType::Transparent);
    assert!(!wake.simp.tris.is_empty());

    // the wake mesh was stretched past the trailing edge
    let max_x = wake
        .simp
        .pnts
        .iter()
        .map(|p| p.x)
        .fold(f64::NEG_INFINITY, f64::max);
    assert!(max_x > 1.5, "wake not extended: max x = {max_x}");

    // every wake leading-edge vertex coincides with a wing mesh vertex
    let wing_surf = &mesher.surfs[0];
    let le_pnts: Vec<Point3> = wake
        .simp
        .pnts
        .iter()
        .copied()
        .filter(|p| (p.x - 1.0).abs() < 1.0e-6)
        .collect();
    assert!(!le_pnts.is_empty());
    for p in &le_pnts {
        let matched = wing_surf
            .simp
            .pnts
            .iter()
            .any(|q| q.distance(*p) < 1.0e-6);
        assert!(matched, "wake LE vertex {p:?} not on the wing trailing edge");
    }
}

#[test]
fn half_mesh_keeps_positive_y_and_closes() {
    let mut settings = quiet_settings();
    settings.grid.base_len = 0.3;
    settings.grid.min_len = 0.02;
    settings.half_mesh_flag = true;
    settings.far_mesh_flag = true;
    settings.far_scale = Vector3::new(3.0, 3.0, 3.0);

    // one box straddling the symmetry plane
    let xfers = common::box_xfers(
        Point3::new(-0.5, -0.5, -0.5),
        Point3::new(0.5, 0.5, 0.5),
        0,
        "body",
        CfdType::Normal,
    );

    let mut mesher = Mesher::new(settings);
    mesher.generate_mesh(xfers);

    for surf in &mesher.surfs {
        for tri in &surf.simp.tris {
            let c = surf.simp.tri_center(&tri.clone());
            assert!(c.y >= -1.0e-10, "triangle below the symmetry plane at {c:?}");
        }
    }
    // symmetry plane panels survive with holes where the body sits
    let sym_tris: usize = mesher
        .surfs
        .iter()
        .filter(|s| s.sym_plane_flag)
        .map(|s| s.simp.tris.len())
        .sum();
    assert!(sym_tris > 0, "symmetry plane lost all triangles");
    let report = mesher.watertight().expect("no watertight report");
    assert_eq!(report.over_shared_edges, 0);
}

#[test]
fn subsurface_polygon_tags_triangles() {
    let mut settings = quiet_settings();
    settings.grid.base_len = 0.1;
    settings.grid.min_len = 0.01;
    settings.intersect_subsurfs = true;

    let plate = common::plate_xfer(
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        SurfKind::Normal,
        "plate",
    );

    let mut mesher = Mesher::new(settings);
    mesher.add_subsurface(SubSurface {
        geom_id: "plate".to_string(),
        tag: 9,
        name: "panel".to_string(),
        polygon: vec![
            Point2::new(0.25, 0.25),
            Point2::new(0.75, 0.25),
            Point2::new(0.75, 0.75),
            Point2::new(0.25, 0.75),
        ],
        poly_flag: true,
    });
    mesher.generate_mesh(vec![plate]);

    let surf = &mesher.surfs[0];
    let mut inside = 0;
    let mut outside = 0;
    for tri in &surf.simp.tris {
        let c = surf.simp.tri_center_uw(&tri.clone());
        let in_poly = c.x > 0.25 && c.x < 0.75 && c.y > 0.25 && c.y < 0.75;
        match tri.tags.as_slice() {
            [1] => {
                outside += 1;
                assert!(!in_poly, "untagged triangle inside the polygon at {c:?}");
            }
            [1, 9] => {
                inside += 1;
                assert!(in_poly, "tagged triangle outside the polygon at {c:?}");
            }
            other => panic!("unexpected tag set {other:?}"),
        }
    }
    assert!(inside > 0 && outside > 0);
}

#[test]
fn clean_merge_is_idempotent() {
    let settings = quiet_settings();
    let mut mesher = Mesher::new(settings);
    let mut xfers = common::box_xfers(
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 1.0),
        0,
        "box",
        CfdType::Normal,
    );
    // give each face its own component so merging has work to do
    for (i, xfer) in xfers.iter_mut().enumerate() {
        xfer.comp_index = i;
    }
    mesher.load_surfs(xfers);
    mesher.clean_merge_surfs();
    let after_first: Vec<usize> = mesher.surfs.iter().map(|s| s.comp_id).collect();
    let count_first = mesher.surfs.len();
    mesher.clean_merge_surfs();
    let after_second: Vec<usize> = mesher.surfs.iter().map(|s| s.comp_id).collect();
    assert_eq!(after_first, after_second);
    assert_eq!(count_first, mesher.surfs.len());
    // all six faces merged into one component
    assert!(after_first.iter().all(|c| *c == after_first[0]));
}
