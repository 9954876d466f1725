use crate::simp::SimpTri;
use crate::*;
use aeromesh_geometry::BezierSurface;
use std::io::Write;
use thiserror::Error;

/// Errors raised by the mesh writers.
#[derive(Debug, Error)]
pub enum ExportError {
    /// underlying stream failure
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

type Result<T> = std::result::Result<T, ExportError>;

fn tri_normal(p0: Point3, p1: Point3, p2: Point3) -> Vector3 {
    let n = (p1 - p0).cross(p2 - p1);
    match n.magnitude2() < 1.0e-30 {
        true => Vector3::new(0.0, 0.0, 0.0),
        false => n.normalize(),
    }
}

fn write_facet<W: Write>(w: &mut W, p0: Point3, p1: Point3, p2: Point3) -> Result<()> {
    let norm = tri_normal(p0, p1, p2);
    writeln!(w, " facet normal  {:2.10e} {:2.10e} {:2.10e}", norm.x, norm.y, norm.z)?;
    writeln!(w, "   outer loop")?;
    for p in [p0, p1, p2] {
        writeln!(w, "     vertex {:2.10e} {:2.10e} {:2.10e}", p.x, p.y, p.z)?;
    }
    writeln!(w, "   endloop")?;
    writeln!(w, " endfacet")?;
    Ok(())
}

/// Writes one ASCII STL solid from a triangle iterator.
pub fn write_stl_solid<W, I>(w: &mut W, name: &str, tris: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = [Point3; 3]>,
{
    match name.is_empty() {
        true => writeln!(w, "solid")?,
        false => writeln!(w, "solid {name}")?,
    }
    for [p0, p1, p2] in tris {
        write_facet(w, p0, p1, p2)?;
    }
    match name.is_empty() {
        true => writeln!(w, "endsolid")?,
        false => writeln!(w, "endsolid {name}")?,
    }
    Ok(())
}

/// Writes a Wavefront OBJ: vertices as `(x, z, −y)`, 1-based triangle lines.
pub fn write_obj<W: Write>(w: &mut W, pnts: &[Point3], tris: &[SimpTri]) -> Result<()> {
    for p in pnts {
        writeln!(w, "v {:16.10} {:16.10} {:16.10}", p.x, p.z, -p.y)?;
    }
    writeln!(w)?;
    for t in tris {
        writeln!(w, "f {} {} {} ", t.ind0 + 1, t.ind1 + 1, t.ind2 + 1)?;
    }
    Ok(())
}

/// Writes a Cart3D `.tri` file: points in `(x, y, z)`, 1-based triangles,
/// then one resolved tag per triangle.
pub fn write_cart3d_tri<W: Write>(
    w: &mut W,
    pnts: &[Point3],
    tris: &[SimpTri],
    tags: &[i32],
) -> Result<()> {
    writeln!(w, "{} {}", pnts.len(), tris.len())?;
    for p in pnts {
        writeln!(w, "{:16.10} {:16.10} {:16.10}", p.x, p.y, p.z)?;
    }
    for t in tris {
        writeln!(w, "{} {} {} ", t.ind0 + 1, t.ind1 + 1, t.ind2 + 1)?;
    }
    for tag in tags {
        writeln!(w, "{tag} ")?;
    }
    Ok(())
}

/// Writes a NASCART `.dat` file: points as `(x, z, −y)`, triangles reversed
/// `(i0, i2, i1)` with the tag as a trailing `.0` field.
pub fn write_nascart_dat<W: Write>(
    w: &mut W,
    pnts: &[Point3],
    tris: &[SimpTri],
    tags: &[i32],
) -> Result<()> {
    writeln!(w, "{} {}", pnts.len(), tris.len())?;
    for p in pnts {
        writeln!(w, "{:.16} {:.16} {:.16}", p.x, p.z, -p.y)?;
    }
    for (t, tag) in tris.iter().zip(tags.iter()) {
        writeln!(w, "{} {} {} {}.0", t.ind0 + 1, t.ind2 + 1, t.ind1 + 1, tag)?;
    }
    Ok(())
}

/// Writes Gmsh 2.2 ASCII: `$MeshFormat`, `$Nodes`, `$Elements` with element
/// type 2 (triangle).
pub fn write_gmsh<W: Write>(w: &mut W, pnts: &[Point3], tris: &[SimpTri]) -> Result<()> {
    writeln!(w, "$MeshFormat")?;
    writeln!(w, "2.2 0 {}", std::mem::size_of::<f64>())?;
    writeln!(w, "$EndMeshFormat")?;

    writeln!(w, "$Nodes")?;
    writeln!(w, "{}", pnts.len())?;
    for (i, p) in pnts.iter().enumerate() {
        writeln!(w, "{} {:16.10} {:16.10} {:16.10}", i + 1, p.x, p.y, p.z)?;
    }
    writeln!(w, "$EndNodes")?;

    writeln!(w, "$Elements")?;
    writeln!(w, "{}", tris.len())?;
    for (i, t) in tris.iter().enumerate() {
        writeln!(
            w,
            "{} 2 0 {} {} {} ",
            i + 1,
            t.ind0 + 1,
            t.ind1 + 1,
            t.ind2 + 1
        )?;
    }
    writeln!(w, "$EndElements")?;
    Ok(())
}

/// Writes a TetGen `.poly` file: node list, one facet per triangle, hole
/// points, empty region list.
pub fn write_tetgen_poly<W: Write>(
    w: &mut W,
    pnts: &[Point3],
    tris: &[SimpTri],
    hole_pnts: &[Point3],
) -> Result<()> {
    writeln!(w, "# Part 1 - node list")?;
    writeln!(w, "{} 3 0 0", pnts.len())?;
    for (i, p) in pnts.iter().enumerate() {
        writeln!(w, "{} {:.16} {:.16} {:.16}", i + 1, p.x, p.y, p.z)?;
    }

    writeln!(w, "# Part 2 - facet list")?;
    writeln!(w, "{} 0", tris.len())?;
    for t in tris {
        writeln!(w, "1")?;
        writeln!(w, "3 {} {} {}", t.ind0 + 1, t.ind1 + 1, t.ind2 + 1)?;
    }

    writeln!(w, "# Part 3 - Hole List")?;
    writeln!(w, "{}", hole_pnts.len())?;
    for (i, p) in hole_pnts.iter().enumerate() {
        writeln!(w, "{}  {:.16} {:.16} {:.16}", i + 1, p.x, p.y, p.z)?;
    }

    writeln!(w, "# Part 4 - region list")?;
    writeln!(w, "0")?;
    Ok(())
}

/// One paired parameter-space polyline for the native `.srf` dump.
#[derive(Clone, Debug, Default)]
pub struct SrfCurve {
    /// surface index of the A side
    pub surf_a: usize,
    /// surface index of the B side
    pub surf_b: usize,
    /// `(a_u, a_w, b_u, b_w)` sample rows
    pub rows: Vec<[f64; 4]>,
}

/// Writes the native `.srf` dump: component table, bezier surfaces, border
/// curves, and intersection curves.
pub fn write_srf<W: Write>(
    w: &mut W,
    comp_surfs: &[(usize, Vec<usize>)],
    surfs: &[&BezierSurface],
    border_curves: &[SrfCurve],
    isect_curves: &[SrfCurve],
) -> Result<()> {
    writeln!(w, "{} Number of Components", comp_surfs.len())?;
    for (comp, surf_ids) in comp_surfs {
        writeln!(w, "{} Component ID, {} Num Surfs", comp, surf_ids.len())?;
        for sid in surf_ids {
            writeln!(w, "{sid}")?;
        }
    }

    writeln!(w, "{} Number of Surfaces", surfs.len())?;
    for (i, surf) in surfs.iter().enumerate() {
        writeln!(w, "{} Surface Number", i)?;
        writeln!(
            w,
            "{} {} Num U and W Patches",
            surf.num_u_patches(),
            surf.num_w_patches()
        )?;
        for row in surf.patches() {
            for net in row {
                for p in net.control_points() {
                    writeln!(w, "{:.16} {:.16} {:.16}", p.x, p.y, p.z)?;
                }
            }
        }
    }

    for (title, curves) in [
        ("Border Curves", border_curves),
        ("Intersect Curves", isect_curves),
    ] {
        writeln!(w, "{} Number of {}", curves.len(), title)?;
        for crv in curves {
            writeln!(
                w,
                "{} {} Surface A and B, {} Num Points",
                crv.surf_a,
                crv.surf_b,
                crv.rows.len()
            )?;
            for r in &crv.rows {
                writeln!(w, "{:.16} {:.16} {:.16} {:.16}", r[0], r[1], r[2], r[3])?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_tri() -> (Vec<Point3>, Vec<SimpTri>) {
        (
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![SimpTri {
                ind0: 0,
                ind1: 1,
                ind2: 2,
                tags: vec![1],
            }],
        )
    }

    #[test]
    fn stl_solid_structure() {
        let (pnts, _) = unit_tri();
        let mut buf = Vec::new();
        write_stl_solid(&mut buf, "wing", [[pnts[0], pnts[1], pnts[2]]]).unwrap();
        let s = String::from_utf8(buf).unwrap();
        assert!(s.starts_with("solid wing\n"));
        assert!(s.ends_with("endsolid wing\n"));
        assert_eq!(s.matches("vertex").count(), 3);
        assert!(s.contains("facet normal"));
    }

    #[test]
    fn obj_flips_axes() {
        let (pnts, tris) = unit_tri();
        let mut buf = Vec::new();
        write_obj(&mut buf, &pnts, &tris).unwrap();
        let s = String::from_utf8(buf).unwrap();
        let first = s.lines().next().unwrap();
        assert!(first.starts_with('v'));
        // y = 0 printed as -0 or 0 in the third slot
        assert!(s.lines().any(|l| l.starts_with("f 1 2 3")));
    }

    #[test]
    fn nascart_reverses_winding() {
        let (pnts, tris) = unit_tri();
        let mut buf = Vec::new();
        write_nascart_dat(&mut buf, &pnts, &tris, &[7]).unwrap();
        let s = String::from_utf8(buf).unwrap();
        assert!(s.lines().next().unwrap().starts_with("3 1"));
        assert!(s.lines().last().unwrap().ends_with("7.0"));
        assert!(s.contains("1 3 2 7.0"));
    }

    #[test]
    fn gmsh_sections() {
        let (pnts, tris) = unit_tri();
        let mut buf = Vec::new();
        write_gmsh(&mut buf, &pnts, &tris).unwrap();
        let s = String::from_utf8(buf).unwrap();
        for tag in ["$MeshFormat", "$Nodes", "$Elements", "$EndElements"] {
            assert!(s.contains(tag));
        }
    }

    #[test]
    fn tetgen_parts() {
        let (pnts, tris) = unit_tri();
        let mut buf = Vec::new();
        write_tetgen_poly(&mut buf, &pnts, &tris, &[Point3::new(0.2, 0.2, 0.0)]).unwrap();
        let s = String::from_utf8(buf).unwrap();
        assert!(s.contains("# Part 1 - node list"));
        assert!(s.contains("# Part 4 - region list"));
        assert!(s.contains("3 1 2 3"));
    }
}
