use crate::settings::{CfdType, MeshSettings};
use crate::surf::Surf;
use crate::*;
use aeromesh_mesh::FaceId;

/// Ray jiggle keeping the +x classification ray off edges and vertices.
const RAY_JIGGLE: f64 = 1.0e-4;

/// Decides whether a triangle dies, from its surface's type, the
/// symmetry-plane flag, and the per-component inside flags.
pub fn set_delete_tri_flag(
    a_type: CfdType,
    sym_plane: bool,
    a_in_b: &[bool],
    surfs: &[Surf],
    settings: &MeshSettings,
) -> bool {
    let mut delete_tri = false;

    // absolute rules first
    for surf in surfs {
        let c = surf.comp_id;
        let inside = a_in_b.get(c).copied().unwrap_or(false);
        let b_type = surf.cfd_type;
        if !inside {
            continue;
        }
        // the far-field component trims the symmetry plane
        if sym_plane && surf.far_flag && settings.far_comp_flag {
            return true;
        }
        // like types swallow each other (transparent never does)
        if a_type == b_type && a_type != CfdType::Transparent {
            return true;
        }
        if a_type == CfdType::Normal && b_type == CfdType::Negative {
            return true;
        }
        if a_type == CfdType::Transparent && b_type == CfdType::Negative {
            return false;
        }
    }

    // then the order-dependent remainder
    for surf in surfs {
        let c = surf.comp_id;
        let inside = a_in_b.get(c).copied().unwrap_or(false);
        let b_type = surf.cfd_type;
        if inside {
            if a_type == CfdType::Negative && b_type == CfdType::Normal {
                return false;
            }
            if a_type == CfdType::Transparent && b_type == CfdType::Normal {
                return true;
            }
        } else if a_type == CfdType::Negative {
            // negative skins only matter where they carve
            delete_tri = true;
        }
    }
    delete_tri
}

/// Classifies every triangle of every surface by ray parity against each
/// other component, smooths the verdicts by a 3-ring neighbor vote, sets the
/// delete flags by the type rules, applies the half-mesh trims, and removes
/// the flagged faces.
pub fn remove_interior_tris(surfs: &mut [Surf], settings: &MeshSettings, num_comps: usize) {
    let mut big_box = BoundingBox::new();
    for surf in surfs.iter() {
        big_box.merge(&surf.bbox);
    }
    let x_dist = 1.0 + big_box.max().x - big_box.min().x;
    let ncomp = num_comps + match settings.sym_splitting_flag {
        true => 10,
        false => 6,
    };

    for s in 0..surfs.len() {
        let tri_comp_id = surfs[s].comp_id;
        let sym_plane = surfs[s].sym_plane_flag;

        // gather ray parities per face against every other component
        let face_ids: Vec<FaceId> = surfs[s].mesh.face_ids().collect();
        let mut inside_of: Vec<Vec<bool>> = Vec::with_capacity(face_ids.len());
        for f in &face_ids {
            let center_uw = surfs[s].mesh.face_center_uw(*f);
            let center = surfs[s].mesh.face_center(*f);
            let (u, w) = surfs[s].closest_uw_guess(center, (center_uw.x, center_uw.y));
            let cp = surfs[s].point(u, w);
            let ep = cp + Vector3::new(x_dist, RAY_JIGGLE, RAY_JIGGLE);

            let mut t_per_comp: Vec<Vec<f64>> = vec![Vec::new(); ncomp];
            for other in surfs.iter() {
                if other.comp_id == tri_comp_id {
                    continue;
                }
                let check_transparent = other.far_flag && sym_plane && settings.far_comp_flag;
                if other.cfd_type == CfdType::Transparent && !check_transparent {
                    continue;
                }
                other.intersect_line_seg(cp, ep, &mut t_per_comp[other.comp_id]);
            }

            let mut inside = vec![false; ncomp];
            for other in surfs.iter() {
                let c = other.comp_id;
                let count = t_per_comp[c].len();
                if sym_plane && other.far_flag && settings.far_comp_flag {
                    // parity flips for the symmetry plane against the far component
                    inside[c] = (count + 1) % 2 == 1;
                } else {
                    inside[c] = count % 2 == 1;
                }
            }
            inside_of.push(inside);
        }

        let mesh = &mut surfs[s].mesh;
        for (f, inside) in face_ids.iter().zip(inside_of.into_iter()) {
            mesh.face_mut(*f).inside = inside;
            mesh.face_mut(*f).vote = vec![0; ncomp];
        }

        // neighborhood voting across three face rings
        let mut ring = Vec::new();
        for f in &face_ids {
            ring.clear();
            mesh.adjacent_faces(*f, 3, &mut ring);
            let inside = mesh.face(*f).inside.clone();
            for adj in &ring {
                for c in 0..ncomp {
                    let delta = match inside[c] {
                        true => 1,
                        false => -1,
                    };
                    mesh.face_mut(*adj).vote[c] += delta;
                }
            }
        }
        for f in &face_ids {
            for c in 0..ncomp {
                let vote = mesh.face(*f).vote[c];
                if vote > 0 {
                    mesh.face_mut(*f).inside[c] = true;
                } else if vote < 0 {
                    mesh.face_mut(*f).inside[c] = false;
                } else {
                    log::debug!("inside/outside vote inconclusive on surf {s}");
                }
            }
        }
    }

    // delete rules
    for s in 0..surfs.len() {
        let a_type = surfs[s].cfd_type;
        let sym_plane = surfs[s].sym_plane_flag;
        let face_ids: Vec<FaceId> = surfs[s].mesh.face_ids().collect();
        let mut verdicts = Vec::with_capacity(face_ids.len());
        for f in &face_ids {
            let inside = surfs[s].mesh.face(*f).inside.clone();
            verdicts.push(set_delete_tri_flag(a_type, sym_plane, &inside, surfs, settings));
        }
        let mesh = &mut surfs[s].mesh;
        for (f, verdict) in face_ids.iter().zip(verdicts) {
            mesh.face_mut(*f).delete_me = verdict;
        }
    }

    // half-mesh trims
    if settings.half_mesh_flag {
        for surf in surfs.iter_mut() {
            if !surf.sym_plane_flag {
                for f in surf.mesh.face_ids().collect::<Vec<_>>() {
                    if surf.mesh.face_center(f).y < -1.0e-10 {
                        surf.mesh.face_mut(f).delete_me = true;
                    }
                }
            } else if !settings.far_mesh_flag {
                // no far field: the symmetry plane itself goes
                for f in surf.mesh.face_ids().collect::<Vec<_>>() {
                    surf.mesh.face_mut(f).delete_me = true;
                }
            }
        }
    }

    for surf in surfs.iter_mut() {
        surf.mesh.remove_interior();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surf_of(comp: usize, cfd: CfdType) -> Surf {
        Surf {
            comp_id: comp,
            cfd_type: cfd,
            ..Default::default()
        }
    }

    #[test]
    fn delete_rule_table() {
        let settings = MeshSettings::default();
        let surfs = vec![surf_of(0, CfdType::Normal), surf_of(1, CfdType::Negative)];
        // normal inside normal: delete
        assert!(set_delete_tri_flag(
            CfdType::Normal,
            false,
            &[true, false],
            &surfs,
            &settings
        ));
        // normal inside negative: delete (carved)
        assert!(set_delete_tri_flag(
            CfdType::Normal,
            false,
            &[false, true],
            &surfs,
            &settings
        ));
        // negative inside normal: keep (forms the cavity wall)
        assert!(!set_delete_tri_flag(
            CfdType::Negative,
            false,
            &[true, false],
            &surfs,
            &settings
        ));
        // negative outside everything: delete
        assert!(set_delete_tri_flag(
            CfdType::Negative,
            false,
            &[false, false],
            &surfs,
            &settings
        ));
        // transparent inside normal: delete
        assert!(set_delete_tri_flag(
            CfdType::Transparent,
            false,
            &[true, false],
            &surfs,
            &settings
        ));
        // transparent inside negative: keep
        assert!(!set_delete_tri_flag(
            CfdType::Transparent,
            false,
            &[false, true],
            &surfs,
            &settings
        ));
    }
}
