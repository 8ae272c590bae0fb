use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::{build_polyhedron, number_opposite_faces, sign_family, PHI};

const RADIUS: f32 = 0.42;

pub(crate) fn vertices() -> Vec<Vec3> {
    let scale = RADIUS / (1.0 + PHI * PHI).sqrt();
    let mut vertices = Vec::with_capacity(12);

    vertices.extend(sign_family(|a, b| Vec3::new(0.0, a, b * PHI)));
    vertices.extend(sign_family(|a, b| Vec3::new(a, b * PHI, 0.0)));
    vertices.extend(sign_family(|a, b| Vec3::new(a * PHI, 0.0, b)));

    vertices.into_iter().map(|v| v * scale).collect()
}

/// Icosahedron: face normals point at the vertices of the dual dodecahedron.
pub fn create_d20() -> (Mesh, Collider, Vec<(Vec3, u32)>) {
    let mut normals = Vec::with_capacity(20);
    for x in [1.0, -1.0] {
        for y in [1.0, -1.0] {
            for z in [1.0, -1.0] {
                normals.push(Vec3::new(x, y, z));
            }
        }
    }
    normals.extend(sign_family(|a, b| Vec3::new(0.0, a * PHI, b / PHI)));
    normals.extend(sign_family(|a, b| Vec3::new(a * PHI, b / PHI, 0.0)));
    normals.extend(sign_family(|a, b| Vec3::new(a / PHI, 0.0, b * PHI)));
    let normals: Vec<Vec3> = normals.into_iter().map(|n| n.normalize()).collect();

    let face_normals = number_opposite_faces(&normals);
    let (mesh, collider) = build_polyhedron(&vertices(), &face_normals);

    (mesh, collider, face_normals)
}
