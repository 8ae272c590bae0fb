use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::{build_polyhedron, number_opposite_faces};

const RADIUS: f32 = 0.42;

pub(crate) fn vertices() -> Vec<Vec3> {
    vec![
        Vec3::X * RADIUS,
        Vec3::NEG_X * RADIUS,
        Vec3::Y * RADIUS,
        Vec3::NEG_Y * RADIUS,
        Vec3::Z * RADIUS,
        Vec3::NEG_Z * RADIUS,
    ]
}

/// Octahedron: one face per octant.
pub fn create_d8() -> (Mesh, Collider, Vec<(Vec3, u32)>) {
    let mut normals = Vec::with_capacity(8);
    for y in [1.0, -1.0] {
        for (x, z) in [(1.0, 1.0), (-1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)] {
            normals.push(Vec3::new(x, y, z).normalize());
        }
    }

    let face_normals = number_opposite_faces(&normals);
    let (mesh, collider) = build_polyhedron(&vertices(), &face_normals);

    (mesh, collider, face_normals)
}
