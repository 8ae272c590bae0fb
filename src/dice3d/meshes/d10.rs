use std::f32::consts::{PI, TAU};

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::{build_polyhedron, number_opposite_faces};

/// Pole height. The rings and kite slopes below are derived from it.
const APEX: f32 = 0.42;
/// Ratio of ring radius to apex height for the pentagonal trapezohedron.
const RING_RADIUS_RATIO: f32 = 1.005_46;

fn ring_height() -> f32 {
    // A kite is only planar when apex = ring_height * (1 + cos36) / (1 - cos36).
    let c = (PI / 5.0).cos();
    APEX * (1.0 - c) / (1.0 + c)
}

pub(crate) fn vertices() -> Vec<Vec3> {
    let radius = APEX * RING_RADIUS_RATIO;
    let z = ring_height();

    let mut vertices = vec![Vec3::Y * APEX, Vec3::NEG_Y * APEX];
    for i in 0..5 {
        let upper = i as f32 * TAU / 5.0;
        let lower = upper + PI / 5.0;
        vertices.push(Vec3::new(radius * upper.cos(), z, radius * upper.sin()));
        vertices.push(Vec3::new(radius * lower.cos(), -z, radius * lower.sin()));
    }
    vertices
}

/// Pentagonal trapezohedron: five kites meeting at each pole.
pub fn create_d10() -> (Mesh, Collider, Vec<(Vec3, u32)>) {
    let radius = APEX * RING_RADIUS_RATIO;
    let z = ring_height();
    let c = (PI / 5.0).cos();

    // Horizontal to vertical ratio of a kite normal.
    let slope = 2.0 * z / (radius * (1.0 - c));

    let mut normals = Vec::with_capacity(10);
    for i in 0..5 {
        let upper = i as f32 * TAU / 5.0 + PI / 5.0;
        normals.push(Vec3::new(slope * upper.cos(), 1.0, slope * upper.sin()).normalize());
    }
    for i in 0..5 {
        let lower = i as f32 * TAU / 5.0;
        normals.push(Vec3::new(slope * lower.cos(), -1.0, slope * lower.sin()).normalize());
    }

    let face_normals = number_opposite_faces(&normals);
    let (mesh, collider) = build_polyhedron(&vertices(), &face_normals);

    (mesh, collider, face_normals)
}
