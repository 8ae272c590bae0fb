pub mod d10;
pub mod d12;
pub mod d20;
pub mod d6;
pub mod d8;

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::dice3d::types::DiceType;

pub use d10::create_d10;
pub use d12::create_d12;
pub use d20::create_d20;
pub use d6::create_d6;
pub use d8::create_d8;

/// Golden ratio, shared by the d12 and d20 layouts.
pub(crate) const PHI: f32 = 1.618_034;

pub fn create_die_mesh_and_collider(die_type: DiceType) -> (Mesh, Collider, Vec<(Vec3, u32)>) {
    match die_type {
        DiceType::D6 => create_d6(),
        DiceType::D8 => create_d8(),
        DiceType::D10 => create_d10(),
        DiceType::D12 => create_d12(),
        DiceType::D20 => create_d20(),
    }
}

/// Number faces so that opposite faces always add up to `faces + 1`.
///
/// Normals are visited in the given order; each unnumbered normal takes the
/// next low value and its antipode the matching high value.
pub(crate) fn number_opposite_faces(normals: &[Vec3]) -> Vec<(Vec3, u32)> {
    let total = normals.len() as u32;
    let mut values = vec![0u32; normals.len()];
    let mut next = 1;

    for i in 0..normals.len() {
        if values[i] != 0 {
            continue;
        }
        values[i] = next;
        if let Some(j) = normals
            .iter()
            .position(|other| other.dot(normals[i]) < -0.999)
        {
            values[j] = total + 1 - next;
        }
        next += 1;
    }

    normals.iter().copied().zip(values).collect()
}

/// Every sign combination of `(a, b)` placed into a vector by `place`.
pub(crate) fn sign_family(place: impl Fn(f32, f32) -> Vec3) -> [Vec3; 4] {
    [place(1.0, 1.0), place(1.0, -1.0), place(-1.0, 1.0), place(-1.0, -1.0)]
}

/// Build a flat-shaded convex polyhedron mesh and its hull collider.
///
/// Each face is the set of vertices lying furthest along its normal; those
/// are sorted around the face center and fanned into triangles.
pub(crate) fn build_polyhedron(vertices: &[Vec3], face_normals: &[(Vec3, u32)]) -> (Mesh, Collider) {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut uvs: Vec<[f32; 2]> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    for (normal, _) in face_normals {
        let normal = normal.normalize();
        let plane = vertices
            .iter()
            .map(|v| v.dot(normal))
            .fold(f32::NEG_INFINITY, f32::max);

        let mut face: Vec<Vec3> = vertices
            .iter()
            .copied()
            .filter(|v| (v.dot(normal) - plane).abs() < 1e-4)
            .collect();
        if face.len() < 3 {
            continue;
        }

        let center = face.iter().copied().sum::<Vec3>() / face.len() as f32;
        let u = (face[0] - center).normalize();
        let w = normal.cross(u);
        face.sort_by(|a, b| {
            let ang_a = (*a - center).dot(w).atan2((*a - center).dot(u));
            let ang_b = (*b - center).dot(w).atan2((*b - center).dot(u));
            ang_a.total_cmp(&ang_b)
        });

        let base = positions.len() as u32;
        for v in &face {
            positions.push(v.to_array());
            normals.push(normal.to_array());
            let local = *v - center;
            uvs.push([0.5 + local.dot(u), 0.5 + local.dot(w)]);
        }
        for k in 1..(face.len() as u32 - 1) {
            indices.extend_from_slice(&[base, base + k, base + k + 1]);
        }
    }

    let mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    )
    .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
    .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
    .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
    .with_inserted_indices(Indices::U32(indices));

    let radius = vertices.iter().map(|v| v.length()).fold(0.0, f32::max);
    let collider = Collider::convex_hull(vertices).unwrap_or_else(|| Collider::ball(radius));

    (mesh, collider)
}

/// Distance from the die center to its faces.
pub fn face_inradius(die_type: DiceType) -> f32 {
    match die_type {
        DiceType::D6 => d6::HALF_SIZE,
        DiceType::D8 => 0.2425,
        DiceType::D10 => 0.2826,
        DiceType::D12 => 0.3179,
        DiceType::D20 => 0.3338,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_die(die_type: DiceType) {
        let (mesh, _, faces) = create_die_mesh_and_collider(die_type);
        let n = die_type.max_value();
        assert_eq!(faces.len() as u32, n, "{} face count", die_type.name());

        let mut values: Vec<u32> = faces.iter().map(|(_, v)| *v).collect();
        values.sort();
        assert_eq!(values, (1..=n).collect::<Vec<_>>(), "{} values", die_type.name());

        for (normal, value) in &faces {
            let opposite = faces
                .iter()
                .find(|(other, _)| other.dot(*normal) < -0.999)
                .map(|(_, v)| *v);
            assert_eq!(opposite, Some(n + 1 - value), "{} opposite of {}", die_type.name(), value);
        }

        let index_count = mesh.indices().map(|i| i.len()).unwrap_or(0);
        assert!(index_count >= faces.len() * 3);
    }

    #[test]
    fn test_d6_faces() {
        assert_die(DiceType::D6);
    }

    #[test]
    fn test_d8_faces() {
        assert_die(DiceType::D8);
    }

    #[test]
    fn test_d10_faces() {
        assert_die(DiceType::D10);
    }

    #[test]
    fn test_d12_faces() {
        assert_die(DiceType::D12);
    }

    #[test]
    fn test_d20_faces() {
        assert_die(DiceType::D20);
    }

    #[test]
    fn test_face_normals_are_unit_length() {
        for die in DiceType::ALL {
            let (_, _, faces) = create_die_mesh_and_collider(die);
            for (normal, _) in faces {
                assert!((normal.length() - 1.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_inradius_matches_geometry() {
        for die in [DiceType::D8, DiceType::D10, DiceType::D12, DiceType::D20] {
            let vertices = match die {
                DiceType::D8 => d8::vertices(),
                DiceType::D10 => d10::vertices(),
                DiceType::D12 => d12::vertices(),
                _ => d20::vertices(),
            };
            let (_, _, faces) = create_die_mesh_and_collider(die);
            let (normal, _) = faces[0];
            let plane = vertices
                .iter()
                .map(|v| v.dot(normal))
                .fold(f32::NEG_INFINITY, f32::max);
            assert!(
                (plane - face_inradius(die)).abs() < 2e-3,
                "{} inradius {}",
                die.name(),
                plane
            );
        }
    }
}
