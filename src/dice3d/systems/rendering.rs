//! Rendering utilities for dice number labels
//!
//! Numbers are built from flat seven-segment strokes so every face value can
//! be produced procedurally without font assets. Labels sit just above the
//! face plane, facing out along the face normal.

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;

use crate::dice3d::meshes::face_inradius;
use crate::dice3d::types::DiceType;

/// Gap between the face plane and the label.
const LABEL_LIFT: f32 = 0.004;

const DIGIT_WIDTH: f32 = 0.55;
const DIGIT_HEIGHT: f32 = 1.0;
const DIGIT_SPACING: f32 = 0.18;
const STROKE: f32 = 0.14;

// Segment bits: a=top, b=top-right, c=bottom-right, d=bottom, e=bottom-left,
// f=top-left, g=middle.
const SEG_A: u8 = 1 << 0;
const SEG_B: u8 = 1 << 1;
const SEG_C: u8 = 1 << 2;
const SEG_D: u8 = 1 << 3;
const SEG_E: u8 = 1 << 4;
const SEG_F: u8 = 1 << 5;
const SEG_G: u8 = 1 << 6;

const DIGIT_SEGMENTS: [u8; 10] = [
    SEG_A | SEG_B | SEG_C | SEG_D | SEG_E | SEG_F,
    SEG_B | SEG_C,
    SEG_A | SEG_B | SEG_G | SEG_E | SEG_D,
    SEG_A | SEG_B | SEG_G | SEG_C | SEG_D,
    SEG_F | SEG_G | SEG_B | SEG_C,
    SEG_A | SEG_F | SEG_G | SEG_C | SEG_D,
    SEG_A | SEG_F | SEG_G | SEG_E | SEG_C | SEG_D,
    SEG_A | SEG_B | SEG_C,
    SEG_A | SEG_B | SEG_C | SEG_D | SEG_E | SEG_F | SEG_G,
    SEG_A | SEG_B | SEG_C | SEG_D | SEG_F | SEG_G,
];

/// Distance from the die center to the label plane
pub fn get_label_offset(die_type: DiceType) -> f32 {
    face_inradius(die_type) + LABEL_LIFT
}

/// Get the scale factor for number labels based on die type
pub fn get_label_scale(die_type: DiceType) -> f32 {
    match die_type {
        DiceType::D6 => 0.24,
        DiceType::D8 => 0.16,
        DiceType::D10 => 0.13,
        DiceType::D12 => 0.12,
        DiceType::D20 => 0.09,
    }
}

/// Rotation taking the label's +Z to the face normal with its +Y kept as
/// close to world up (or world forward, on horizontal faces) as possible.
pub fn get_label_rotation(normal: Vec3) -> Quat {
    let z = normal.normalize();
    let reference = if z.y.abs() > 0.99 { Vec3::NEG_Z } else { Vec3::Y };
    let y = (reference - z * reference.dot(z)).normalize();
    let x = y.cross(z);
    Quat::from_mat3(&Mat3::from_cols(x, y, z))
}

/// Whether a value needs an underline to tell it apart upside down.
pub fn needs_underline(value: u32, die_type: DiceType) -> bool {
    die_type != DiceType::D6 && matches!(value, 6 | 9)
}

/// Create a mesh for a number label
pub fn create_digit_mesh(value: u32, underline: bool) -> Mesh {
    let (positions, indices) = generate_number_geometry(value, underline);
    let normals = vec![[0.0, 0.0, 1.0]; positions.len()];
    let uvs: Vec<[f32; 2]> = positions.iter().map(|p| [p[0] + 0.5, 0.5 - p[1]]).collect();

    Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    )
    .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
    .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
    .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
    .with_inserted_indices(Indices::U32(indices))
}

/// Vertex positions and indices for a multi-digit number, centered on the origin
pub fn generate_number_geometry(value: u32, underline: bool) -> (Vec<[f32; 3]>, Vec<u32>) {
    let digits: Vec<u32> = value
        .to_string()
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect();

    let count = digits.len() as f32;
    let total_width = count * DIGIT_WIDTH + (count - 1.0).max(0.0) * DIGIT_SPACING;
    let start_x = -total_width / 2.0;

    let mut positions = Vec::new();
    let mut indices = Vec::new();

    for (i, digit) in digits.iter().enumerate() {
        let left = start_x + i as f32 * (DIGIT_WIDTH + DIGIT_SPACING);
        push_digit(&mut positions, &mut indices, *digit, left);
    }

    if underline {
        let y = -DIGIT_HEIGHT / 2.0 - STROKE * 1.8;
        push_quad(
            &mut positions,
            &mut indices,
            Vec2::new(start_x, y - STROKE / 2.0),
            Vec2::new(start_x + total_width, y + STROKE / 2.0),
        );
    }

    (positions, indices)
}

fn push_digit(positions: &mut Vec<[f32; 3]>, indices: &mut Vec<u32>, digit: u32, left: f32) {
    let mask = DIGIT_SEGMENTS[digit as usize % 10];
    let right = left + DIGIT_WIDTH;
    let top = DIGIT_HEIGHT / 2.0;
    let bottom = -DIGIT_HEIGHT / 2.0;
    let half = STROKE / 2.0;

    let segments = [
        (SEG_A, Vec2::new(left, top - STROKE), Vec2::new(right, top)),
        (SEG_B, Vec2::new(right - STROKE, 0.0), Vec2::new(right, top)),
        (SEG_C, Vec2::new(right - STROKE, bottom), Vec2::new(right, 0.0)),
        (SEG_D, Vec2::new(left, bottom), Vec2::new(right, bottom + STROKE)),
        (SEG_E, Vec2::new(left, bottom), Vec2::new(left + STROKE, 0.0)),
        (SEG_F, Vec2::new(left, 0.0), Vec2::new(left + STROKE, top)),
        (SEG_G, Vec2::new(left, -half), Vec2::new(right, half)),
    ];

    for (bit, min, max) in segments {
        if mask & bit != 0 {
            push_quad(positions, indices, min, max);
        }
    }
}

fn push_quad(positions: &mut Vec<[f32; 3]>, indices: &mut Vec<u32>, min: Vec2, max: Vec2) {
    let base = positions.len() as u32;
    positions.push([min.x, min.y, 0.0]);
    positions.push([max.x, min.y, 0.0]);
    positions.push([max.x, max.y, 0.0]);
    positions.push([min.x, max.y, 0.0]);
    indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_rotation_maps_z_to_normal() {
        for normal in [
            Vec3::Y,
            Vec3::NEG_Y,
            Vec3::X,
            Vec3::new(1.0, 1.0, 1.0).normalize(),
            Vec3::new(-0.3, -0.8, 0.5).normalize(),
        ] {
            let rotated = get_label_rotation(normal) * Vec3::Z;
            assert!((rotated - normal).length() < 1e-4, "{:?}", normal);
        }
    }

    #[test]
    fn test_number_geometry_segment_counts() {
        // "8" lights all seven segments, "1" two.
        let (positions, indices) = generate_number_geometry(8, false);
        assert_eq!(positions.len(), 7 * 4);
        assert_eq!(indices.len(), 7 * 6);

        let (positions, _) = generate_number_geometry(1, false);
        assert_eq!(positions.len(), 2 * 4);
    }

    #[test]
    fn test_two_digit_numbers_are_centered() {
        let (positions, _) = generate_number_geometry(20, false);
        let min_x = positions.iter().map(|p| p[0]).fold(f32::MAX, f32::min);
        let max_x = positions.iter().map(|p| p[0]).fold(f32::MIN, f32::max);
        assert!((min_x + max_x).abs() < 1e-5);
    }

    #[test]
    fn test_underline_only_where_ambiguous() {
        assert!(needs_underline(6, DiceType::D20));
        assert!(needs_underline(9, DiceType::D10));
        assert!(!needs_underline(6, DiceType::D6));
        assert!(!needs_underline(7, DiceType::D20));

        let (plain, _) = generate_number_geometry(9, false);
        let (marked, _) = generate_number_geometry(9, true);
        assert_eq!(marked.len(), plain.len() + 4);
    }
}
