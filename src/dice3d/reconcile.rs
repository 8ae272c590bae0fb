//! Face reading and value reconciliation
//!
//! A die shows the value of the face whose normal points most nearly up.
//! Reconciling rotates a settled die about its own center so that the face
//! carrying the committed value points straight up.

use bevy::prelude::*;

/// Value of the face pointing most nearly along +Y.
pub fn read_face_value(rotation: Quat, face_normals: &[(Vec3, u32)]) -> u32 {
    let mut best_match = 1;
    let mut best_dot = f32::NEG_INFINITY;

    for (normal, value) in face_normals {
        let dot = (rotation * *normal).dot(Vec3::Y);
        if dot > best_dot {
            best_dot = dot;
            best_match = *value;
        }
    }

    best_match
}

/// Rotation that leaves `target` on top, or `None` if no face carries it.
///
/// The correction is the shortest arc from the target face's current world
/// normal to +Y, applied in world space, so a die that already shows the
/// target is left untouched.
pub fn reconcile_rotation(rotation: Quat, face_normals: &[(Vec3, u32)], target: u32) -> Option<Quat> {
    let (normal, _) = face_normals.iter().find(|(_, value)| *value == target)?;
    let world_normal = (rotation * *normal).normalize();
    let correction = Quat::from_rotation_arc(world_normal, Vec3::Y);
    Some((correction * rotation).normalize())
}
