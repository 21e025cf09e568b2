//! Geometry helpers for sight cones, rays and paths.

use glam::Vec3;

/// Returns the vector with its vertical component removed.
#[must_use]
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Distance between two points ignoring height.
#[must_use]
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    flatten(b - a).length()
}

/// Unsigned angle between two directions, in degrees.
///
/// Returns 0 when either direction is degenerate.
#[must_use]
pub fn angle_between_deg(a: Vec3, b: Vec3) -> f32 {
    let (Some(a), Some(b)) = (a.try_normalize(), b.try_normalize()) else {
        return 0.0;
    };
    a.dot(b).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Returns true if `direction` lies strictly inside a cone of `angle_deg`
/// (full aperture) around `forward`.
#[must_use]
pub fn within_cone(forward: Vec3, direction: Vec3, angle_deg: f32) -> bool {
    angle_between_deg(forward, direction) < angle_deg * 0.5
}

/// Sums consecutive corner-to-corner distances of a path.
#[must_use]
pub fn polyline_length(corners: &[Vec3]) -> f32 {
    corners.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Distance along a ray to the first intersection with a sphere.
///
/// `direction` must be normalized. Rays starting inside the sphere hit at 0.
#[must_use]
pub fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let to_center = center - origin;
    let c = to_center.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    let b = to_center.dot(direction);
    if b <= 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    Some(b - discriminant.sqrt())
}

/// Rotates `forward` toward `target` on the horizontal plane by at most
/// `max_degrees`.
#[must_use]
pub fn rotate_towards(forward: Vec3, target: Vec3, max_degrees: f32) -> Vec3 {
    let from = flatten(forward).try_normalize().unwrap_or(Vec3::Z);
    let Some(to) = flatten(target).try_normalize() else {
        return from;
    };
    let angle = angle_between_deg(from, to);
    if angle <= max_degrees || angle <= f32::EPSILON {
        return to;
    }
    let from_yaw = from.x.atan2(from.z);
    let to_yaw = to.x.atan2(to.z);
    let mut delta = to_yaw - from_yaw;
    while delta > std::f32::consts::PI {
        delta -= std::f32::consts::TAU;
    }
    while delta < -std::f32::consts::PI {
        delta += std::f32::consts::TAU;
    }
    let yaw = from_yaw + delta.signum() * max_degrees.to_radians();
    Vec3::new(yaw.sin(), 0.0, yaw.cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planar_distance_ignores_height() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 10.0, 4.0);
        assert!((planar_distance(a, b) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_within_cone_uses_half_angle() {
        let forward = Vec3::Z;
        let thirty_degrees = Vec3::new(0.5, 0.0, 0.866);
        assert!(within_cone(forward, thirty_degrees, 90.0));
        assert!(!within_cone(forward, thirty_degrees, 60.0));
    }

    #[test]
    fn test_polyline_length() {
        let corners = [
            Vec3::ZERO,
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(3.0, 0.0, 4.0),
        ];
        assert!((polyline_length(&corners) - 7.0).abs() < 1e-5);
        assert_eq!(polyline_length(&corners[..1]), 0.0);
    }

    #[test]
    fn test_ray_sphere_hit_and_miss() {
        let hit = ray_sphere(Vec3::ZERO, Vec3::X, Vec3::new(5.0, 0.0, 0.0), 1.0);
        assert!((hit.expect("ray should hit") - 4.0).abs() < 1e-5);

        let behind = ray_sphere(Vec3::ZERO, Vec3::X, Vec3::new(-5.0, 0.0, 0.0), 1.0);
        assert!(behind.is_none());

        let beside = ray_sphere(Vec3::ZERO, Vec3::X, Vec3::new(5.0, 3.0, 0.0), 1.0);
        assert!(beside.is_none());
    }

    #[test]
    fn test_rotate_towards_clamps_step() {
        let turned = rotate_towards(Vec3::Z, Vec3::X, 45.0);
        assert!((angle_between_deg(Vec3::Z, turned) - 45.0).abs() < 0.01);

        let snapped = rotate_towards(Vec3::Z, Vec3::X, 120.0);
        assert!((snapped - Vec3::X).length() < 1e-5);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn vec3() -> impl Strategy<Value = Vec3> {
            (-100.0f32..100.0, -100.0f32..100.0, -100.0f32..100.0)
                .prop_map(|(x, y, z)| Vec3::new(x, y, z))
        }

        proptest! {
            #[test]
            fn angle_is_symmetric_and_bounded(a in vec3(), b in vec3()) {
                let ab = angle_between_deg(a, b);
                let ba = angle_between_deg(b, a);
                prop_assert!((0.0..=180.0).contains(&ab));
                prop_assert!((ab - ba).abs() < 1e-3);
            }
        }
    }
}
