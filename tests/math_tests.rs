use approx::assert_relative_eq;
use std::f32::consts::PI;
use traj_engine::math::{approx_eq, approx_zero, lerp, Matrix3, Matrix4, Quaternion, Ray, Vector3};

#[test]
fn test_scalar_helpers() {
    assert!(approx_eq(1.0, 1.0 + 1e-7));
    assert!(!approx_eq(1.0, 1.001));
    assert!(approx_zero(1e-7));
    assert!(!approx_zero(0.1));
    assert_relative_eq!(lerp(2.0, 4.0, 0.5), 3.0);
}

#[test]
fn test_vector3_operations() {
    let v1 = Vector3::new(1.0, 2.0, 3.0);
    let v2 = Vector3::new(4.0, 5.0, 6.0);

    let sum = v1 + v2;
    assert_eq!(sum, Vector3::new(5.0, 7.0, 9.0));

    let diff = v2 - v1;
    assert_eq!(diff, Vector3::new(3.0, 3.0, 3.0));

    let scaled = v1 * 2.0;
    assert_eq!(scaled, Vector3::new(2.0, 4.0, 6.0));

    let halved = v1 / 2.0;
    assert_eq!(halved, Vector3::new(0.5, 1.0, 1.5));

    let dot = v1.dot(&v2);
    assert_eq!(dot, 32.0);

    let cross = Vector3::unit_x().cross(&Vector3::unit_y());
    assert_eq!(cross, Vector3::unit_z());

    let length = v1.length();
    assert_relative_eq!(length, 14.0f32.sqrt());

    let normalized = v1.normalize();
    assert_relative_eq!(normalized.length(), 1.0);

    assert_eq!(Vector3::unit_axis(0), Vector3::unit_x());
    assert_eq!(Vector3::unit_axis(1), Vector3::unit_y());
    assert_eq!(Vector3::unit_axis(2), Vector3::unit_z());
}

#[test]
fn test_vector3_clamp_and_lerp() {
    let v = Vector3::new(2.0, -3.0, 0.5);
    let clamped = v.clamp(Vector3::splat(-1.0), Vector3::splat(1.0));
    assert_eq!(clamped, Vector3::new(1.0, -1.0, 0.5));

    let a = Vector3::new(0.0, 0.0, 0.0);
    let b = Vector3::new(10.0, 20.0, -4.0);
    assert_eq!(a.lerp(&b, 0.0), a);
    assert_eq!(a.lerp(&b, 1.0), b);
    assert_eq!(a.lerp(&b, 0.5), Vector3::new(5.0, 10.0, -2.0));
}

#[test]
fn test_matrix3_inverse() {
    let m = Matrix3::from_columns(
        Vector3::new(2.0, 0.0, 0.0),
        Vector3::new(0.0, 4.0, 0.0),
        Vector3::new(0.0, 0.0, 8.0),
    );
    assert_relative_eq!(m.determinant(), 64.0);

    let inverse = m.inverse().unwrap();
    let v = Vector3::new(2.0, 4.0, 8.0);
    let roundtrip = inverse.multiply_vector(m.multiply_vector(v));
    assert_relative_eq!(roundtrip.x, v.x, epsilon = 1e-5);
    assert_relative_eq!(roundtrip.y, v.y, epsilon = 1e-5);
    assert_relative_eq!(roundtrip.z, v.z, epsilon = 1e-5);

    // Singular matrices have no inverse
    assert!(Matrix3::zero().inverse().is_none());
}

#[test]
fn test_matrix3_columns_and_abs() {
    let m = Matrix3::from_columns(
        Vector3::new(1.0, 2.0, 3.0),
        Vector3::new(-4.0, 5.0, -6.0),
        Vector3::new(7.0, -8.0, 9.0),
    );
    assert_eq!(m.column(0), Vector3::new(1.0, 2.0, 3.0));
    assert_eq!(m.column(1), Vector3::new(-4.0, 5.0, -6.0));

    let abs = m.abs();
    assert_eq!(abs.column(1), Vector3::new(4.0, 5.0, 6.0));
    assert_eq!(abs.column(2), Vector3::new(7.0, 8.0, 9.0));
}

#[test]
fn test_matrix4_translation() {
    let m = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0));
    assert_eq!(m.translation(), Vector3::new(1.0, 2.0, 3.0));

    // Points pick up the translation, directions do not
    let p = m.multiply_point(Vector3::new(1.0, 1.0, 1.0));
    assert_eq!(p, Vector3::new(2.0, 3.0, 4.0));

    let d = m.multiply_direction(Vector3::new(1.0, 1.0, 1.0));
    assert_eq!(d, Vector3::new(1.0, 1.0, 1.0));

    let shifted = m.translated(Vector3::new(0.0, 0.0, -3.0));
    assert_eq!(shifted.translation(), Vector3::new(1.0, 2.0, 0.0));
}

#[test]
fn test_quaternion_rotation() {
    let q = Quaternion::from_axis_angle(Vector3::unit_z(), PI / 2.0);

    let rotated = q.rotate_vector(Vector3::unit_x());
    assert_relative_eq!(rotated.x, 0.0, epsilon = 1e-5);
    assert_relative_eq!(rotated.y, 1.0, epsilon = 1e-5);
    assert_relative_eq!(rotated.z, 0.0, epsilon = 1e-5);

    // Conjugate undoes the rotation
    let back = q.conjugate().rotate_vector(rotated);
    assert_relative_eq!(back.x, 1.0, epsilon = 1e-5);
    assert_relative_eq!(back.y, 0.0, epsilon = 1e-5);
}

#[test]
fn test_quaternion_matrix_roundtrip() {
    let q = Quaternion::from_axis_angle(Vector3::new(1.0, 1.0, 0.0).normalize(), 0.7);
    let m = q.to_rotation_matrix();
    let q2 = Quaternion::from_linear(&m);

    let v = Vector3::new(3.0, -2.0, 5.0);
    let a = q.rotate_vector(v);
    let b = q2.rotate_vector(v);
    assert_relative_eq!(a.x, b.x, epsilon = 1e-4);
    assert_relative_eq!(a.y, b.y, epsilon = 1e-4);
    assert_relative_eq!(a.z, b.z, epsilon = 1e-4);
}

#[test]
fn test_ray_basics() {
    let ray = Ray::new_normalized(Vector3::zero(), Vector3::new(0.0, 0.0, 2.0));
    assert_relative_eq!(ray.direction.length(), 1.0);
    assert_eq!(ray.point_at(3.0), Vector3::new(0.0, 0.0, 3.0));

    let m = Matrix4::from_translation(Vector3::new(5.0, 0.0, 0.0));
    let moved = ray.transform(&m);
    assert_eq!(moved.origin, Vector3::new(5.0, 0.0, 0.0));
    assert_eq!(moved.direction, ray.direction);
}
