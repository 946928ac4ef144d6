use approx::assert_relative_eq;
use std::f32::consts::PI;
use traj_engine::collider::{Aabb, Collider, OrientedBox};
use traj_engine::math::{Matrix4, Quaternion, Ray, Vector3};

#[test]
fn test_aabb_containment() {
    let aabb = Aabb::new(Vector3::zero(), Vector3::new(1.0, 2.0, 3.0));

    assert!(aabb.contains(Vector3::zero()));
    assert!(aabb.contains(Vector3::new(1.0, 2.0, 3.0)));
    assert!(!aabb.contains(Vector3::new(1.1, 0.0, 0.0)));
    assert!(!aabb.contains(Vector3::new(0.0, -2.1, 0.0)));

    let other = Aabb::from_min_max(Vector3::new(0.5, 0.5, 0.5), Vector3::new(5.0, 5.0, 5.0));
    assert!(aabb.intersects_aabb(&other));
}

#[test]
fn test_aabb_closest_point_outside() {
    let aabb = Aabb::new(Vector3::zero(), Vector3::splat(1.0));

    let contact = aabb.closest_point(Vector3::new(3.0, 0.0, 0.0));
    assert_eq!(contact.point, Vector3::new(1.0, 0.0, 0.0));
    assert_eq!(contact.normal, Vector3::unit_x());
    // Negative penetration means separation
    assert_relative_eq!(contact.penetration, -2.0);
}

#[test]
fn test_aabb_closest_point_inside() {
    let aabb = Aabb::new(Vector3::zero(), Vector3::splat(1.0));

    // Nearest face is +y
    let contact = aabb.closest_point(Vector3::new(0.1, 0.8, -0.2));
    assert_eq!(contact.normal, Vector3::unit_y());
    assert_relative_eq!(contact.penetration, 0.2, epsilon = 1e-5);
    assert_relative_eq!(contact.point.y, 0.8, epsilon = 1e-5);
}

#[test]
fn test_aabb_ray_intersection() {
    let aabb = Aabb::new(Vector3::zero(), Vector3::splat(1.0));

    let hit = Ray::new(Vector3::new(-5.0, 0.0, 0.0), Vector3::unit_x());
    assert_relative_eq!(aabb.intersect_ray(&hit).unwrap(), 4.0);

    let miss = Ray::new(Vector3::new(-5.0, 3.0, 0.0), Vector3::unit_x());
    assert!(aabb.intersect_ray(&miss).is_none());

    // Pointing away
    let away = Ray::new(Vector3::new(-5.0, 0.0, 0.0), -Vector3::unit_x());
    assert!(aabb.intersect_ray(&away).is_none());

    // Ray starting inside hits at t = 0
    let inside = Ray::new(Vector3::zero(), Vector3::unit_x());
    assert_relative_eq!(inside.point_at(aabb.intersect_ray(&inside).unwrap()).x, 0.0);

    // Parallel ray outside the slab
    let parallel = Ray::new(Vector3::new(0.0, 3.0, 0.0), Vector3::unit_x());
    assert!(aabb.intersect_ray(&parallel).is_none());
}

#[test]
fn test_aabb_transformed() {
    let aabb = Aabb::new(Vector3::zero(), Vector3::new(1.0, 2.0, 3.0));
    let model = Matrix4::from_translation(Vector3::new(10.0, 0.0, 0.0));

    let world = aabb.transformed(&model);
    assert_eq!(world.center, Vector3::new(10.0, 0.0, 0.0));
    assert_eq!(world.half_extents, Vector3::new(1.0, 2.0, 3.0));
}

#[test]
fn test_oriented_box_containment() {
    // Unit cube rotated 45 degrees about z
    let rotation = Quaternion::from_axis_angle(Vector3::unit_z(), PI / 4.0);
    let obb = OrientedBox::new(Vector3::zero(), Vector3::splat(1.0), rotation);

    assert!(obb.contains(Vector3::zero()));
    // The rotated diagonal reaches sqrt(2) along x
    assert!(obb.contains(Vector3::new(1.3, 0.0, 0.0)));
    assert!(!obb.contains(Vector3::new(1.3, 1.3, 0.0)));
}

#[test]
fn test_oriented_box_closest_point() {
    let obb = OrientedBox::new(
        Vector3::zero(),
        Vector3::splat(1.0),
        Quaternion::identity(),
    );

    let outside = obb.closest_point(Vector3::new(0.0, 4.0, 0.0));
    assert_relative_eq!(outside.penetration, -3.0, epsilon = 1e-5);
    assert_relative_eq!(outside.normal.y, 1.0, epsilon = 1e-5);

    let inside = obb.closest_point(Vector3::new(0.0, 0.9, 0.0));
    assert!(inside.penetration > 0.0);
    assert_relative_eq!(inside.penetration, 0.1, epsilon = 1e-5);
}

#[test]
fn test_oriented_box_ray_intersection() {
    let rotation = Quaternion::from_axis_angle(Vector3::unit_z(), PI / 4.0);
    let obb = OrientedBox::new(Vector3::zero(), Vector3::splat(1.0), rotation);

    // Along x the rotated cube extends to sqrt(2)
    let ray = Ray::new(Vector3::new(-5.0, 0.0, 0.0), Vector3::unit_x());
    let t = obb.intersect_ray(&ray).unwrap();
    assert_relative_eq!(t, 5.0 - 2.0f32.sqrt(), epsilon = 1e-4);
}

#[test]
fn test_collider_dispatch() {
    let collider: Collider = Aabb::new(Vector3::zero(), Vector3::splat(2.0)).into();
    assert!(collider.contains(Vector3::new(1.0, 1.0, 1.0)));

    let model = Matrix4::from_translation(Vector3::new(0.0, 10.0, 0.0));
    let world = collider.transformed(&model);
    assert!(world.contains(Vector3::new(0.0, 11.0, 0.0)));
    assert!(!world.contains(Vector3::new(0.0, 1.0, 0.0)));

    let contact = world.closest_point(Vector3::new(0.0, 13.0, 0.0));
    assert_relative_eq!(contact.penetration, -1.0, epsilon = 1e-5);
}
