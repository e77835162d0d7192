//! Property тесты wall basis на случайных (seeded) нормалях
//!
//! Для любой поверхности: basis ортонормирован, right = forward × normal,
//! меш после orient смотрит (+X) туда, куда идёт input.

use bevy::prelude::*;
use gravshift_simulation::wall::{compute_wall_attachment, orient_mesh_to_wall, CapsuleDimensions};
use gravshift_simulation::SurfaceHit;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const SAMPLES: usize = 500;
const TOLERANCE: f32 = 1e-4;

fn random_unit(rng: &mut ChaCha8Rng) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        if v.length() > 0.1 {
            return v.normalize();
        }
    }
}

fn random_hit(rng: &mut ChaCha8Rng) -> SurfaceHit {
    SurfaceHit {
        point: Vec3::new(
            rng.gen_range(-2000.0..2000.0),
            rng.gen_range(-2000.0..2000.0),
            rng.gen_range(-2000.0..2000.0),
        ),
        normal: random_unit(rng),
        distance: rng.gen_range(0.0..200.0),
    }
}

fn random_capsule(rng: &mut ChaCha8Rng) -> Transform {
    Transform {
        translation: Vec3::new(rng.gen_range(-500.0..500.0), rng.gen_range(0.0..500.0), 0.0),
        rotation: Quat::from_rotation_y(rng.gen_range(-3.1..3.1)),
        scale: Vec3::ONE,
    }
}

#[test]
fn test_basis_is_orthonormal_for_any_normal() {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let dims = CapsuleDimensions::default();

    for i in 0..SAMPLES {
        let hit = random_hit(&mut rng);
        let capsule = random_capsule(&mut rng);
        let basis = compute_wall_attachment(&hit, &capsule, &dims).basis;

        for (name, axis) in [("normal", basis.normal), ("right", basis.right), ("forward", basis.forward)] {
            assert!((axis.length() - 1.0).abs() < TOLERANCE, "sample {i}: {name} not unit: {axis:?}");
        }
        assert!(basis.normal.dot(basis.right).abs() < TOLERANCE, "sample {i}: {basis:?}");
        assert!(basis.normal.dot(basis.forward).abs() < TOLERANCE, "sample {i}: {basis:?}");
        assert!(basis.right.dot(basis.forward).abs() < TOLERANCE, "sample {i}: {basis:?}");
        assert!(
            basis.forward.cross(basis.normal).abs_diff_eq(basis.right, TOLERANCE),
            "sample {i}: handedness {basis:?}"
        );
        assert!(basis.normal.abs_diff_eq(hit.normal, TOLERANCE));
    }
}

#[test]
fn test_capsule_target_sits_off_the_surface() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let dims = CapsuleDimensions::default();

    for _ in 0..SAMPLES {
        let hit = random_hit(&mut rng);
        let capsule = random_capsule(&mut rng);
        let attachment = compute_wall_attachment(&hit, &capsule, &dims);

        // Над плоскостью контакта минимум на радиус
        let height = (attachment.capsule.translation - hit.point).dot(hit.normal);
        assert!(height >= dims.radius - 1e-2, "height {height} for {hit:?}");

        // Капсула всегда стоит вертикально
        let up = attachment.capsule.rotation * Vec3::Y;
        assert!(up.abs_diff_eq(Vec3::Y, TOLERANCE));
        assert!(attachment.approach_direction.y.abs() < TOLERANCE);
    }
}

#[test]
fn test_oriented_mesh_follows_input() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let dims = CapsuleDimensions::default();

    for i in 0..SAMPLES {
        let hit = random_hit(&mut rng);
        let capsule = random_capsule(&mut rng);
        let attachment = compute_wall_attachment(&hit, &capsule, &dims);

        let angle = rng.gen_range(-3.1..3.1f32);
        let input = Vec2::new(angle.sin(), angle.cos());

        let Some(rotation) = orient_mesh_to_wall(input, &attachment.basis, attachment.wall_rotator) else {
            panic!("sample {i}: non-zero input produced no rotation");
        };

        let expected = attachment.basis.movement_direction(input).normalize();
        assert!((rotation * Vec3::Y).abs_diff_eq(attachment.basis.normal, 1e-3), "sample {i}");
        assert!((rotation * Vec3::X).abs_diff_eq(expected, 1e-3), "sample {i}");
    }
}
