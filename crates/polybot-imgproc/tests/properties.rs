// Shape and value properties of the transform engine over random grids.

use polybot_imgproc::transform::{blur, concat, contour, rotate, salt_n_pepper, segment};
use polybot_imgproc::{Direction, Grid, ImgProcError, RotateMode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_grid(rng: &mut StdRng, rows: usize, cols: usize) -> Grid {
    let data = (0..rows * cols)
        .map(|_| f64::from(rng.random_range(0u8..=255)))
        .collect();
    Grid::new(rows, cols, data).unwrap()
}

#[test]
fn blur_output_shape_and_cells() {
    let mut rng = StdRng::seed_from_u64(1);
    for (rows, cols, k) in [(7, 9, 3), (5, 5, 5), (12, 4, 2), (6, 8, 1)] {
        let g = random_grid(&mut rng, rows, cols);
        let out = blur(&g, k).unwrap();
        assert_eq!(out.dims(), (rows - k + 1, cols - k + 1));

        for i in 0..out.rows() {
            for j in 0..out.cols() {
                let mut sum = 0.0;
                for r in i..i + k {
                    for c in j..j + k {
                        sum += g.get(r, c);
                    }
                }
                assert_eq!(out.get(i, j), (sum / (k * k) as f64).floor());
            }
        }
    }
}

#[test]
fn contour_shape_and_cells() {
    let mut rng = StdRng::seed_from_u64(2);
    let g = random_grid(&mut rng, 6, 10);
    let out = contour(&g).unwrap();
    assert_eq!(out.dims(), (6, 9));
    for i in 0..6 {
        for j in 1..10 {
            assert_eq!(out.get(i, j - 1), (g.get(i, j - 1) - g.get(i, j)).abs());
        }
    }
}

#[test]
fn segment_is_binary_and_idempotent() {
    let mut rng = StdRng::seed_from_u64(3);
    let g = random_grid(&mut rng, 20, 20);
    let once = segment(&g);
    for (before, after) in g.as_slice().iter().zip(once.as_slice()) {
        let expected = if *before > 100.0 { 255.0 } else { 0.0 };
        assert_eq!(*after, expected);
    }
    assert_eq!(segment(&once), once);
}

#[test]
fn horizontal_concat_places_rows_side_by_side() {
    let mut rng = StdRng::seed_from_u64(4);
    let a = random_grid(&mut rng, 4, 6);
    let b = random_grid(&mut rng, 4, 6);
    let out = concat(&a, &b, Direction::Horizontal).unwrap();
    assert_eq!(out.dims(), (4, 12));
    for i in 0..4 {
        assert_eq!(&out.row(i)[..6], a.row(i));
        assert_eq!(&out.row(i)[6..], b.row(i));
    }
}

#[test]
fn concat_rejects_any_shape_mismatch() {
    let mut rng = StdRng::seed_from_u64(5);
    let a = random_grid(&mut rng, 4, 6);
    for (rows, cols) in [(5, 6), (4, 7), (3, 3)] {
        let b = random_grid(&mut rng, rows, cols);
        for direction in [Direction::Horizontal, Direction::Vertical] {
            assert!(matches!(
                concat(&a, &b, direction),
                Err(ImgProcError::SizeMismatch { .. })
            ));
        }
    }
}

#[test]
fn legacy_rotation_is_full_rotation_minus_last_column() {
    let mut rng = StdRng::seed_from_u64(6);
    let g = random_grid(&mut rng, 5, 5);
    let full = rotate(&g, RotateMode::Full).unwrap();
    let legacy = rotate(&g, RotateMode::LegacyCrop).unwrap();
    assert_eq!(legacy.dims(), (5, 4));
    for i in 0..5 {
        assert_eq!(legacy.row(i), &full.row(i)[..4]);
    }
}

#[test]
fn four_full_rotations_restore_the_grid() {
    let mut rng = StdRng::seed_from_u64(7);
    let g = random_grid(&mut rng, 3, 8);
    let mut out = g.clone();
    for _ in 0..4 {
        out = rotate(&out, RotateMode::Full).unwrap();
    }
    assert_eq!(out, g);
}

#[test]
fn salt_and_pepper_fractions_converge() {
    // Mid-grey input so that neither 0 nor 255 can come from the source.
    let g = Grid::filled(200, 200, 128.0).unwrap();
    let mut rng = StdRng::seed_from_u64(8);
    let out = salt_n_pepper(&g, &mut rng);

    let total = out.as_slice().len() as f64;
    let salt = out.as_slice().iter().filter(|&&v| v == 255.0).count() as f64 / total;
    let pepper = out.as_slice().iter().filter(|&&v| v == 0.0).count() as f64 / total;
    assert!((salt - 0.2).abs() < 0.02, "salt fraction {salt}");
    assert!((pepper - 0.2).abs() < 0.02, "pepper fraction {pepper}");
}
