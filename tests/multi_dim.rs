// Test intent: validates the nested dispatcher against separable 1D transforms and checks round trips.
use radixfft::{Complex32, Complex64, FftEngine, FftError, MultiFft, Nested};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn grid(rows: usize, cols: usize, seed: u64) -> Vec<Vec<Complex64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..rows)
        .map(|_| {
            (0..cols)
                .map(|_| Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
                .collect()
        })
        .collect()
}

/// Row-column 2D transform built from 1D transforms.
fn separable(engine: &FftEngine<f64>, data: &mut [Vec<Complex64>]) {
    for row in data.iter_mut() {
        engine.complex_forward(row).unwrap();
    }
    let rows = data.len();
    let mut column = vec![Complex64::new(0.0, 0.0); rows];
    for c in 0..data[0].len() {
        for r in 0..rows {
            column[r] = data[r][c];
        }
        engine.complex_forward(&mut column).unwrap();
        for r in 0..rows {
            data[r][c] = column[r];
        }
    }
}

#[test]
fn matches_row_column_transform() {
    let engine = FftEngine::<f64>::new();
    let multi = MultiFft::from(engine.clone());
    for (rows, cols) in [(2, 2), (4, 16), (8, 8), (32, 4)] {
        let input = grid(rows, cols, (rows + cols) as u64);
        let mut expected = input.clone();
        separable(&engine, &mut expected);
        let mut data = input;
        multi.complex_forward(&mut data).unwrap();
        for (row, exp) in data.iter().zip(&expected) {
            for (a, b) in row.iter().zip(exp) {
                assert!((*a - *b).norm() < 1e-10, "{rows}x{cols}");
            }
        }
    }
}

#[test]
fn three_dim_round_trip_f32() {
    let multi = MultiFft::<f32>::new();
    let mut rng = StdRng::seed_from_u64(11);
    let input: Vec<Nested<Vec<Complex32>>> = (0..4)
        .map(|_| {
            Nested(
                (0..4)
                    .map(|_| {
                        (0..8)
                            .map(|_| Complex32::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
                            .collect()
                    })
                    .collect(),
            )
        })
        .collect();
    let mut data = input.clone();
    multi.complex_forward(&mut data).unwrap();
    multi.complex_back(&mut data).unwrap();
    let factor = 1.0 / (4 * 4 * 8) as f32;
    for (plane, orig) in data.iter().zip(&input) {
        for (row, orig_row) in plane.0.iter().zip(&orig.0) {
            for (a, b) in row.iter().zip(orig_row) {
                assert!((a.scale(factor) - *b).norm() < 1e-5);
            }
        }
    }
}

#[test]
fn real_volume_round_trip() {
    let multi = MultiFft::<f64>::new();
    let mut rng = StdRng::seed_from_u64(12);
    let input: Vec<Nested<Vec<f64>>> = (0..2)
        .map(|_| {
            Nested(
                (0..4)
                    .map(|_| (0..32).map(|_| rng.gen_range(-1.0..1.0)).collect())
                    .collect(),
            )
        })
        .collect();
    let mut data = input.clone();
    multi.real_transform(&mut data, true).unwrap();
    multi.real_transform(&mut data, false).unwrap();
    // 2 planes, 4 rows, 32 packed reals contributing 16.
    let factor = (2 * 4 * 16) as f64;
    for (plane, orig) in data.iter().zip(&input) {
        for (row, orig_row) in plane.0.iter().zip(&orig.0) {
            for (a, b) in row.iter().zip(orig_row) {
                assert!((a / factor - b).abs() < 1e-12);
            }
        }
    }
}

#[test]
fn complex_rows_as_real_innermost() {
    // Complex rows under a real transform are treated as interleaved reals.
    let multi = MultiFft::<f64>::new();
    let mut data = vec![vec![Complex64::new(1.0, 1.0); 4]; 2];
    multi.real_transform(&mut data, true).unwrap();
    assert!((data[0][0].re - 16.0).abs() < 1e-12);
    assert!(data[0][1..].iter().chain(&data[1]).all(|c| c.norm() < 1e-12));
}

#[test]
fn rejects_ragged_rows() {
    let multi = MultiFft::<f64>::new();
    let mut data = grid(4, 8, 1);
    data[2].truncate(4);
    assert_eq!(multi.complex_forward(&mut data), Err(FftError::ShapeMismatch));
}

#[test]
fn inner_errors_surface() {
    let multi = MultiFft::<f64>::new();
    let mut data: Vec<Vec<f64>> = vec![Vec::new(); 4];
    assert_eq!(multi.real_transform(&mut data, true), Err(FftError::EmptyInput));
}

/// Direct 3D DFT of a real volume, `X[p][u][k]` as `(re, im)`.
fn naive_dft3(x: &[Vec<Vec<f64>>]) -> Vec<Vec<Vec<(f64, f64)>>> {
    let (planes, rows, cols) = (x.len(), x[0].len(), x[0][0].len());
    let mut out = vec![vec![vec![(0.0, 0.0); cols]; rows]; planes];
    for p in 0..planes {
        for u in 0..rows {
            for k in 0..cols {
                let (mut re, mut im) = (0.0, 0.0);
                for (a, plane) in x.iter().enumerate() {
                    for (b, row) in plane.iter().enumerate() {
                        for (c, v) in row.iter().enumerate() {
                            let turns = (p * a) as f64 / planes as f64
                                + (u * b) as f64 / rows as f64
                                + (k * c) as f64 / cols as f64;
                            let angle = -2.0 * std::f64::consts::PI * turns;
                            re += v * angle.cos();
                            im += v * angle.sin();
                        }
                    }
                }
                out[p][u][k] = (re, im);
            }
        }
    }
    out
}

/// Which column lane 0 carries at an outer index of a dimension of size `m`.
enum Column {
    Dc,
    Nyquist,
    Both,
}

fn column_at(i: usize, m: usize) -> Column {
    if i == 0 || i == m / 2 {
        Column::Both
    } else if i < m / 2 {
        Column::Dc
    } else {
        Column::Nyquist
    }
}

#[test]
fn real_volume_matches_direct_dft() {
    let multi = MultiFft::<f64>::new();
    let mut rng = StdRng::seed_from_u64(13);
    let (planes, rows, cols) = (4, 4, 8);
    let input: Vec<Vec<Vec<f64>>> = (0..planes)
        .map(|_| {
            (0..rows)
                .map(|_| (0..cols).map(|_| rng.gen_range(-1.0..1.0)).collect())
                .collect()
        })
        .collect();
    let expected = naive_dft3(&input);
    let mut data: Vec<Nested<Vec<f64>>> = input.iter().cloned().map(Nested).collect();
    multi.real_transform(&mut data, true).unwrap();

    let close = |a: f64, b: f64, what: &str| assert!((a - b).abs() < 1e-9, "{what}: {a} vs {b}");
    for p in 0..planes {
        for u in 0..rows {
            let row = &data[p].0[u];
            let bin = &expected[p][u];
            for k in 1..cols / 2 {
                close(row[2 * k], bin[k].0, "re");
                close(row[2 * k + 1], bin[k].1, "im");
            }
            // The innermost outer index off the self-conjugate set decides.
            let column = match column_at(u, rows) {
                Column::Both => column_at(p, planes),
                other => other,
            };
            let (re, im) = match column {
                Column::Dc => bin[0],
                Column::Nyquist => bin[cols / 2],
                Column::Both => {
                    close(bin[0].1, 0.0, "dc imag");
                    close(bin[cols / 2].1, 0.0, "nyquist imag");
                    (bin[0].0, bin[cols / 2].0)
                }
            };
            close(row[0], re, "lane 0 first");
            close(row[1], im, "lane 0 second");
        }
    }
}
