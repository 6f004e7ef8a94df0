// Test intent: validates transforms of impulses, cosines and constants against closed-form spectra.
use radixfft::{Complex32, Complex64, FftEngine, Float, NyquistUnrolledFft, RealFftImpl};

const N: usize = 64;

fn cosine(bin: usize, amplitude: f64) -> Vec<f64> {
    (0..N)
        .map(|j| amplitude * Float::cos(2.0 * core::f64::consts::PI * (bin * j) as f64 / N as f64))
        .collect()
}

#[test]
fn impulse_has_flat_magnitude() {
    let engine = FftEngine::<f32>::new();
    let mut data = vec![Complex32::new(0.0, 0.0); N];
    data[0] = Complex32::new(1.0, 0.0);
    engine.complex_forward(&mut data).unwrap();
    for c in &data {
        assert!((c.norm() - 1.0).abs() < 1e-6);
    }
}

#[test]
fn shifted_impulse_has_flat_magnitude() {
    let engine = FftEngine::<f64>::new();
    let mut data = vec![Complex64::new(0.0, 0.0); N];
    data[5] = Complex64::new(0.0, 2.0);
    engine.complex_forward(&mut data).unwrap();
    for c in &data {
        assert!((c.norm() - 2.0).abs() < 1e-12);
    }
}

#[test]
fn cosine_lands_in_two_bins() {
    let engine = FftEngine::<f64>::new();
    let mut data: Vec<Complex64> = cosine(7, 1.0)
        .into_iter()
        .map(|x| Complex64::new(x, 0.0))
        .collect();
    engine.to_amplitudes(&mut data).unwrap();
    for (k, c) in data.iter().enumerate() {
        let expected = if k == 7 || k == N - 7 { 1.0 } else { 0.0 };
        assert!((c.norm() - expected).abs() < 1e-12, "bin {k}");
    }
}

#[test]
fn real_cosine_amplitude() {
    let engine = FftEngine::<f64>::new();
    let mut data = cosine(3, 2.5);
    engine.real_to_amplitude(&mut data).unwrap();
    for k in 1..N / 2 {
        let magnitude = Float::sqrt(data[2 * k] * data[2 * k] + data[2 * k + 1] * data[2 * k + 1]);
        let expected = if k == 3 { 2.5 } else { 0.0 };
        assert!((magnitude - expected).abs() < 1e-12, "bin {k}");
    }
    assert!(data[0].abs() < 1e-12);
    assert!(data[1].abs() < 1e-12);
}

#[test]
fn constant_is_dc_only() {
    let engine = FftEngine::<f64>::new();
    let mut data = vec![Complex64::new(1.5, -0.5); N];
    engine.complex_forward(&mut data).unwrap();
    assert!((data[0] - Complex64::new(1.5 * N as f64, -0.5 * N as f64)).norm() < 1e-12);
    assert!(data[1..].iter().all(|c| c.norm() < 1e-12));

    let mut real = vec![0.75f64; N];
    engine.real_forward(&mut real).unwrap();
    assert!((real[0] - 0.75 * N as f64).abs() < 1e-12);
    assert!(real[1..].iter().all(|x| x.abs() < 1e-12));
}

#[test]
fn alternating_signal_is_nyquist_only() {
    let plain = FftEngine::<f64>::new();
    let unrolled = NyquistUnrolledFft::<f64>::new();
    let signal: Vec<f64> = (0..N).map(|j| if j % 2 == 0 { 1.0 } else { -1.0 }).collect();

    let mut packed = signal.clone();
    plain.real_forward(&mut packed).unwrap();
    assert!(packed[0].abs() < 1e-12);
    assert!((packed[1] - N as f64).abs() < 1e-12);

    let mut wide = signal;
    wide.extend_from_slice(&[0.0, 0.0]);
    unrolled.real_forward(&mut wide).unwrap();
    assert!((wide[N] - N as f64).abs() < 1e-12);
    assert!(wide[..N].iter().all(|x| x.abs() < 1e-12));
    assert_eq!(wide[N + 1], 0.0);
}

#[test]
fn real_impulse_has_equal_amplitude_in_every_bin() {
    const LEN: usize = 8;
    let mut impulse = [0.0f64; LEN];
    impulse[0] = 1.0;

    let mut packed = impulse.to_vec();
    FftEngine::<f64>::new().real_to_amplitude(&mut packed).unwrap();
    assert!((packed[0] - 0.25).abs() < 1e-12, "dc");
    assert!((packed[1] - 0.25).abs() < 1e-12, "nyquist");
    for k in 1..LEN / 2 {
        let magnitude = Float::sqrt(packed[2 * k] * packed[2 * k] + packed[2 * k + 1] * packed[2 * k + 1]);
        assert!((magnitude - 0.25).abs() < 1e-12, "bin {k}");
    }

    let mut wide = impulse.to_vec();
    wide.extend_from_slice(&[0.0, 0.0]);
    NyquistUnrolledFft::<f64>::new().real_to_amplitude(&mut wide).unwrap();
    assert!((wide[0] - 0.25).abs() < 1e-12, "dc");
    assert_eq!(wide[1], 0.0);
    assert!((wide[LEN] - 0.25).abs() < 1e-12, "nyquist");
    assert_eq!(wide[LEN + 1], 0.0);
    for k in 1..LEN / 2 {
        let magnitude = Float::sqrt(wide[2 * k] * wide[2 * k] + wide[2 * k + 1] * wide[2 * k + 1]);
        assert!((magnitude - 0.25).abs() < 1e-12, "bin {k}");
    }
}
