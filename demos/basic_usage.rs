//! Basic usage example for radixfft
//!
//! Complex and real transforms, amplitude scaling, padding, power spectra
//! and precision estimates.

use radixfft::window::hann;
use radixfft::{get_padded, Complex32, FftEngine, FftError, NyquistUnrolledFft, RealFftImpl};

fn fmt(data: &[Complex32]) -> Vec<String> {
    data.iter().map(|c| format!("{:.2}{:+.2}i", c.re, c.im)).collect()
}

fn main() -> Result<(), FftError> {
    println!("=== radixfft Basic Usage Example ===\n");

    // 1. Complex FFT
    println!("1. Complex FFT");
    let fft = FftEngine::<f32>::new();
    let mut data: Vec<Complex32> = (1..=8).map(|x| Complex32::new(x as f32, 0.0)).collect();
    fft.complex_forward(&mut data)?;
    println!("   Forward: {:?}", fmt(&data));
    fft.complex_back(&mut data)?;
    println!("   Back (unnormalized, x8): {:?}", data.iter().map(|c| c.re).collect::<Vec<_>>());
    println!();

    // 2. Amplitudes
    println!("2. Amplitudes");
    let mut tone: Vec<Complex32> = (0..16)
        .map(|i| Complex32::new((core::f32::consts::PI * i as f32 / 4.0).cos(), 0.0))
        .collect();
    fft.to_amplitudes(&mut tone)?;
    println!("   Bin 2 amplitude: {:.3}", tone[2].norm());
    fft.from_amplitudes(&mut tone)?;
    println!("   Restored sample 0: {:.3}", tone[0].re);
    println!();

    // 3. Real FFT, packed in place
    println!("3. Real FFT");
    let mut real = vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
    fft.real_forward(&mut real)?;
    println!("   DC = {:.2}, Nyquist = {:.2}, rest = {:?}", real[0], real[1], &real[2..]);
    fft.real_back(&mut real)?;
    println!("   Back (x{}): {:?}", real.len() / 2, real);

    let unrolled = NyquistUnrolledFft::<f32>::new();
    let mut buf = vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 0.0, 0.0];
    unrolled.real_forward(&mut buf)?;
    println!("   Unrolled Nyquist at slot 8: {:.2}", buf[8]);
    println!();

    // 4. Lengths that are not a power of two
    println!("4. Padding");
    let odd = vec![Complex32::new(1.0, 0.0); 6];
    let mut truncated = odd.clone();
    fft.complex_forward(&mut truncated)?;
    println!("   Truncated to 4: {:?}", fmt(&truncated));
    let mut padded = get_padded(&odd, odd.len().next_power_of_two()).into_owned();
    fft.complex_forward(&mut padded)?;
    println!("   Padded to 8:    {:?}", fmt(&padded));
    println!();

    // 5. Welch power spectrum
    println!("5. Average power");
    let signal: Vec<f32> = (0..256).map(|i| (i as f32 * 0.4).sin()).collect();
    let power = fft.average_real_power(&signal, &hann(64))?;
    let peak = power
        .iter()
        .enumerate()
        .fold((0, 0.0f32), |best, (k, &p)| if p > best.1 { (k, p) } else { best });
    println!("   {} bins, peak at bin {}", power.len(), peak.0);
    println!();

    // 6. Precision
    println!("6. Precision");
    for bits in [10u32, 16, 20] {
        let len = 1usize << bits;
        println!(
            "   N = 2^{bits}: {:.1} bits, {:.1} dB",
            fft.precision_bits_for(len),
            fft.dynamic_range_db_for(len)
        );
    }
    Ok(())
}
