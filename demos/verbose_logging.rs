//! Demonstrates enabling verbose logging for radixfft.
use radixfft::{Complex32, FftEngine, FftError};

fn main() -> Result<(), FftError> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .init();

    let mut fft = FftEngine::<f32>::new();
    fft.set_parallel(4);
    // Six elements: the two past the power of two are discarded and logged.
    let mut data = vec![Complex32::new(1.0, 0.0); 6];
    fft.complex_forward(&mut data)?;
    println!("{:?}", data);
    Ok(())
}
