//! Multi-dimensional example for radixfft
//! Transforms a 2D image and a small 3D volume in place.

use radixfft::{Complex32, FftError, MultiFft, Nested};

fn main() -> Result<(), FftError> {
    let fft = MultiFft::<f32>::new();

    // 2D: rows are the innermost dimension.
    let mut image: Vec<Vec<Complex32>> = (0..4)
        .map(|r| (0..4).map(|c| Complex32::new((r * 4 + c) as f32, 0.0)).collect())
        .collect();
    fft.complex_forward(&mut image)?;
    println!("2D DC term: {:?}", image[0][0]);
    fft.complex_back(&mut image)?;
    println!("2D restored (x16): {:?}", image[1].iter().map(|c| c.re).collect::<Vec<_>>());

    // Real rows, complex columns.
    let mut rows: Vec<Vec<f32>> = (0..4).map(|r| vec![r as f32 + 1.0; 8]).collect();
    fft.real_transform(&mut rows, true)?;
    println!("Real 2D packed row 0: {:?}", rows[0]);
    fft.real_transform(&mut rows, false)?;
    println!("Real 2D restored row 2: {:?}", rows[2]);

    // 3D through nesting.
    let mut volume: Vec<Nested<Vec<Complex32>>> = (0..2)
        .map(|_| Nested(vec![vec![Complex32::new(1.0, 0.0); 2]; 2]))
        .collect();
    fft.complex_forward(&mut volume)?;
    println!("3D DC term: {:?}", volume[0].0[0][0]);
    Ok(())
}
