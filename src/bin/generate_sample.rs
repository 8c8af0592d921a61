//! Writes `sample_cv.par`: a synthetic cyclic-voltammetry file in the
//! tagged PAR text layout, for trying the viewer without instrument data.

use std::fmt::Write as _;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() {
    let mut rng = SimpleRng::new(42);

    const SEGMENTS: usize = 3;
    const SWEEP_POINTS: usize = 200; // per direction
    const V_HIGH: f64 = 0.6;
    const V_LOW: f64 = -0.6;

    let mut records = String::new();
    let mut point = 0usize;

    for segment in 0..SEGMENTS {
        let scale = 1.0 + segment as f64 * 0.5;
        let step = (V_HIGH - V_LOW) / SWEEP_POINTS as f64;

        // Downward sweep with a cathodic dip, then upward with an anodic
        // bump, starting at the high vertex so the reader's half-cycle
        // split lands on the sweep boundaries.
        for i in 0..2 * SWEEP_POINTS {
            let voltage = if i < SWEEP_POINTS {
                V_HIGH - i as f64 * step
            } else {
                V_LOW + (i - SWEEP_POINTS) as f64 * step
            };

            let mut current = 2e-5 * voltage;
            if i < SWEEP_POINTS {
                current += gaussian(voltage, -0.15, 0.08, -4e-4 * scale);
            } else {
                current += gaussian(voltage, 0.05, 0.08, 5e-4 * scale);
            }
            current += rng.gauss(0.0, 2e-6);

            // Roughly one record in fifty carries an instrument error flag.
            let status = if rng.next_f64() < 0.02 { 1u32 << 8 } else { 0 };

            let _ = writeln!(
                records,
                "{segment},{point},{voltage:.6},{current:.6e},0,0,0,{status}"
            );
            point += 1;
        }
    }

    let text = format!(
        "<Application>\nVersaStudio\n</Application>\n\
         <Instrument>\nVersaSTAT 3\n</Instrument>\n\
         <Segment1>\n\
         Definition=Segment #, Point #, E(V), I(A), Elapsed Time(s), ADC Sync Input(V), Current Range, Status\n\
         Segment1 data\n\
         Type=CV\n\
         Points={points}\n\
         {records}</Segment1>\n",
        points = point,
        records = records,
    );

    let output_path = "sample_cv.par";
    if let Err(e) = std::fs::write(output_path, &text) {
        eprintln!("Failed to write {output_path}: {e}");
        std::process::exit(1);
    }

    println!(
        "Wrote {SEGMENTS} segments ({} points total) to {output_path}",
        point
    );
}
