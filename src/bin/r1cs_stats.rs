use std::{env, path::PathBuf, time::Duration, time::Instant};

use r1cs_checker::checker::r1cs::ConstraintSystem;

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() == 0 {
        format!("{:.2} ms", duration.as_secs_f64() * 1_000.0)
    } else {
        format!("{:.3} s", duration.as_secs_f64())
    }
}

fn parse_args() -> Result<PathBuf, Box<dyn std::error::Error>> {
    env::args()
        .nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| "usage: r1cs_stats <circuit.r1cs>".into())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = parse_args()?;
    let bytes = std::fs::read(&path)?;

    let decode_start = Instant::now();
    let system = ConstraintSystem::decode(&bytes)?;
    let decode_time = decode_start.elapsed();

    // Coefficients at or above the prime are reduced on load and re-encode differently.
    let roundtrip = system.encode()? == bytes;

    let header = system.header();
    let (mut terms, mut widest) = (0usize, 0usize);
    for constraint in system.constraints() {
        let width = constraint.a.len() + constraint.b.len() + constraint.c.len();
        terms += width;
        widest = widest.max(width);
    }
    let average = if system.num_constraints() == 0 {
        0.0
    } else {
        terms as f64 / system.num_constraints() as f64
    };

    println!("=== R1CS Stats ===\n");
    println!("file: {}   bytes: {}", path.display(), bytes.len());
    println!("prime: {}", system.field().modulus());
    println!("curve: {}", if system.field().is_bn254() { "bn128" } else { "unknown" });
    println!("n8: {}", header.n8);
    println!("wires: {}   labels: {}", header.n_wires, header.n_labels);
    println!(
        "public outputs: {}   public inputs: {}   private inputs: {}",
        header.n_pub_out, header.n_pub_in, header.n_prv_in
    );
    println!("constraints: {}", system.num_constraints());
    println!("terms per constraint: avg {:.2}, max {}", average, widest);
    println!(
        "highest signal referenced: {}",
        system
            .max_signal()
            .map_or_else(|| "-".to_string(), |s| s.to_string())
    );
    println!(
        "wire->label map: {}",
        if system.wire_to_label().is_some() { "present" } else { "absent" }
    );
    println!("digest: {}", hex::encode(system.digest()));
    println!("decode time: {}", format_duration(decode_time));
    println!("byte-exact re-encode: {}", roundtrip);

    Ok(())
}
