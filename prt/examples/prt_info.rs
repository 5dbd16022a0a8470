//! Print the header of a PRT file
//!
//! Usage: cargo run --example prt_info -- particles_0001.prt

use prt::ParticleReader;

fn main() -> prt::Result<()> {
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: prt_info <file.prt>");
        std::process::exit(2);
    };

    let reader = ParticleReader::open_file(&path)?;
    println!("{path}");
    println!("  version:        {}", reader.version());
    println!("  particles:      {}", reader.particle_count());
    println!("  record size:    {} bytes", reader.layout().record_size());

    println!("  channels:");
    for channel in reader.layout().channels() {
        println!("    {channel}");
    }

    println!("  metadata:");
    for (name, value) in reader.metadata() {
        match value.primitive_type() {
            Some(ty) => println!("    {name}: {ty}[{}] = {value}", value.arity()),
            None => println!("    {name}: \"{value}\""),
        }
    }

    if let Some(bounds) = reader.bound_box() {
        println!("  bounds:         {:?} .. {:?}", bounds.min, bounds.max);
    }
    Ok(())
}
