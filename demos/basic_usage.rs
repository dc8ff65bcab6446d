//! Walk through the BitArray API.
//!
//! Run with `RUST_LOG=trace cargo run --example basic_usage` to see the
//! library's resize and shift logging.

use anyhow::{Context, Result};
use dynbits::BitArray;

fn main() -> Result<()> {
    env_logger::init();

    println!("=== {} ===\n", dynbits::version());

    let mut flags = BitArray::with_value(8, 0b1100_1100);
    println!("initial:       {} (count = {})", flags, flags.count());

    let mask: BitArray = "11110000".parse().context("parsing mask")?;
    flags &= &mask;
    println!("& {}:    {}", mask, flags);

    flags <<= 2;
    println!("<<= 2:         {}", flags);

    flags >>= 3;
    println!(">>= 3:         {}", flags);

    flags.resize(12, true);
    println!("resize(12, 1): {}", flags);

    flags.push_back(false);
    println!("push_back(0):  {} (size = {})", flags, flags.size());

    println!("as integer:    {:#x}", flags.to_u64()?);

    let other = BitArray::new(4);
    if let Err(e) = flags.try_bit_or_assign(&other) {
        println!("checked OR rejected: {}", e);
    }

    if let Err(e) = flags.try_get(100) {
        println!("checked get rejected: {}", e);
    }

    Ok(())
}
