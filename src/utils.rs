use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::slice::from_raw_parts;

use num::Complex;

/// Raw byte view of an sc16 pulse buffer: each sample is an in-phase i16
/// followed by a quadrature i16, no header. This is the exact flat layout
/// the downstream stream/persistence tools expect.
pub fn pulse_as_u8(x: &[Complex<i16>]) -> &[u8] {
    unsafe { from_raw_parts(x.as_ptr() as *const u8, std::mem::size_of_val(x)) }
}

/// Writes a pulse buffer verbatim to `path`.
pub fn writebuff<P: AsRef<Path>>(path: P, samples: &[Complex<i16>]) -> io::Result<()> {
    let mut f = File::create(path)?;
    f.write_all(pulse_as_u8(samples))
}
