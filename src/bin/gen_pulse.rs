use clap::Parser;

use sincrs::sinc::{PulseShape, SincTable};
use sincrs::utils::writebuff;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(short = 'b', long = "bw", value_name = "normalized passband", default_value_t = 0.2)]
    bw: f32,

    #[clap(short = 'c', long = "cbw", value_name = "containment bw", default_value_t = 0.25)]
    cbw: f32,

    #[clap(short = 's', long = "spb", value_name = "samples per pulse", default_value_t = 1000)]
    spb: usize,

    #[clap(short = 'r', long = "ratio", value_name = "oversampling ratio", default_value_t = 16)]
    ratio: usize,

    #[clap(short = 'A', long = "ampl", value_name = "amplitude", default_value_t = 1000)]
    ampl: i16,

    #[clap(short = 'd', long = "delay", value_name = "delay in samples", default_value_t = 0.0)]
    delay: f32,

    #[clap(short = 'o', long = "out", value_name = "out name")]
    outname: Option<String>,
}

fn main() {
    let args = Args::parse();

    let shape = PulseShape {
        bw: args.bw,
        cbw: args.cbw,
        spb: args.spb,
        ratio: args.ratio,
    };
    let table = SincTable::build(&shape).expect("failed to build sinc table");
    let pulse = table
        .gen(args.ampl, args.spb, args.delay)
        .expect("failed to generate pulse");

    let peak = pulse.iter().map(|s| (s.re as i32).abs()).max().unwrap_or(0);
    println!("{} samples, peak |I| = {}", pulse.len(), peak);

    if let Some(outname) = args.outname {
        writebuff(&outname, &pulse).expect("failed to write dump file");
        println!("wrote {} bytes to {}", pulse.len() * 4, outname);
    }
}
