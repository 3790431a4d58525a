use std::{
    fs::File,
    io::Write,
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::Local;
use clap::Parser;
use crossbeam::channel::bounded;
use lockfree_object_pool::{LinearObjectPool, LinearOwnedReusable};
use num::Complex;

use sincrs::sinc::{PulseShape, SincTable};
use sincrs::utils::pulse_as_u8;

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

    #[clap(short = 'n', long = "npulses", value_name = "num of pulses", default_value_t = 1000)]
    npulses: usize,

    #[clap(short = 'd', long = "step", value_name = "delay step per pulse", default_value_t = 0.0625)]
    step: f32,

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
    let table = Arc::new(SincTable::build(&shape).expect("failed to build sinc table"));

    let (tx_pulse, rx_pulse) = bounded::<LinearOwnedReusable<Vec<Complex<i16>>>>(1024);

    let spb = args.spb;
    let ampl = args.ampl;
    let step = args.step;
    let npulses = args.npulses;
    let gen_table = Arc::clone(&table);
    let gen_thread = std::thread::spawn(move || {
        let pool: Arc<LinearObjectPool<Vec<Complex<i16>>>> = Arc::new(LinearObjectPool::new(
            move || vec![Complex::<i16>::default(); spb],
            |_v| {},
        ));
        let half = spb as f32 / 2.0;
        for i in 0..npulses {
            // sweep the delay, wrapped so the main lobe stays inside the window
            let delay = (i as f32 * step + half).rem_euclid(spb as f32) - half;
            let mut pulse = pool.pull_owned();
            gen_table
                .gen_into(ampl, delay, &mut pulse)
                .expect("failed to generate pulse");
            if tx_pulse.send(pulse).is_err() {
                return;
            }
        }
    });

    let mut outfile = args
        .outname
        .map(|outname| File::create(&outname).expect("failed to create dump file"));

    let mut last_print_time = Instant::now();
    let print_interval = Duration::from_secs(2);
    let mut npulses_written = 0usize;
    while let Ok(pulse) = rx_pulse.recv() {
        if let Some(ref mut f) = outfile {
            f.write_all(pulse_as_u8(&pulse))
                .expect("failed to write to dump file");
        }
        npulses_written += 1;

        let now = Instant::now();
        if now.duration_since(last_print_time) >= print_interval {
            let local_time = Local::now().format("%Y-%m-%d %H:%M:%S");
            println!(
                "{} {} pulses written q={}",
                local_time,
                npulses_written,
                rx_pulse.len()
            );
            last_print_time = now;
        }
    }

    gen_thread.join().expect("generator thread panicked");
    println!(
        "{} pulses, {} bytes total",
        npulses_written,
        npulses_written * args.spb * 4
    );
}
