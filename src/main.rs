use std::env;
use std::process::ExitCode;

use cachesim_moesi::trace::read_trace;
use cachesim_moesi::*;
use env_logger::Env;
use log::{error, info};

fn demo() -> Insts {
    vec![
        Request::Read { proc: 0, addr: Addr(3) },
        Request::Read { proc: 1, addr: Addr(3) },
        Request::Write { proc: 0, addr: Addr(3), data: 9 },
        Request::Read { proc: 2, addr: Addr(3) },
        Request::Write { proc: 1, addr: Addr(5), data: 42 },
        Request::Read { proc: 0, addr: Addr(5) },
        Request::Read { proc: 0, addr: Addr(16) },
    ]
}

fn arg<T: std::str::FromStr>(args: &[String], i: usize, default: T) -> Result<T, String> {
    match args.get(i) {
        Some(s) => s.parse().map_err(|_| format!("invalid argument `{s}`")),
        None => Ok(default),
    }
}

fn run(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    // cachesim [trace-file|-] [procs] [mem-size] [lines] [seed]
    let defaults = SystemSpec::default();
    let specs = SystemSpec {
        num_procs: arg(args, 2, defaults.num_procs)?,
        mem_size: arg(args, 3, defaults.mem_size)?,
        cache_lines: arg(args, 4, defaults.cache_lines)?,
        seed: arg(args, 5, defaults.seed)?,
    };
    let insts = match args.get(1).map(String::as_str) {
        Some("-") | None => demo(),
        Some(path) => read_trace(path)?,
    };

    let mut sim = Simulator::new(specs)?;
    println!("{}", sim.snapshot());
    for req in insts {
        match sim.apply(req) {
            Ok(Some(data)) => println!("{req} -> {data}"),
            Ok(None) => println!("{req}"),
            Err(e) => println!("{req} -> error: {e}"),
        }
        println!("{}", sim.snapshot());
    }
    info!("finished after {} requests", sim.clock());
    Ok(())
}

fn main() -> ExitCode {
    // logging
    let env = Env::default()
        .filter_or("CACHESIM_LOG", "info")
        .write_style_or("CACHESIM_LOG_STYLE", "auto");
    env_logger::init_from_env(env);

    let args: Vec<String> = env::args().collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
