use pipesim_lib::cpu::CpuPolicy;
use pipesim_lib::error::SimulatorResult;
use pipesim_lib::flags::PipeSimArgs;
use pipesim_lib::run_wrapper;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> SimulatorResult<()> {
    let args = PipeSimArgs::from_env_or_exit();

    let mut policy = CpuPolicy::default();
    if args.verbose {
        policy.verbose = true;
    }
    if args.history {
        policy.history = true;
    }
    if let Some(cycles) = args.cycles {
        policy.cycles = cycles;
    }

    run_wrapper::run(&args.imem_file, &args.dmem_file, policy)?;

    Ok(())
}
