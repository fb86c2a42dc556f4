//! A simulator wrapper

use std::path::Path;

use crate::cpu::{CpuPolicy, CpuState};
use crate::error::SimulatorResult;
use crate::loader;
use crate::memory::{DataMem, InstrMem};
use crate::pipelined;
use crate::report;

/// Runs the simulation on the given image files and prints the final state
pub fn run(imem_file: &Path, dmem_file: &Path, policy: CpuPolicy) -> SimulatorResult<()> {
    let imem_image = loader::load_imem_file(imem_file, policy.imem_depth)?;
    let dmem_image = loader::load_dmem_file(dmem_file, policy.dmem_depth)?;

    if policy.verbose {
        for (i, word) in imem_image.iter().enumerate() {
            eprintln!("[VERBOSE] imem[{:03}]: {:08X}", i, word);
        }
        for (i, word) in dmem_image.iter().enumerate() {
            eprintln!("[VERBOSE] dmem[{:03}]: {:08X}", i, word);
        }
    }

    let imem = InstrMem::load(&imem_image, policy.imem_depth);
    let mut dmem = DataMem::load(&dmem_image, policy.dmem_depth);
    let mut cpu = CpuState::make(policy);

    pipelined::run(&mut cpu, &imem, &mut dmem);

    if policy.history {
        eprintln!("[HISTORY] # cycles = {}", cpu.history.cycle_count);
        eprintln!("[HISTORY] # load-use bubbles = {}", cpu.history.load_use_stalls);
        eprintln!("[HISTORY] # branch squashes = {}", cpu.history.branch_squashes);
    }

    report::show_state(&cpu, &dmem);

    Ok(())
}
