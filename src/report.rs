//! Final architectural state report

use crate::cpu::CpuState;
use crate::memory::DataMem;

/// Data-memory words included in the report
const DMEM_REPORT_WORDS: usize = 15;

/// Prints the register file and the first data-memory words
pub fn show_state(cpu: &CpuState, dmem: &DataMem) {
    println!("\nREGISTER FILE");
    for (i, reg) in cpu.gpr.iter().enumerate() {
        println!("RF[{:03}]: {:08X}", i, reg.read());
    }

    println!("\nDMEM");
    for i in 0..DMEM_REPORT_WORDS.min(dmem.depth()) {
        println!("DMEM[{:03}]: {:08X}", i, dmem.word(i));
    }
}
