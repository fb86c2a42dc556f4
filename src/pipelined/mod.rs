//! Pipelined implementation
//!
//! The driver evaluates every stage's combinational outputs against the
//! current pipeline registers, then latches all four registers and the PC
//! as one clock edge. Ordering inside a tick only encodes the same-cycle
//! combinational paths: the write-back commit is visible to the decode
//! read ports and to the forwarding unit, and the data-memory output is
//! latched into MEM/WB within the same tick.

pub mod pipeline;
pub mod stages;

use crate::cpu::CpuState;
use crate::memory::{DataMem, InstrMem};

use crate::pipelined::pipeline::{
    hazard_unit, ExMemRegister, IdExRegister, IfIdRegister, MemWbRegister, PipelineState,
};

/// Cycles the PC is held in reset before fetch begins
const RESET_CYCLES: u32 = 2;

/// Runs the fixed-cycle simulation
pub fn run(cpu: &mut CpuState, imem: &InstrMem, dmem: &mut DataMem) {
    let mut state = PipelineState::default();

    let mut cc = RESET_CYCLES;
    while cc < cpu.policy.cycles {
        if cpu.policy.verbose {
            eprintln!("[VERBOSE] New cycle; PC: {:#010x}", cpu.pc.read());
        }

        tick(cpu, imem, dmem, &mut state, cc);

        cpu.history.cycle_count += 1;
        cc += 1;
    }
}

/// Advances the datapath by one clock edge
pub fn tick(
    cpu: &mut CpuState,
    imem: &InstrMem,
    dmem: &mut DataMem,
    state: &mut PipelineState,
    cc: u32,
) {
    // WB first: the register write must be visible to this cycle's
    // decode read and to the forwarding unit
    let wb_value = stages::write_back(cpu, &state.mem_wb);

    let dmem_dout = stages::memory_access(&state.ex_mem, dmem, cpu.policy.verbose);

    let ex_out = stages::execute(state, wb_value);

    let (inst, rs1_val, rs2_val) = stages::instruction_decode(cpu, &state.if_id);
    if cpu.policy.verbose {
        eprintln!(
            "[VERBOSE] Decoding PC: {:#010x}; Instruction: {:#034b}",
            state.if_id.pc, state.if_id.inst
        );
    }

    // A taken branch whose target is already fetched needs no redirect:
    // IF/ID holds the target and only the sequential advance remains.
    // The hazard unit must see the filtered signal, or it would flush
    // and freeze the fetch of that very instruction.
    let pc_curr = cpu.pc.read();
    let redirect = ex_out.redirect.filter(|&target| target != pc_curr);

    let hz = hazard_unit(state, inst.rs1, inst.rs2, redirect);

    if hz.id_stall {
        cpu.history.load_use_stalls += 1;
        if cpu.policy.verbose {
            eprintln!("[VERBOSE] Inserting bubble due to load-use hazard");
        }
    }
    if hz.id_flush {
        cpu.history.branch_squashes += 1;
    }

    // Latch the next pipeline state
    state.mem_wb = MemWbRegister::latch(&state.ex_mem, dmem_dout);
    state.ex_mem = ExMemRegister::latch(&state.id_ex, &ex_out.alu, ex_out.slt, ex_out.rs2_forwarded);
    state.id_ex = if hz.id_flush || hz.id_stall {
        // bubble
        IdExRegister::default()
    } else {
        IdExRegister::latch(&state.if_id, &inst, rs1_val, rs2_val)
    };

    // PC update. A redirect overrides pc_write, which gates only the
    // sequential path.
    if cc > RESET_CYCLES {
        if let Some(target) = redirect {
            if cpu.policy.verbose {
                eprintln!("[VERBOSE] Jumping from {:#010x} to {:#010x}", pc_curr, target);
            }
            cpu.pc.write(target);
        } else if hz.pc_write {
            cpu.pc.write(pc_curr.wrapping_add(4));
        }
    }

    // IF: latch the fetch at the updated PC. A redirect lands the branch
    // target here, so IF/ID is never zeroed for it; on a stall the
    // register holds.
    if !hz.if_stall {
        let pc = cpu.pc.read();
        state.if_id = IfIdRegister {
            pc,
            inst: imem.fetch(pc),
        };
    }
}
