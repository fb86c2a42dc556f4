//! Stage logic for the pipelined datapath
//!
//! Each function evaluates one stage's combinational outputs against the
//! current pipeline registers; the driver latches the results at the
//! cycle edge.

use crate::alu::{alu, alu_control, AluOutput};
use crate::cpu::CpuState;
use crate::instruction::{opcodes, BranchKind, Instruction};
use crate::memory::DataMem;

use super::pipeline::{ExMemRegister, Forward, IfIdRegister, MemWbRegister, PipelineState};

/// Combinational outputs of the EX stage
#[derive(Clone, Copy, Debug, Default)]
pub struct ExOutput {
    pub alu: AluOutput,
    pub slt: bool,
    /// rs2 after forwarding; latched as the store-data path
    pub rs2_forwarded: u32,
    /// Branch target when the instruction in EX resolved taken
    pub redirect: Option<u32>,
}

/// ID: decode and register read.
/// Runs after write-back so the read ports see this cycle's commit.
pub fn instruction_decode(cpu: &CpuState, if_id: &IfIdRegister) -> (Instruction, u32, u32) {
    let inst = Instruction::new(if_id.inst);
    let rs1_val = cpu.read_gpr(inst.rs1);
    let rs2_val = cpu.read_gpr(inst.rs2);
    (inst, rs1_val, rs2_val)
}

/// EX: ALU-control derivation, operand forwarding, ALU evaluation and
/// branch resolution.
/// `wb_value` is the write-back value committed this cycle.
pub fn execute(state: &PipelineState, wb_value: u32) -> ExOutput {
    let ex = &state.id_ex;

    let (control, slt) = alu_control(ex.alu_op, ex.funct3, ex.funct7);

    let rs1_fwd = forwarded(state, state.forward(ex.rs1), ex.rs1_val, wb_value);
    let rs2_fwd = forwarded(state, state.forward(ex.rs2), ex.rs2_val, wb_value);

    // jal and auipc add their immediate to the pc; jalr keeps rs1
    let in1 = if ex.opcode == opcodes::JAL || ex.opcode == opcodes::AUIPC {
        ex.pc
    } else {
        rs1_fwd
    };
    // auipc's operand is the architectural upper immediate
    let in2 = if ex.alu_src {
        if ex.opcode == opcodes::AUIPC {
            ex.imm32 << 12
        } else {
            ex.imm32
        }
    } else {
        rs2_fwd
    };

    let out = alu(control, in1, in2);

    let taken = match ex.branch {
        BranchKind::None => false,
        BranchKind::Beq => out.zero,
        BranchKind::Bne => !out.zero,
        // signed comparisons are evaluated directly; the subtraction's
        // sign flag is wrong across overflow
        BranchKind::Blt => (rs1_fwd as i32) < (rs2_fwd as i32),
        BranchKind::Bge => (rs1_fwd as i32) >= (rs2_fwd as i32),
        BranchKind::Bltu => out.carry,
        BranchKind::Bgeu => !out.carry || out.zero,
        BranchKind::Jump => true,
    };

    let redirect = if taken {
        Some(if ex.opcode == opcodes::JALR {
            // jalr targets drop bit 0
            out.result & !1
        } else {
            // branch and jal immediates are encoded in halfwords
            ex.pc.wrapping_add(ex.imm32 << 1)
        })
    } else {
        None
    };

    ExOutput {
        alu: out,
        slt,
        rs2_forwarded: rs2_fwd,
        redirect,
    }
}

fn forwarded(state: &PipelineState, select: Forward, reg_val: u32, wb_value: u32) -> u32 {
    match select {
        Forward::None => reg_val,
        Forward::WriteBack => wb_value,
        Forward::ExMem => state.ex_mem.alu_result,
        Forward::ExMemLui => state.ex_mem.imm32 << 12,
    }
}

/// MEM: performs the data-memory access for the instruction in EX/MEM.
/// Returns the read port output (zero when not reading).
pub fn memory_access(mem: &ExMemRegister, dmem: &mut DataMem, verbose: bool) -> u32 {
    if mem.mem_write {
        let mask = store_mask(mem.funct3);
        dmem.write_masked(mem.alu_result, mem.rs2_val_forwarded, mask);
        if verbose {
            eprintln!(
                "[VERBOSE] DMEM write; address: {:#010x}; data: {:#010x}",
                mem.alu_result,
                mem.rs2_val_forwarded & mask
            );
        }
    }

    if mem.mem_read {
        let dout = dmem.read(mem.alu_result);
        if verbose {
            eprintln!(
                "[VERBOSE] DMEM read; address: {:#010x}; data: {:#010x}",
                mem.alu_result, dout
            );
        }
        dout
    } else {
        0
    }
}

fn store_mask(funct3: u8) -> u32 {
    match funct3 {
        0b000 => 0xff,   // sb
        0b001 => 0xffff, // sh
        _ => !0,         // sw
    }
}

/// WB: selects the write-back value and commits it to the register file.
/// Returns the selected value for same-cycle forwarding.
pub fn write_back(cpu: &mut CpuState, wb: &MemWbRegister) -> u32 {
    let rd_din = if wb.is_jump {
        // link register value
        wb.pc.wrapping_add(4)
    } else if wb.mem_to_reg {
        load_extend(wb.funct3, wb.dmem_dout)
    } else if wb.slt {
        // sltu/sltiu read the borrow flag, slt/slti the sign flag
        if wb.funct3 == 0b011 {
            wb.carry as u32
        } else {
            wb.sign as u32
        }
    } else if wb.opcode == opcodes::LUI {
        wb.imm32 << 12
    } else {
        wb.alu_result
    };

    if wb.reg_write {
        cpu.write_gpr(wb.rd, rd_din);
    }
    rd_din
}

/// Sign- or zero-extends a load result by funct3
fn load_extend(funct3: u8, dout: u32) -> u32 {
    match funct3 {
        0b000 => dout as u8 as i8 as i32 as u32,   // lb
        0b001 => dout as u16 as i16 as i32 as u32, // lh
        0b100 => dout & 0xff,                      // lbu
        0b101 => dout & 0xffff,                    // lhu
        _ => dout,                                 // lw
    }
}
