//! Pipeline state

use crate::alu::AluOutput;
use crate::instruction::{opcodes, AluOp, BranchKind, Instruction};

/// Pipeline state = 4 pipeline registers
#[derive(Clone, Copy, Default)]
pub struct PipelineState {
    pub if_id: IfIdRegister,
    pub id_ex: IdExRegister,
    pub ex_mem: ExMemRegister,
    pub mem_wb: MemWbRegister,
}

impl PipelineState {
    /// Forwarding select for one EX-stage operand.
    /// A lui sitting in EX/MEM has no usable ALU result, so its upper
    /// immediate takes priority; then the EX/MEM result, then the value
    /// written back this cycle. x0 is never forwarded.
    /// See P&H p. 300
    pub fn forward(&self, rs: u8) -> Forward {
        if self.ex_mem.opcode == opcodes::LUI && self.ex_mem.rd == rs && self.ex_mem.rd != 0 {
            Forward::ExMemLui
        } else if self.ex_mem.reg_write && self.ex_mem.rd == rs && self.ex_mem.rd != 0 {
            Forward::ExMem
        } else if self.mem_wb.reg_write && self.mem_wb.rd == rs && self.mem_wb.rd != 0 {
            Forward::WriteBack
        } else {
            Forward::None
        }
    }

    /// Load-use hazard: the load in EX has no data until its MEM ends,
    /// so a dependent instruction in ID must wait one cycle
    pub fn load_hazard(&self, rs1: u8, rs2: u8) -> bool {
        self.id_ex.mem_read
            && self.id_ex.rd != 0
            && (self.id_ex.rd == rs1 || self.id_ex.rd == rs2)
    }
}

/// ALU operand source selected by the forwarding unit
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Forward {
    /// Value read from the register file in ID
    #[default]
    None,
    /// Write-back value computed this cycle
    WriteBack,
    /// EX/MEM ALU result
    ExMem,
    /// Upper immediate of the lui in EX/MEM
    ExMemLui,
}

/// Stall and flush signals produced by the hazard-detection unit
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HazardControls {
    pub if_flush: bool,
    pub if_stall: bool,
    pub id_flush: bool,
    pub id_stall: bool,
    /// Enables the sequential PC path; a taken-branch redirect overrides it
    pub pc_write: bool,
}

/// Hazard-detection unit.
///
/// `rs1`/`rs2` are the ID-stage source indices and `redirect` is the
/// branch target when the instruction in EX resolved taken toward a PC
/// that is not already fetched; the driver drops a target that IF/ID
/// already holds. The flush comparisons skip squashing whatever already
/// lies on the taken path.
pub fn hazard_unit(
    state: &PipelineState,
    rs1: u8,
    rs2: u8,
    redirect: Option<u32>,
) -> HazardControls {
    let stall = state.load_hazard(rs1, rs2);

    let (id_flush, if_flush) = match redirect {
        Some(target) => (
            state.if_id.pc != target,
            state.if_id.pc.wrapping_add(4) != target,
        ),
        None => (false, false),
    };

    HazardControls {
        if_flush,
        if_stall: stall,
        id_flush,
        id_stall: stall,
        pc_write: !(if_flush || stall),
    }
}

/// IF/ID register
#[derive(Clone, Copy, Default)]
pub struct IfIdRegister {
    /// Program counter
    pub pc: u32,

    /// Raw instruction
    pub inst: u32,
}

/// ID/EX register
#[derive(Clone, Copy, Default)]
pub struct IdExRegister {
    /// Program counter
    pub pc: u32,

    /// Register file read port outputs
    pub rs1_val: u32,
    pub rs2_val: u32,

    /// Extended immediate
    pub imm32: u32,

    pub opcode: u8,
    pub funct3: u8,
    pub funct7: u8,

    pub branch: BranchKind,
    pub alu_src: bool,
    pub alu_op: AluOp,
    pub mem_read: bool,
    pub mem_write: bool,

    /// Source indices for the forwarding unit
    pub rs1: u8,
    pub rs2: u8,

    pub rd: u8,
    pub reg_write: bool,
    pub mem_to_reg: bool,
}

impl IdExRegister {
    /// Latched from the decode outputs at the cycle edge.
    /// The default value is the bubble inserted by flushes and stalls.
    pub fn latch(if_id: &IfIdRegister, inst: &Instruction, rs1_val: u32, rs2_val: u32) -> Self {
        Self {
            pc: if_id.pc,
            rs1_val,
            rs2_val,
            imm32: inst.imm32,
            opcode: inst.opcode,
            funct3: inst.funct3,
            funct7: inst.funct7,
            branch: inst.branch,
            alu_src: inst.controls.alu_src,
            alu_op: inst.controls.alu_op,
            mem_read: inst.controls.mem_read,
            mem_write: inst.controls.mem_write,
            rs1: inst.rs1,
            rs2: inst.rs2,
            rd: inst.rd,
            reg_write: inst.controls.reg_write,
            mem_to_reg: inst.controls.mem_to_reg,
        }
    }
}

/// EX/MEM register
#[derive(Clone, Copy, Default)]
pub struct ExMemRegister {
    /// Low 32 bits of the ALU result; doubles as the memory address
    pub alu_result: u32,

    /// rs2 after forwarding; the store-data path
    pub rs2_val_forwarded: u32,

    pub mem_read: bool,
    pub mem_write: bool,
    pub rd: u8,
    pub reg_write: bool,
    pub mem_to_reg: bool,
    pub funct3: u8,
    pub opcode: u8,

    /// Set-less-than instruction; write-back reads the flags instead of
    /// the result
    pub slt: bool,

    pub imm32: u32,
    pub pc: u32,

    /// Bit 31 of the ALU result
    pub sign: bool,
    /// Bit 32 of the ALU result
    pub carry: bool,

    /// Unconditional jump; write-back links pc + 4
    pub is_jump: bool,
}

impl ExMemRegister {
    /// Latched from the EX-stage outputs at the cycle edge
    pub fn latch(ex: &IdExRegister, alu: &AluOutput, slt: bool, rs2_val_forwarded: u32) -> Self {
        Self {
            alu_result: alu.result,
            rs2_val_forwarded,
            mem_read: ex.mem_read,
            mem_write: ex.mem_write,
            rd: ex.rd,
            reg_write: ex.reg_write,
            mem_to_reg: ex.mem_to_reg,
            funct3: ex.funct3,
            opcode: ex.opcode,
            slt,
            imm32: ex.imm32,
            pc: ex.pc,
            sign: alu.sign,
            carry: alu.carry,
            is_jump: ex.branch == BranchKind::Jump,
        }
    }
}

/// MEM/WB register
#[derive(Clone, Copy, Default)]
pub struct MemWbRegister {
    pub alu_result: u32,

    /// Data memory read port output
    pub dmem_dout: u32,

    pub rd: u8,
    pub reg_write: bool,
    pub mem_to_reg: bool,
    pub funct3: u8,
    pub opcode: u8,
    pub slt: bool,
    pub imm32: u32,
    pub pc: u32,
    pub sign: bool,
    pub carry: bool,
    pub is_jump: bool,
}

impl MemWbRegister {
    /// Latched from EX/MEM and the data-memory output at the cycle edge
    pub fn latch(mem: &ExMemRegister, dmem_dout: u32) -> Self {
        Self {
            alu_result: mem.alu_result,
            dmem_dout,
            rd: mem.rd,
            reg_write: mem.reg_write,
            mem_to_reg: mem.mem_to_reg,
            funct3: mem.funct3,
            opcode: mem.opcode,
            slt: mem.slt,
            imm32: mem.imm32,
            pc: mem.pc,
            sign: mem.sign,
            carry: mem.carry,
            is_jump: mem.is_jump,
        }
    }
}
