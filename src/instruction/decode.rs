//! Decoding helper functions

use super::opcodes::*;
use super::{AluOp, BranchKind, Controls, Instruction};

/// Decodes a raw instruction word.
///
/// Total over all 32-bit patterns: an unknown opcode produces an all-clear
/// control bundle and therefore takes no architectural effect.
pub fn decode(raw: u32) -> Instruction {
    let opcode = (raw & 0x7f) as u8;
    let funct3 = ((raw >> 12) & 0x7) as u8;
    let funct7 = ((raw >> 25) & 0x7f) as u8;

    // lui, auipc and jal don't use rs1
    let rs1 = if matches!(opcode, LUI | AUIPC | JAL) {
        0
    } else {
        get_rs1(raw)
    };
    // loads, i-type, lui, auipc, jal, jalr don't use rs2
    let rs2 = if matches!(opcode, LUI | AUIPC | JAL | JALR | LOAD | OP_IMM) {
        0
    } else {
        get_rs2(raw)
    };

    Instruction {
        raw,
        opcode,
        funct3,
        funct7,
        rs1,
        rs2,
        rd: get_rd(raw),
        imm32: immediate(raw, opcode, funct3),
        branch: branch_kind(opcode, funct3),
        controls: controls(opcode),
    }
}

fn branch_kind(opcode: u8, funct3: u8) -> BranchKind {
    use BranchKind::*;
    match opcode {
        BRANCH => match funct3 {
            0b000 => Beq,
            0b001 => Bne,
            0b100 => Blt,
            0b101 => Bge,
            0b110 => Bltu,
            0b111 => Bgeu,
            _ => None,
        },
        JAL | JALR => Jump,
        _ => None,
    }
}

fn controls(opcode: u8) -> Controls {
    Controls {
        mem_read: opcode == LOAD,
        mem_write: opcode == STORE,
        mem_to_reg: opcode == LOAD,
        reg_write: matches!(opcode, LOAD | OP | OP_IMM | JALR | JAL | LUI | AUIPC),
        alu_src: matches!(opcode, LOAD | STORE | OP_IMM | JALR | JAL | AUIPC),
        alu_op: match opcode {
            BRANCH => AluOp::Branch,
            OP => AluOp::Op,
            OP_IMM => AluOp::OpImm,
            _ => AluOp::Add,
        },
    }
}

/// Immediate extraction and extension.
///
/// All 12-bit immediates sign-extend from bit 11 and the J immediate from
/// bit 19, per the official encoding. Branch and jal immediates are kept
/// in halfword units; the target adder shifts them left by one. The upper
/// 20 bits of lui/auipc stay unshifted until write-back.
fn immediate(raw: u32, opcode: u8, funct3: u8) -> u32 {
    match opcode {
        LOAD | JALR => sign_extend12(i_imm(raw)),
        OP_IMM => {
            // slli/srli/srai carry the shamt in the low five bits
            if funct3 == 0b001 || funct3 == 0b101 {
                i_imm(raw) & 0x1f
            } else {
                sign_extend12(i_imm(raw))
            }
        }
        STORE => sign_extend12(s_imm(raw)),
        BRANCH => sign_extend12(b_imm(raw)),
        JAL => sign_extend20(j_imm(raw)),
        LUI | AUIPC => u_imm(raw),
        _ => 0,
    }
}

/// imm12 = inst[31:20]
fn i_imm(raw: u32) -> u32 {
    (raw >> 20) & 0xfff
}

/// imm12 = {inst[31:25], inst[11:7]}
fn s_imm(raw: u32) -> u32 {
    (((raw >> 25) & 0x7f) << 5) | ((raw >> 7) & 0x1f)
}

/// imm12 = {inst[31], inst[7], inst[30:25], inst[11:8]}, halfword units
fn b_imm(raw: u32) -> u32 {
    (((raw >> 31) & 0x1) << 11)
        | (((raw >> 7) & 0x1) << 10)
        | (((raw >> 25) & 0x3f) << 4)
        | ((raw >> 8) & 0xf)
}

/// imm20 = {inst[31], inst[19:12], inst[20], inst[30:21]}, halfword units
fn j_imm(raw: u32) -> u32 {
    (((raw >> 31) & 0x1) << 19)
        | (((raw >> 12) & 0xff) << 11)
        | (((raw >> 20) & 0x1) << 10)
        | ((raw >> 21) & 0x3ff)
}

/// imm20 = inst[31:12], zero-extended
fn u_imm(raw: u32) -> u32 {
    (raw >> 12) & 0xfffff
}

fn sign_extend12(imm12: u32) -> u32 {
    (((imm12 as i32) << 20) >> 20) as u32
}

fn sign_extend20(imm20: u32) -> u32 {
    (((imm20 as i32) << 12) >> 12) as u32
}

/// Extracts the rs1 field from a raw instruction
fn get_rs1(raw: u32) -> u8 {
    ((raw >> 15) & 0x1f) as u8
}

/// Extracts the rs2 field from a raw instruction
fn get_rs2(raw: u32) -> u8 {
    ((raw >> 20) & 0x1f) as u8
}

/// Extracts the rd field from a raw instruction
fn get_rd(raw: u32) -> u8 {
    ((raw >> 7) & 0x1f) as u8
}
