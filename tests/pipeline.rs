//! End-to-end pipeline tests on hand-encoded instruction images

use pipesim_lib::cpu::{CpuPolicy, CpuState};
use pipesim_lib::loader;
use pipesim_lib::memory::{DataMem, InstrMem};
use pipesim_lib::pipelined;

/// Runs a program against a preloaded data image for the default 50 cycles
fn run_program(prog: &[u32], data: &[u32]) -> (CpuState, DataMem) {
    let policy = CpuPolicy::default();
    let imem = InstrMem::load(prog, policy.imem_depth);
    let mut dmem = DataMem::load(data, policy.dmem_depth);
    let mut cpu = CpuState::make(policy);

    pipelined::run(&mut cpu, &imem, &mut dmem);
    (cpu, dmem)
}

#[test]
fn arithmetic_with_forwarding() {
    let prog = [
        enc::addi(1, 0, 5),
        enc::addi(2, 0, 7),
        enc::add(3, 1, 2),
    ];

    let (cpu, _) = run_program(&prog, &[]);
    assert_eq!(cpu.read_gpr(1), 5);
    assert_eq!(cpu.read_gpr(2), 7);
    assert_eq!(cpu.read_gpr(3), 12);
    assert_eq!(cpu.history.load_use_stalls, 0);
}

#[test]
fn dependent_chain_never_stalls() {
    let prog = [
        enc::addi(1, 0, 1),
        enc::add(2, 1, 1),
        enc::add(3, 2, 2),
        enc::add(4, 3, 3),
    ];

    let (cpu, _) = run_program(&prog, &[]);
    assert_eq!(cpu.read_gpr(4), 8);
    assert_eq!(cpu.history.load_use_stalls, 0);
}

#[test]
fn load_use_stalls_once() {
    let prog = [
        enc::lw(1, 0, 0),
        enc::add(2, 1, 1),
    ];

    let (cpu, _) = run_program(&prog, &[0x11223344]);
    assert_eq!(cpu.read_gpr(1), 0x11223344);
    assert_eq!(cpu.read_gpr(2), 0x22446688);
    assert_eq!(cpu.history.load_use_stalls, 1);
}

#[test]
fn load_with_distant_consumer_does_not_stall() {
    let prog = [
        enc::lw(1, 0, 0),
        enc::addi(5, 0, 9),
        enc::add(2, 1, 1),
    ];

    let (cpu, _) = run_program(&prog, &[0x00000021]);
    assert_eq!(cpu.read_gpr(2), 0x42);
    assert_eq!(cpu.read_gpr(5), 9);
    assert_eq!(cpu.history.load_use_stalls, 0);
}

#[test]
fn backward_branch_loop() {
    let prog = [
        enc::addi(1, 0, 3),
        enc::addi(2, 2, 1),  // L:
        enc::addi(1, 1, -1),
        enc::bne(1, 0, -8),
    ];

    let (cpu, _) = run_program(&prog, &[]);
    assert_eq!(cpu.read_gpr(2), 3);
    assert_eq!(cpu.read_gpr(1), 0);
}

#[test]
fn jal_links_and_squashes_delay_slot() {
    let prog = [
        enc::jal(1, 8),
        enc::addi(2, 0, 99), // squashed
        enc::addi(3, 0, 42),
    ];

    let (cpu, _) = run_program(&prog, &[]);
    assert_eq!(cpu.read_gpr(1), 4);
    assert_eq!(cpu.read_gpr(2), 0);
    assert_eq!(cpu.read_gpr(3), 42);
    assert_eq!(cpu.history.branch_squashes, 1);
}

#[test]
fn jalr_takes_forwarded_base() {
    let prog = [
        enc::addi(1, 0, 16),
        enc::jalr(2, 1, 4),  // to 20, link 8
        enc::addi(3, 0, 1),  // squashed
        0,
        0,
        enc::addi(4, 0, 9),  // 20:
    ];

    let (cpu, _) = run_program(&prog, &[]);
    assert_eq!(cpu.read_gpr(2), 8);
    assert_eq!(cpu.read_gpr(3), 0);
    assert_eq!(cpu.read_gpr(4), 9);
}

#[test]
fn lui_and_auipc() {
    let prog = [
        enc::lui(1, 0x12345),
        enc::auipc(2, 0x1), // at pc = 4
    ];

    let (cpu, _) = run_program(&prog, &[]);
    assert_eq!(cpu.read_gpr(1), 0x12345000);
    assert_eq!(cpu.read_gpr(2), 0x00001004);
}

#[test]
fn lui_value_forwards_to_consumer() {
    let prog = [
        enc::lui(1, 0x00001),
        enc::add(2, 1, 1),
        enc::add(3, 1, 2),
    ];

    let (cpu, _) = run_program(&prog, &[]);
    assert_eq!(cpu.read_gpr(2), 0x2000);
    assert_eq!(cpu.read_gpr(3), 0x3000);
}

#[test]
fn sltu_reads_the_borrow() {
    let prog = [
        enc::addi(1, 0, 1),
        enc::addi(2, 0, 2),
        enc::sltu(3, 1, 2),
        enc::sltu(4, 2, 1),
    ];

    let (cpu, _) = run_program(&prog, &[]);
    assert_eq!(cpu.read_gpr(3), 1);
    assert_eq!(cpu.read_gpr(4), 0);
}

#[test]
fn slt_reads_the_sign() {
    let prog = [
        enc::addi(1, 0, -1),
        enc::addi(2, 0, 1),
        enc::slt(3, 1, 2),
        enc::slt(4, 2, 1),
    ];

    let (cpu, _) = run_program(&prog, &[]);
    assert_eq!(cpu.read_gpr(3), 1);
    assert_eq!(cpu.read_gpr(4), 0);
}

#[test]
fn store_load_round_trip() {
    let prog = [
        enc::addi(1, 0, 0x123),
        enc::sw(1, 0, 8),
        enc::lw(2, 0, 8),
    ];

    let (cpu, dmem) = run_program(&prog, &[]);
    assert_eq!(cpu.read_gpr(2), 0x123);
    assert_eq!(dmem.word(2), 0x123);
}

#[test]
fn byte_store_merges_and_loads_extend() {
    let prog = [
        enc::addi(1, 0, 0x11),
        enc::sb(1, 0, 0),     // dmem[0] low byte <- 0x11
        enc::lw(2, 0, 0),
        enc::lb(3, 0, 4),     // 0xf0 sign-extends
        enc::lbu(4, 0, 4),
    ];

    let (cpu, dmem) = run_program(&prog, &[0xaabbccdd, 0x000000f0]);
    assert_eq!(dmem.word(0), 0xaabbcc11);
    assert_eq!(cpu.read_gpr(2), 0xaabbcc11);
    assert_eq!(cpu.read_gpr(3), 0xfffffff0);
    assert_eq!(cpu.read_gpr(4), 0x000000f0);
}

#[test]
fn taken_beq_skips_over() {
    let prog = [
        enc::addi(1, 0, 4),
        enc::beq(0, 0, 12),  // at 4, to 16
        enc::addi(2, 0, 1),  // squashed
        enc::addi(3, 0, 1),  // never fetched
        enc::addi(4, 0, 1),  // 16:
    ];

    let (cpu, _) = run_program(&prog, &[]);
    assert_eq!(cpu.read_gpr(2), 0);
    assert_eq!(cpu.read_gpr(3), 0);
    assert_eq!(cpu.read_gpr(4), 1);
}

#[test]
fn taken_branch_to_fall_through_executes_it_once() {
    // +4 targets the branch's own fall-through: the pipeline already
    // holds the right instruction, so nothing squashes and nothing may
    // run twice
    let prog = [
        enc::beq(0, 0, 4),
        enc::addi(2, 2, 1),
        enc::addi(5, 0, 99),
    ];

    let (cpu, _) = run_program(&prog, &[]);
    assert_eq!(cpu.read_gpr(2), 1);
    assert_eq!(cpu.read_gpr(5), 99);
    assert_eq!(cpu.history.branch_squashes, 0);
}

#[test]
fn jal_to_fall_through_links_without_squash() {
    let prog = [
        enc::jal(1, 4),
        enc::addi(2, 2, 1),
    ];

    let (cpu, _) = run_program(&prog, &[]);
    assert_eq!(cpu.read_gpr(1), 4);
    assert_eq!(cpu.read_gpr(2), 1);
    assert_eq!(cpu.history.branch_squashes, 0);
}

#[test]
fn image_text_round_trip() {
    let prog = [enc::addi(1, 0, 5), enc::add(3, 1, 1)];
    let text: String = prog.iter().map(|w| format!("{:032b}\n", w)).collect();

    let words = loader::parse_imem(&text, 1024).unwrap();
    assert_eq!(words, prog);

    let (cpu, _) = run_program(&words, &[]);
    assert_eq!(cpu.read_gpr(3), 10);
}

/// Instruction encoders for the test programs
mod enc {
    fn r(funct7: u32, rs2: u32, rs1: u32, funct3: u32, rd: u32, opcode: u32) -> u32 {
        (funct7 << 25) | (rs2 << 20) | (rs1 << 15) | (funct3 << 12) | (rd << 7) | opcode
    }

    fn i(imm: i32, rs1: u32, funct3: u32, rd: u32, opcode: u32) -> u32 {
        ((imm as u32 & 0xfff) << 20) | (rs1 << 15) | (funct3 << 12) | (rd << 7) | opcode
    }

    fn s(imm: i32, rs2: u32, rs1: u32, funct3: u32) -> u32 {
        let imm = imm as u32;
        (((imm >> 5) & 0x7f) << 25)
            | (rs2 << 20)
            | (rs1 << 15)
            | (funct3 << 12)
            | ((imm & 0x1f) << 7)
            | 0x23
    }

    /// `imm` is the byte offset from the branch
    fn b(imm: i32, rs2: u32, rs1: u32, funct3: u32) -> u32 {
        let imm = imm as u32;
        (((imm >> 12) & 0x1) << 31)
            | (((imm >> 5) & 0x3f) << 25)
            | (rs2 << 20)
            | (rs1 << 15)
            | (funct3 << 12)
            | (((imm >> 1) & 0xf) << 8)
            | (((imm >> 11) & 0x1) << 7)
            | 0x63
    }

    /// `imm` is the byte offset from the jump
    fn j(imm: i32, rd: u32) -> u32 {
        let imm = imm as u32;
        (((imm >> 20) & 0x1) << 31)
            | (((imm >> 1) & 0x3ff) << 21)
            | (((imm >> 11) & 0x1) << 20)
            | (((imm >> 12) & 0xff) << 12)
            | (rd << 7)
            | 0x6f
    }

    fn u(imm20: u32, rd: u32, opcode: u32) -> u32 {
        ((imm20 & 0xfffff) << 12) | (rd << 7) | opcode
    }

    pub fn addi(rd: u32, rs1: u32, imm: i32) -> u32 {
        i(imm, rs1, 0b000, rd, 0x13)
    }

    pub fn add(rd: u32, rs1: u32, rs2: u32) -> u32 {
        r(0, rs2, rs1, 0b000, rd, 0x33)
    }

    pub fn slt(rd: u32, rs1: u32, rs2: u32) -> u32 {
        r(0, rs2, rs1, 0b010, rd, 0x33)
    }

    pub fn sltu(rd: u32, rs1: u32, rs2: u32) -> u32 {
        r(0, rs2, rs1, 0b011, rd, 0x33)
    }

    pub fn lw(rd: u32, rs1: u32, imm: i32) -> u32 {
        i(imm, rs1, 0b010, rd, 0x03)
    }

    pub fn lb(rd: u32, rs1: u32, imm: i32) -> u32 {
        i(imm, rs1, 0b000, rd, 0x03)
    }

    pub fn lbu(rd: u32, rs1: u32, imm: i32) -> u32 {
        i(imm, rs1, 0b100, rd, 0x03)
    }

    pub fn sw(rs2: u32, rs1: u32, imm: i32) -> u32 {
        s(imm, rs2, rs1, 0b010)
    }

    pub fn sb(rs2: u32, rs1: u32, imm: i32) -> u32 {
        s(imm, rs2, rs1, 0b000)
    }

    pub fn beq(rs1: u32, rs2: u32, imm: i32) -> u32 {
        b(imm, rs2, rs1, 0b000)
    }

    pub fn bne(rs1: u32, rs2: u32, imm: i32) -> u32 {
        b(imm, rs2, rs1, 0b001)
    }

    pub fn jal(rd: u32, imm: i32) -> u32 {
        j(imm, rd)
    }

    pub fn jalr(rd: u32, rs1: u32, imm: i32) -> u32 {
        i(imm, rs1, 0b000, rd, 0x67)
    }

    pub fn lui(rd: u32, imm20: u32) -> u32 {
        u(imm20, rd, 0x37)
    }

    pub fn auipc(rd: u32, imm20: u32) -> u32 {
        u(imm20, rd, 0x17)
    }
}
