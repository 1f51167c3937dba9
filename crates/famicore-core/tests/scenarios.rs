//! End-to-end scenarios driven through the public console API.

mod common;

use common::{console_with, console_with_hosts, console_with_nmi};
use famicore_core::{buttons, Status};

#[test]
fn load_transfer_program() {
    // LDA #$C0; TAX; INX; BRK
    let mut console = console_with(&[0xA9, 0xC0, 0xAA, 0xE8, 0x00]);

    for _ in 0..4 {
        console.step_instruction();
    }

    let regs = console.cpu_registers();
    assert_eq!(regs.a, 0xC0);
    assert_eq!(regs.x, 0xC1);
    assert!(!regs.p.contains(Status::Z));
    assert!(regs.p.contains(Status::N));
    // BRK vectored to the IRQ handler.
    assert_eq!(regs.pc, 0xA000);
}

#[test]
fn page_cross_penalty() {
    // LDX #$FF; LDA $0100,X; LDX #$00; LDA $0100,X
    let mut console = console_with(&[0xA2, 0xFF, 0xBD, 0x00, 0x01, 0xA2, 0x00, 0xBD, 0x00, 0x01]);

    assert_eq!(console.step_instruction(), 2);
    assert_eq!(console.step_instruction(), 5); // crossed into $0200
    assert_eq!(console.step_instruction(), 2);
    assert_eq!(console.step_instruction(), 4);
}

#[test]
fn indirect_jmp_page_wrap() {
    // Plant $12/$34 so that ($02FF) resolves through the page-wrap bug.
    let program = [
        0xA9, 0x34, // LDA #$34
        0x8D, 0xFF, 0x02, // STA $02FF
        0xA9, 0x12, // LDA #$12
        0x8D, 0x00, 0x02, // STA $0200
        0x6C, 0xFF, 0x02, // JMP ($02FF)
    ];
    let mut console = console_with(&program);

    for _ in 0..5 {
        console.step_instruction();
    }
    assert_eq!(console.cpu_registers().pc, 0x1234);
}

#[test]
fn ppuaddr_ppudata_round_trip() {
    // Write $AB at nametable $2345, then read it back through the
    // buffered PPUDATA path.
    let program = [
        0xA9, 0x23, 0x8D, 0x06, 0x20, // $2006 ← $23
        0xA9, 0x45, 0x8D, 0x06, 0x20, // $2006 ← $45
        0xA9, 0xAB, 0x8D, 0x07, 0x20, // $2007 ← $AB
        0xA9, 0x23, 0x8D, 0x06, 0x20, //
        0xA9, 0x45, 0x8D, 0x06, 0x20, //
        0xAD, 0x07, 0x20, // LDA $2007 (stale buffer)
        0xAD, 0x07, 0x20, // LDA $2007
    ];
    let mut console = console_with(&program);

    for _ in 0..12 {
        console.step_instruction();
    }
    assert_eq!(console.cpu_registers().a, 0xAB);
}

#[test]
fn one_nmi_per_frame_when_enabled() {
    // Enable NMI, then spin. The handler counts entries in X.
    let program = [
        0xA2, 0x00, // LDX #$00
        0xA9, 0x80, // LDA #$80
        0x8D, 0x00, 0x20, // STA $2000
        0x4C, 0x07, 0x80, // spin
    ];
    let mut console = console_with_nmi(&program, &[0xE8, 0x40]); // INX; RTI

    console.step_frame();
    assert_eq!(console.cpu_registers().x, 1);

    console.step_frame();
    assert_eq!(console.cpu_registers().x, 2);

    console.step_frame();
    console.step_frame();
    assert_eq!(console.cpu_registers().x, 4);
}

#[test]
fn no_nmi_when_disabled() {
    let program = [
        0xA2, 0x00, // LDX #$00
        0x4C, 0x02, 0x80, // spin
    ];
    let mut console = console_with_nmi(&program, &[0xE8, 0x40]);

    console.step_frame();
    console.step_frame();
    assert_eq!(console.cpu_registers().x, 0);
}

#[test]
fn oam_dma_stalls_and_copies() {
    let program = [
        0xA9, 0x77, // LDA #$77
        0x8D, 0x50, 0x02, // STA $0250
        0xA9, 0x02, // LDA #$02
        0x8D, 0x14, 0x40, // STA $4014
        0xEA, // NOP
    ];
    let mut console = console_with(&program);

    for _ in 0..4 {
        console.step_instruction();
    }
    // The next step services the DMA before the NOP runs.
    let dma_cycles = console.step_instruction();
    assert!(dma_cycles == 513 || dma_cycles == 514);

    assert_eq!(console.oam()[0x50], 0x77);
    // The 3:1 ratio held through the stall.
    assert_eq!(console.ppu_dots(), console.cpu_cycles() * 3);
}

#[test]
fn controller_bits_reach_the_cpu() {
    // Strobe, then read A and B from $4016.
    let program = [
        0xA9, 0x01, 0x8D, 0x16, 0x40, // $4016 ← 1
        0xA9, 0x00, 0x8D, 0x16, 0x40, // $4016 ← 0
        0xAD, 0x16, 0x40, // LDA $4016 (A button)
        0xAA, // TAX
        0xAD, 0x16, 0x40, // LDA $4016 (B button)
    ];
    let mut console = console_with_hosts(
        &program,
        Box::new(|_, _, _, _, _| {}),
        Box::new(|| (buttons::A | buttons::START, 0)),
    );

    for _ in 0..7 {
        console.step_instruction();
    }
    let regs = console.cpu_registers();
    assert_eq!(regs.x & 1, 1); // A pressed
    assert_eq!(regs.a & 1, 0); // B released
}

#[test]
fn pixels_flow_during_step_frame() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let count = Rc::new(RefCell::new(0u64));
    let sink = Rc::clone(&count);
    let mut console = console_with_hosts(
        &[0x4C, 0x00, 0x80],
        Box::new(move |_, _, _, _, _| *sink.borrow_mut() += 1),
        Box::new(|| (0, 0)),
    );

    console.step_frame();
    console.step_frame();
    // Two frames of 256×240 visible dots, give or take the partial
    // scanlines at the boundaries.
    let seen = *count.borrow();
    assert!(seen >= 61440 && seen <= 3 * 61440, "saw {seen} pixels");
}
