//! nestest golden-log validation.
//!
//! Runs the reference ROM in automation mode (PC forced to $C000) and
//! checks every executed instruction's registers and cycle counter
//! against nestest.log, stopping at the first opcode this interpreter
//! does not decode (the log's unofficial-opcode section). Skips when
//! the ROM is not checked in.

use std::fs;
use std::path::PathBuf;

use famicore_cpu::{Bus, Cpu, TraceEntry};

/// Minimal NROM-128 harness: 2 KiB RAM plus 16 KiB PRG mirrored at
/// $8000 and $C000. nestest in automation mode touches nothing else.
struct NestestBus {
    ram: [u8; 0x0800],
    prg: Vec<u8>,
}

impl Bus for NestestBus {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[usize::from(addr & 0x07FF)],
            0x8000..=0xFFFF => self.prg[usize::from(addr & 0x3FFF)],
            _ => 0,
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        if addr < 0x2000 {
            self.ram[usize::from(addr & 0x07FF)] = value;
        }
    }
}

fn rom_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .map(|p| p.join("test-roms"))
        .unwrap_or_default()
}

/// Pull a hex field like "A:00" out of a log line.
fn log_field(line: &str, tag: &str) -> Option<u64> {
    let start = line.find(tag)? + tag.len();
    let rest = &line[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_hexdigit())
        .unwrap_or(rest.len());
    u64::from_str_radix(&rest[..end], 16).ok()
}

fn log_cycles(line: &str) -> Option<u64> {
    let start = line.find("CYC:")? + 4;
    line[start..].trim().parse().ok()
}

#[test]
fn nestest_trace_matches_log() {
    let dir = rom_dir();
    let Ok(rom) = fs::read(dir.join("nestest.nes")) else {
        eprintln!("skipping: {:?} not present", dir.join("nestest.nes"));
        return;
    };
    let Ok(log) = fs::read_to_string(dir.join("nestest.log")) else {
        eprintln!("skipping: nestest.log not present");
        return;
    };

    let mut bus = NestestBus {
        ram: [0; 0x0800],
        prg: rom[16..16 + 16384].to_vec(),
    };
    let mut cpu = Cpu::new();
    cpu.reset(&mut bus);
    cpu.pc = 0xC000; // automation entry point

    for (number, line) in log.lines().enumerate() {
        let entry = TraceEntry::capture(&cpu, &mut bus);
        if entry.disassembly.starts_with(".byte") {
            // Reached the unofficial-opcode section of the log.
            assert!(number > 5000, "undecoded opcode too early, line {number}");
            return;
        }

        // The line leads with the 4-digit PC.
        let expected_pc = u64::from_str_radix(line.get(..4).unwrap_or(""), 16);
        assert_eq!(
            Ok(u64::from(entry.pc)),
            expected_pc,
            "PC diverged at log line {}: {line}",
            number + 1
        );
        for (tag, actual) in [
            ("A:", u64::from(entry.registers.a)),
            ("X:", u64::from(entry.registers.x)),
            ("Y:", u64::from(entry.registers.y)),
            ("P:", u64::from(entry.registers.p.bits())),
            ("SP:", u64::from(entry.registers.sp)),
        ] {
            assert_eq!(
                actual,
                log_field(line, tag).unwrap_or(actual),
                "{tag} diverged at log line {}: {line}",
                number + 1
            );
        }
        if let Some(cycles) = log_cycles(line) {
            assert_eq!(
                cpu.cycles(),
                cycles,
                "cycle count diverged at log line {}: {line}",
                number + 1
            );
        }

        cpu.step(&mut bus);
    }
}
