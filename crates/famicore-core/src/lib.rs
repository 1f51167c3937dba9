//! NES emulation core: CPU, PPU, and mapper behind one console.
//!
//! The console couples the 6502 to the 2C02 at the hardware's 3:1
//! dot-per-cycle ratio: each `step_instruction` runs one CPU
//! instruction (or a pending OAM DMA) and immediately advances the PPU
//! three dots per consumed cycle. Pixels and controller state cross the
//! boundary through host-supplied callbacks; nothing is buffered in
//! the core.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                   Console                    │
//! │  ┌────────────────────────────────────────┐  │
//! │  │                  Bus                   │  │
//! │  │  ┌────────┐ ┌─────┐ ┌────────┐         │  │
//! │  │  │ CpuRam │ │ Ppu │ │ Mapper │  $4016  │  │
//! │  │  └────────┘ └─────┘ └────────┘         │  │
//! │  └────────────────────────────────────────┘  │
//! │                     ▲                        │
//! │                ┌────┴────┐                   │
//! │                │ Cpu 6502│                   │
//! │                └─────────┘                   │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use famicore_core::Console;
//!
//! let image = std::fs::read("game.nes").expect("read ROM");
//! let mut console = Console::new(
//!     Box::new(|x, y, r, g, b| {
//!         // blit (x, y) ← (r, g, b)
//!         let _ = (x, y, r, g, b);
//!     }),
//!     Box::new(|| (0, 0)),
//! );
//! console.insert_cartridge(image).expect("load cartridge");
//!
//! loop {
//!     console.step_frame();
//! }
//! ```

mod bus;
mod console;

pub use bus::{buttons, Bus, ControllerRead, CpuRam};
pub use console::{Console, ConsoleError, TraceHook};

// Commonly used types from the component crates.
pub use famicore_cpu::{Cpu, CpuRegisters, Status, TraceEntry};
pub use famicore_mappers::{
    create_mapper, Cartridge, Mapper, NametableArrangement, RomError, RomHeader,
};
pub use famicore_ppu::{PixelSink, Ppu, PpuStatus};

/// Screen geometry of the visible frame.
pub mod screen {
    /// Width in pixels.
    pub const WIDTH: u16 = famicore_ppu::VISIBLE_WIDTH;
    /// Height in pixels.
    pub const HEIGHT: u16 = famicore_ppu::VISIBLE_HEIGHT;
    /// Pixels per frame.
    pub const PIXELS: u32 = WIDTH as u32 * HEIGHT as u32;
}
