//! NES cartridge parsing and mapper implementations.
//!
//! This crate owns everything on the cartridge side of the connector:
//! the iNES image format, the [`Mapper`] capability contract used by the
//! CPU bus and the PPU, and the boards themselves. Nametable CIRAM and
//! its arrangement live behind the mapper.
//!
//! # Example
//!
//! ```no_run
//! use famicore_mappers::{Cartridge, create_mapper};
//!
//! let image = std::fs::read("game.nes").expect("read ROM");
//! let cart = Cartridge::load(image).expect("parse ROM");
//! let mapper = create_mapper(cart).expect("unsupported mapper");
//! let reset_lo = mapper.cpu_read(0xFFFC);
//! ```

pub mod mapper;
pub mod rom;

mod nrom;

pub use mapper::{BankWindow, Mapper, NametableArrangement};
pub use nrom::Nrom;
pub use rom::{Cartridge, RomError, RomHeader};

/// Build the mapper for a cartridge, consuming it.
///
/// # Errors
///
/// Returns [`RomError::UnsupportedMapper`] for any board other than NROM.
pub fn create_mapper(cart: Cartridge) -> Result<Box<dyn Mapper>, RomError> {
    match cart.header().mapper {
        0 => Ok(Box::new(Nrom::new(cart))),
        n => Err(RomError::UnsupportedMapper(n)),
    }
}
