//! Shared helpers: in-memory NROM images and consoles wired to no-op
//! hosts.

use famicore_core::{Console, ControllerRead, PixelSink};

/// Build a 32 KiB NROM image with `program` at $8000 and `nmi_handler`
/// at $9000. Reset vector $8000, NMI vector $9000, IRQ vector parked on
/// an RTI.
#[must_use]
pub fn build_rom(program: &[u8], nmi_handler: &[u8]) -> Vec<u8> {
    let mut image = vec![0x4E, 0x45, 0x53, 0x1A, 2, 1, 0x00, 0x00];
    image.extend_from_slice(&[0; 8]);

    let mut prg = vec![0xEA; 32768];
    prg[..program.len()].copy_from_slice(program);
    prg[0x1000..0x1000 + nmi_handler.len()].copy_from_slice(nmi_handler);
    prg[0x2000] = 0x40; // RTI for the IRQ vector
    prg[0x7FFA] = 0x00;
    prg[0x7FFB] = 0x90;
    prg[0x7FFC] = 0x00;
    prg[0x7FFD] = 0x80;
    prg[0x7FFE] = 0x00;
    prg[0x7FFF] = 0xA0;
    image.extend_from_slice(&prg);

    image.extend_from_slice(&[0; 8192]);
    image
}

/// Console with a discarding pixel sink and idle controllers.
#[must_use]
pub fn console_with(program: &[u8]) -> Console {
    console_with_hosts(
        program,
        Box::new(|_, _, _, _, _| {}),
        Box::new(|| (0, 0)),
    )
}

/// Console with explicit host callbacks.
#[must_use]
pub fn console_with_hosts(
    program: &[u8],
    pixel_sink: PixelSink,
    controller_read: ControllerRead,
) -> Console {
    let mut console = Console::new(pixel_sink, controller_read);
    console
        .insert_cartridge(build_rom(program, &[0x40]))
        .expect("test ROM loads");
    console
}

/// Console with a custom NMI handler at $9000.
#[must_use]
pub fn console_with_nmi(program: &[u8], nmi_handler: &[u8]) -> Console {
    let mut console = Console::new(Box::new(|_, _, _, _, _| {}), Box::new(|| (0, 0)));
    console
        .insert_cartridge(build_rom(program, nmi_handler))
        .expect("test ROM loads");
    console
}
