// SPDX-License-Identifier: GPL-3.0
// main.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use std::{
    error::Error,
    fs,
    path::PathBuf,
    process::ExitCode,
};

// This file is the core of the basic client - it exists merely as a CLI-based
// program to build an XBUS with stub devices, poke its registers and move
// snapshots in and out of files. Real accessories and a full machine will
// plug in around it in due course.

use clap::Parser;
use log::{debug, error, info, warn};
use opera_core::{
    interrupts::InterruptController,
    xbus::{
        BUILTIN_SELECTOR, POLL_STATUS_READY, SLOT_COUNT, Xbus,
        clio_xbus::ClioXbus,
        stub_xbus_device::StubXbusDevice,
    },
};

/// The builtin identify command, padded out to the full register width.
const IDENTIFY_COMMAND: [u32; 7] = [0x83, 0, 0, 0, 0, 0, 0];

#[derive(Parser)]
#[command(
    version,
    about = "A basic barebones UI for the Opera XBUS",
    long_about = None
)]
struct OperaArgs {
    #[arg(
        long = "devices",
        help = "How many stub devices to attach after the one in slot 0",
        default_value_t = 1
    )]
    devices: usize,

    #[arg(
        long = "identify",
        help = "Run the builtin identify command and print its status bytes"
    )]
    identify: bool,

    #[arg(
        long = "load",
        help = "An optional snapshot file to restore first",
        id = "Snapshot to load"
    )]
    load: Option<PathBuf>,

    #[arg(
        long = "save",
        help = "An optional snapshot file to write last",
        id = "Snapshot to save"
    )]
    save: Option<PathBuf>,

    #[arg(
        long = "legacy",
        help = "Read and write snapshots without the version header"
    )]
    legacy: bool,
}

/// Counts the FIQs raised by the bus, so they can be reported at exit.
struct FiqCounter {
    count: usize,
}

impl InterruptController for FiqCounter {

    fn raise(&mut self, line: u32, subcode: u32) {
        debug!("FIQ raised on line {line}, sub-code {subcode}");
        self.count += 1;
    }
}

fn main() -> ExitCode {
    colog::init();
    let opera_args = OperaArgs::parse();

    match run(&opera_args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        },
    }
}

/// Sends the builtin identify command and drains its response. Returns None
/// when slot 15 is occupied, as that device then receives the command instead.
fn run_identify<I: InterruptController>(xbus: &mut ClioXbus<I>) -> Option<Vec<u8>> {

    if xbus.is_occupied(SLOT_COUNT - 1) {
        warn!("Skipping identify: the device in slot 15 shadows the builtin command port");
        return None;
    }

    xbus.write_select(BUILTIN_SELECTOR as u32);
    for value in IDENTIFY_COMMAND {
        xbus.write_command(value);
    }

    let mut status = Vec::new();
    while xbus.read_poll() & POLL_STATUS_READY as u32 != 0 {
        status.push(xbus.read_status() as u8);
    }

    Some(status)
}

fn run(opera_args: &OperaArgs) -> Result<(), Box<dyn Error>> {

    let mut xbus = ClioXbus::new(Box::new(StubXbusDevice::new(0)), FiqCounter { count: 0 });
    for reserve in 1..=opera_args.devices {
        let slot = xbus.attach(Box::new(StubXbusDevice::new(reserve as u32)))?;
        info!("Attached stub device to slot {slot}");
    }

    if let Some(path) = &opera_args.load {
        let snapshot = fs::read(path)?;
        if opera_args.legacy {
            xbus.load_legacy(&snapshot)?;
        } else {
            xbus.load(&snapshot)?;
        }
        info!("Restored snapshot from {}", path.display());
    }

    xbus.start_running();
    if opera_args.identify {
        if let Some(status) = run_identify(&mut xbus) {
            println!("Identify response: {status:02X?}");
        }
    }
    xbus.stop_running();

    if let Some(path) = &opera_args.save {
        let snapshot = if opera_args.legacy {
            let mut buffer = vec![0; xbus.compute_legacy_size()];
            xbus.save_legacy(&mut buffer)?;
            buffer
        } else {
            xbus.save_to_vec()?
        };
        fs::write(path, &snapshot)?;
        info!("Wrote {} byte snapshot to {}", snapshot.len(), path.display());
    }

    info!("{} FIQ(s) raised", xbus.interrupt_controller().count);
    xbus.detach_all();

    Ok(())
}
