//! Basic module commands: liveness, resets and firmware version.

use crate::{
    commands::generic,
    config::OkCutoff,
    helpers::{LossyStr, SliceExt, WHITESPACE},
    response::{Lines, MAX_LINES},
    Client, Clock, Error, Invocation, Ticker, Transport,
};

/// Check that the module answers `AT` with `OK`.
pub fn test<T: Transport, C: Clock>(client: &mut Client<T, C>) -> Result<bool, Error> {
    client.test(generic::TEST_AT)
}

/// Restart the module and wait for it to finish booting.
pub fn reset<T: Transport, C: Clock>(client: &mut Client<T, C>) -> Result<(), Error> {
    client.send(&Invocation::execute(generic::RESET).ok_cutoff(OkCutoff::Quiet))?;
    await_boot(client)
}

/// Restore factory defaults. The module restarts afterwards.
pub fn factory_reset<T: Transport, C: Clock>(client: &mut Client<T, C>) -> Result<(), Error> {
    client.send(&Invocation::execute(generic::FACTORY_RESET).ok_cutoff(OkCutoff::Quiet))?;
    await_boot(client)
}

/// Firmware and SDK version lines.
pub fn version<T: Transport, C: Clock>(client: &mut Client<T, C>) -> Result<Lines, Error> {
    client.execute(generic::VERSION_INFO, None)
}

/// Wait for the first boot message, then log boot output until the drain
/// window closes.
fn await_boot<T: Transport, C: Clock>(client: &mut Client<T, C>) -> Result<(), Error> {
    let config = *client.config();

    let mut ticker = Ticker::new(config.boot_polls, config.poll_interval);
    while !client.transport_mut().data_available()? {
        if !ticker.wait(client.clock_mut()) {
            warn!("RX timeout occured while waiting for the module to boot!");
            break;
        }
    }

    let mut lines = 0usize;
    let mut ticker = Ticker::new(config.boot_drain_polls, config.boot_drain_interval);
    loop {
        for _ in 0..MAX_LINES {
            if !client.transport_mut().data_available()? {
                break;
            }
            let line = client.transport_mut().read_line()?;
            debug!("Boot: {:?}", LossyStr(line.trim_end(WHITESPACE)));
            lines += 1;
        }
        if !ticker.wait(client.clock_mut()) {
            break;
        }
    }
    debug!("Module booted, {} lines of boot output", lines);
    Ok(())
}
