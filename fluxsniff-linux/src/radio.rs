/// Channel tuning through `iw`.
use std::process::Command;

use fluxsniff::channel::RadioController;
use fluxsniff::error::RadioError;

/// Runs `iw dev <iface> set channel <n>`. Arguments are passed as a
/// vector, never through a shell.
pub struct IwRadio;

impl RadioController for IwRadio {
    fn set_channel(&mut self, interface: &str, channel: u8) -> Result<(), RadioError> {
        if !(1..=14).contains(&channel) {
            return Err(RadioError::InvalidChannel(channel));
        }

        let status = Command::new("iw")
            .args(["dev", interface, "set", "channel", &channel.to_string()])
            .status()
            .map_err(|e| RadioError::Command(e.to_string()))?;

        if !status.success() {
            return Err(RadioError::Command(format!("iw exited with {status}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Any outcome other than InvalidChannel means `iw` was run.
    #[test]
    fn out_of_band_channels_rejected_before_iw() {
        for channel in [0, 15] {
            assert_eq!(
                IwRadio.set_channel("fluxsniff-test0", channel),
                Err(RadioError::InvalidChannel(channel))
            );
        }
    }
}
