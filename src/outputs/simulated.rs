use {
    crate::outputs::{AnalogChannel, AnalogOutput},
    anyhow::{bail, Result},
    log::info,
};

/// Stands in for DAQ hardware on the bench. Keeps the last written level per
/// channel.
#[derive(Debug, Default)]
pub struct Simulated {
    last: Vec<(String, f64)>,
}

impl Simulated {
    pub fn level(&self, channel: &str) -> Option<f64> {
        self.last
            .iter()
            .find(|(name, _)| name == channel)
            .map(|(_, volts)| *volts)
    }
}

impl AnalogOutput for Simulated {
    fn write_voltage(&mut self, channel: &AnalogChannel, volts: f64) -> Result<()> {
        if !channel.contains(volts) {
            bail!(
                "{} V is outside the {} range {}..={} V",
                volts,
                channel.name,
                channel.min_volts,
                channel.max_volts
            );
        }

        info!("[simulated] {} <- {} V", channel.name, volts);

        match self.last.iter_mut().find(|(name, _)| *name == channel.name) {
            Some((_, level)) => *level = volts,
            None => self.last.push((channel.name.clone(), volts)),
        }

        Ok(())
    }
}
