use {anyhow::Result, clap::ValueEnum};

#[cfg(feature = "nidaqmx")]
mod nidaqmx;
mod simulated;

#[cfg(feature = "nidaqmx")]
pub use nidaqmx::NiDaqmx;
pub use simulated::Simulated;

/// A device that can drive a voltage onto a named analog output channel.
///
/// Implementations acquire the channel for the duration of a single write and
/// release it before returning.
pub trait AnalogOutput {
    fn write_voltage(&mut self, channel: &AnalogChannel, volts: f64) -> Result<()>;
}

impl<T: AnalogOutput + ?Sized> AnalogOutput for Box<T> {
    fn write_voltage(&mut self, channel: &AnalogChannel, volts: f64) -> Result<()> {
        (**self).write_voltage(channel, volts)
    }
}

/// Physical channel name (e.g. `Dev1/ao1`) and the voltage range it is
/// configured with.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalogChannel {
    pub name: String,
    pub min_volts: f64,
    pub max_volts: f64,
}

impl AnalogChannel {
    pub fn contains(&self, volts: f64) -> bool {
        (self.min_volts..=self.max_volts).contains(&volts)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputKind {
    /// National Instruments DAQ via the NI-DAQmx driver
    Nidaqmx,
    /// Log writes without touching hardware
    Simulated,
}

pub fn open(kind: OutputKind) -> Result<Box<dyn AnalogOutput>> {
    match kind {
        #[cfg(feature = "nidaqmx")]
        OutputKind::Nidaqmx => Ok(Box::new(NiDaqmx)),
        #[cfg(not(feature = "nidaqmx"))]
        OutputKind::Nidaqmx => Err(anyhow::anyhow!(
            "Built without NI-DAQmx support, rebuild with `--features nidaqmx` or use `--output simulated`"
        )),
        OutputKind::Simulated => Ok(Box::new(Simulated::default())),
    }
}
