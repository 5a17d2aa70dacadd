use {
    crate::outputs::{AnalogChannel, AnalogOutput},
    anyhow::{Context, Result},
    log::info,
    std::fmt,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValveState {
    Open,
    Closed,
}

impl ValveState {
    /// Opens below `threshold_ppm` to release CO2, closes at or above it.
    pub fn for_concentration(co2_ppm: u32, threshold_ppm: u32) -> Self {
        if co2_ppm < threshold_ppm {
            ValveState::Open
        } else {
            ValveState::Closed
        }
    }
}

impl fmt::Display for ValveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValveState::Open => write!(f, "open"),
            ValveState::Closed => write!(f, "closed"),
        }
    }
}

/// Solenoid valve driven by one analog output channel.
pub struct Valve<O> {
    output: O,
    channel: AnalogChannel,
    open_volts: f64,
    closed_volts: f64,
}

impl<O: AnalogOutput> Valve<O> {
    pub fn new(output: O, channel: AnalogChannel, open_volts: f64, closed_volts: f64) -> Self {
        Self {
            output,
            channel,
            open_volts,
            closed_volts,
        }
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn set(&mut self, state: ValveState) -> Result<()> {
        let volts = match state {
            ValveState::Open => self.open_volts,
            ValveState::Closed => self.closed_volts,
        };

        self.output
            .write_voltage(&self.channel, volts)
            .with_context(|| format!("Failed to set valve {}", state))?;

        match state {
            ValveState::Open => info!("Valve opened - releasing CO2"),
            ValveState::Closed => info!("Valve closed - stopping CO2 release"),
        }

        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        self.set(ValveState::Closed)
    }
}
