use {
    crate::{control::ControlSettings, outputs::AnalogChannel, outputs::OutputKind},
    anyhow::{ensure, Result},
    clap::Parser,
    std::time::Duration,
};

/// Holds a CO2 atmosphere below a threshold by polling a serial gas sensor and
/// switching a solenoid valve through a DAQ analog output.
#[derive(Debug, Clone, Parser)]
#[command(version)]
pub struct Config {
    /// Serial port the sensor is attached to
    #[arg(short, long, env = "CO2_SERIAL_PORT", default_value = "COM4")]
    pub port: String,

    /// Serial baud rate
    #[arg(short, long, env = "CO2_SERIAL_BAUD", default_value_t = 9600)]
    pub baud: u32,

    /// Concentration in ppm at or above which the valve is closed
    #[arg(short, long, env = "CO2_THRESHOLD_PPM", default_value_t = 10_000)]
    pub threshold: u32,

    /// DAQ physical channel driving the valve
    #[arg(short, long, env = "CO2_VALVE_CHANNEL", default_value = "Dev1/ao1")]
    pub channel: String,

    /// Output voltage with the valve open
    #[arg(long, env = "CO2_VALVE_OPEN_V", default_value_t = 5.0, allow_negative_numbers = true)]
    pub open_voltage: f64,

    /// Output voltage with the valve closed
    #[arg(long, env = "CO2_VALVE_CLOSED_V", default_value_t = 0.0, allow_negative_numbers = true)]
    pub closed_voltage: f64,

    /// Lower bound of the analog output range
    #[arg(long, env = "CO2_AO_MIN_V", default_value_t = 0.0, allow_negative_numbers = true)]
    pub min_voltage: f64,

    /// Upper bound of the analog output range
    #[arg(long, env = "CO2_AO_MAX_V", default_value_t = 5.0, allow_negative_numbers = true)]
    pub max_voltage: f64,

    /// Time the sensor is given to answer a query
    #[arg(long, env = "CO2_RESPONSE_DELAY_MS", default_value_t = 100)]
    pub response_delay_ms: u64,

    /// Time between sensor reads
    #[arg(long, env = "CO2_POLL_INTERVAL_MS", default_value_t = 1000)]
    pub poll_interval_ms: u64,

    /// Analog output backend
    #[arg(short, long, env = "CO2_OUTPUT", value_enum, default_value_t = OutputKind::Nidaqmx)]
    pub output: OutputKind,

    /// Close the valve after this many consecutive cycles without a reading
    #[arg(long, env = "CO2_FAIL_SAFE_AFTER", value_parser = clap::value_parser!(u32).range(1..))]
    pub fail_safe_after: Option<u32>,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.min_voltage < self.max_voltage,
            "Output range {}..={} V is empty",
            self.min_voltage,
            self.max_voltage
        );

        let channel = self.channel();
        for (name, volts) in [("open", self.open_voltage), ("closed", self.closed_voltage)] {
            ensure!(
                channel.contains(volts),
                "Valve {} level {} V is outside the output range {}..={} V",
                name,
                volts,
                self.min_voltage,
                self.max_voltage
            );
        }

        ensure!(self.poll_interval_ms > 0, "Poll interval must be non-zero");

        Ok(())
    }

    pub fn channel(&self) -> AnalogChannel {
        AnalogChannel {
            name: self.channel.clone(),
            min_volts: self.min_voltage,
            max_volts: self.max_voltage,
        }
    }

    pub fn response_delay(&self) -> Duration {
        Duration::from_millis(self.response_delay_ms)
    }

    pub fn control_settings(&self) -> ControlSettings {
        ControlSettings {
            threshold_ppm: self.threshold,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            fail_safe_after: self.fail_safe_after,
        }
    }
}
