use {
    crate::{
        config::Config,
        control::Controller,
        sensors::Cozir,
        valve::Valve,
    },
    anyhow::Result,
    clap::Parser,
    log::{error, info},
    std::{env, future},
    tokio::signal,
};

pub mod config;
pub mod control;
pub mod outputs;
pub mod sensors;
pub mod valve;

pub async fn controller() -> Result<()> {
    if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();
    color_backtrace::install();

    let config = Config::parse();
    config.validate()?;

    info!("CO2 concentration monitoring and control system started...");

    let sensor = Cozir::open(&config.port, config.baud, config.response_delay())?;
    let output = outputs::open(config.output)?;
    let valve = Valve::new(
        output,
        config.channel(),
        config.open_voltage,
        config.closed_voltage,
    );

    info!(
        "Valve on {} ({} V open, {} V closed), threshold {} ppm",
        config.channel, config.open_voltage, config.closed_voltage, config.threshold
    );

    let mut controller = Controller::new(sensor, valve, config.control_settings());
    let result = controller
        .run_until(async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                future::pending::<()>().await;
            }
        })
        .await;

    // Releases the serial port
    drop(controller);
    info!("Program has exited");

    result
}
