//! # posproxy CLI
//!
//! ## Usage
//!
//! ```bash
//! # Serve the ePOS-Print endpoint for a USB printer
//! posproxy serve --device /dev/usb/lp0
//!
//! # Network printer, 58mm paper, ordered dithering
//! posproxy serve --device tcp://192.168.1.50 --width 384 --dither bayer
//!
//! # Send one SOAP document without the HTTP layer
//! posproxy print job.xml --device /dev/usb/lp0
//! ```
//!
//! Logging is controlled with `RUST_LOG` (default `info`).

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use posproxy::{
    JobOptions, PrinterConfig, ProxyError,
    job::{Device, PrintService},
    render::DitheringAlgorithm,
    server::{self, ServerConfig},
    transport::DeviceTarget,
};
use tracing_subscriber::EnvFilter;

/// posproxy - ePOS-Print endpoint for ESC/POS receipt printers
#[derive(Parser, Debug)]
#[command(name = "posproxy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP endpoint
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8000")]
        listen: String,

        #[command(flatten)]
        printer: PrinterArgs,
    },

    /// Print one SOAP document and show the reply
    Print {
        /// SOAP request file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        printer: PrinterArgs,
    },
}

#[derive(Args, Debug)]
struct PrinterArgs {
    /// Printer device path, or tcp://host[:port] for network printers
    #[arg(long, default_value = "/dev/usb/lp0")]
    device: DeviceTarget,

    /// Device write timeout in seconds
    #[arg(long, default_value = "10")]
    timeout: u64,

    /// Print width in dots (576 for 80mm, 384 for 58mm)
    #[arg(long, default_value = "576")]
    width: u16,

    /// Dithering for grayscale images: floyd-steinberg, bayer or threshold
    #[arg(long, default_value = "floyd-steinberg")]
    dither: DitheringAlgorithm,

    /// Extra lines fed before a feed cut
    #[arg(long, default_value = "0")]
    cut_feed: u8,
}

impl PrinterArgs {
    fn job_options(&self) -> Result<JobOptions, ProxyError> {
        Ok(JobOptions {
            printer: PrinterConfig::for_width(self.width)?,
            dithering: self.dither,
            feed_before_cut: self.cut_feed,
        })
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.max(1))
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ProxyError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { listen, printer } => {
            let config = ServerConfig {
                listen_addr: listen,
                write_timeout: printer.timeout(),
                job: printer.job_options()?,
                device: printer.device,
            };
            server::serve(config).await
        }
        Commands::Print { file, printer } => {
            let body = tokio::fs::read(&file).await.map_err(|e| {
                ProxyError::Transport(format!("Failed to read {}: {}", file.display(), e))
            })?;

            let transport = printer.device.open(printer.timeout())?;
            let device = Device::new(transport, printer.timeout());
            let service = PrintService::new(device, printer.job_options()?);

            let reply = service.process(body).await;
            if let Some(report) = &reply.report {
                for skipped in &report.skipped {
                    eprintln!(
                        "skipped element #{} <{}>: {}",
                        skipped.index, skipped.name, skipped.error
                    );
                }
            }
            println!("{}", reply.body);

            if reply.status() == 200 {
                Ok(())
            } else {
                Err(ProxyError::Transport(format!(
                    "printer replied with status {}",
                    reply.status()
                )))
            }
        }
    }
}
