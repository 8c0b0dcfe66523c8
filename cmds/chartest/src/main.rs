use std::process::ExitCode;

use anyhow::Result;
use chartest_cli::{
	commands::{self, util::BrokenPipeGuard, util::ColorMode},
	telemetry,
};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;

#[cfg(all(
	target_os = "linux",
	feature = "mimalloc",
	not(feature = "system-alloc")
))]
#[global_allocator]
static GLOBAL: mimallocator::Mimalloc = mimallocator::Mimalloc;

#[derive(Parser)]
#[command(name = "chartest")]
#[command(about = "Render Helm charts and check the rendered objects", long_about = None)]
#[command(version)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Log level (default: $RUST_LOG, then info)
	#[arg(long, global = true, value_enum)]
	log_level: Option<LogLevel>,

	/// Controls color in output
	#[arg(long, global = true, value_enum, default_value_t)]
	color: ColorMode,
}

#[derive(Subcommand)]
enum Commands {
	/// Render a chart and list or print its objects
	Render(commands::render::RenderCmdArgs),

	/// Render a chart and check it contains the objects of a YAML file
	Check(commands::check::CheckArgs),

	/// Run a suite of checks described in a TOML file
	Run(commands::run::RunArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
	Error,
	Warn,
	Info,
	Debug,
	Trace,
}

impl From<LogLevel> for Level {
	fn from(level: LogLevel) -> Self {
		match level {
			LogLevel::Error => Self::ERROR,
			LogLevel::Warn => Self::WARN,
			LogLevel::Info => Self::INFO,
			LogLevel::Debug => Self::DEBUG,
			LogLevel::Trace => Self::TRACE,
		}
	}
}

fn main() -> Result<ExitCode> {
	let cli = Cli::parse();

	telemetry::init(cli.log_level.map(Level::from))?;

	let color = cli.color.enabled();
	colored::control::set_override(color);

	let stdout = BrokenPipeGuard::new(std::io::stdout().lock());

	let passed = match cli.command {
		Commands::Render(args) => commands::render::run(args, stdout).map(|()| true)?,
		Commands::Check(args) => commands::check::run(args, stdout, color)?,
		Commands::Run(args) => commands::run::run(args, stdout, color)?,
	};

	Ok(if passed {
		ExitCode::SUCCESS
	} else {
		ExitCode::FAILURE
	})
}
