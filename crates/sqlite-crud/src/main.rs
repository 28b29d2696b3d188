use clap::Parser;

use sqlite_crud::{
    adapters,
    cli::{Args, Command},
    error::{AppError, AppResult},
    logging,
};

fn main() -> AppResult<()> {
    let args = Args::parse();
    logging::init(&args.log_level);

    let rt = match args.command {
        Command::Serve { .. } => tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build(),
        Command::Mcp | Command::Node { .. } => tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build(),
    }
    .map_err(|e| AppError::Internal(e.to_string()))?;

    match args.command.clone() {
        Command::Serve { host, port } => rt.block_on(adapters::http::serve(&args, &host, port)),
        Command::Mcp => rt.block_on(adapters::mcp::run(&args)),
        Command::Node { input } => rt.block_on(adapters::workflow::run(&args, input.as_deref())),
    }
}
