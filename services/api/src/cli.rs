use crate::demo::{run_check, run_demo, run_predict, ArtifactArgs, DemoArgs, PredictArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use student_performance::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "student-performance",
    about = "Serve and exercise the student academic-performance predictor",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Predict the performance tier for a single student
    Predict(PredictArgs),
    /// Run the built-in sample student through the pipeline
    Demo(DemoArgs),
    /// Load the model artifacts and print their diagnostics
    Check(ArtifactArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Predict(args) => run_predict(args),
        Command::Demo(args) => run_demo(args),
        Command::Check(args) => run_check(args),
    }
}
