// SPDX-License-Identifier: MIT

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use workstation_rs::adk::model::ModelRegistry;
use workstation_rs::workstation::workflow::{compile, run, CompileOptions, GraphBuilder, WorkflowLoader};

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a workflow in-process
    Run {
        /// Path to the workflow file (JSON or YAML)
        file: PathBuf,
    },
    /// Generate a standalone program from a workflow
    Compile {
        /// Path to the workflow file (JSON or YAML)
        file: PathBuf,

        /// Write the program here instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip rustfmt
        #[arg(long)]
        no_format: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let loader = WorkflowLoader::new();
    let builder = GraphBuilder::new(ModelRegistry::new());

    match args.command {
        Commands::Run { file } => {
            let config = loader.load_workflow(&file)?;
            let graph = builder.build(&config).await?;

            println!("Running workflow: {}", file.display());
            let summary = run(&graph).await?;
            for (id, output) in &summary.outputs {
                match output {
                    Some(msg) => println!("[{}] {}: {}", id, msg.name, msg.content_text()),
                    None => println!("[{}] (no output)", id),
                }
            }
        }
        Commands::Compile {
            file,
            output,
            no_format,
        } => {
            let config = loader.load_workflow(&file)?;
            let graph = builder.build(&config).await?;

            let mut options = CompileOptions::new().with_format(!no_format);
            if let Some(path) = &output {
                options = options.with_destination(path);
            }
            let program = compile(&graph, &options).await?;
            if output.is_none() {
                print!("{}", program.text());
            }
        }
    }

    Ok(())
}
