use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use neoghidra::commands::*;
use neoghidra::init_logging;

/// Browse Ghidra's decompilation and disassembly from the terminal.
///
/// This CLI is a thin wrapper around `neoghidra-core`; every subcommand builds
/// a session, runs the headless analyzer as needed, and prints the result.
#[derive(Parser, Debug)]
#[command(name = "neoghidra", version, about = "Ghidra headless analysis browser", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Config file (.json, .yaml or .yml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to analyzeHeadless; overrides config and environment.
    #[arg(long, global = true)]
    analyzer: Option<PathBuf>,

    /// Analysis timeout in seconds.
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Emit JSON instead of human-readable text.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
}

impl From<GlobalArgs> for GlobalOptions {
    fn from(args: GlobalArgs) -> Self {
        Self { config: args.config, analyzer: args.analyzer, timeout: args.timeout, json: args.json }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the decompiled view of a binary.
    Decompile {
        binary: String,
    },

    /// Print the disassembly of a binary.
    Disassemble {
        binary: String,

        /// Place the cursor on this address.
        #[arg(long)]
        address: Option<String>,
    },

    /// Find the line for an address in a view.
    Jump {
        binary: String,

        /// Address, hex with or without 0x.
        address: String,

        #[arg(long, value_enum, default_value = "disassembly")]
        view: ViewArg,
    },

    /// Show where an address in one view lands in the other view.
    Toggle {
        binary: String,

        address: String,

        /// View the address is looked up in first.
        #[arg(long, value_enum, default_value = "decompiled")]
        from: ViewArg,
    },

    /// List the functions Ghidra found.
    Functions {
        binary: String,
    },

    /// List the symbols Ghidra found.
    Symbols {
        binary: String,
    },

    /// Resolve a name, or the branch target on the line at --at.
    Definition {
        binary: String,

        /// Function or symbol name.
        word: Option<String>,

        /// Disassembly address whose line supplies the branch target.
        #[arg(long)]
        at: Option<String>,
    },

    /// Lines in a view that mention a name.
    References {
        binary: String,

        word: String,

        #[arg(long, value_enum, default_value = "decompiled")]
        view: ViewArg,
    },

    /// Rename the symbol at an address (display only, never saved).
    Rename {
        binary: String,

        address: String,

        new_name: String,
    },

    /// Report whether a file would be analyzed as a binary.
    Detect {
        path: String,
    },

    /// Show the effective configuration and resolved analyzer.
    Config,

    /// Interactive session reading commands from stdin.
    Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let opts = GlobalOptions::from(cli.global);

    match cli.command {
        Command::Decompile { binary } => decompile_command(&opts, &binary).await?,
        Command::Disassemble { binary, address } => {
            disassemble_command(&opts, &binary, address.as_deref()).await?
        }
        Command::Jump { binary, address, view } => {
            jump_command(&opts, &binary, &address, view).await?
        }
        Command::Toggle { binary, address, from } => {
            toggle_command(&opts, &binary, &address, from).await?
        }
        Command::Functions { binary } => functions_command(&opts, &binary).await?,
        Command::Symbols { binary } => symbols_command(&opts, &binary).await?,
        Command::Definition { binary, word, at } => {
            definition_command(&opts, &binary, word.as_deref(), at.as_deref()).await?
        }
        Command::References { binary, word, view } => {
            references_command(&opts, &binary, &word, view).await?
        }
        Command::Rename { binary, address, new_name } => {
            rename_command(&opts, &binary, &address, &new_name).await?
        }
        Command::Detect { path } => detect_command(&opts, &path)?,
        Command::Config => config_command(&opts)?,
        Command::Shell => shell_command(&opts).await?,
    }

    Ok(())
}
