//! riposte CLI: rule-driven dialogue responder.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use riposte::engine::Engine;

#[derive(Parser)]
#[command(name = "riposte", version, about = "Rule-driven dialogue responder")]
struct Cli {
    /// Data directory (intents, modules, profiles, chat log).
    #[arg(long, global = true, default_value = ".riposte")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new riposte data directory with starter intents.
    Init,

    /// Interactive chat session (`/reload` reloads, `/quit` exits).
    Chat {
        /// Username the session runs as.
        #[arg(long, default_value = "user")]
        user: String,
    },

    /// Ask a single question and print the reply.
    Ask {
        /// Username the turn runs as.
        #[arg(long, default_value = "user")]
        user: String,

        /// The message to respond to.
        message: String,
    },

    /// Show engine info and statistics.
    Info,

    /// List registered command modules.
    Modules,
}

/// Starter catalog written by `riposte init`. The `noanswer` and
/// `moduleerror` tags are load-bearing: the engine degrades to them.
const STARTER_INTENTS: &str = r#"[
  {
    "tag": "greeting",
    "patterns": ["hello", "hi there", "good morning", "hey"],
    "responses": ["Hello {{user,name}}!", "Hi, good to see you."]
  },
  {
    "tag": "goodbye",
    "patterns": ["bye", "goodbye", "see you later"],
    "responses": ["Goodbye!", "See you, {{user,name}}."]
  },
  {
    "tag": "myname",
    "patterns": ["my name is {{name,*}}", "call me {{name,*}}"],
    "responses": ["Nice to meet you, {{user,name}}."]
  },
  {
    "tag": "time",
    "patterns": ["what time is it", "tell me the time"],
    "responses": ["It is {{datetime}}."]
  },
  {
    "tag": "noanswer",
    "patterns": [],
    "responses": ["Sorry, I did not understand that."]
  },
  {
    "tag": "moduleerror",
    "patterns": [],
    "responses": ["Sorry, the {{module}} module is not answering right now."]
  }
]
"#;

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            let intents_dir = cli.data_dir.join("intents");
            std::fs::create_dir_all(&intents_dir).into_diagnostic()?;
            std::fs::create_dir_all(cli.data_dir.join("modules")).into_diagnostic()?;

            let starter = intents_dir.join("starter.json");
            if starter.exists() {
                miette::bail!(
                    "{} already exists; refusing to overwrite",
                    starter.display()
                );
            }
            std::fs::write(&starter, STARTER_INTENTS).into_diagnostic()?;

            let engine = Engine::open(&cli.data_dir)?;
            println!("Initialized riposte at {}", cli.data_dir.display());
            println!("{}", engine.info());
        }

        Commands::Chat { user } => {
            let engine = Engine::open(&cli.data_dir)?;
            println!("riposte: chatting as '{user}' (/reload, /quit)");

            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            loop {
                print!("{user}> ");
                stdout.flush().into_diagnostic()?;

                let mut line = String::new();
                if stdin.lock().read_line(&mut line).into_diagnostic()? == 0 {
                    break; // EOF
                }
                let line = line.trim();

                match line {
                    "/quit" | "/exit" => break,
                    "/reload" => {
                        engine.reload()?;
                        println!("reloaded");
                    }
                    _ => {
                        if let Some(reply) = engine.respond(&user, line) {
                            println!("{reply}");
                        }
                    }
                }
            }
            engine.flush()?;
        }

        Commands::Ask { user, message } => {
            let engine = Engine::open(&cli.data_dir)?;
            if let Some(reply) = engine.respond(&user, &message) {
                println!("{reply}");
            }
            engine.flush()?;
        }

        Commands::Info => {
            let engine = Engine::open(&cli.data_dir)?;
            println!("{}", engine.info());
        }

        Commands::Modules => {
            let engine = Engine::open(&cli.data_dir)?;
            let names = engine.registry().names();
            println!("Registered modules ({}):", names.len());
            for name in names {
                println!("  {name}");
            }
        }
    }

    Ok(())
}
