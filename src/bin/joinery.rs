//! joinery: compile request files to SQL
//!
//! # Usage
//!
//! ```bash
//! # Show the SELECT for a request
//! joinery select request.json
//!
//! # Show the COUNT, or run it
//! joinery count request.json --execute
//!
//! # Show the parsed predicate tree and both statements
//! joinery explain request.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;
use joinery::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "joinery")]
#[command(version)]
#[command(about = "Compile join-graph query requests to MySQL", long_about = None)]
#[command(after_help = "EXAMPLES:
    joinery select request.json
    joinery count request.json --execute --database-url mysql://localhost/app
    joinery explain request.json --strict")]
struct Cli {
    /// Configuration file with the entity catalog
    #[arg(short, long, global = true)]
    catalog: Option<PathBuf>,

    /// Database connection URL
    #[arg(long, env = "JOINERY_DATABASE_URL", global = true)]
    database_url: Option<String>,

    /// Reject predicate groups left open at the end of a sequence
    #[arg(long, global = true)]
    strict: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the SELECT statement for a request
    Select {
        /// Request file (JSON)
        request: PathBuf,
    },
    /// Print the COUNT statement for a request
    Count {
        /// Request file (JSON)
        request: PathBuf,

        /// Run the statement and print the count
        #[arg(short, long)]
        execute: bool,
    },
    /// Show the parsed request and both statements
    Explain {
        /// Request file (JSON)
        request: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut config = Config::discover(cli.catalog.as_deref())?;
    if cli.strict {
        config.compiler.parenthesis = ParenthesisPolicy::Strict;
    }
    if cli.database_url.is_some() {
        config.database.url = cli.database_url.clone();
    }

    let compiler = Compiler::new(&config.entities, &MysqlEscaper).with_config(&config.compiler);

    match &cli.command {
        Commands::Select { request } => {
            let req = load_request(request, &config)?;
            println!("{}", compiler.compile_select(&req)?.white());
        }
        Commands::Count { request, execute } => {
            let req = load_request(request, &config)?;
            let sql = compiler.compile_count(&req)?;
            if !*execute {
                println!("{}", sql.white());
                return Ok(());
            }
            if cli.verbose {
                println!("{}", "Generated SQL:".green().bold());
                println!("{}", sql.white());
            }
            let db = Database::from_config(&config.database)
                .await
                .context("use --database-url or set JOINERY_DATABASE_URL")?;
            let n = db.count(&compiler, &req).await?;
            println!("{} {}", n.to_string().cyan().bold(), "row(s)".dimmed());
        }
        Commands::Explain { request } => {
            let req = load_request(request, &config)?;
            explain(&compiler, &req)?;
        }
    }

    Ok(())
}

fn load_request(path: &Path, config: &Config) -> anyhow::Result<Request> {
    let req = joinery::parser::load_request(path, config.compiler.parenthesis)
        .with_context(|| format!("failed to load request {}", path.display()))?;
    Ok(req)
}

fn explain(compiler: &Compiler<'_>, req: &Request) -> anyhow::Result<()> {
    println!("{}", "Request".cyan().bold());
    for (i, class) in req.classes.iter().enumerate() {
        let table = compiler.metadata().table_name(class)?;
        let join = match req.links.get(&i) {
            Some(link) => format!(
                "{} on T{}.{}=T{}.{}",
                link.join_type.to_sql(),
                link.left_table_index,
                link.left_table_field,
                i,
                link.right_table_field
            ),
            None => "root".to_string(),
        };
        println!(
            "  {} {} ({}) {}",
            format!("T{}", i).yellow(),
            class.white(),
            table.dimmed(),
            join.dimmed()
        );
    }

    if !req.conditions.is_empty() {
        println!();
        println!("{}", "Conditions".cyan().bold());
        print_tree(&req.conditions, 1);
    }
    for (i, link) in &req.links {
        if !link.conditions.is_empty() {
            println!();
            println!("{} T{}", "Join conditions".cyan().bold(), i);
            print_tree(&link.conditions, 1);
        }
    }

    println!();
    println!("{}", "SELECT".green().bold());
    println!("{}", compiler.compile_select(req)?.white());
    println!();
    println!("{}", "COUNT".green().bold());
    println!("{}", compiler.compile_count(req)?.white());
    Ok(())
}

fn print_tree(predicates: &[Predicate], depth: usize) {
    let pad = "  ".repeat(depth);
    for p in predicates {
        let logic = p.logic().map(|l| l.to_string()).unwrap_or_default();
        match p {
            Predicate::Comparison { comparison, .. } => println!(
                "{}{:>3} T{}.{} {} {}",
                pad,
                logic.magenta(),
                comparison.table,
                comparison.field.white(),
                comparison.op.to_string().cyan(),
                comparison.value.to_string().yellow()
            ),
            Predicate::Group { children, .. } => {
                println!("{}{:>3} {}", pad, logic.magenta(), "(".dimmed());
                print_tree(children, depth + 1);
                println!("{}    {}", pad, ")".dimmed());
            }
        }
    }
}
