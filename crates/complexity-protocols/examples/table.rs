//! Compares the costs of MPC protocols in a LaTeX table.
//!
//! ```text
//! cargo run --example table -- --communication --collapse 1 Ours LowGear TopGear
//! ```
use std::fs::File;
use std::io::{self, stdout, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use complexity::aggregate::Role;
use complexity::params::{SizeParams, COMPUTE_PARTY_COUNT};
use complexity::reduce::ReduceMode;
use complexity::render::{Collapse, Midrules, Table};
use complexity::{Phase, Symbol};
use complexity_protocols::{build_all, encoding, ProtocolConfig};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Protocols to compare, in column order.
    #[arg(required = true)]
    protocols: Vec<String>,

    /// Render the communication table.
    #[arg(long)]
    communication: bool,

    /// Render the computation table.
    #[arg(long)]
    computation: bool,

    /// Print the costs of all phases as JSON instead of a table.
    #[arg(long, conflicts_with_all = ["communication", "computation"])]
    json: bool,

    /// Phases to tabulate.
    #[arg(long, value_delimiter = ',', value_parser = parse_phase, default_value = "setup,offline,online,verification")]
    phases: Vec<Phase>,

    /// Roles whose computation is tabulated.
    #[arg(long, value_delimiter = ',', value_parser = parse_role, default_value = "compute_party,input_party,output_party")]
    roles: Vec<Role>,

    /// 0: every sender and receiver, 1: receivers merged except the bulletin board,
    /// 2: all receivers merged, 3: senders merged too.
    #[arg(long, default_value_t = 0)]
    collapse: u8,

    #[arg(long, value_enum, default_value_t = MidruleStyle::None)]
    midrules: MidruleStyle,

    #[arg(long, value_enum, default_value_t = Notation::Exact)]
    notation: Notation,

    /// Placeholder for empty cells.
    #[arg(long)]
    zero: Option<String>,

    /// Role of the parties which provide the inputs.
    #[arg(long, value_parser = parse_role)]
    input_party: Option<Role>,

    /// Role of the parties which receive the private outputs.
    #[arg(long, value_parser = parse_role)]
    output_party: Option<Role>,

    /// JSON file with protocol variants. Command line roles take precedence.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    size: SizeArgs,

    /// Write JSON logs to this file instead of human readable logs to stderr.
    #[arg(long)]
    log: Option<PathBuf>,
}

/// Fixes size parameters which are symbolic otherwise.
#[derive(clap::Args, Debug)]
struct SizeArgs {
    #[arg(long)]
    parties: Option<i64>,
    #[arg(long)]
    input_parties: Option<i64>,
    #[arg(long)]
    output_parties: Option<i64>,
    #[arg(long)]
    inputs: Option<i64>,
    #[arg(long)]
    additions: Option<i64>,
    #[arg(long)]
    scalar_multiplications: Option<i64>,
    #[arg(long)]
    multiplications: Option<i64>,
    #[arg(long)]
    public_outputs: Option<i64>,
    #[arg(long)]
    private_outputs: Option<i64>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum MidruleStyle {
    None,
    Full,
    Trimmed,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Notation {
    Exact,
    /// Highest power of the number of parties.
    Leading,
    /// Unit costs set to one and dominated terms removed.
    KeepFactors,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = init_tracing(&args).context("failed to initialize tracing")?;

    let mut config = match &args.config {
        Some(path) => {
            let file = File::open(path).context("failed to open config")?;
            serde_json::from_reader(BufReader::new(file)).context("invalid config")?
        }
        None => ProtocolConfig::default(),
    };
    if let Some(role) = args.input_party {
        config = config.input_party(role);
    }
    if let Some(role) = args.output_party {
        config = config.output_party(role);
    }

    let encodings = args
        .protocols
        .iter()
        .map(|name| encoding(name, &config))
        .collect::<Result<Vec<_>, _>>()?;
    let params = args.size.params();
    info!(protocols = encodings.len(), free = ?params.free_symbols(), "Building protocols");
    let protocols = build_all(&encodings, &params).context("failed to build protocols")?;

    let mut out = BufWriter::new(stdout().lock());
    if args.json {
        serde_json::to_writer_pretty(&mut out, &protocols)?;
        writeln!(out)?;
        return Ok(());
    }
    let Some(collapse) = Collapse::from_level(args.collapse) else {
        bail!("--collapse should be 0, 1, 2 or 3");
    };
    let table = Table::new()
        .communication(args.communication)
        .computation(args.computation)
        .phases(args.phases.iter().copied())
        .parties(args.roles.iter().copied())
        .collapse(collapse)
        .midrules(args.midrules.into())
        .notation(args.notation.into());
    let table = match &args.zero {
        Some(zero) => table.zero(zero),
        None => table,
    };
    let rendered = table
        .render(&protocols)
        .context("failed to render table")?;

    writeln!(out, "% generated by:")?;
    let invocation: Vec<String> = std::env::args().collect();
    writeln!(out, "% {}", invocation.join(" "))?;
    write!(out, "{rendered}")?;
    out.flush()?;
    Ok(())
}

impl SizeArgs {
    fn params(&self) -> SizeParams {
        let mut params = SizeParams::default();
        if let Some(parties) = self.parties {
            params = params.parties(parties);
        }
        if let Some(input_parties) = self.input_parties {
            params = params.input_parties(input_parties);
        }
        if let Some(output_parties) = self.output_parties {
            params = params.output_parties(output_parties);
        }
        if let Some(inputs) = self.inputs {
            params = params.inputs(inputs);
        }
        if let Some(additions) = self.additions {
            params = params.additions(additions);
        }
        if let Some(scalar_multiplications) = self.scalar_multiplications {
            params = params.scalar_multiplications(scalar_multiplications);
        }
        if let Some(multiplications) = self.multiplications {
            params = params.multiplications(multiplications);
        }
        if let Some(public_outputs) = self.public_outputs {
            params = params.public_outputs(public_outputs);
        }
        if let Some(private_outputs) = self.private_outputs {
            params = params.private_outputs(private_outputs);
        }
        params
    }
}

impl From<MidruleStyle> for Midrules {
    fn from(style: MidruleStyle) -> Self {
        match style {
            MidruleStyle::None => Midrules::None,
            MidruleStyle::Full => Midrules::Full,
            MidruleStyle::Trimmed => Midrules::Trimmed,
        }
    }
}

impl From<Notation> for ReduceMode {
    fn from(notation: Notation) -> Self {
        match notation {
            Notation::Exact => ReduceMode::Exact,
            Notation::Leading => ReduceMode::Leading(Symbol::clone(&COMPUTE_PARTY_COUNT)),
            Notation::KeepFactors => ReduceMode::DropUnitCosts,
        }
    }
}

fn parse_phase(name: &str) -> Result<Phase> {
    Phase::ALL
        .into_iter()
        .find(|phase| phase.name() == name)
        .with_context(|| format!("unknown phase {name}"))
}

fn parse_role(name: &str) -> Result<Role> {
    [Role::ComputeParty, Role::InputParty, Role::OutputParty]
        .into_iter()
        .find(|role| role.name() == name)
        .with_context(|| format!("unknown role {name}"))
}

fn init_tracing(args: &Args) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env()
        .context("Invalid log directives")?;
    match &args.log {
        Some(path) => {
            let log_writer =
                BufWriter::new(File::create(path).context("failed to create log file")?);
            let (non_blocking, appender_guard) = tracing_appender::non_blocking(log_writer);
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(non_blocking)
                .init();
            Ok(Some(appender_guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_writer(io::stderr)
                .with_env_filter(env_filter)
                .init();
            Ok(None)
        }
    }
}
