use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pokemem::config::{validate_config, Config, ConfigLoader, DEFAULT_CONFIG_FILE};
use pokemem::memory::format_byte_size;
use pokemem::{
    Address, DataType, MemoryError, MemoryOperations, ProcessId, ResourceEstimate, SearchMode,
    SearchSession, TypedValue,
};
use serde_json::json;
use std::io::Write as _;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pokemem", version)]
#[command(about = "View, edit and search the memory of a running process")]
struct Cli {
    #[arg(short, long, env = "POKEMEM_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Don't SIGSTOP the target while accessing its memory
    #[arg(long)]
    no_stop: bool,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the searchable memory regions of a process
    Maps { pid: ProcessId },

    /// Show consecutive items starting at an address
    Read {
        pid: ProcessId,
        address: Address,
        #[arg(short = 'n', long, default_value_t = 16)]
        count: usize,
        #[arg(short = 't', long = "type")]
        data_type: Option<DataType>,
        /// Also show each item's raw bytes in hex
        #[arg(long)]
        raw: bool,
    },

    /// Write one value, or raw hex bytes, at an address
    Write {
        pid: ProcessId,
        address: Address,
        #[arg(required_unless_present = "bytes")]
        value: Option<String>,
        #[arg(short = 't', long = "type")]
        data_type: Option<DataType>,
        #[arg(long, conflicts_with = "value")]
        bytes: Option<String>,
    },

    /// Save every searchable region to a snapshot file
    Dump { pid: ProcessId, path: PathBuf },

    /// Write a snapshot file back into a process
    Load { pid: ProcessId, path: PathBuf },

    /// Interactively narrow down where a value lives
    Search {
        pid: ProcessId,
        #[arg(short = 't', long = "type")]
        data_type: Option<DataType>,
    },
}

/// Runs engine work off the async runtime
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .context("worker thread panicked")?
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::new(&cli.config).load_or_default();
    validate_config(&config).with_context(|| format!("invalid configuration in {}", cli.config.display()))?;
    if cli.no_stop {
        config.process.stop_while_accessing = false;
    }

    init_logging(&config.logging.level);
    info!("pokemem v{}", env!("CARGO_PKG_VERSION"));

    let json = cli.json;
    match cli.command {
        Command::Maps { pid } => maps(&config, pid, json).await,
        Command::Read {
            pid,
            address,
            count,
            data_type,
            raw,
        } => {
            let data_type = data_type.unwrap_or(config.scanner.default_type);
            read(&config, pid, address, count, data_type, raw, json).await
        }
        Command::Write {
            pid,
            address,
            value,
            data_type,
            bytes,
        } => {
            let data_type = data_type.unwrap_or(config.scanner.default_type);
            write(&config, pid, address, value, data_type, bytes, json).await
        }
        Command::Dump { pid, path } => dump(&config, pid, path, json).await,
        Command::Load { pid, path } => load(&config, pid, path, json).await,
        Command::Search { pid, data_type } => {
            let data_type = data_type.unwrap_or(config.scanner.default_type);
            search(&config, pid, data_type, json).await
        }
    }
}

fn operations(config: &Config, pid: ProcessId) -> Result<MemoryOperations> {
    if !pokemem::process::exists(pid) {
        bail!("no process with PID {}", pid);
    }
    Ok(MemoryOperations::from_config(pid, config))
}

async fn maps(config: &Config, pid: ProcessId, json: bool) -> Result<()> {
    let mut ops = operations(config, pid)?;
    let info = ops.process_info();
    let space = blocking(move || Ok(ops.refresh_address_space()?)).await?;

    if json {
        println!("{}", json!({ "process": info, "address_space": space }));
        return Ok(());
    }

    println!("{}", info);
    for region in &space {
        println!(
            "{:>16x}-{:<16x} {} {:>10} {}",
            region.base.as_u64(),
            region.end().as_u64(),
            region.permissions,
            format_byte_size(region.size),
            region.pathname.as_deref().unwrap_or("")
        );
    }
    println!("{} regions, {}", space.len(), format_byte_size(space.total_bytes()));
    Ok(())
}

async fn read(
    config: &Config,
    pid: ProcessId,
    address: Address,
    count: usize,
    data_type: DataType,
    raw: bool,
    json: bool,
) -> Result<()> {
    let mut ops = operations(config, pid)?;
    let items = blocking(move || Ok(ops.read_items(address, count, data_type)?)).await?;
    let width = data_type.size() as u64;

    if json {
        let rows: Vec<_> = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                json!({
                    "address": address.add(i as u64 * width),
                    "value": item.as_ref().map(|v| v.format()),
                    "bytes": item.as_ref().map(|v| hex::encode(v.as_bytes())),
                })
            })
            .collect();
        println!("{}", json!({ "type": data_type, "items": rows }));
        return Ok(());
    }

    for (i, item) in items.iter().enumerate() {
        let at = address.add(i as u64 * width);
        match item {
            Some(v) if raw => println!("{:>16x}  {:<24} {}", at.as_u64(), v, hex::encode(v.as_bytes())),
            Some(v) => println!("{:>16x}  {}", at.as_u64(), v),
            None => println!("{:>16x}  ??", at.as_u64()),
        }
    }
    Ok(())
}

async fn write(
    config: &Config,
    pid: ProcessId,
    address: Address,
    value: Option<String>,
    data_type: DataType,
    bytes: Option<String>,
    json: bool,
) -> Result<()> {
    let mut ops = operations(config, pid)?;

    let (written, summary) = match (bytes, value) {
        (Some(hex_bytes), _) => {
            let data = hex::decode(hex_bytes.trim()).context("--bytes must be hex")?;
            let text = format!("{} bytes", data.len());
            let row = json!({ "address": address, "bytes": hex::encode(&data) });
            blocking(move || Ok(ops.write_bytes(address, &data)?)).await?;
            (row, text)
        }
        (None, Some(text)) => {
            let value = TypedValue::parse(data_type, &text)?;
            let row = json!({ "address": address, "type": data_type, "value": value.format() });
            blocking(move || Ok(ops.write_item(address, &value)?)).await?;
            (row, format!("{} {}", data_type, value))
        }
        (None, None) => bail!("nothing to write"),
    };

    report(json, written, || format!("wrote {} at {}", summary, address));
    Ok(())
}

async fn dump(config: &Config, pid: ProcessId, path: PathBuf, json: bool) -> Result<()> {
    let mut ops = operations(config, pid)?;
    let target = path.clone();
    let summary = blocking(move || {
        let space = ops.refresh_address_space()?;
        Ok(ops.dump_all(&space, &target)?)
    })
    .await
    .with_context(|| format!("dumping to {}", path.display()))?;

    if json {
        println!("{}", json!({ "path": path, "summary": summary }));
    } else {
        println!(
            "saved {} runs ({}) to {}",
            summary.runs,
            format_byte_size(summary.bytes),
            path.display()
        );
    }
    Ok(())
}

async fn load(config: &Config, pid: ProcessId, path: PathBuf, json: bool) -> Result<()> {
    let mut ops = operations(config, pid)?;
    let source = path.clone();
    let summary = blocking(move || Ok(ops.load(&source)?))
        .await
        .with_context(|| format!("loading {}", path.display()))?;

    if json {
        println!("{}", json!({ "path": path, "summary": summary }));
    } else {
        println!(
            "restored {} runs ({}) from {}",
            summary.runs,
            format_byte_size(summary.bytes),
            path.display()
        );
    }
    Ok(())
}

/// Engine state carried across blocking calls in the search loop
struct SearchState {
    ops: MemoryOperations,
    session: SearchSession,
}

enum Step {
    Continue,
    Quit,
}

const SEARCH_HELP: &str = "\
<value>        keep only candidates currently equal to <value>
count          show how many candidates are left
list [n]       show the first n candidates and their values
remove <addr>  drop one candidate
save <path>    save the candidates' current bytes to a snapshot
quit           stop searching";

async fn search(config: &Config, pid: ProcessId, data_type: DataType, json: bool) -> Result<()> {
    let mut ops = operations(config, pid)?;
    let info = ops.process_info();
    let (ops, space) = blocking(move || {
        let space = ops.refresh_address_space()?;
        Ok((ops, space))
    })
    .await?;

    let estimate = ResourceEstimate::for_search(&space, data_type, SearchMode::EnterValue);
    let mut ops = ops;
    let session = ops.start_search(space, data_type)?;
    let count = session.count();
    let mut state = Some(SearchState { ops, session });

    if json {
        println!(
            "{}",
            json!({ "process": info, "type": data_type, "estimate": estimate, "candidates": count })
        );
    } else {
        println!("{}", info);
        println!("searching {} ({})", data_type, estimate);
        println!("{}", SEARCH_HELP);
    }

    let limit = config.scanner.result_limit;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if !json {
            if let Some(s) = &state {
                print!("[{}] > ", s.session.count());
            }
            std::io::stdout().flush()?;
        }

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        let Some(current) = state.take() else { break };
        let (next, step) = search_step(current, line, limit, json).await?;
        state = Some(next);
        if let Step::Quit = step {
            break;
        }
    }
    Ok(())
}

async fn search_step(mut state: SearchState, line: String, limit: usize, json: bool) -> Result<(SearchState, Step)> {
    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((c, a)) => (c.to_string(), Some(a.trim().to_string())),
        None => (line.clone(), None),
    };

    match command.as_str() {
        "quit" | "exit" => return Ok((state, Step::Quit)),
        "help" => println!("{}", SEARCH_HELP),
        "count" => report(json, json!({ "candidates": state.session.count() }), || {
            format!("{} candidates", state.session.count())
        }),
        "list" => {
            let n = match arg.as_deref().map(str::parse::<usize>) {
                Some(Ok(n)) => n,
                Some(Err(_)) => {
                    warn!("list takes a number");
                    return Ok((state, Step::Continue));
                }
                None => limit,
            };
            return blocking(move || {
                let rows = list_candidates(&mut state, n)?;
                if json {
                    println!("{}", json!({ "candidates": rows }));
                } else {
                    for (address, value) in &rows {
                        println!("{:>16x}  {}", address.as_u64(), value.as_deref().unwrap_or("??"));
                    }
                }
                Ok((state, Step::Continue))
            })
            .await;
        }
        "remove" => {
            let address: Address = match arg.as_deref().unwrap_or("").parse() {
                Ok(address) => address,
                Err(e) => {
                    warn!("{}", e);
                    return Ok((state, Step::Continue));
                }
            };
            let removed = state.ops.remove_candidate(&mut state.session, address)?;
            report(json, json!({ "address": address, "removed": removed }), || {
                if removed {
                    format!("removed {}", address)
                } else {
                    format!("{} is not a candidate", address)
                }
            });
        }
        "save" => {
            let Some(path) = arg.map(PathBuf::from) else {
                warn!("save needs a path");
                return Ok((state, Step::Continue));
            };
            return blocking(move || {
                let summary = state.ops.dump_candidates(&state.session, &path)?;
                report(json, json!({ "path": path, "summary": summary }), || {
                    format!("saved {} candidates to {}", summary.runs, path.display())
                });
                Ok((state, Step::Continue))
            })
            .await;
        }
        _ => {
            let value = match TypedValue::parse(state.session.data_type(), &line) {
                Ok(value) => value,
                Err(e) => {
                    warn!("{}", e);
                    return Ok((state, Step::Continue));
                }
            };
            return blocking(move || {
                match state.ops.apply_predicate(&mut state.session, &value) {
                    Ok(left) => report(json, json!({ "value": value.format(), "candidates": left }), || {
                        format!("{} candidates left", left)
                    }),
                    Err(e @ MemoryError::ProcessUnreachable { .. }) => return Err(e.into()),
                    Err(e) => warn!("{}", e),
                }
                Ok((state, Step::Continue))
            })
            .await;
        }
    }
    Ok((state, Step::Continue))
}

fn list_candidates(state: &mut SearchState, n: usize) -> Result<Vec<(Address, Option<String>)>> {
    let rows = state.ops.read_candidates(&state.session, n)?;
    Ok(rows
        .into_iter()
        .map(|(address, value)| (address, value.map(|v| v.format())))
        .collect())
}

fn report(json: bool, value: serde_json::Value, text: impl FnOnce() -> String) {
    if json {
        println!("{}", value);
    } else {
        println!("{}", text());
    }
}
