use clap::{Args, Parser as ClapParser, Subcommand};
use snow_client::Client;
use snow_client::cli::{self, BuildOptions, CliError, DecodeOptions, GetCommand};
use snow_client::decoder::DEFAULT_CHUNK_SIZE;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "snow")]
#[command(about = "snow - query ServiceNow tables from the command line")]
#[command(version)]
struct Cli {
    /// Log requests and pagination to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Connection {
    /// Instance name, e.g. `dev12345` for dev12345.service-now.com
    #[arg(long, env = "SNOW_INSTANCE")]
    instance: Option<String>,

    /// Full host name, for instances outside service-now.com
    #[arg(long, env = "SNOW_HOST", conflicts_with = "instance")]
    host: Option<String>,

    #[arg(short, long, env = "SNOW_USER")]
    user: Option<String>,

    #[arg(long, env = "SNOW_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// OAuth access token, used instead of user and password
    #[arg(long, env = "SNOW_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Talk plain HTTP
    #[arg(long)]
    no_ssl: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an encoded query from key=value terms
    Build {
        /// Terms such as `active=true`, joined with `^`
        pairs: Vec<String>,

        /// Sort key, `-field` for descending (repeatable)
        #[arg(short, long = "order-by", allow_hyphen_values = true)]
        order_by: Vec<String>,
    },

    /// Fetch records from a table
    Get {
        /// Table name, e.g. `incident`
        table: String,

        /// Encoded query
        #[arg(short, long)]
        query: Option<String>,

        #[arg(short, long)]
        limit: Option<u64>,

        #[arg(long)]
        offset: Option<u64>,

        /// Fields to return, comma-separated or repeated
        #[arg(short, long, value_delimiter = ',')]
        fields: Vec<String>,

        /// Sort key, `-field` for descending (repeatable)
        #[arg(long = "order-by", allow_hyphen_values = true)]
        order_by: Vec<String>,

        /// Decode records as they arrive
        #[arg(long)]
        stream: bool,

        /// Fail unless exactly one record matches
        #[arg(long, conflicts_with = "first")]
        one: bool,

        /// Print only the first record
        #[arg(long)]
        first: bool,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        #[command(flatten)]
        connection: Connection,
    },

    /// Extract the records of a saved response body
    Decode {
        /// File holding a response body (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Use the streaming decoder
        #[arg(long)]
        stream: bool,

        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Build { pairs, order_by } => {
            cli::execute_build(&BuildOptions { pairs, order_by }).map(|query| println!("{}", query))
        }
        Commands::Get {
            table,
            query,
            limit,
            offset,
            fields,
            order_by,
            stream,
            one,
            first,
            pretty,
            connection,
        } => {
            let command = GetCommand {
                table,
                query,
                limit,
                offset,
                fields,
                order_by,
                stream,
                one,
                first,
            };
            run_get(connection, &command, pretty)
        }
        Commands::Decode {
            input,
            stream,
            chunk_size,
            pretty,
        } => run_decode(input, stream, chunk_size, pretty),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "snow_client=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn connect(connection: Connection) -> Result<Client, CliError> {
    let mut builder = Client::builder().use_ssl(!connection.no_ssl);
    if let Some(instance) = connection.instance {
        builder = builder.instance(instance);
    }
    if let Some(host) = connection.host {
        builder = builder.host(host);
    }
    builder = match (connection.token, connection.user, connection.password) {
        (Some(token), _, _) => builder.oauth().token(token),
        (None, Some(user), Some(password)) => builder.basic_auth(user, password),
        _ => builder,
    };
    Ok(builder.build()?)
}

fn run_get(connection: Connection, command: &GetCommand, pretty: bool) -> Result<(), CliError> {
    let client = connect(connection)?;
    let output = cli::execute_get(&client, command)?;
    print_json(&output, pretty)
}

fn run_decode(
    input: Option<PathBuf>,
    stream: bool,
    chunk_size: usize,
    pretty: bool,
) -> Result<(), CliError> {
    let input = match input {
        Some(path) => Some(fs::read_to_string(path)?),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map_err(CliError::Io)?;
            Some(buffer)
        }
        None => None,
    };

    let options = DecodeOptions {
        input,
        stream,
        chunk_size,
    };
    let output = cli::execute_decode(&options)?;
    print_json(&output, pretty)
}

fn print_json(value: &serde_json::Value, pretty: bool) -> Result<(), CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }?;
    println!("{}", json);
    Ok(())
}
