use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use snapcast_rpc::envelope::command::{
    ClientSetVolumeRequest, GroupSetMuteRequest, GroupSetStreamRequest, ServerGetRpcVersionRequest,
    ServerGetStatusRequest,
};
use snapcast_rpc::envelope::model::Volume;
use snapcast_rpc::envelope::{Method, Notification};
use snapcast_rpc::{Client, ClientError, ClientOptions, Notifications, StreamError};

/// Buffer per notification channel; the dispatcher waits when one fills.
const EVENT_BUFFER: usize = 64;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("notification stream failed: {0}")]
    Stream(#[from] StreamError),
    #[error("unknown method `{0}`")]
    UnknownMethod(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("failed to wait for Ctrl-C: {0}")]
    Signal(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "snapctl", about = "Snapcast JSON-RPC command and notification CLI")]
struct Cli {
    #[arg(long, env = "SNAPCAST_HOST", default_value = snapcast_rpc::config::DEFAULT_HOST)]
    host: String,

    /// Use https/wss.
    #[arg(long, env = "SNAPCAST_SECURE")]
    secure: bool,

    /// Per-command deadline in seconds, rate-limit wait included.
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the full server state.
    Status,
    /// Print the server's protocol version.
    Version,
    /// Set a client's volume.
    Volume {
        client: String,
        #[arg(value_parser = clap::value_parser!(u16).range(0..=100))]
        percent: u16,
        #[arg(long, default_value_t = false)]
        muted: bool,
    },
    /// Mute or unmute a group.
    Mute {
        group: String,
        #[arg(value_parser = BoolishValueParser::new(), action = ArgAction::Set)]
        muted: bool,
    },
    /// Switch a group to another stream.
    Stream { group: String, stream: String },
    /// Send any method with raw JSON params and print the response envelope.
    Rpc {
        method: String,
        #[arg(long, default_value = "{}")]
        params: String,
    },
    /// Print every notification until the stream closes.
    Listen,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut options = ClientOptions::from_env();
    options.host = cli.host;
    options.secure = cli.secure;
    let client = Client::new(options)?;
    let deadline = Duration::from_secs(cli.timeout);

    match cli.command {
        Command::Status => {
            let response = with_deadline(deadline, client.call(&ServerGetStatusRequest {})).await?;
            print_json(&response)
        }
        Command::Version => {
            let v = with_deadline(deadline, client.call(&ServerGetRpcVersionRequest {})).await?;
            println!("{}.{}.{}", v.major, v.minor, v.patch);
            Ok(())
        }
        Command::Volume {
            client: id,
            percent,
            muted,
        } => {
            let request = ClientSetVolumeRequest {
                id,
                volume: Volume { muted, percent },
            };
            let response = with_deadline(deadline, client.call(&request)).await?;
            print_json(&response)
        }
        Command::Mute { group, muted } => {
            let request = GroupSetMuteRequest { id: group, muted };
            let response = with_deadline(deadline, client.call(&request)).await?;
            print_json(&response)
        }
        Command::Stream { group, stream } => {
            let request = GroupSetStreamRequest {
                id: group,
                stream_id: stream,
            };
            let response = with_deadline(deadline, client.call(&request)).await?;
            print_json(&response)
        }
        Command::Rpc { method, params } => run_rpc(&client, deadline, &method, &params).await,
        Command::Listen => run_listen(&client).await,
    }
}

async fn with_deadline<T>(
    deadline: Duration,
    call: impl Future<Output = Result<T, ClientError>>,
) -> Result<T, CliError> {
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(ClientError::Timeout.into()),
    }
}

async fn run_rpc(client: &Client, deadline: Duration, method: &str, params: &str) -> Result<(), CliError> {
    let method = Method::from_name(method).ok_or_else(|| CliError::UnknownMethod(method.to_owned()))?;
    let params: Value = serde_json::from_str(params)?;
    let response = client.send_with_timeout(method, &params, deadline).await?;
    print_json(&response)
}

async fn run_listen(client: &Client) -> Result<(), CliError> {
    let (errors_tx, mut errors_rx) = mpsc::channel::<StreamError>(EVENT_BUFFER);
    let mut notifications = Notifications {
        errors: Some(errors_tx),
        ..Notifications::default()
    };
    let mut printers = vec![tokio::spawn(async move {
        while let Some(error) = errors_rx.recv().await {
            eprintln!("stream error: {error}");
        }
    })];

    printers.push(register(&mut notifications.client_on_connect));
    printers.push(register(&mut notifications.client_on_disconnect));
    printers.push(register(&mut notifications.client_on_volume_changed));
    printers.push(register(&mut notifications.client_on_latency_changed));
    printers.push(register(&mut notifications.client_on_name_changed));
    printers.push(register(&mut notifications.group_on_mute));
    printers.push(register(&mut notifications.group_on_stream_changed));
    printers.push(register(&mut notifications.group_on_name_changed));
    printers.push(register(&mut notifications.stream_on_update));
    printers.push(register(&mut notifications.stream_on_properties));
    printers.push(register(&mut notifications.server_on_update));

    let signal = client.listen(notifications).await?;
    eprintln!("listening on {}", client.options().stream_url());

    let closed = signal.wait();
    tokio::pin!(closed);
    let outcome = tokio::select! {
        outcome = &mut closed => outcome,
        interrupted = tokio::signal::ctrl_c() => {
            interrupted?;
            client.close().await?;
            closed.await
        }
    };

    // Printers finish once the dispatcher drops its senders.
    for printer in printers {
        let _ = printer.await;
    }
    eprintln!("stream closed");
    Ok(outcome?)
}

/// Install a channel in `slot` and spawn a task printing what arrives on it.
fn register<T>(slot: &mut Option<mpsc::Sender<T>>) -> JoinHandle<()>
where
    T: Notification + Serialize + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<T>(EVENT_BUFFER);
    *slot = Some(tx);
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(rendered) => println!("{}\t{rendered}", T::METHOD),
                Err(e) => eprintln!("{}: failed to render event: {e}", T::METHOD),
            }
        }
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
