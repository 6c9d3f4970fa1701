use chrono::{Local, Utc};
use clap::Parser;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::field::{Field, Visit};
use tracing::instrument::WithSubscriber;
use tracing::{error, info, Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::database::command_log::{create_command_log, finish_command_log};
use crate::database::DatabaseManager;
use crate::error::{ImportError, Result};
use crate::models::{CommandLogStatus, Config};
use crate::tools::import_command::{find_command, ImportFlags, ImportSummary};

const LOG_COMMAND: &str = "log";

#[derive(Debug, Default)]
struct Captured {
    log: String,
    errors: usize,
}

/// Shared buffer of formatted log lines for one wrapped run
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    inner: Arc<Mutex<Captured>>,
}

impl LogCapture {
    fn lock(&self) -> MutexGuard<'_, Captured> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn text(&self) -> String {
        self.lock().log.clone()
    }

    pub fn errors(&self) -> usize {
        self.lock().errors
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

/// Tracing layer that appends INFO and more severe events to a [`LogCapture`]
/// as `LEVEL <time> [target] message`, counting ERROR events
pub struct CommandLogLayer {
    capture: LogCapture,
}

impl CommandLogLayer {
    pub fn new(capture: LogCapture) -> Self {
        Self { capture }
    }
}

impl<S: Subscriber> Layer<S> for CommandLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() > Level::INFO {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let mut captured = self.capture.lock();
        let _ = writeln!(
            captured.log,
            "{} {} [{}] {}{}",
            metadata.level(),
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            metadata.target(),
            visitor.message,
            visitor.fields
        );
        if *metadata.level() == Level::ERROR {
            captured.errors += 1;
        }
    }
}

/// Join the arguments and split off the command name from its options
pub fn split_command(args: &[String]) -> Option<(String, Option<String>)> {
    let joined = args.join(" ");
    let joined = joined.trim();
    if joined.is_empty() {
        return None;
    }
    match joined.split_once(' ') {
        Some((command, options)) => {
            let options = options.trim();
            Some((
                command.to_string(),
                (!options.is_empty()).then(|| options.to_string()),
            ))
        }
        None => Some((joined.to_string(), None)),
    }
}

/// Split a wrapped command's option string the way a POSIX shell would
fn option_args(command: &str, options: Option<&str>) -> Result<Vec<String>> {
    let Some(options) = options else {
        return Ok(Vec::new());
    };
    shlex::split(options).ok_or_else(|| ImportError::InvalidOptions {
        command: command.to_string(),
        message: format!("unbalanced quotes in {}", options),
    })
}

#[derive(Parser)]
#[command(no_binary_name = true)]
struct WrappedOptions {
    #[command(flatten)]
    flags: ImportFlags,
}

/// Outcome of a wrapped run
#[derive(Debug, Clone)]
pub struct LoggedRun {
    pub id: i64,
    pub status: CommandLogStatus,
    pub summary: ImportSummary,
}

/// Run an import command while recording its log output in `command_log`.
///
/// The row is created as `running` and finished as `failed` when any ERROR
/// was logged, `completed` otherwise. An error from the wrapped command is
/// logged into the record and then returned.
pub async fn run_logged(db: &DatabaseManager, config: &Config, args: &[String]) -> Result<LoggedRun> {
    let (command_name, cmd_options) = split_command(args).ok_or_else(|| ImportError::InvalidOptions {
        command: LOG_COMMAND.to_string(),
        message: "no command given".to_string(),
    })?;
    if command_name.replace('_', "-") == LOG_COMMAND {
        return Err(ImportError::InvalidOptions {
            command: LOG_COMMAND.to_string(),
            message: "cannot wrap the log command".to_string(),
        });
    }

    let command = find_command(config, &command_name)?;
    let wrapped_args = option_args(&command_name, cmd_options.as_deref())?;
    let wrapped = WrappedOptions::try_parse_from(wrapped_args).map_err(|e| ImportError::InvalidOptions {
        command: command_name.clone(),
        message: e.to_string(),
    })?;
    let options = wrapped.flags.resolve(config.debug);

    info!("Running command: {}", command_name);
    info!("With options: {}", cmd_options.as_deref().unwrap_or("None"));

    let id = create_command_log(db.pool(), &command_name, cmd_options.as_deref(), Utc::now()).await?;

    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::layer().with_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("charity_data=info")),
            ),
        )
        .with(CommandLogLayer::new(capture.clone()));

    let result = async {
        let result = command.handle(db, options).await;
        if let Err(e) = &result {
            error!("{} failed: {}", command_name, e);
        }
        result
    }
    .with_subscriber(subscriber)
    .await;

    let status = if capture.errors() > 0 {
        CommandLogStatus::Failed
    } else {
        CommandLogStatus::Completed
    };
    let log = capture.text();
    finish_command_log(
        db.pool(),
        id,
        status,
        (!log.is_empty()).then_some(log.as_str()),
        Utc::now(),
    )
    .await?;
    info!("Command log {} {}", id, status.as_str());

    let summary = result?;
    Ok(LoggedRun { id, status, summary })
}
