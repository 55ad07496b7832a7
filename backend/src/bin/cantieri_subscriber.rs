//! Follow construction-site announcements for a set of postal codes.
//!
//! ```text
//! cantieri-subscriber [CAP[,CAP...]]
//! ```
//!
//! Recreates the well-known subscription with a postal-code filter, then
//! prints every delivered site until interrupted. Site lines go to stdout and
//! JSON logs to stderr.

use std::ffi::OsString;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use ortho_config::OrthoConfig;
use tokio_util::sync::CancellationToken;
use tracing::{Subscriber, info, warn};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use umarell::domain::ports::{HandlerError, NotificationHandler};
use umarell::domain::{DeliveredSite, SubscriptionManager, parse_postal_code_list};
use umarell::outbound::pubsub::PubSubHttpClient;
use umarell::settings::SubscriberSettings;

#[derive(Debug, Parser)]
#[command(
    name = "cantieri-subscriber",
    about = "Print new construction sites for the given postal codes"
)]
struct Cli {
    /// Comma-separated postal codes to follow; every site when omitted.
    postal_codes: Option<String>,
}

/// Writes one line per delivered site.
struct ConsoleHandler<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> ConsoleHandler<W> {
    fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }
}

#[async_trait]
impl<W: Write + Send> NotificationHandler for ConsoleHandler<W> {
    async fn handle(&self, delivery: &DeliveredSite) -> Result<(), HandlerError> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| HandlerError::failed("output lock poisoned"))?;
        writeln!(
            out,
            "New construction site: {}, {}.",
            delivery.body, delivery.cap
        )
        .and_then(|()| out.flush())
        .map_err(|err| HandlerError::failed(err.to_string()))
    }
}

fn log_subscriber<W>(filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    fmt()
        .with_env_filter(filter)
        .json()
        .with_writer(writer)
        .finish()
}

fn spawn_shutdown(cancel: CancellationToken, listen_timeout: Option<Duration>) {
    tokio::spawn(async move {
        let deadline = async {
            match listen_timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => info!("interrupt received, stopping"),
                Err(err) => warn!(error = %err, "cannot listen for interrupts, stopping"),
            },
            () = deadline => info!("listen timeout elapsed, stopping"),
        }
        cancel.cancel();
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = log_subscriber(EnvFilter::from_default_env(), std::io::stderr).try_init() {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();
    let filter = parse_postal_code_list(cli.postal_codes.as_deref().unwrap_or_default())?;
    let settings = SubscriberSettings::load_from_iter([OsString::from("cantieri-subscriber")])
        .map_err(|err| eyre!("invalid settings: {err}"))?;
    let broker = Arc::new(PubSubHttpClient::new(settings.pubsub()?)?);
    let handler = Arc::new(ConsoleHandler::new(std::io::stdout()));
    let manager = SubscriptionManager::new(broker, handler, settings.subscription_settings());

    let cancel = CancellationToken::new();
    spawn_shutdown(cancel.clone(), settings.listen_timeout());
    let acknowledged = manager.run(&filter, cancel).await?;
    info!(acknowledged, "subscriber stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn console_handler_prints_site_line() {
        let handler = ConsoleHandler::new(Vec::new());
        let delivery = DeliveredSite {
            message_id: "1".to_owned(),
            body: "Via Roma".to_owned(),
            cap: "20100".to_owned(),
            publish_time: None,
        };

        handler.handle(&delivery).await.expect("handled");

        let out = handler.out.into_inner().expect("lock");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "New construction site: Via Roma, 20100.\n"
        );
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("log buffer").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn logs_do_not_mix_with_site_lines() {
        let logs = Captured::default();
        let sink = logs.clone();
        let subscriber = log_subscriber(EnvFilter::new("info"), move || sink.clone());
        let handler = ConsoleHandler::new(Vec::new());
        let delivery = DeliveredSite {
            message_id: "7".to_owned(),
            body: "Corso Como".to_owned(),
            cap: "20154".to_owned(),
            publish_time: None,
        };

        let _guard = tracing::subscriber::set_default(subscriber);
        info!(cap = %delivery.cap, "delivering");
        handler.handle(&delivery).await.expect("handled");

        let out = String::from_utf8(handler.out.into_inner().expect("lock")).expect("utf8");
        assert_eq!(out, "New construction site: Corso Como, 20154.\n");
        let logged = String::from_utf8(logs.0.lock().expect("log buffer").clone()).expect("utf8");
        assert!(logged.contains("\"delivering\""));
        assert!(!logged.contains("New construction site"));
    }

    #[test]
    fn positional_list_is_optional() {
        let none = Cli::try_parse_from(["cantieri-subscriber"]).expect("no args");
        assert!(none.postal_codes.is_none());
        let some = Cli::try_parse_from(["cantieri-subscriber", "20100,20200"]).expect("list");
        assert_eq!(some.postal_codes.as_deref(), Some("20100,20200"));
    }
}
