use std::time::Duration;

use knitlink_session::{Diagnostic, Session, SessionConfig};
use knitlink_transport::{connect_ws, TransportEvent};
use tokio::time::Instant;
use tracing::info;

use crate::cmd::{parse_duration, runtime, MonitorArgs};
use crate::exit::{session_error, transport_error, CliResult, SUCCESS};
use crate::output::{print_row, EventRow, OutputFormat};

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = args.timeout.as_deref().map(parse_duration).transpose()?;
    runtime()?.block_on(monitor(args, timeout, format))
}

async fn monitor(
    args: MonitorArgs,
    timeout: Option<Duration>,
    format: OutputFormat,
) -> CliResult<i32> {
    let url = args.endpoint.url();
    let (transport, mut receiver) = connect_ws(&url)
        .await
        .map_err(|err| transport_error("connect failed", err))?;

    let config = SessionConfig {
        request_system_info_on_open: !args.no_system_info,
        log_traffic: args.endpoint.log_traffic,
        ..SessionConfig::default()
    };
    let mut session = Session::new(transport, config);
    session.on_diagnostic(move |diag: &Diagnostic| print_row(&EventRow::diagnostic(diag), format));

    let deadline = timeout.map(|timeout| Instant::now() + timeout);
    let mut printed = 0usize;

    loop {
        let event = tokio::select! {
            event = receiver.next_event() => event,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                return Ok(SUCCESS);
            }
            _ = wait_until(deadline) => {
                info!("monitor time limit reached");
                return Ok(SUCCESS);
            }
        };
        let Some(event) = event else {
            return Ok(SUCCESS);
        };

        let opened = matches!(event, TransportEvent::Open);
        let (items, close) = session
            .handle_event(event)
            .map_err(|err| session_error("receive failed", err))?;

        if opened {
            print_row(&EventRow::opened(&url), format);
            if args.machine_info {
                session
                    .request_info()
                    .map_err(|err| session_error("request-info failed", err))?;
            }
        }

        for item in &items {
            print_row(&EventRow::inbound(item), format);
            printed = printed.saturating_add(1);
            if args.count.is_some_and(|count| printed >= count) {
                return Ok(SUCCESS);
            }
        }

        if let Some(close) = close {
            print_row(&EventRow::closed(&close), format);
            return Ok(SUCCESS);
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
