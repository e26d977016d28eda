use std::time::Duration;

use knitlink_ayab::AyabMessage;
use knitlink_control::{Envelope, MessageId, NetworkParams};
use knitlink_session::{Inbound, Session, SessionConfig};
use knitlink_transport::{connect_ws, ChannelTransport, ClientStream, TransportEvent, WsReceiver};
use tokio::time::Instant;
use tracing::debug;

use crate::cmd::{parse_duration, runtime, Request, SendArgs};
use crate::exit::{
    control_error, session_error, transport_error, CliError, CliResult, FAILURE, SUCCESS, TIMEOUT,
    TRANSPORT_ERROR, USAGE,
};
use crate::output::{print_row, EventRow, OutputFormat};

/// What `send` puts on the wire and which reply it waits for.
#[derive(Debug)]
enum Outbound {
    Control {
        envelope: Envelope,
        reply: Option<u32>,
    },
    MachineInfo,
}

impl Outbound {
    fn expects_reply(&self) -> bool {
        match self {
            Self::Control { reply, .. } => reply.is_some(),
            Self::MachineInfo => true,
        }
    }

    fn is_reply(&self, item: &Inbound) -> bool {
        match (self, item) {
            (Self::Control { reply: Some(id), .. }, Inbound::Control(envelope)) => {
                envelope.id == *id
            }
            (Self::MachineInfo, Inbound::Machine(AyabMessage::InfoReply(_))) => true,
            _ => false,
        }
    }
}

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let outbound = build_request(&args)?;
    let url = args.endpoint.url();
    // only the reply to our own request matters
    let config = SessionConfig {
        request_system_info_on_open: false,
        log_traffic: args.endpoint.log_traffic,
        ..SessionConfig::default()
    };
    runtime()?.block_on(send(
        &url,
        outbound,
        !args.no_wait,
        wait_timeout,
        config,
        format,
    ))
}

fn build_request(args: &SendArgs) -> CliResult<Outbound> {
    let message = match args.request {
        Request::SystemInfo => MessageId::SystemInfo,
        Request::Esp32Reset => MessageId::Esp32Reset,
        Request::Ra4m1Reset => MessageId::Ra4m1Reset,
        Request::GetNetworkParams => MessageId::GetNetworkParams,
        Request::ListFiles => MessageId::ListFiles,
        Request::MachineInfo => return Ok(Outbound::MachineInfo),
        Request::SetNetworkParams => {
            let params = NetworkParams {
                ssid: args.ssid.clone(),
                password: args.password.clone(),
                hostname: args.hostname.clone(),
            };
            if params == NetworkParams::default() {
                return Err(CliError::new(
                    USAGE,
                    "set-network-params needs at least one of --ssid, --password, --hostname",
                ));
            }
            let envelope = Envelope::set_network_params(&params)
                .map_err(|err| control_error("build request failed", err))?;
            return Ok(control(envelope, MessageId::SetNetworkParams));
        }
        Request::DeleteFiles => {
            if args.files.is_empty() {
                return Err(CliError::new(USAGE, "delete-files needs at least one --file"));
            }
            let envelope = Envelope::delete_files(args.files.iter().cloned());
            return Ok(control(envelope, MessageId::DeleteFiles));
        }
    };
    Ok(control(Envelope::request(message), message))
}

fn control(envelope: Envelope, message: MessageId) -> Outbound {
    Outbound::Control {
        envelope,
        reply: message.reply_id(),
    }
}

async fn send(
    url: &str,
    outbound: Outbound,
    wait: bool,
    timeout: Duration,
    config: SessionConfig,
    format: OutputFormat,
) -> CliResult<i32> {
    let (transport, mut receiver) = connect_ws(url)
        .await
        .map_err(|err| transport_error("connect failed", err))?;
    let mut session = Session::new(transport, config);
    let deadline = Instant::now() + timeout;

    loop {
        let event = match tokio::time::timeout_at(deadline, receiver.next_event()).await {
            Ok(Some(event)) => event,
            Ok(None) => {
                return Err(CliError::new(
                    TRANSPORT_ERROR,
                    "connection ended before a reply arrived",
                ))
            }
            Err(_) => {
                return Err(CliError::new(
                    TIMEOUT,
                    format!("no reply within {}ms", timeout.as_millis()),
                ))
            }
        };

        let opened = matches!(event, TransportEvent::Open);
        let (items, close) = session
            .handle_event(event)
            .map_err(|err| session_error("receive failed", err))?;

        if opened {
            send_outbound(&mut session, &outbound)?;
            if !wait || !outbound.expects_reply() {
                finish(session, &mut receiver).await;
                return Ok(SUCCESS);
            }
        }

        if let Some(reply) = items.iter().find(|item| outbound.is_reply(item)) {
            print_row(&EventRow::inbound(reply), format);
            if let Inbound::Control(envelope) = reply {
                if !envelope.is_success() {
                    return Err(CliError::new(
                        FAILURE,
                        format!(
                            "controller reported result {}",
                            envelope.result.unwrap_or_default()
                        ),
                    ));
                }
            }
            return Ok(SUCCESS);
        }

        if close.is_some() {
            return Err(CliError::new(
                TRANSPORT_ERROR,
                "connection closed before a reply arrived",
            ));
        }
    }
}

fn send_outbound(session: &mut Session<ChannelTransport>, outbound: &Outbound) -> CliResult<()> {
    let result = match outbound {
        Outbound::Control { envelope, .. } => session.send_control(envelope),
        Outbound::MachineInfo => session.request_info(),
    };
    result.map_err(|err| session_error("send failed", err))?;
    debug!(?outbound, "request sent");
    Ok(())
}

/// Drop the sending half and wait until queued units reach the socket.
async fn finish(session: Session<ChannelTransport>, receiver: &mut WsReceiver<ClientStream>) {
    drop(session.into_transport());
    receiver.join_writer().await;
}
