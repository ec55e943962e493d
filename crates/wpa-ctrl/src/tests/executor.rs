//! Command executor behaviour over mocked transports.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use rstest::rstest;

use super::{StaticConnector, payload_is};
use crate::client::Client;
use crate::error::CtrlError;
use crate::transport::{ExchangeStage, MockTransport, Transport, TransportError};

fn command_transport(configure: impl FnOnce(&mut MockTransport)) -> Arc<dyn Transport> {
    let mut transport = MockTransport::new();
    configure(&mut transport);
    transport.expect_close().times(1).returning(|| Ok(()));
    Arc::new(transport)
}

fn client_over(transport: Arc<dyn Transport>) -> Client {
    Client::with_connector(StaticConnector::new(vec![transport])).expect("client")
}

#[test]
fn joins_arguments_into_one_line() {
    let transport = command_transport(|mock| {
        mock.expect_execute()
            .withf(|payload| payload_is(payload, "SET_NETWORK 0 ssid \"home\""))
            .times(1)
            .returning(|_| Ok(b"OK\n".to_vec()));
    });
    let client = client_over(transport);

    let reply = client
        .execute("SET_NETWORK", &["0", "ssid", "\"home\""])
        .expect("execute");
    assert_eq!(reply, b"OK\n");
}

#[rstest]
#[case(b"FAIL\n".as_slice())]
#[case(b"FAIL".as_slice())]
fn fail_reply_returns_no_bytes(#[case] reply: &'static [u8]) {
    let transport = command_transport(|mock| {
        mock.expect_execute()
            .times(1)
            .returning(move |_| Ok(reply.to_vec()));
    });
    let client = client_over(transport);

    let error = client.execute("ENABLE_NETWORK", &["0"]).expect_err("FAIL");
    assert!(matches!(error, CtrlError::CommandFailed { context: None }));
}

#[test]
fn unknown_command_is_reported() {
    let transport = command_transport(|mock| {
        mock.expect_execute()
            .times(1)
            .returning(|_| Ok(b"UNKNOWN COMMAND\n".to_vec()));
    });
    let client = client_over(transport);

    let error = client.execute("NOPE", &["arg0"]).expect_err("unknown");
    assert!(matches!(error, CtrlError::UnknownCommand));
    assert!(error.is_rejection());
}

#[rstest]
#[case(b"OK\n".as_slice())]
#[case(b"PONG PONG\n".as_slice())]
#[case(b"pong\n".as_slice())]
fn liveness_requires_exact_pong(#[case] reply: &'static [u8]) {
    let transport = command_transport(|mock| {
        mock.expect_execute()
            .withf(|payload| payload_is(payload, "PING"))
            .times(1)
            .returning(move |_| Ok(reply.to_vec()));
    });
    let client = client_over(transport);

    let error = client.ping().expect_err("not PONG");
    let CtrlError::CommandFailed { context: Some(context) } = error else {
        panic!("expected CommandFailed with context, got {error:?}");
    };
    assert!(context.starts_with("expected PONG got"));
}

#[test]
fn transport_failures_are_returned_unmodified() {
    let transport = command_transport(|mock| {
        mock.expect_execute().times(1).returning(|_| {
            Err(TransportError::exchange(
                ExchangeStage::Receive,
                TransportError::Receive {
                    source: io::Error::from(io::ErrorKind::ConnectionReset),
                },
            ))
        });
    });
    let client = client_over(transport);

    let error = client.execute("STATUS", &[]).expect_err("transport failure");
    assert!(matches!(
        error,
        CtrlError::Transport(TransportError::Exchange {
            stage: ExchangeStage::Receive,
            ..
        })
    ));
    assert!(error.to_string().starts_with("read failed"));
}

/// Records whether two exchanges ever ran at the same time.
#[derive(Default)]
struct OverlapProbe {
    in_flight: AtomicBool,
    overlaps: AtomicUsize,
    calls: AtomicUsize,
}

impl Transport for OverlapProbe {
    fn send(&self, _payload: &[u8]) -> Result<(), TransportError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn receive(&self) -> Result<Vec<u8>, TransportError> {
        thread::sleep(Duration::from_millis(2));
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.in_flight.store(false, Ordering::SeqCst);
        Ok(b"OK\n".to_vec())
    }

    fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

#[test]
fn commands_never_overlap() {
    let probe = Arc::new(OverlapProbe::default());
    let transport: Arc<dyn Transport> = Arc::<OverlapProbe>::clone(&probe);
    let client = Arc::new(client_over(transport));

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let shared = Arc::clone(&client);
            thread::spawn(move || {
                for _ in 0..4 {
                    shared.execute("RECONNECT", &[]).expect("execute");
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker");
    }

    assert_eq!(probe.calls.load(Ordering::SeqCst), 16);
    assert_eq!(probe.overlaps.load(Ordering::SeqCst), 0);
}

#[test]
fn closed_client_rejects_commands_without_touching_the_socket() {
    let transport = command_transport(|mock| {
        mock.expect_execute().never();
    });
    let client = client_over(transport);
    client.close().expect("close");

    let error = client.execute("PING", &[]).expect_err("closed");
    assert!(matches!(error, CtrlError::Transport(TransportError::Closed)));
}

struct RefusingTransport;

impl Transport for RefusingTransport {
    fn send(&self, _payload: &[u8]) -> Result<(), TransportError> {
        Err(TransportError::ShortWrite {
            written: 2,
            expected: 4,
        })
    }

    fn receive(&self) -> Result<Vec<u8>, TransportError> {
        panic!("receive must not follow a failed send");
    }

    fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

#[test]
fn failed_send_skips_the_read() {
    let error = RefusingTransport
        .execute(b"PING")
        .expect_err("send fails");
    assert_eq!(error.to_string(), "send failed: short write: 2 of 4 bytes accepted");
}
