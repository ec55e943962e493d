//! Behaviour-driven tests for event subscriptions.

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use super::{Sandbox, WAIT, eventually, new_sandbox};
use crate::client::Client;
use crate::commands::{
    ATTACH, EVENT_AVOID_FREQ, EVENT_BEACON_LOSS, EVENT_BSS_ADDED, EVENT_CHANNEL_SWITCH,
    EVENT_CONNECTED, EVENT_PASSWORD_CHANGED,
};
use crate::error::CtrlError;
use crate::registry::EventStream;
use crate::test_support::EVENTS_TRIGGER;

// ---------------------------------------------------------------------------
// Test world
// ---------------------------------------------------------------------------

struct SubscriptionWorld {
    client: Client,
    connection: Option<EventStream>,
    everything: Option<EventStream>,
    password: Option<EventStream>,
    failure: Option<CtrlError>,
    // Declared last so the client closes before the daemon goes away.
    sandbox: Sandbox,
}

#[fixture]
fn world() -> SubscriptionWorld {
    let sandbox = new_sandbox();
    let client = sandbox.client();
    SubscriptionWorld {
        client,
        connection: None,
        everything: None,
        password: None,
        failure: None,
        sandbox,
    }
}

fn stream<'a>(slot: &'a Option<EventStream>, name: &str) -> &'a EventStream {
    slot.as_ref()
        .unwrap_or_else(|| panic!("no {name} subscriber registered"))
}

fn drain(stream: &EventStream) -> Vec<String> {
    std::iter::from_fn(|| stream.try_recv().ok())
        .map(|event| event.message)
        .collect()
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

#[given("a client connected to a fake supplicant")]
fn given_client(world: &mut SubscriptionWorld) {
    world.client.ping().expect("fake supplicant answers PING");
}

#[given("the supplicant rejects ATTACH")]
fn given_attach_rejected(world: &mut SubscriptionWorld) {
    world.sandbox.daemon.set_reply(ATTACH, "FAIL");
}

#[given("a subscriber to connection events")]
fn given_connection_subscriber(world: &mut SubscriptionWorld) {
    world.connection = Some(world.client.notify([EVENT_CONNECTED]).expect("notify"));
}

#[given("a subscriber to all events")]
fn given_catch_all_subscriber(world: &mut SubscriptionWorld) {
    world.everything = Some(world.client.notify(Vec::<String>::new()).expect("notify"));
}

#[given("a subscriber to password changes")]
fn given_password_subscriber(world: &mut SubscriptionWorld) {
    world.password = Some(
        world
            .client
            .notify([EVENT_PASSWORD_CHANGED])
            .expect("notify"),
    );
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

#[when("the supplicant emits its event burst")]
fn when_burst(world: &mut SubscriptionWorld) {
    world
        .client
        .execute(EVENTS_TRIGGER, &[])
        .expect("trigger event burst");
    // The password change closes the burst; once it arrives every earlier
    // event has been dispatched.
    let last = stream(&world.password, "password")
        .recv_timeout(WAIT)
        .expect("last event of the burst");
    assert_eq!(last.message, EVENT_PASSWORD_CHANGED);
}

#[when("a subscriber registers for connection events")]
fn when_subscribe_rejected(world: &mut SubscriptionWorld) {
    match world.client.notify([EVENT_CONNECTED]) {
        Ok(stream) => world.connection = Some(stream),
        Err(error) => world.failure = Some(error),
    }
}

#[when("the client detaches")]
fn when_detach(world: &mut SubscriptionWorld) {
    world.client.detach().expect("detach");
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then("the connection subscriber receives only the connected event")]
fn then_connection_only(world: &mut SubscriptionWorld) {
    assert_eq!(drain(stream(&world.connection, "connection")), vec![EVENT_CONNECTED]);
}

#[then("the catch-all subscriber keeps the first five events")]
fn then_catch_all_saturates(world: &mut SubscriptionWorld) {
    assert_eq!(
        drain(stream(&world.everything, "catch-all")),
        vec![
            EVENT_AVOID_FREQ,
            EVENT_BEACON_LOSS,
            EVENT_BSS_ADDED,
            EVENT_BSS_ADDED,
            EVENT_CHANNEL_SWITCH,
        ]
    );
}

#[then("the supplicant saw a single ATTACH")]
fn then_single_attach(world: &mut SubscriptionWorld) {
    assert_eq!(world.sandbox.daemon.request_count(ATTACH), 1);
}

#[then("every subscription has ended")]
fn then_streams_closed(world: &mut SubscriptionWorld) {
    for (slot, name) in [
        (&world.connection, "connection"),
        (&world.everything, "catch-all"),
        (&world.password, "password"),
    ] {
        let ended = stream(slot, name);
        drain(ended);
        assert!(ended.recv().is_none(), "{name} stream still open");
    }
    assert!(world.client.registry().is_empty());
    assert!(!world.client.is_attached());
}

#[then("the supplicant has no attached clients")]
fn then_no_attached_clients(world: &mut SubscriptionWorld) {
    assert!(eventually(|| world.sandbox.daemon.attached_clients() == 0));
}

#[then("the subscription fails with a command failure")]
fn then_command_failure(world: &mut SubscriptionWorld) {
    assert!(world.connection.is_none());
    assert!(matches!(
        world.failure,
        Some(CtrlError::CommandFailed { context: None })
    ));
}

#[then("no subscriber remains registered")]
fn then_registry_empty(world: &mut SubscriptionWorld) {
    assert!(world.client.registry().is_empty());
}

#[then("the event channel is detached")]
fn then_detached(world: &mut SubscriptionWorld) {
    assert!(!world.client.is_attached());
    assert_eq!(world.sandbox.daemon.attached_clients(), 0);
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(path = "tests/features/event_subscription.feature")]
fn event_subscription_behaviour(world: SubscriptionWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/attach_failure.feature")]
fn attach_failure_behaviour(world: SubscriptionWorld) {
    let _ = world;
}
