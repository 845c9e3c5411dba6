mod common;

use common::MockNative;
use jackline::{
    Client, ConnectionOp, Error, PortRegistrationError, PortTypeRegistry, StaticPortTypes,
    proto::{ClientConfiguration, PortFlags, PortTypeInformation, port},
    sys,
};
use std::sync::Arc;

fn open(mock: &Arc<MockNative>, registry: Arc<PortTypeRegistry>) -> Client {
    Client::open(
        Arc::clone(mock) as Arc<dyn sys::Native>,
        registry,
        &ClientConfiguration::default().with_client_name("test"),
    )
    .unwrap()
}

fn open_default(mock: &Arc<MockNative>) -> Client {
    open(mock, Arc::new(PortTypeRegistry::with_defaults()))
}

#[test]
fn registered_port_attributes() {
    let mock = MockNative::new();
    let client = open_default(&mock);

    let out = client
        .port_register_audio("out_1", PortFlags::IS_OUTPUT | PortFlags::IS_TERMINAL)
        .unwrap();

    assert_eq!(out.name().unwrap(), "test:out_1");
    assert_eq!(out.short_name().unwrap(), "out_1");
    assert_eq!(out.type_name().unwrap(), port::DEFAULT_AUDIO_TYPE);
    assert_eq!(out.type_info(), &PortTypeInformation::AUDIO);
    assert_eq!(out.flags().unwrap(), PortFlags::IS_OUTPUT | PortFlags::IS_TERMINAL);
    assert!(out.belongs_to(&client).unwrap());

    let flags = mock.state.lock().ports[0].flags;
    assert_eq!(flags, sys::port_flags::IS_OUTPUT | sys::port_flags::IS_TERMINAL);
}

#[test]
fn unrecognized_type_never_reaches_the_server() {
    let mock = MockNative::new();
    let client = open_default(&mock);

    let before = mock.call_count();
    let result = client.port_register("cv", "voltage", PortFlags::IS_INPUT, 0);

    assert!(matches!(
        result,
        Err(Error::PortRegistrationFailed(PortRegistrationError::UnrecognizedType(ref t))) if t == "voltage"
    ));
    assert_eq!(mock.call_count(), before);
}

#[test]
fn custom_types_can_be_registered() {
    let mock = MockNative::new();
    let registry = Arc::new(PortTypeRegistry::with_defaults());
    let client = open(&mock, Arc::clone(&registry));

    let cv = PortTypeInformation::new("voltage", core::num::NonZeroU32::new(8).unwrap(), false);
    let id = registry.register(Arc::new(StaticPortTypes::new([cv.clone()])));

    let port = client.port_register("cv", "voltage", PortFlags::IS_INPUT, 0).unwrap();
    assert_eq!(port.type_info(), &cv);

    registry.unregister(id);
    assert!(client.port_register("cv2", "voltage", PortFlags::IS_INPUT, 0).is_err());
}

#[test]
fn rejected_registration() {
    let mock = MockNative::new();
    let client = open_default(&mock);
    mock.state.lock().reject_ports = true;

    assert!(matches!(
        client.port_register_audio("out", PortFlags::IS_OUTPUT),
        Err(Error::PortRegistrationFailed(PortRegistrationError::Rejected { .. }))
    ));
}

#[test]
fn port_lookup() {
    let mock = MockNative::new();
    mock.add_foreign_port("system:capture_1", port::DEFAULT_AUDIO_TYPE, 0x2 | 0x4);
    mock.add_foreign_port("video:out", "raw video", 0x2);

    let client = open_default(&mock);

    let capture = client.port_by_name("system:capture_1").unwrap().unwrap();
    assert_eq!(capture.flags().unwrap(), PortFlags::IS_OUTPUT | PortFlags::IS_PHYSICAL);
    assert!(!capture.belongs_to(&client).unwrap());

    assert!(client.port_by_name("system:capture_9").unwrap().is_none());

    assert!(matches!(
        client.port_by_name("video:out"),
        Err(Error::PortSearchFailed(_))
    ));
}

#[test]
fn empty_listings() {
    let mock = MockNative::new();
    let client = open_default(&mock);

    // the mock answers null when nothing matches
    assert_eq!(client.ports(None, None, PortFlags::empty()).unwrap(), Vec::<String>::new());
    assert!(client.ports_all_inputs().unwrap().is_empty());
}

#[test]
fn explicitly_empty_listings() {
    let mock = MockNative::new();
    mock.add_foreign_port("system:capture_1", port::DEFAULT_AUDIO_TYPE, 0x2);
    mock.state.lock().empty_list_not_null = true;

    let client = open_default(&mock);

    assert_eq!(
        client.ports(Some("nomatch"), None, PortFlags::empty()).unwrap(),
        Vec::<String>::new()
    );
    assert!(client.ports_all_inputs().unwrap().is_empty());
    assert_eq!(client.ports_all_outputs().unwrap(), ["system:capture_1"]);
}

#[test]
fn listings_filter_by_pattern_and_flags() {
    let mock = MockNative::new();
    mock.add_foreign_port("system:capture_1", port::DEFAULT_AUDIO_TYPE, 0x2);
    mock.add_foreign_port("system:playback_1", port::DEFAULT_AUDIO_TYPE, 0x1);
    mock.add_foreign_port("midi:in", port::DEFAULT_MIDI_TYPE, 0x1);

    let client = open_default(&mock);

    assert_eq!(client.ports_all_outputs().unwrap(), ["system:capture_1"]);
    assert_eq!(
        client.ports_all_inputs().unwrap(),
        ["system:playback_1", "midi:in"]
    );
    assert_eq!(
        client
            .ports(None, Some("midi"), PortFlags::empty())
            .unwrap(),
        ["midi:in"]
    );
    assert_eq!(
        client
            .ports(Some("system"), None, PortFlags::empty())
            .unwrap()
            .len(),
        2
    );
}

#[test]
fn connecting_twice() {
    let mock = MockNative::new();
    let client = open_default(&mock);

    assert!(client.connect("a:out", "b:in").unwrap());
    assert!(!client.connect("a:out", "b:in").unwrap());

    client.disconnect("a:out", "b:in").unwrap();
    assert!(client.connect("a:out", "b:in").unwrap());
}

#[test]
fn connection_failures() {
    let mock = MockNative::new();
    let client = open_default(&mock);

    mock.state.lock().connect_code = Some(-1);
    assert!(matches!(
        client.connect("a:out", "b:in"),
        Err(Error::PortConnectionFailed {
            op: ConnectionOp::Connect,
            code: -1,
            ..
        })
    ));

    // nothing to disconnect
    assert!(matches!(
        client.disconnect("a:out", "b:in"),
        Err(Error::PortConnectionFailed {
            op: ConnectionOp::Disconnect,
            ..
        })
    ));
}
