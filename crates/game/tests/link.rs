use std::net::{SocketAddr, TcpListener};
use std::thread;
use std::time::{Duration, Instant};

use duet::{
    Encoding, KeyId, KeyStateTable, LinkError, PlayerPosition, ReceiveMode, Role, Session,
    SessionConfig, SetupError, Transport,
};

fn config(role: Role, encoding: Encoding, receive_timeout: Duration) -> SessionConfig {
    let mut config = SessionConfig::new(role);
    config.encoding = encoding;
    config.link.receive_timeout = receive_timeout;
    config.frame_interval = Duration::ZERO;
    config
}

fn transport_pair(encoding: Encoding) -> (Transport, Transport) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let connector = thread::spawn(move || Transport::connect(addr, encoding).unwrap());
    let authority = Transport::accept(listener, encoding).unwrap();
    let initiator = connector.join().unwrap();

    (authority, initiator)
}

fn session_pair(authority: SessionConfig, initiator: SessionConfig) -> (Session, Session) {
    assert_eq!(authority.encoding, initiator.encoding);
    let (a, i) = transport_pair(authority.encoding);
    (
        Session::new(&authority, a).unwrap(),
        Session::new(&initiator, i).unwrap(),
    )
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[test]
fn test_key_state_record_round_trip() {
    let timeout = Duration::from_secs(1);
    let (mut authority, mut initiator) = session_pair(
        config(Role::Authority, Encoding::KeyState, timeout),
        config(Role::Initiator, Encoding::KeyState, timeout),
    );

    assert!(authority.on_key_down(KeyId::UP).unwrap());
    assert!(authority.on_key_down(KeyId(0xff)).unwrap());
    assert!(!authority.on_key_down(KeyId::UP).unwrap());
    assert_eq!(authority.stats().records_sent, 2);

    let deadline = Instant::now() + Duration::from_secs(2);
    while initiator.remote_keys() != authority.local_keys() && Instant::now() < deadline {
        initiator.tick().unwrap();
    }

    assert_eq!(initiator.remote_keys(), authority.local_keys());
    assert_eq!(initiator.local_keys(), &KeyStateTable::new());
}

#[test]
fn test_repeated_edges_send_nothing() {
    let timeout = Duration::from_millis(5);
    let (mut authority, _initiator) = session_pair(
        config(Role::Authority, Encoding::KeyState, timeout),
        config(Role::Initiator, Encoding::KeyState, timeout),
    );

    assert!(!authority.on_key_up(KeyId::LEFT).unwrap());
    assert!(authority.on_key_down(KeyId::LEFT).unwrap());
    assert!(!authority.on_key_down(KeyId::LEFT).unwrap());
    assert!(authority.on_key_up(KeyId::LEFT).unwrap());
    assert!(!authority.on_key_up(KeyId::LEFT).unwrap());

    assert_eq!(authority.stats().records_sent, 2);
}

#[test]
fn test_both_peers_compute_same_positions() {
    let timeout = Duration::from_millis(25);
    let (mut authority, mut initiator) = session_pair(
        config(Role::Authority, Encoding::KeyState, timeout),
        config(Role::Initiator, Encoding::KeyState, timeout),
    );

    authority.on_key_down(KeyId::UP).unwrap();
    authority.on_key_down(KeyId::LEFT).unwrap();
    initiator.on_key_down(KeyId::DOWN).unwrap();

    // Let each side see the other's table before counting ticks.
    let deadline = Instant::now() + Duration::from_secs(2);
    while (authority.remote_keys() != initiator.local_keys()
        || initiator.remote_keys() != authority.local_keys())
        && Instant::now() < deadline
    {
        if let Some(record) = authority.poll_remote().unwrap() {
            authority.apply_remote(&record);
        }
        if let Some(record) = initiator.poll_remote().unwrap() {
            initiator.apply_remote(&record);
        }
    }

    for _ in 0..10 {
        authority.tick().unwrap();
        initiator.tick().unwrap();
    }

    assert_eq!(authority.model(), initiator.model());
    assert!((authority.own_position().y() - -0.05).abs() < 1e-5);
    assert!((initiator.own_position().y() - -0.05).abs() < 1e-5);
}

#[test]
fn test_timeouts_keep_remote_position() {
    let timeout = Duration::from_millis(5);
    let (mut authority, mut initiator) = session_pair(
        config(Role::Authority, Encoding::Position, timeout),
        config(Role::Initiator, Encoding::Position, timeout),
    );

    authority.on_key_down(KeyId::RIGHT).unwrap();
    authority.tick().unwrap();

    let deadline = Instant::now() + Duration::from_secs(2);
    while initiator.peer_position() != authority.own_position() && Instant::now() < deadline {
        initiator.tick().unwrap();
    }
    let seen = initiator.peer_position();
    assert_eq!(seen, authority.own_position());

    let timeouts_before = initiator.stats().timeouts;
    for _ in 0..8 {
        initiator.tick().unwrap();
        assert_eq!(initiator.peer_position(), seen);
    }
    assert!(initiator.stats().timeouts >= timeouts_before + 8);
}

#[test]
fn test_position_encoding_overwrites_peer_position() {
    let timeout = Duration::from_millis(50);
    let (mut authority, mut initiator) = session_pair(
        config(Role::Authority, Encoding::Position, timeout),
        config(Role::Initiator, Encoding::Position, timeout),
    );

    initiator.on_key_down(KeyId::UP).unwrap();
    assert_eq!(initiator.stats().records_sent, 0);

    for _ in 0..3 {
        initiator.tick().unwrap();
    }
    assert!((initiator.own_position().y() - 0.015).abs() < 1e-5);

    let deadline = Instant::now() + Duration::from_secs(2);
    while authority.peer_position() != initiator.own_position() && Instant::now() < deadline {
        authority.tick().unwrap();
    }

    assert_eq!(authority.peer_position(), initiator.own_position());
    assert_eq!(authority.remote_keys(), &KeyStateTable::new());
}

#[test]
fn test_background_receive_delivers_latest_position() {
    let timeout = Duration::from_millis(20);
    let mut initiator_config = config(Role::Initiator, Encoding::Position, timeout);
    initiator_config.receive_mode = ReceiveMode::Background;

    let (mut authority, mut initiator) = session_pair(
        config(Role::Authority, Encoding::Position, timeout),
        initiator_config,
    );

    authority.on_key_down(KeyId::DOWN).unwrap();
    for _ in 0..4 {
        authority.tick().unwrap();
    }

    let deadline = Instant::now() + Duration::from_secs(2);
    while initiator.peer_position() != authority.own_position() && Instant::now() < deadline {
        initiator.tick().unwrap();
        thread::sleep(Duration::from_millis(1));
    }

    assert_eq!(initiator.peer_position(), authority.own_position());
    assert!(initiator.stats().records_received >= 1);
}

#[test]
fn test_peer_close_surfaces_link_error() {
    let timeout = Duration::from_secs(1);
    let (authority, mut initiator) = session_pair(
        config(Role::Authority, Encoding::KeyState, timeout),
        config(Role::Initiator, Encoding::KeyState, timeout),
    );

    let before = initiator.model().clone();
    drop(authority);

    let result = initiator.tick();

    assert!(matches!(result, Err(LinkError::Closed)));
    assert_eq!(initiator.model(), &before);
}

#[test]
fn test_background_peer_close_surfaces_link_error() {
    let timeout = Duration::from_millis(20);
    let mut authority_config = config(Role::Authority, Encoding::Position, timeout);
    authority_config.receive_mode = ReceiveMode::Background;

    let (mut authority, initiator) = session_pair(
        authority_config,
        config(Role::Initiator, Encoding::Position, timeout),
    );
    drop(initiator);

    let deadline = Instant::now() + Duration::from_secs(2);
    let result = loop {
        match authority.poll_remote() {
            Ok(_) if Instant::now() < deadline => thread::sleep(Duration::from_millis(1)),
            Ok(_) => panic!("link still up after peer closed"),
            Err(e) => break e,
        }
    };

    assert!(matches!(result, LinkError::Closed));
}

#[test]
fn test_session_rejects_mismatched_encoding() {
    let (authority, _initiator) = transport_pair(Encoding::KeyState);
    let config = config(Role::Authority, Encoding::Position, Duration::from_millis(5));

    let result = Session::new(&config, authority);

    assert!(matches!(result, Err(SetupError::Config(_))));
}

#[test]
fn test_establish_by_role() {
    let port = free_port();
    let timeout = Duration::from_millis(5);

    let mut authority_config = config(Role::Authority, Encoding::KeyState, timeout);
    authority_config.link.bind_host = "127.0.0.1".into();
    authority_config.link.port = port;

    let mut initiator_config = config(Role::Initiator, Encoding::KeyState, timeout);
    initiator_config.link.port = port;

    let listener = thread::spawn(move || Session::establish(&authority_config).unwrap());

    let deadline = Instant::now() + Duration::from_secs(2);
    let initiator = loop {
        match Session::establish(&initiator_config) {
            Ok(session) => break session,
            Err(SetupError::Connect { .. }) if Instant::now() < deadline => {
                thread::sleep(Duration::from_millis(10));
            }
            Err(e) => panic!("connect failed: {}", e),
        }
    };
    let authority = listener.join().unwrap();

    let expected: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();
    assert_eq!(initiator.peer_addr(), expected);
    assert_eq!(authority.role(), Role::Authority);
    assert_eq!(initiator.own_position(), PlayerPosition::new(0.05, 0.0));
    assert_eq!(authority.own_position(), PlayerPosition::new(-0.05, 0.0));
}

#[test]
fn test_connect_failure_is_setup_error() {
    let port = free_port();
    let mut config = config(Role::Initiator, Encoding::KeyState, Duration::from_millis(5));
    config.link.port = port;

    assert!(matches!(
        Session::establish(&config),
        Err(SetupError::Connect { .. })
    ));
}
