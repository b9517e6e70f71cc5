mod common;

use std::net::Ipv4Addr;

use simple_socket::{
    net::{AddressingMode, Connector, Listener},
    SocketError,
};

const GROUP: &str = "239.255.42.99";

#[test]
fn membership_follows_join_and_leave() {
    common::init_logging();

    let mut listener = Listener::datagram();
    assert_eq!(listener.bind_multicast("127.0.0.1", "239.255.42.1", 0), Ok(()));
    let port = listener.local_addr().unwrap().port();

    let membership = listener.membership().unwrap();
    assert_eq!(membership.group(), Ipv4Addr::new(239, 255, 42, 1));
    assert_eq!(membership.interface(), Ipv4Addr::LOCALHOST);
    assert_eq!(listener.addressing(), AddressingMode::Multicast);

    // Joining a second group makes it the send target.
    assert_eq!(listener.join("239.255.42.2"), Ok(()));
    assert_eq!(
        listener.membership().map(|m| m.group()),
        Some(Ipv4Addr::new(239, 255, 42, 2))
    );

    // Leaving a group other than the current one keeps the handle in multicast mode.
    assert_eq!(listener.leave("239.255.42.1"), Ok(()));
    assert_eq!(listener.addressing(), AddressingMode::Multicast);

    assert_eq!(listener.leave("239.255.42.2"), Ok(()));
    assert_eq!(listener.membership(), None);
    assert_eq!(listener.addressing(), AddressingMode::Unicast);
    assert_eq!(listener.socket_error(), SocketError::Success);
    assert_eq!(listener.local_addr().unwrap().port(), port);
    assert!(listener.is_valid());
}

#[test]
fn failed_leave_closes_the_handle() {
    common::init_logging();

    let mut listener = Listener::datagram();
    listener.bind_multicast("127.0.0.1", GROUP, 0).unwrap();

    assert_eq!(
        listener.leave("239.255.42.77"),
        Err(SocketError::InvalidAddress)
    );
    assert_eq!(listener.socket_error(), SocketError::InvalidAddress);
    assert!(!listener.is_valid());

    assert_eq!(listener.join(GROUP), Err(SocketError::InvalidSocket));
}

#[test]
fn group_traffic_reaches_receiver() {
    common::init_logging();

    let mut receiver = Listener::datagram();
    receiver.bind_multicast("", GROUP, 0).unwrap();
    receiver.set_receive_timeout(5, 0).unwrap();
    let port = receiver.local_addr().unwrap().port();
    assert_eq!(
        receiver.membership().map(|m| m.interface()),
        Some(Ipv4Addr::UNSPECIFIED)
    );

    let mut sender = Connector::datagram();
    sender.open(GROUP, port).unwrap();
    assert_eq!(sender.send(b"Test Packet"), Ok(11));

    assert_eq!(receiver.receive(1024), Ok(11));
    assert_eq!(receiver.data(), b"Test Packet");
    assert!(receiver.last_source().is_some());
    // Multicast receives do not redirect sends away from the group.
    assert_eq!(receiver.peer_addr(), None);

    assert_eq!(receiver.leave(GROUP), Ok(()));
    assert_eq!(receiver.membership(), None);
    assert_eq!(receiver.addressing(), AddressingMode::Unicast);
}
