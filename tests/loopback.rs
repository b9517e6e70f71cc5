mod common;

use std::thread;

use simple_socket::{
    net::{ConnectState, Connector, Listener, SocketType},
    Direction, SocketError,
};

fn stream_listener() -> (Listener, u16) {
    let mut listener = Listener::stream();
    listener
        .listen("127.0.0.1", 0, 16)
        .expect("Failed to listen on loopback.");
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

#[test]
fn accept_records_both_endpoints() {
    common::init_logging();
    let (mut listener, port) = stream_listener();

    let server = thread::spawn(move || listener.accept());

    let mut client = Connector::stream();
    assert_eq!(client.open("127.0.0.1", port), Ok(()));
    assert_eq!(client.socket_error(), SocketError::Success);
    let client_local = client.local_addr().unwrap();

    let conn = server.join().unwrap().expect("Failed to accept connection.");
    assert!(conn.is_valid());
    assert_eq!(conn.kind(), SocketType::Stream);
    assert_eq!(conn.local_addr().unwrap().port(), port);
    assert_eq!(conn.peer_addr().unwrap().port(), client_local.port());
    assert_eq!(client.peer_addr().unwrap().port(), port);
}

#[test]
fn stream_round_trip() {
    common::init_logging();
    let (mut listener, port) = stream_listener();

    let mut client = Connector::stream();
    client.open("127.0.0.1", port).unwrap();
    let mut conn = listener.accept().unwrap();

    assert_eq!(client.send(b"Hello from client!"), Ok(18));
    assert_eq!(client.bytes_sent(), Some(18));

    let read = conn.receive(1024).unwrap();
    assert_eq!(&conn.data()[..read], b"Hello from client!");
    assert_eq!(conn.bytes_received(), Some(read));

    let request = conn.data().to_vec();
    conn.send(&request).unwrap();

    let read = client.receive(1024).unwrap();
    assert_eq!(client.data(), &request[..read]);
}

#[test]
fn shutdown_signals_end_of_stream() {
    common::init_logging();
    let (mut listener, port) = stream_listener();

    let mut client = Connector::stream();
    client.open("127.0.0.1", port).unwrap();
    let mut conn = listener.accept().unwrap();

    assert_eq!(client.shutdown(Direction::Send), Ok(()));
    assert_eq!(conn.receive(64), Ok(0));
    assert!(conn.data().is_empty());
}

#[test]
fn datagram_echo() {
    common::init_logging();

    let mut server = Listener::datagram();
    server.listen("127.0.0.1", 0, 0).unwrap();
    server.set_receive_timeout(5, 0).unwrap();
    let port = server.local_addr().unwrap().port();

    let mut client = Connector::datagram();
    client.set_receive_timeout(5, 0).unwrap();
    client.open("127.0.0.1", port).unwrap();

    assert_eq!(client.send(b"Test Packet"), Ok(11));

    assert_eq!(server.receive(1024), Ok(11));
    assert_eq!(server.data(), b"Test Packet");
    assert_eq!(server.peer_addr(), client.local_addr());
    assert_eq!(server.last_source(), client.local_addr());

    let payload = server.data().to_vec();
    assert_eq!(server.send(&payload), Ok(11));

    assert_eq!(client.receive(1024), Ok(11));
    assert_eq!(client.data(), b"Test Packet");
    assert_eq!(client.bytes_received(), Some(11));
}

#[test]
fn send_after_close() {
    common::init_logging();

    for kind in [SocketType::Stream, SocketType::Datagram] {
        let mut socket = Connector::new(kind);
        assert_eq!(socket.close(), Ok(()));

        assert_eq!(socket.send(b"Test Packet"), Err(SocketError::InvalidSocket));
        assert_eq!(socket.socket_error(), SocketError::InvalidSocket);
        assert_eq!(socket.bytes_sent(), None);

        assert_eq!(socket.close(), Ok(()));
        assert_eq!(socket.socket_error(), SocketError::Success);
    }
}

#[test]
fn open_rejects_bad_arguments() {
    common::init_logging();

    for nonblocking in [false, true] {
        let mut socket = Connector::stream();
        if nonblocking {
            socket.set_nonblocking().unwrap();
        }

        assert_eq!(socket.open("127.0.0.1", 0), Err(SocketError::InvalidPort));
        assert_eq!(socket.socket_error(), SocketError::InvalidPort);

        assert_eq!(socket.open("", 4242), Err(SocketError::InvalidAddress));
        assert_eq!(socket.socket_error(), SocketError::InvalidAddress);
    }
}

#[test]
fn blocking_connect_refused() {
    common::init_logging();

    // Grab a free port and release it again so nothing is listening there.
    let (mut listener, port) = stream_listener();
    listener.close().unwrap();

    let mut client = Connector::stream();
    assert_eq!(
        client.open("127.0.0.1", port),
        Err(SocketError::ConnectionRefused)
    );
    assert_eq!(client.socket_error(), SocketError::ConnectionRefused);
    assert_eq!(client.state(), ConnectState::Failed(SocketError::ConnectionRefused));
    assert!(!client.is_valid());
}

#[test]
fn multicast_argument_errors() {
    common::init_logging();

    let mut listener = Listener::datagram();
    assert_eq!(
        listener.bind_multicast("", "192.168.1.1", 0),
        Err(SocketError::InvalidAddress)
    );
    assert_eq!(listener.leave("not-a-group"), Err(SocketError::InvalidAddress));

    let mut stream = Listener::stream();
    assert_eq!(
        stream.bind_multicast("", "239.255.0.1", 0),
        Err(SocketError::ProtocolError)
    );
    assert_eq!(stream.accept().map(|_| ()).unwrap_err(), SocketError::ProtocolError);
    assert_eq!(
        Listener::datagram().accept().map(|_| ()),
        Err(SocketError::ProtocolError)
    );
}
