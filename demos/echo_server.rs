use std::thread;

use simple_socket::net::{Listener, SocketType};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    // A datagram echo runs next to the TCP one, on the same port number.
    thread::spawn(|| {
        let mut socket = Listener::new(SocketType::Datagram);
        socket
            .listen("0.0.0.0", 9091, 0)
            .expect("Failed to bind UDP socket.");

        loop {
            let read = match socket.receive(1024) {
                Ok(read) => read,
                Err(e) => {
                    println!("Failed to receive datagram: {}", e);
                    continue;
                }
            };

            // Unicast receives record the sender as the peer, so this replies to it.
            let payload = socket.data().to_vec();
            println!("Echoing {} bytes to {:?}", read, socket.peer_addr());
            if let Err(e) = socket.send(&payload) {
                println!("Failed to echo datagram: {}", e);
            }
        }
    });

    // Since we are demonstrating a TCP server, lets start by creating a new Listener that is set
    // to listen on 0.0.0.0:9091 and have a connection backlog of 1024.
    let mut listener = Listener::stream();
    listener
        .listen_default("0.0.0.0", 9091)
        .expect("Failed to configure listener.");

    println!("Listening on: {:?}", listener.local_addr());

    // Accept runs on this thread, each connection is served by its own.
    loop {
        let mut conn = match listener.accept() {
            Ok(conn) => conn,
            Err(e) => {
                println!("Oh no we had an error: {}", e);
                continue;
            }
        };

        println!("Got connection from: {:?}", conn.peer_addr());

        thread::spawn(move || loop {
            let read = match conn.receive(1024) {
                Ok(0) => break,
                Ok(read) => read,
                Err(e) => {
                    println!("Failed to receive from client: {}", e);
                    break;
                }
            };

            let request = conn.data().to_vec();
            println!("Client request: {}", String::from_utf8_lossy(&request));

            let mut sent = 0;
            while sent < read {
                match conn.send(&request[sent..]) {
                    Ok(n) => sent += n,
                    Err(e) => {
                        println!("Failed to respond to client: {}", e);
                        return;
                    }
                }
            }
        });
    }
}
