use std::{env, time::Duration};

use simple_socket::{
    net::{Connector, SocketType},
    SocketBuilder,
};
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

    let host = env::args().nth(1).unwrap_or_else(|| String::from("127.0.0.1"));

    println!("Connecting to remote server.");

    let mut client = SocketBuilder::new()
        .nonblocking(true)
        .connect_timeout(Duration::from_secs(2))
        .connector()
        .expect("Failed to open socket.");

    client
        .open(&host, 9091)
        .expect("Failed to connect to remote server.");
    client.set_blocking().expect("Failed to switch to blocking.");

    println!(
        "Connected to remote server in {}us, local address: {:?}",
        client.timer().micros(),
        client.local_addr()
    );

    client
        .send(b"Hello from client!")
        .expect("Failed to send request.");

    let read = client.receive(1024).expect("Failed to receive response.");
    println!(
        "Server response: {}",
        String::from_utf8_lossy(&client.data()[..read])
    );

    let mut udp = Connector::new(SocketType::Datagram);
    udp.set_receive_timeout(2, 0)
        .expect("Failed to set receive timeout.");
    udp.open(&host, 9091).expect("Failed to set UDP destination.");

    match udp.send(b"Test Packet") {
        Ok(sent) => println!("Sent {} bytes to {:?}.", sent, udp.peer_addr()),
        Err(e) => println!("Failed to send data to remote: {}", e),
    };

    match udp.receive(1024) {
        Ok(read) => println!(
            "Received {} bytes from {:?} message: {}",
            read,
            udp.last_source(),
            String::from_utf8_lossy(udp.data())
        ),
        Err(e) => println!("Failed to receive data from remote: {}", e),
    };
}
