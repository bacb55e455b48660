//! End-to-end tests exercising only the public API, the way an actual
//! proxy implementation built on this crate would use it: pick a
//! cipher by name, dial or listen, and push bytes or datagrams through
//! it.

use shadowsocks_crypto_transport::{
    list_ciphers, pick_cipher, pick_cipher_with_password, AeadReader, AeadWriter, CipherKind,
    Listener, StreamCipherReader, StreamCipherWriter,
};
use std::{
    collections::HashSet,
    io::{Read, Write},
    net::{TcpStream, UdpSocket},
    thread,
};

#[test]
fn test_tcp_round_trip_for_every_cipher() {
    for name in list_ciphers() {
        let cipher = pick_cipher_with_password(name, b"shared secret").unwrap();
        let listener = Listener::bind("127.0.0.1:0", cipher.clone()).unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut conn, _addr) = listener.accept().unwrap();
            let mut buf = [0u8; 256];
            let n = conn.read(&mut buf).unwrap();
            conn.write_all(&buf[..n]).unwrap();
        });

        let client_stream = TcpStream::connect(addr).unwrap();
        let mut conn = cipher.wrap_stream(client_stream).unwrap();
        let message = format!("hello over {name}");
        conn.write_all(message.as_bytes()).unwrap();
        let mut echoed = vec![0u8; message.len()];
        conn.read_exact(&mut echoed).unwrap();
        assert_eq!(echoed, message.as_bytes());

        server.join().unwrap();
    }
}

#[test]
fn test_udp_round_trip_for_every_cipher() {
    for name in list_ciphers() {
        let cipher = pick_cipher_with_password(name, b"datagram secret").unwrap();

        let server_sock = UdpSocket::bind("127.0.0.1:0").unwrap();
        let server_addr = server_sock.local_addr().unwrap();
        let client_sock = UdpSocket::bind("127.0.0.1:0").unwrap();

        let server = cipher.wrap_packet(server_sock);
        let client = cipher.wrap_packet(client_sock);

        let message = format!("datagram over {name}");
        client.send_to(message.as_bytes(), server_addr).unwrap();

        let mut buf = [0u8; 256];
        let (n, _from) = server.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], message.as_bytes());
    }
}

#[test]
fn test_plain_cipher_round_trips_unmodified() {
    let cipher = pick_cipher("none", b"", b"").unwrap();
    let listener = Listener::bind("127.0.0.1:0", cipher.clone()).unwrap();
    let addr = listener.local_addr().unwrap();

    let server = thread::spawn(move || {
        let (mut conn, _addr) = listener.accept().unwrap();
        let mut buf = [0u8; 32];
        let n = conn.read(&mut buf).unwrap();
        conn.write_all(&buf[..n]).unwrap();
    });

    let client_stream = TcpStream::connect(addr).unwrap();
    let mut conn = cipher.wrap_stream(client_stream).unwrap();
    conn.write_all(b"plaintext passthrough").unwrap();
    let mut echoed = [0u8; 22];
    conn.read_exact(&mut echoed).unwrap();
    assert_eq!(&echoed, b"plaintext passthrough");

    server.join().unwrap();
}

#[test]
fn test_pick_cipher_with_password_is_deterministic_across_peers() {
    // Two independently derived ciphers from the same password must be
    // able to talk to each other, the same way two Shadowsocks peers
    // configured with the same password do.
    let listener_cipher =
        pick_cipher_with_password("CHACHA20-IETF-POLY1305", b"correct horse battery staple")
            .unwrap();
    let dialer_cipher =
        pick_cipher_with_password("CHACHA20-IETF-POLY1305", b"correct horse battery staple")
            .unwrap();

    let listener = Listener::bind("127.0.0.1:0", listener_cipher).unwrap();
    let addr = listener.local_addr().unwrap();

    let server = thread::spawn(move || {
        let (mut conn, _addr) = listener.accept().unwrap();
        let mut buf = [0u8; 32];
        let n = conn.read(&mut buf).unwrap();
        conn.write_all(&buf[..n]).unwrap();
    });

    let client_stream = TcpStream::connect(addr).unwrap();
    let mut conn = dialer_cipher.wrap_stream(client_stream).unwrap();
    conn.write_all(b"shared password").unwrap();
    let mut echoed = [0u8; 16];
    conn.read_exact(&mut echoed).unwrap();
    assert_eq!(&echoed, b"shared password");

    server.join().unwrap();
}

/// Reads `r` to completion using a fixed-size buffer whose length
/// rotates through `sizes`, so no two consecutive reads use the same
/// chunk size as either the framing's own chunk boundaries or any
/// power-of-two internal buffer.
fn drain_with_rotating_read_sizes(mut r: impl Read, sizes: &[usize]) -> Vec<u8> {
    let mut got = Vec::new();
    let mut next_size = 0;
    loop {
        let size = sizes[next_size % sizes.len()];
        next_size += 1;
        let mut buf = vec![0u8; size];
        let n = r.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        got.extend_from_slice(&buf[..n]);
    }
    got
}

#[test]
fn test_10mib_payload_survives_arbitrary_read_chunking_for_every_cipher() {
    use rand::RngCore;

    let mut payload = vec![0u8; 10 * 1024 * 1024];
    rand::thread_rng().fill_bytes(&mut payload);
    let read_sizes = [1usize, 3, 7, 13, 1024, 4096, 16383, 65536];

    for name in list_ciphers() {
        let cipher = pick_cipher_with_password(name, b"ten-mebibyte-password").unwrap();

        let mut wire = Vec::new();
        match &cipher {
            CipherKind::Aead(c) => {
                AeadWriter::new(&mut wire, c.clone()).write_all(&payload).unwrap()
            }
            CipherKind::Stream(c) => StreamCipherWriter::new(&mut wire, c.clone())
                .write_all(&payload)
                .unwrap(),
            CipherKind::None => unreachable!("list_ciphers never names the pass-through cipher"),
        }

        let got = match &cipher {
            CipherKind::Aead(c) => drain_with_rotating_read_sizes(
                AeadReader::new(wire.as_slice(), c.clone()),
                &read_sizes,
            ),
            CipherKind::Stream(c) => drain_with_rotating_read_sizes(
                StreamCipherReader::new(wire.as_slice(), c.clone()),
                &read_sizes,
            ),
            CipherKind::None => unreachable!(),
        };

        assert_eq!(
            got, payload,
            "{name} did not round-trip a 10 MiB payload under arbitrary read chunking"
        );
    }
}

#[test]
fn test_independent_writers_never_collide_on_salt_or_iv_across_1000_samples() {
    let aead_cipher = match pick_cipher_with_password("CHACHA20-IETF-POLY1305", b"collision-password")
        .unwrap()
    {
        CipherKind::Aead(c) => c,
        _ => unreachable!(),
    };
    let mut salts = HashSet::new();
    for _ in 0..1000 {
        let mut wire = Vec::new();
        AeadWriter::new(&mut wire, aead_cipher.clone())
            .write_all(b"x")
            .unwrap();
        let salt = wire[..aead_cipher.salt_size()].to_vec();
        assert!(
            salts.insert(salt),
            "two independently constructed AEAD writers emitted the same salt"
        );
    }

    let stream_cipher = match pick_cipher_with_password("AES-256-CTR", b"collision-password").unwrap()
    {
        CipherKind::Stream(c) => c,
        _ => unreachable!(),
    };
    let mut ivs = HashSet::new();
    for _ in 0..1000 {
        let mut wire = Vec::new();
        StreamCipherWriter::new(&mut wire, stream_cipher.clone())
            .write_all(b"x")
            .unwrap();
        let iv = wire[..stream_cipher.iv_size()].to_vec();
        assert!(
            ivs.insert(iv),
            "two independently constructed stream-cipher writers emitted the same IV"
        );
    }
}
