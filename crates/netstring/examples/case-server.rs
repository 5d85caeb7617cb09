//! Request/response over TCP with record mapping.
//!
//! A server thread answers case-conversion requests: each request names a function and
//! an input, each response carries either the output or an error.
//!
//! Run with:
//!   cargo run --example case-server

use std::net::{TcpListener, TcpStream};
use std::thread;

use netstring::{record, Decoder, Encoder};

const END_OF_MESSAGE: u8 = b'z';

#[derive(Debug, Default)]
struct Request {
    function: String,
    input: String,
}

record!(Request {
    function => "f",
    input => "i",
});

#[derive(Debug, Default)]
struct Response {
    output: String,
    error: String,
}

record!(Response {
    output => "o",
    error => "e",
});

fn serve(stream: TcpStream) -> netstring::Result<()> {
    let mut requests = Decoder::new(stream.try_clone()?);
    let mut responses = Encoder::new(stream);

    loop {
        let mut request = Request::default();
        match requests.unmarshal(END_OF_MESSAGE, &mut request) {
            Ok(_) => {}
            Err(err) if err.is_end_of_stream() => return Ok(()),
            Err(err) => return Err(err),
        }
        eprintln!("server: {} {:?}", request.function, request.input);

        let response = match request.function.as_str() {
            "lower" => Response {
                output: request.input.to_lowercase(),
                ..Response::default()
            },
            "upper" => Response {
                output: request.input.to_uppercase(),
                ..Response::default()
            },
            other => Response {
                error: format!("invalid function {other:?}"),
                ..Response::default()
            },
        };
        responses.marshal(END_OF_MESSAGE, &response)?;
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    eprintln!("Listening on {addr}");

    let server = thread::spawn(move || -> netstring::Result<()> {
        let (stream, peer) = listener.accept()?;
        eprintln!("server: client connected from {peer}");
        serve(stream)
    });

    let stream = TcpStream::connect(addr)?;
    let mut requests = Encoder::new(stream.try_clone()?);
    let mut responses = Decoder::new(stream);

    for (function, input) in [
        ("upper", "Hello, World"),
        ("lower", "Reykjavík"),
        ("reverse", "abc"),
    ] {
        let request = Request {
            function: function.into(),
            input: input.into(),
        };
        requests.marshal(END_OF_MESSAGE, &request)?;

        let mut response = Response::default();
        responses.unmarshal(END_OF_MESSAGE, &mut response)?;
        if response.error.is_empty() {
            println!("{function}({input:?}) = {:?}", response.output);
        } else {
            println!("{function}({input:?}) failed: {}", response.error);
        }
    }

    // Closing the client side ends the server loop with a clean end of stream.
    drop(requests);
    drop(responses);
    server.join().map_err(|_| "server thread panicked")??;
    Ok(())
}
