//! Language Server binary for a declarative UI markup language.
//!
//! Usage:
//!   qml-lsp --stdio     Run over stdin/stdout (the only supported mode)
//!   qml-lsp --version   Print the server version
//!   qml-lsp --help      Show this help message

use std::env;
use std::process;

use qml_lsp::Server;

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    set_stdio_binary_mode();

    let args: Vec<String> = env::args().collect();
    for arg in &args[1..] {
        match arg.as_str() {
            "--stdio" => {}
            "--version" => {
                println!("qml-lsp {}", env!("CARGO_PKG_VERSION"));
                return;
            }
            "--help" | "-h" => {
                print_help();
                return;
            }
            other => {
                eprintln!("Unknown option: {other}");
                print_help();
                process::exit(1);
            }
        }
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to start the async runtime");

    let exit_code = runtime.block_on(async { Server::new().run().await });
    process::exit(exit_code);
}

/// Windows opens stdin/stdout in text mode by default, which translates
/// `\n` to `\r\n` and corrupts Content-Length-framed messages. Put both
/// streams in binary mode before the transport touches them.
#[cfg(windows)]
fn set_stdio_binary_mode() {
    // SAFETY: `_setmode` only changes the translation mode of the given CRT
    // file descriptor; 0 and 1 are always stdin/stdout.
    unsafe {
        if libc::_setmode(0, libc::O_BINARY) == -1 {
            eprintln!("failed to set binary mode for stdin");
        }
        if libc::_setmode(1, libc::O_BINARY) == -1 {
            eprintln!("failed to set binary mode for stdout");
        }
    }
}

#[cfg(not(windows))]
fn set_stdio_binary_mode() {}

fn print_help() {
    eprintln!("qml-lsp");
    eprintln!();
    eprintln!("Usage: qml-lsp [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --stdio      Use stdio for communication (default, and only supported mode)");
    eprintln!("  --version    Show version information");
    eprintln!("  --help       Show this help message");
}
