// SPDX-License-Identifier: Apache-2.0

//! Feeds a JSON file through the stream parser one byte at a time and
//! prints every notification as it fires.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use sipjson::{ErrorKind, EventSink, JsonInt, ParserPool};

#[derive(Parser)]
#[command(about = "Feed a JSON file through the stream parser byte by byte")]
struct Args {
    /// Path to the JSON file
    file: PathBuf,
}

#[derive(Default)]
struct PrintSink {
    indent: usize,
    errors: usize,
}

impl PrintSink {
    fn line(&self, text: &str) {
        println!("{:indent$}{text}", "", indent = self.indent * 2);
    }
}

impl EventSink for PrintSink {
    fn on_object_start(&mut self, _parsers: &mut ParserPool, name: &str) {
        self.line(&format!("object '{name}' {{"));
        self.indent += 1;
    }
    fn on_object_complete(&mut self, _parsers: &mut ParserPool, name: &str) {
        self.indent = self.indent.saturating_sub(1);
        self.line(&format!("}} object '{name}'"));
    }
    fn on_array_start(&mut self, _parsers: &mut ParserPool, name: &str) {
        self.line(&format!("array '{name}' ["));
        self.indent += 1;
    }
    fn on_array_complete(&mut self, _parsers: &mut ParserPool, name: &str) {
        self.indent = self.indent.saturating_sub(1);
        self.line(&format!("] array '{name}'"));
    }
    fn on_string(&mut self, _parsers: &mut ParserPool, name: &str, value: &str) {
        self.line(&format!("{name} = \"{value}\""));
    }
    fn on_integer(&mut self, _parsers: &mut ParserPool, name: &str, value: JsonInt) {
        self.line(&format!("{name} = {value}"));
    }
    fn on_error(
        &mut self,
        _parsers: &mut ParserPool,
        code: ErrorKind,
        message: &'static str,
        context: &str,
    ) {
        self.errors += 1;
        self.indent = 0;
        eprintln!("error {}: {} near '{}'", code.code(), message, context);
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let data = match fs::read(&args.file) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Error: unable to read '{}': {}", args.file.display(), e);
            process::exit(1);
        }
    };

    let mut pool = ParserPool::new();
    let mut sink = PrintSink::default();
    for byte in data {
        pool.feed(byte, &mut sink);
    }

    if sink.errors > 0 {
        process::exit(1);
    }
}
