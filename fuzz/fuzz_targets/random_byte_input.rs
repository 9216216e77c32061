#![no_main]

use libfuzzer_sys::fuzz_target;
use rdsap::output::Output;
use rdsap::{run_project, ProjectFlags};
use std::io;
use std::io::{BufReader, Cursor, Write};

fuzz_target!(|data: &[u8]| {
    let _run = run_project(
        BufReader::new(Cursor::new(data)),
        &SinkOutput,
        &ProjectFlags::RDSAP_COMPLETION,
    );
});

/// An output that goes to nowhere/ a "sink"/ /dev/null.
#[derive(Debug, Default)]
pub struct SinkOutput;

impl Output for SinkOutput {
    fn writer_for_location_key(
        &self,
        _location_key: &str,
        _file_extension: &str,
    ) -> anyhow::Result<impl Write> {
        Ok(io::sink())
    }

    fn is_noop(&self) -> bool {
        // make the output pretend it's a no-op so fuzzing exercises code that calls it
        false
    }
}
