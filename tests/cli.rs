//! End-to-end checks of the command-line tool: exit codes, the `error:`
//! stderr contract, overwrite protection, and that what it writes is a
//! decodable frame.

use std::fs;
use std::io::{Cursor, Read};
use std::process::Command;

use lz_oracle::decompress_frame;
use tempfile::tempdir;

fn binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_lz-oracle"))
}

#[test]
fn compresses_a_file_to_a_decodable_frame() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.bin");
    let output = dir.path().join("output.lz4");
    fs::write(&input, b"a small file, compressed end to end").unwrap();

    let status = binary()
        .arg("-9")
        .arg(&input)
        .arg(&output)
        .status()
        .expect("binary must run");
    assert!(status.success());

    let frame = fs::read(&output).unwrap();
    let decoded = decompress_frame(Cursor::new(&frame[..])).unwrap();
    assert_eq!(decoded, b"a small file, compressed end to end");
}

#[test]
fn refuses_to_overwrite_without_force() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.bin");
    let output = dir.path().join("output.lz4");
    fs::write(&input, b"payload").unwrap();
    fs::write(&output, b"precious").unwrap();

    let refused = binary().arg(&input).arg(&output).output().unwrap();
    assert_eq!(refused.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&refused.stderr).starts_with("error: "));
    assert_eq!(fs::read(&output).unwrap(), b"precious");

    let forced = binary().arg("-f").arg(&input).arg(&output).output().unwrap();
    assert!(forced.status.success());
    assert_ne!(fs::read(&output).unwrap(), b"precious");
}

#[test]
fn missing_input_is_an_error() {
    let dir = tempdir().unwrap();
    let output = binary()
        .arg(dir.path().join("does-not-exist"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("error: "));
}

#[test]
fn unknown_flags_are_an_error() {
    let output = binary().arg("-q").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("error: "));
}

#[test]
fn help_exits_cleanly() {
    let output = binary().arg("-h").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("usage:"));
}

#[test]
fn stdin_to_stdout_with_dictionary() {
    use std::io::Write;
    use std::process::Stdio;

    let dir = tempdir().unwrap();
    let dict_path = dir.path().join("shared.dict");
    fs::write(&dict_path, b"a dictionary both sides agreed on").unwrap();

    let mut child = binary()
        .arg("-D")
        .arg(&dict_path)
        .arg("-")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"a dictionary both sides agreed on, reused")
        .unwrap();
    let out = child.wait_with_output().unwrap();
    assert!(out.status.success());

    let decoded = lz_oracle::LZ4FrameReader::with_dictionary(
        Cursor::new(&out.stdout[..]),
        b"a dictionary both sides agreed on",
    )
    .unwrap()
    .into_read()
    .bytes()
    .collect::<Result<Vec<u8>, _>>()
    .unwrap();
    assert_eq!(decoded, b"a dictionary both sides agreed on, reused");
}
