//! Runs the generated TypeScript and C++ codecs for `commands.tsp` and checks
//! that they produce the same bytes as the Rust runtime.
//!
//! Each test is skipped when its toolchain (`tsc` + `node`, or `c++`) is not on
//! the PATH.

use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use tbs_compiler::{compile, Language};
use tbs_wire::{ByteWriter, LengthPrefix};

const COMMANDS: &str = include_str!("../../example/schema/commands.tsp");

fn has_tool(name: &str) -> bool {
    Command::new(name)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn write_sensor(w: &mut ByteWriter, id: u8) {
    w.write_u64(1_000 + id as u64);
    w.write_u8(id);
    w.write_f32(1.0);
    w.write_f32(2.0);
    w.write_f32(3.0);
    w.write_f32(20.5);
    w.write_f32(0.25);
}

/// `name hex` lines, in the order every driver prints them.
fn expected_lines() -> Vec<String> {
    let mut info = ByteWriter::new();
    info.write_u8(2);
    info.write_fixed_string("ab", 32);
    info.write_fixed_string("1.0", 16);
    info.write_u32(42);
    info.write_i16(-12);
    info.write_u8(99);
    let info = info.data();

    let mut sensors = ByteWriter::new();
    sensors.write_u8(3);
    sensors
        .write_length_prefixed_items(LengthPrefix::U16, &[1u8, 2, 3], |w, id| {
            write_sensor(w, *id);
            Ok(())
        })
        .unwrap();
    let sensors = sensors.data();

    let mut samples = ByteWriter::new();
    samples.write_u8(2);
    for sample in [-1i16, 0, 300] {
        samples.write_i16(sample);
    }
    let samples = samples.data();

    vec![
        format!("info {}", hex(&info)),
        format!("info-again {}", hex(&info)),
        format!("sensors {}", hex(&sensors)),
        format!("sensors-again {}", hex(&sensors)),
        format!("samples {}", hex(&samples)),
        format!("samples-again {}", hex(&samples)),
    ]
}

/// Writes the generated files for `language` under `dir` and returns the
/// language directory.
fn write_generated(dir: &Path, language: Language) -> PathBuf {
    let files = compile(COMMANDS, "commands.tsp", &[language]).unwrap();
    for file in &files {
        let path = dir.join(&file.filename);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, &file.content).unwrap();
    }
    dir.join(language.dir_name())
}

fn run(command: &mut Command) -> String {
    let output = command.output().unwrap();
    assert!(
        output.status.success(),
        "{:?} failed\nstdout:\n{}\nstderr:\n{}",
        command,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

fn assert_lines(stdout: &str) {
    let got: Vec<&str> = stdout.lines().collect();
    assert_eq!(got, expected_lines());
}

const TS_DRIVER: &str = r#"import * as Types from './types.js';
import * as S from './serializer.js';

const hex = (bytes: Uint8Array): string =>
    Array.from(bytes, (b) => b.toString(16).padStart(2, '0')).join('');

const sensor = (id: number): Types.SensorData => ({
    timestamp: BigInt(1000 + id),
    sensor_id: id,
    position: { x: 1.0, y: 2.0, z: 3.0 },
    temperature: 20.5,
    humidity: 0.25,
});

const info: Types.DeviceInfoResponse = {
    status: Types.DeviceStatus.Busy,
    device_name: 'ab',
    firmware_version: '1.0',
    uptime_seconds: 42,
    temperature: -12,
    battery_level: 99,
};
const infoBytes = S.serializeDeviceInfoResponse(info);
console.log(`info ${hex(infoBytes)}`);
console.log(`info-again ${hex(S.serializeDeviceInfoResponse(S.deserializeDeviceInfoResponse(infoBytes)))}`);

const sensors: Types.SensorDataResponse = { sensor_count: 3, sensors: [sensor(1), sensor(2), sensor(3)] };
const sensorBytes = S.serializeSensorDataResponse(sensors);
console.log(`sensors ${hex(sensorBytes)}`);
console.log(`sensors-again ${hex(S.serializeSensorDataResponse(S.deserializeSensorDataResponse(sensorBytes)))}`);

const samples: Types.StreamSamplesCommand = { channel: 2, samples: [-1, 0, 300] };
const sampleBytes = S.serializeStreamSamplesCommand(samples);
console.log(`samples ${hex(sampleBytes)}`);
console.log(`samples-again ${hex(S.serializeStreamSamplesCommand(S.deserializeStreamSamplesCommand(sampleBytes)))}`);
"#;

#[test]
fn typescript_matches_rust_bytes() {
    if !has_tool("tsc") || !has_tool("node") {
        eprintln!("skipping: tsc or node not found");
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let ts_dir = write_generated(tmp.path(), Language::TypeScript);
    fs::write(ts_dir.join("driver.ts"), TS_DRIVER).unwrap();

    // Type errors are reported but do not block emit; the bytes are what is
    // compared here.
    let out_dir = ts_dir.join("out");
    let tsc = Command::new("tsc")
        .current_dir(&ts_dir)
        .args(["--target", "es2020", "--module", "commonjs", "--outDir"])
        .arg(&out_dir)
        .args(["types.ts", "serializer.ts", "driver.ts"])
        .output()
        .unwrap();
    assert!(
        out_dir.join("driver.js").exists(),
        "tsc emitted nothing:\n{}",
        String::from_utf8_lossy(&tsc.stdout)
    );

    let stdout = run(Command::new("node").arg(out_dir.join("driver.js")));
    assert_lines(&stdout);
}

const CPP_DRIVER: &str = r#"#include "protocol.hpp"

#include <cstdio>

using namespace binaryprotocol;

static void print(const char* name, const std::vector<uint8_t>& bytes) {
    std::printf("%s ", name);
    for (uint8_t b : bytes) {
        std::printf("%02x", b);
    }
    std::printf("\n");
}

static SensorData sensor(uint8_t id) {
    SensorData s;
    s.timestamp = 1000 + id;
    s.sensor_id = id;
    s.position.x = 1.0f;
    s.position.y = 2.0f;
    s.position.z = 3.0f;
    s.temperature = 20.5f;
    s.humidity = 0.25f;
    return s;
}

int main() {
    DeviceInfoResponse info;
    info.status = DeviceStatus::Busy;
    info.device_name = "ab";
    info.firmware_version = "1.0";
    info.uptime_seconds = 42;
    info.temperature = -12;
    info.battery_level = 99;
    std::vector<uint8_t> infoBytes = serialize(info);
    print("info", infoBytes);
    print("info-again", serialize(deserializeDeviceInfoResponse(infoBytes)));

    SensorDataResponse sensors;
    sensors.sensor_count = 3;
    sensors.sensors = {sensor(1), sensor(2), sensor(3)};
    std::vector<uint8_t> sensorBytes = serialize(sensors);
    print("sensors", sensorBytes);
    print("sensors-again", serialize(deserializeSensorDataResponse(sensorBytes)));

    StreamSamplesCommand samples;
    samples.channel = 2;
    samples.samples = {-1, 0, 300};
    std::vector<uint8_t> sampleBytes = serialize(samples);
    print("samples", sampleBytes);
    print("samples-again", serialize(deserializeStreamSamplesCommand(sampleBytes)));
    return 0;
}
"#;

#[test]
fn cpp_matches_rust_bytes() {
    if !has_tool("c++") {
        eprintln!("skipping: c++ not found");
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let cpp_dir = write_generated(tmp.path(), Language::Cpp);
    fs::write(cpp_dir.join("driver.cpp"), CPP_DRIVER).unwrap();

    let binary = cpp_dir.join("driver");
    run(Command::new("c++")
        .current_dir(&cpp_dir)
        .args(["-std=c++17", "-o"])
        .arg(&binary)
        .args(["protocol.cpp", "driver.cpp"]));

    let stdout = run(&mut Command::new(&binary));
    assert_lines(&stdout);
}

#[test]
fn reference_bytes_match_known_layout() {
    let lines = expected_lines();
    let info = lines[0].strip_prefix("info ").unwrap();
    assert_eq!(info.len(), 56 * 2);
    assert!(info.starts_with("026162"));
    let sensors = lines[2].strip_prefix("sensors ").unwrap();
    assert!(sensors.starts_with("035700"));
    assert_eq!(lines[4], "samples 02ffff00002c01");
}
