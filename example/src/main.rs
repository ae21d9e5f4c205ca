// example/src/main.rs

use example_app::*;

fn main() -> Result<(), WireError> {
    let reading = SensorDataResponse {
        sensor_count: 2,
        sensors: vec![
            SensorData {
                timestamp: 1_700_000_000_000,
                sensor_id: 1,
                position: Vector3D { x: 1.0, y: 2.0, z: 3.0 },
                temperature: 21.5,
                humidity: 40.0,
            },
            SensorData {
                timestamp: 1_700_000_000_500,
                sensor_id: 2,
                position: Vector3D { x: -1.0, y: 0.5, z: 0.0 },
                temperature: 19.0,
                humidity: 55.5,
            },
        ],
    };

    let message = frame(SensorDataResponse::COMMAND_ID, 7, &reading)?;
    println!("framed {} bytes: {:02x?}", message.len(), &message[..14]);

    let (header, body) = unframe(&message)?;
    assert_eq!(header.command_id, command_ids::SENSOR_DATA_RESPONSE);
    let decoded = SensorDataResponse::deserialize(body)?;

    for sensor in &decoded.sensors {
        println!(
            "  sensor {} at ({}, {}, {}): {} C, {} %",
            sensor.sensor_id, sensor.position.x, sensor.position.y, sensor.position.z, sensor.temperature, sensor.humidity
        );
    }

    let info = DeviceInfoResponse {
        status: DeviceStatus::Online,
        device_name: "sensor-hub".to_string(),
        firmware_version: "1.4.2".to_string(),
        uptime_seconds: 3600,
        temperature: 215,
        battery_level: 87,
    };
    let bytes = info.serialize()?;
    println!("DeviceInfoResponse: {} bytes, status {:?}", bytes.len(), DeviceInfoResponse::deserialize(&bytes)?.status);

    Ok(())
}
