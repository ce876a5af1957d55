// MyCobot serial framing: FE FE <len> <cmd> <data..> FA
use crate::domain::joint::{Direction, JOINT_COUNT, JointAngles, JointId, Speed};
use anyhow::{Context, bail};
use bytes::{BufMut, Bytes, BytesMut};
use std::io::Read;

pub const HEADER: [u8; 2] = [0xFE, 0xFE];
pub const FOOTER: u8 = 0xFA;

pub const GET_ANGLES: u8 = 0x20;
pub const SEND_ANGLE: u8 = 0x21;
pub const SEND_ANGLES: u8 = 0x22;
pub const STOP: u8 = 0x29;
pub const IS_MOVING: u8 = 0x2B;
pub const JOG_ANGLE: u8 = 0x30;

/// Frames for other commands that may be skipped while waiting for a reply
const MAX_SKIPPED_FRAMES: usize = 8;
/// Noise bytes tolerated before a header
const MAX_SYNC_BYTES: usize = 64;

/// Encode a frame. The length byte counts the command, data and footer.
pub fn encode_frame(command: u8, data: &[u8]) -> Bytes {
    let mut frame = BytesMut::with_capacity(data.len() + 5);
    frame.put_slice(&HEADER);
    frame.put_u8((data.len() + 2) as u8);
    frame.put_u8(command);
    frame.put_slice(data);
    frame.put_u8(FOOTER);
    frame.freeze()
}

/// Angles travel as hundredths of a degree, big-endian
fn put_angle(buf: &mut BytesMut, angle: f64) {
    buf.put_i16((angle * 100.0).round() as i16);
}

pub fn send_angle(joint: JointId, angle: f64, speed: Speed) -> Bytes {
    let mut data = BytesMut::with_capacity(4);
    data.put_u8(joint.number());
    put_angle(&mut data, angle);
    data.put_u8(speed.value());
    encode_frame(SEND_ANGLE, &data)
}

pub fn send_angles(angles: &JointAngles, speed: Speed) -> Bytes {
    let mut data = BytesMut::with_capacity(JOINT_COUNT * 2 + 1);
    for angle in angles {
        put_angle(&mut data, *angle);
    }
    data.put_u8(speed.value());
    encode_frame(SEND_ANGLES, &data)
}

pub fn jog_angle(joint: JointId, direction: Direction, speed: Speed) -> Bytes {
    let direction = match direction {
        Direction::Positive => 1,
        Direction::Negative => 0,
    };
    encode_frame(JOG_ANGLE, &[joint.number(), direction, speed.value()])
}

pub fn query(command: u8) -> Bytes {
    encode_frame(command, &[])
}

pub fn decode_angles(data: &[u8]) -> anyhow::Result<JointAngles> {
    if data.len() != JOINT_COUNT * 2 {
        bail!("expected {} angle bytes, got {}", JOINT_COUNT * 2, data.len());
    }
    let mut angles = [0.0; JOINT_COUNT];
    for (angle, raw) in angles.iter_mut().zip(data.chunks_exact(2)) {
        *angle = f64::from(i16::from_be_bytes([raw[0], raw[1]])) / 100.0;
    }
    Ok(angles)
}

pub fn decode_flag(data: &[u8]) -> anyhow::Result<bool> {
    match data {
        [0] => Ok(false),
        [1] => Ok(true),
        other => bail!("unexpected flag payload {:02X?}", other),
    }
}

/// Read frames until one carries `command`, returning its data bytes
pub fn read_reply<R: Read + ?Sized>(reader: &mut R, command: u8) -> anyhow::Result<Bytes> {
    for _ in 0..=MAX_SKIPPED_FRAMES {
        let (received, data) = read_frame(reader)?;
        if received == command {
            return Ok(data);
        }
        tracing::debug!("Skipping frame 0x{:02X} while waiting for 0x{:02X}", received, command);
    }
    bail!("no reply to command 0x{:02X}", command)
}

fn read_frame<R: Read + ?Sized>(reader: &mut R) -> anyhow::Result<(u8, Bytes)> {
    sync_header(reader)?;

    let mut len = [0u8; 1];
    reader.read_exact(&mut len).context("reading frame length")?;
    let len = len[0] as usize;
    if len < 2 {
        bail!("frame length {} too short", len);
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).context("reading frame body")?;
    if body[len - 1] != FOOTER {
        bail!("bad frame footer 0x{:02X}", body[len - 1]);
    }

    Ok((body[0], Bytes::copy_from_slice(&body[1..len - 1])))
}

fn sync_header<R: Read + ?Sized>(reader: &mut R) -> anyhow::Result<()> {
    let mut byte = [0u8; 1];
    let mut matched = 0;
    for _ in 0..MAX_SYNC_BYTES + HEADER.len() {
        reader.read_exact(&mut byte).context("waiting for frame header")?;
        if byte[0] == HEADER[matched] {
            matched += 1;
            if matched == HEADER.len() {
                return Ok(());
            }
        } else {
            matched = usize::from(byte[0] == HEADER[0]);
        }
    }
    bail!("no frame header found")
}
