//! Big-endian encoding of TraCI messages, commands and values.

use super::constants::*;
use crate::{Error, Result};
use smallvec::SmallVec;

/// A request message under construction.
#[derive(Default)]
pub struct Message {
    /// The encoded commands.
    buf: Vec<u8>,
    /// The IDs of the commands, in order.
    commands: SmallVec<[u8; 4]>,
}

impl Message {
    /// Creates an empty message.
    pub fn new() -> Self {
        Default::default()
    }

    /// Appends a command with the given content.
    pub fn push(&mut self, id: u8, content: &[u8]) {
        put_command(&mut self.buf, id, content);
        self.commands.push(id);
    }

    /// Gets the IDs of the commands in the message.
    pub fn commands(&self) -> &[u8] {
        &self.commands
    }

    /// Gets the bytes to send, including the message length.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.buf.len() + 4);
        put_i32(&mut out, (self.buf.len() + 4) as i32);
        out.extend_from_slice(&self.buf);
        out
    }
}

/// Encodes a command, using the extended length form if it is too long for one byte.
pub fn put_command(buf: &mut Vec<u8>, id: u8, content: &[u8]) {
    let len = content.len() + 2;
    if len <= 255 {
        buf.push(len as u8);
    } else {
        buf.push(0);
        put_i32(buf, (len + 4) as i32);
    }
    buf.push(id);
    buf.extend_from_slice(content);
}

pub fn put_i32(buf: &mut Vec<u8>, value: i32) {
    buf.extend_from_slice(&value.to_be_bytes());
}

pub fn put_f64(buf: &mut Vec<u8>, value: f64) {
    buf.extend_from_slice(&value.to_be_bytes());
}

pub fn put_string(buf: &mut Vec<u8>, value: &str) {
    put_i32(buf, value.len() as i32);
    buf.extend_from_slice(value.as_bytes());
}

/// Encodes the content of a "get variable" command.
pub fn get_variable(var: u8, object_id: &str) -> Vec<u8> {
    let mut content = Vec::with_capacity(5 + object_id.len());
    content.push(var);
    put_string(&mut content, object_id);
    content
}

/// A cursor over a received message.
pub struct Storage {
    buf: Vec<u8>,
    pos: usize,
}

impl Storage {
    /// Wraps the body of a message (without its length prefix).
    pub fn new(buf: Vec<u8>) -> Self {
        Self { buf, pos: 0 }
    }

    /// The number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, count: usize) -> Result<&[u8]> {
        if count > self.remaining() {
            return Err(Error::Protocol(format!(
                "Wanted {} bytes but only {} remain",
                count,
                self.remaining()
            )));
        }
        let bytes = &self.buf[self.pos..self.pos + count];
        self.pos += count;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.take_array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_be_bytes(self.take_array()?))
    }

    /// Reads a command length: one byte, or a zero byte followed by a 4 byte length.
    /// The returned length includes the length field itself.
    pub fn read_length(&mut self) -> Result<usize> {
        match self.read_u8()? {
            0 => {
                let len = self.read_i32()?;
                usize::try_from(len)
                    .map_err(|_| Error::Protocol(format!("Negative command length {}", len)))
            }
            len => Ok(len as usize),
        }
    }

    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_count()?;
        let bytes = self.take(len)?.to_vec();
        String::from_utf8(bytes).map_err(|err| Error::Protocol(format!("Invalid string: {}", err)))
    }

    pub fn read_string_list(&mut self) -> Result<Vec<String>> {
        let count = self.read_count()?;
        (0..count).map(|_| self.read_string()).collect()
    }

    fn read_count(&mut self) -> Result<usize> {
        let count = self.read_i32()?;
        usize::try_from(count).map_err(|_| Error::Protocol(format!("Negative length {}", count)))
    }

    fn expect_type(&mut self, expected: u8) -> Result<()> {
        match self.read_u8()? {
            found if found == expected => Ok(()),
            found => Err(Error::Protocol(format!(
                "Expected value of type 0x{:02x}, found 0x{:02x}",
                expected, found
            ))),
        }
    }

    pub fn read_typed_i32(&mut self) -> Result<i32> {
        self.expect_type(TYPE_INTEGER)?;
        self.read_i32()
    }

    pub fn read_typed_f64(&mut self) -> Result<f64> {
        self.expect_type(TYPE_DOUBLE)?;
        self.read_f64()
    }

    pub fn read_typed_string_list(&mut self) -> Result<Vec<String>> {
        self.expect_type(TYPE_STRINGLIST)?;
        self.read_string_list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn short_commands_use_a_single_length_byte() {
        let mut message = Message::new();
        let mut content = vec![TYPE_DOUBLE];
        put_f64(&mut content, 0.0);
        message.push(CMD_SIMSTEP, &content);

        let bytes = message.to_bytes();
        assert_eq!(&bytes[..4], &15i32.to_be_bytes());
        assert_eq!(bytes[4], 11);
        assert_eq!(bytes[5], CMD_SIMSTEP);
        assert_eq!(bytes[6], TYPE_DOUBLE);
        assert_eq!(bytes.len(), 15);
        assert_eq!(message.commands(), &[CMD_SIMSTEP]);
    }

    #[test]
    fn long_commands_use_the_extended_length() {
        let id = "v".repeat(300);
        let content = get_variable(VAR_SPEED, &id);
        let mut buf = vec![];
        put_command(&mut buf, CMD_GET_VEHICLE_VARIABLE, &content);

        assert_eq!(buf[0], 0);
        assert_eq!(&buf[1..5], &(buf.len() as i32).to_be_bytes());
        assert_eq!(buf[5], CMD_GET_VEHICLE_VARIABLE);

        let mut storage = Storage::new(buf);
        assert_eq!(storage.read_length().unwrap(), 2 + 4 + content.len());
        assert_eq!(storage.read_u8().unwrap(), CMD_GET_VEHICLE_VARIABLE);
        assert_eq!(storage.read_u8().unwrap(), VAR_SPEED);
        assert_eq!(storage.read_string().unwrap(), id);
        assert_eq!(storage.remaining(), 0);
    }

    #[test]
    fn typed_values_check_their_type() {
        let mut buf = vec![TYPE_STRINGLIST];
        put_i32(&mut buf, 2);
        put_string(&mut buf, "veh0");
        put_string(&mut buf, "veh1");
        buf.push(TYPE_DOUBLE);
        put_f64(&mut buf, 12.5);
        buf.push(TYPE_DOUBLE);

        let mut storage = Storage::new(buf);
        assert_eq!(storage.read_typed_string_list().unwrap(), ["veh0", "veh1"]);
        assert_approx_eq!(storage.read_typed_f64().unwrap(), 12.5);
        assert!(matches!(storage.read_typed_i32(), Err(Error::Protocol(_))));
    }

    #[test]
    fn truncated_input_is_a_protocol_error() {
        let mut storage = Storage::new(vec![0, 0, 0, 9, b'a']);
        assert!(matches!(storage.read_string(), Err(Error::Protocol(_))));

        let mut storage = Storage::new(vec![0xff, 0xff, 0xff, 0xff]);
        assert!(matches!(storage.read_string_list(), Err(Error::Protocol(_))));
    }
}
