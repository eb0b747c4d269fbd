//! A blocking client for SUMO's TraCI protocol.

use self::codec::{Message, Storage};
use self::constants::*;
use crate::config::SimulatorConfig;
use crate::control::{SimulationControl, SpeedReading};
use crate::{Error, Result};
use log::{debug, info, trace, warn};
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::path::Path;
use std::process::{Child, Command};
use std::time::Duration;

mod codec;
mod constants;

/// A connection to a TraCI server, optionally owning the simulator process behind it.
pub struct TraciClient {
    /// The socket to the server.
    stream: TcpStream,
    /// The simulator process, if this client launched it.
    child: Option<Child>,
    /// Whether the close command has been sent.
    closed: bool,
}

impl TraciClient {
    /// Connects to an already running TraCI server.
    pub fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr).map_err(|err| Error::Connect {
            addr: addr.into(),
            reason: err.to_string(),
        })?;
        Self::from_stream(stream, None)
    }

    /// Launches the simulator described by `config` and connects to it.
    ///
    /// # Parameters
    /// * `config` - What to launch and where to reach it.
    /// * `home` - The simulator's installation root, used to locate the binary.
    pub fn launch(config: &SimulatorConfig, home: &Path) -> Result<Self> {
        let port = match config.port {
            Some(port) => port,
            None => free_port(&config.host)?,
        };
        let binary = config.resolve_binary(home);
        info!("Launching {} on port {}", binary.display(), port);
        let mut child = Command::new(&binary)
            .args(config.command_args(port))
            .spawn()
            .map_err(|source| Error::Launch {
                binary: binary.display().to_string(),
                source,
            })?;

        let addr = format!("{}:{}", config.host, port);
        match connect_with_retries(&addr, config.connect_retries, config.retry_delay(), &mut child) {
            Ok(stream) => Self::from_stream(stream, Some(child)),
            Err(err) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(err)
            }
        }
    }

    fn from_stream(stream: TcpStream, child: Option<Child>) -> Result<Self> {
        stream.set_nodelay(true)?;
        let mut client = Self {
            stream,
            child,
            closed: false,
        };
        let (api, name) = client.version()?;
        info!("Connected to {} (TraCI API {})", name, api);
        if api > TRACI_VERSION {
            warn!(
                "Server speaks TraCI API {} but this client was written for {}",
                api, TRACI_VERSION
            );
        }
        Ok(client)
    }

    /// Gets the server's API version and identification string.
    pub fn version(&mut self) -> Result<(i32, String)> {
        let mut storage = self.send_command(CMD_GETVERSION, &[])?;
        storage.read_length()?;
        let id = storage.read_u8()?;
        if id != CMD_GETVERSION {
            return Err(Error::Protocol(format!(
                "Received version response 0x{:02x}",
                id
            )));
        }
        Ok((storage.read_i32()?, storage.read_string()?))
    }

    /// Sends a single command and checks its status response.
    /// Returns the rest of the reply.
    fn send_command(&mut self, id: u8, content: &[u8]) -> Result<Storage> {
        let mut message = Message::new();
        message.push(id, content);
        trace!("Sending command 0x{:02x} ({} bytes)", id, content.len());
        self.stream.write_all(&message.to_bytes())?;

        let mut storage = self.receive()?;
        for &command in message.commands() {
            storage.read_length()?;
            let answered = storage.read_u8()?;
            let result = storage.read_u8()?;
            let description = storage.read_string()?;
            if answered != command {
                return Err(Error::Protocol(format!(
                    "Received answer 0x{:02x} for command 0x{:02x}",
                    answered, command
                )));
            }
            match result {
                RTYPE_OK => {}
                RTYPE_NOTIMPLEMENTED => {
                    return Err(Error::Command {
                        command,
                        description: format!("Not implemented: {}", description),
                    })
                }
                RTYPE_ERR => return Err(Error::Command { command, description }),
                other => {
                    return Err(Error::Protocol(format!(
                        "Unknown result 0x{:02x} for command 0x{:02x}",
                        other, command
                    )))
                }
            }
        }
        Ok(storage)
    }

    /// Reads one message from the server.
    fn receive(&mut self) -> Result<Storage> {
        let mut header = [0; 4];
        self.stream.read_exact(&mut header)?;
        let len = i32::from_be_bytes(header);
        let body_len = usize::try_from(len)
            .ok()
            .and_then(|len| len.checked_sub(4))
            .ok_or_else(|| Error::Protocol(format!("Invalid message length {}", len)))?;
        let mut body = vec![0; body_len];
        self.stream.read_exact(&mut body)?;
        Ok(Storage::new(body))
    }

    /// Requests a variable, returning the reply positioned at the typed value.
    fn get_variable(&mut self, command: u8, var: u8, object_id: &str) -> Result<Storage> {
        let mut storage = self.send_command(command, &codec::get_variable(var, object_id))?;
        storage.read_length()?;
        let response = storage.read_u8()?;
        let returned_var = storage.read_u8()?;
        storage.read_string()?;
        if response != command.wrapping_add(RESPONSE_OFFSET) || returned_var != var {
            return Err(Error::Protocol(format!(
                "Received response 0x{:02x}/0x{:02x} for request 0x{:02x}/0x{:02x}",
                response, returned_var, command, var
            )));
        }
        Ok(storage)
    }
}

impl SimulationControl for TraciClient {
    fn step(&mut self) -> Result<()> {
        let mut content = vec![TYPE_DOUBLE];
        codec::put_f64(&mut content, 0.0);
        let mut storage = self.send_command(CMD_SIMSTEP, &content)?;
        match storage.read_i32()? {
            0 => Ok(()),
            count => Err(Error::Protocol(format!(
                "Received {} subscription results without subscribing",
                count
            ))),
        }
    }

    fn vehicle_ids(&mut self) -> Result<Vec<String>> {
        self.get_variable(CMD_GET_VEHICLE_VARIABLE, TRACI_ID_LIST, "")?
            .read_typed_string_list()
    }

    fn time(&mut self) -> Result<f64> {
        self.get_variable(CMD_GET_SIM_VARIABLE, VAR_TIME, "")?
            .read_typed_f64()
    }

    fn min_expected_vehicles(&mut self) -> Result<i32> {
        self.get_variable(CMD_GET_SIM_VARIABLE, VAR_MIN_EXPECTED_VEHICLES, "")?
            .read_typed_i32()
    }

    fn vehicle_speed(&mut self, vehicle_id: &str) -> Result<SpeedReading> {
        match self.get_variable(CMD_GET_VEHICLE_VARIABLE, VAR_SPEED, vehicle_id) {
            Ok(mut storage) => Ok(SpeedReading::Speed(storage.read_typed_f64()?)),
            Err(Error::Command { description, .. }) => {
                debug!("Speed of '{}' unavailable: {}", vehicle_id, description);
                Ok(SpeedReading::Unavailable)
            }
            Err(err) => Err(err),
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let result = self.send_command(CMD_CLOSE, &[]).map(|_| ());
        let _ = self.stream.shutdown(Shutdown::Both);
        if let Some(mut child) = self.child.take() {
            if result.is_err() {
                let _ = child.kill();
            }
            let status = child.wait()?;
            debug!("Simulator exited with {}", status);
        }
        result
    }
}

impl Drop for TraciClient {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Asks the OS for a port on `host` that is currently free.
fn free_port(host: &str) -> Result<u16> {
    Ok(TcpListener::bind((host, 0))?.local_addr()?.port())
}

/// Connects to a freshly launched simulator, which may take a while to start listening.
fn connect_with_retries(
    addr: &str,
    retries: u32,
    delay: Duration,
    child: &mut Child,
) -> Result<TcpStream> {
    let mut attempt = 0;
    loop {
        if let Some(status) = child.try_wait()? {
            return Err(Error::Connect {
                addr: addr.into(),
                reason: format!("TraCI server already finished ({})", status),
            });
        }
        match TcpStream::connect(addr) {
            Ok(stream) => return Ok(stream),
            Err(err) if attempt < retries => {
                attempt += 1;
                warn!(
                    "Could not connect to TraCI server at {} ({}), retrying in {:?}",
                    addr, err, delay
                );
                std::thread::sleep(delay);
            }
            Err(err) => {
                return Err(Error::Connect {
                    addr: addr.into(),
                    reason: err.to_string(),
                })
            }
        }
    }
}
