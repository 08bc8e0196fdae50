use anyhow::{anyhow, bail, Context, Result};

/// Host and port both roles fall back to when none is given.
pub const DEFAULT_ADDR: &str = "127.0.0.1:5050";

const CLIENT_USAGE: &str = "Usage: app client [--server <host:port>] [--width <px>] \
[--height <px>] [--fps <n>] [--history <frames>] [--verbose]\n\nA positional \
<host:port> is also accepted.";

const SERVER_USAGE: &str = "Usage: app server [--listen <host:port>] \
[--threshold <0-255>] [--verbose]\n\nA positional <host:port> is also accepted.";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub server_addr: String,
    pub width: usize,
    pub height: usize,
    pub fps: u32,
    pub history_capacity: usize,
    pub verbose: bool,
}

impl ClientConfig {
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut server_addr: Option<String> = None;
        let mut width: Option<usize> = None;
        let mut height: Option<usize> = None;
        let mut fps: Option<u32> = None;
        let mut history_capacity: Option<usize> = None;
        let mut verbose = false;

        let mut idx = 2;
        while idx < args.len() {
            match args[idx].as_str() {
                "--server" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--server requires a value"))?
                        .clone();
                    server_addr = Some(value);
                    idx += 1;
                }
                "--width" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--width requires a value"))?
                        .parse::<usize>()
                        .with_context(|| "--width must be a positive integer".to_string())?;
                    if value == 0 {
                        bail!("--width must be a positive integer");
                    }
                    width = Some(value);
                    idx += 1;
                }
                "--height" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--height requires a value"))?
                        .parse::<usize>()
                        .with_context(|| "--height must be a positive integer".to_string())?;
                    if value == 0 {
                        bail!("--height must be a positive integer");
                    }
                    height = Some(value);
                    idx += 1;
                }
                "--fps" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--fps requires a value"))?
                        .parse::<u32>()
                        .with_context(|| "--fps must be an integer between 1 and 240".to_string())?;
                    if !(1..=240).contains(&value) {
                        bail!("--fps must be an integer between 1 and 240");
                    }
                    fps = Some(value);
                    idx += 1;
                }
                "--history" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--history requires a value"))?
                        .parse::<usize>()
                        .with_context(|| "--history must be a positive integer".to_string())?;
                    if value == 0 {
                        bail!("--history must be at least 1");
                    }
                    history_capacity = Some(value);
                    idx += 1;
                }
                "--verbose" => {
                    verbose = true;
                    idx += 1;
                }
                "--help" | "-h" => {
                    bail!(CLIENT_USAGE);
                }
                arg if arg.starts_with('-') => {
                    bail!("Unrecognised flag: {arg}\n{CLIENT_USAGE}");
                }
                other => {
                    if server_addr.is_some() {
                        bail!("Unexpected argument: {other}\n{CLIENT_USAGE}");
                    }
                    server_addr = Some(other.to_string());
                    idx += 1;
                }
            }
        }

        Ok(Self {
            server_addr: server_addr.unwrap_or_else(|| DEFAULT_ADDR.to_string()),
            width: width.unwrap_or(640),
            height: height.unwrap_or(480),
            fps: fps.unwrap_or(15),
            history_capacity: history_capacity.unwrap_or(128),
            verbose,
        })
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub threshold: u8,
    pub verbose: bool,
}

impl ServerConfig {
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut listen_addr: Option<String> = None;
        let mut threshold: Option<u8> = None;
        let mut verbose = false;

        let mut idx = 2;
        while idx < args.len() {
            match args[idx].as_str() {
                "--listen" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--listen requires a value"))?
                        .clone();
                    listen_addr = Some(value);
                    idx += 1;
                }
                "--threshold" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--threshold requires a value"))?
                        .parse::<i64>()
                        .with_context(|| {
                            "--threshold must be an integer between 0 and 255".to_string()
                        })?;
                    if !(0..=255).contains(&value) {
                        bail!("--threshold must be an integer between 0 and 255");
                    }
                    threshold = Some(value as u8);
                    idx += 1;
                }
                "--verbose" => {
                    verbose = true;
                    idx += 1;
                }
                "--help" | "-h" => {
                    bail!(SERVER_USAGE);
                }
                arg if arg.starts_with('-') => {
                    bail!("Unrecognised flag: {arg}\n{SERVER_USAGE}");
                }
                other => {
                    if listen_addr.is_some() {
                        bail!("Unexpected argument: {other}\n{SERVER_USAGE}");
                    }
                    listen_addr = Some(other.to_string());
                    idx += 1;
                }
            }
        }

        Ok(Self {
            listen_addr: listen_addr.unwrap_or_else(|| DEFAULT_ADDR.to_string()),
            threshold: threshold.unwrap_or(200),
            verbose,
        })
    }
}
