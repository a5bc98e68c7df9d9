//! Local stand-ins for network devices.
//!
//! A [`FakeDevice`] is a small `sh` script that behaves like a device CLI on
//! the other end of an ssh session: it prints a prompt, echoes each input
//! line, answers the commands it knows, and exits on `exit`. Running it as a
//! real child process exercises the same pipes, timeouts, and kills as the
//! ssh client does.

use std::collections::HashMap;

use tokio::process::Command;

use crate::error::TransportError;
use crate::transport::{SessionTarget, Transport};

/// Scripted device behavior.
#[derive(Debug, Clone)]
pub struct FakeDevice {
    script: String,
}

impl FakeDevice {
    /// Device with `prompt` that answers nothing yet.
    pub fn new(prompt: &str) -> FakeDeviceBuilder {
        FakeDeviceBuilder {
            prompt: prompt.to_string(),
            banner: None,
            delay: None,
            answers: Vec::new(),
        }
    }

    /// Client that fails to connect, like ssh against a closed port.
    pub fn unreachable(address: &str) -> Self {
        Self {
            script: format!(
                "printf '%s\\n' {} >&2; exit 255",
                quote(&format!(
                    "ssh: connect to host {address} port 22: Connection refused"
                ))
            ),
        }
    }

    /// Client that connects and then never answers.
    pub fn hung() -> Self {
        Self {
            script: "exec sleep 30".to_string(),
        }
    }

    /// The shell script.
    pub fn script(&self) -> &str {
        &self.script
    }
}

/// Builder for an answering [`FakeDevice`].
#[derive(Debug, Clone)]
pub struct FakeDeviceBuilder {
    prompt: String,
    banner: Option<String>,
    delay: Option<f32>,
    answers: Vec<Answer>,
}

#[derive(Debug, Clone)]
struct Answer {
    command: String,
    output: String,
    hang_up: bool,
}

impl FakeDeviceBuilder {
    /// Print `text` before the first prompt.
    pub fn banner(mut self, text: &str) -> Self {
        self.banner = Some(text.to_string());
        self
    }

    /// Sleep before printing the first prompt.
    pub fn delay(mut self, seconds: f32) -> Self {
        self.delay = Some(seconds);
        self
    }

    /// Answer `command` with `output`.
    pub fn answer(mut self, command: &str, output: &str) -> Self {
        self.answers.push(Answer {
            command: command.to_string(),
            output: output.to_string(),
            hang_up: false,
        });
        self
    }

    /// Print `output` for `command`, then drop the connection like a
    /// remote disconnect (exit 255).
    pub fn hang_up_on(mut self, command: &str, output: &str) -> Self {
        self.answers.push(Answer {
            command: command.to_string(),
            output: output.to_string(),
            hang_up: true,
        });
        self
    }

    fn render(&self) -> String {
        let prompt = quote(&self.prompt);
        let mut script = String::new();

        if let Some(seconds) = self.delay {
            script.push_str(&format!("sleep {seconds}\n"));
        }
        if let Some(banner) = &self.banner {
            script.push_str(&format!("printf '%s\\n' {}\n", quote(banner)));
        }
        script.push_str(&format!("printf '%s' {prompt}\n"));
        script.push_str("while IFS= read -r line; do\n");
        script.push_str("  printf '%s\\n' \"$line\"\n");
        script.push_str("  case \"$line\" in\n");
        script.push_str("    exit) exit 0 ;;\n");
        script.push_str("    'echo '*) printf '%s\\n' \"${line#echo }\" ;;\n");
        for answer in &self.answers {
            let hang_up = if answer.hang_up { "; exit 255" } else { "" };
            script.push_str(&format!(
                "    {}) printf '%s\\n' {}{hang_up} ;;\n",
                quote(&answer.command),
                quote(&answer.output)
            ));
        }
        script.push_str("  esac\n");
        script.push_str(&format!("  printf '%s' {prompt}\n"));
        script.push_str("done\n");
        script
    }
}

impl From<FakeDeviceBuilder> for FakeDevice {
    fn from(builder: FakeDeviceBuilder) -> Self {
        Self {
            script: builder.render(),
        }
    }
}

/// Single-quote `text` for `sh`.
fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

/// Transport that runs a [`FakeDevice`] script per hostname.
#[derive(Debug, Clone, Default)]
pub struct ShellTransport {
    devices: HashMap<String, FakeDevice>,
}

impl ShellTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `hostname` with `device`.
    pub fn with_device(mut self, hostname: &str, device: impl Into<FakeDevice>) -> Self {
        self.devices.insert(hostname.to_string(), device.into());
        self
    }
}

impl Transport for ShellTransport {
    fn command(&self, target: &SessionTarget<'_>) -> Result<Command, TransportError> {
        let device = self
            .devices
            .get(target.hostname)
            .ok_or_else(|| TransportError::Spawn {
                program: "sh".to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no fake device for {}", target.hostname),
                ),
            })?;

        let mut command = Command::new("sh");
        command.arg("-c").arg(device.script());
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn test_quote() {
        assert_eq!(quote("show clock"), "'show clock'");
        assert_eq!(quote("at '^' marker"), r"'at '\''^'\'' marker'");
    }

    #[tokio::test]
    async fn test_fake_device_hangs_up() {
        let device: FakeDevice = FakeDevice::new("R1#")
            .hang_up_on("show version", "Cisco IOS XE Software")
            .into();

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(device.script())
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .spawn()
            .unwrap();
        let mut stdin = child.stdin.take().unwrap();
        stdin.write_all(b"show version\nshow clock\n").await.unwrap();
        drop(stdin);

        let output = child.wait_with_output().await.unwrap();
        assert_eq!(output.status.code(), Some(255));
        assert_eq!(
            String::from_utf8(output.stdout).unwrap(),
            "R1#show version\nCisco IOS XE Software\n"
        );
    }

    #[tokio::test]
    async fn test_fake_device_answers() {
        let device: FakeDevice = FakeDevice::new("R1#")
            .answer("show clock", "12:00")
            .into();

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(device.script())
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .spawn()
            .unwrap();
        let mut stdin = child.stdin.take().unwrap();
        stdin
            .write_all(b"show clock\necho @@T@@\nexit\n")
            .await
            .unwrap();
        drop(stdin);

        let output = child.wait_with_output().await.unwrap();
        assert_eq!(
            String::from_utf8(output.stdout).unwrap(),
            "R1#show clock\n12:00\nR1#echo @@T@@\n@@T@@\nR1#exit\n"
        );
    }
}
