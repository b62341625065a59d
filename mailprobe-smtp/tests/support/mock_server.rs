//! Scriptable SMTP server on a loopback port.
#![allow(dead_code)]

use std::{
    fmt::Write,
    net::SocketAddr,
    sync::Arc,
    time::Duration,
};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::Mutex,
};

/// What the server saw, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmtpCommand {
    Ehlo(String),
    Auth(String),
    MailFrom(String),
    RcptTo(String),
    Data,
    MessageContent(String),
    Quit,
    Other(String),
}

#[derive(Debug, Clone)]
struct Reply {
    code: u16,
    message: String,
}

impl Reply {
    fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        format!("{} {}\r\n", self.code, self.message).into_bytes()
    }
}

#[derive(Debug, Clone)]
struct Script {
    greeting: Reply,
    capabilities: Vec<String>,
    auth: Reply,
    mail_from: Reply,
    rcpt_to: Reply,
    data: Reply,
    data_end: Reply,
    hang_after_greeting: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            greeting: Reply::new(220, "mock ESMTP"),
            capabilities: vec!["mock.example.com".to_string(), "SIZE 10000".to_string()],
            auth: Reply::new(235, "Authentication successful"),
            mail_from: Reply::new(250, "OK"),
            rcpt_to: Reply::new(250, "OK"),
            data: Reply::new(354, "End data with <CR><LF>.<CR><LF>"),
            data_end: Reply::new(250, "OK: queued"),
            hang_after_greeting: false,
        }
    }
}

fn ehlo_reply(capabilities: &[String]) -> Vec<u8> {
    let mut reply = String::new();
    let last = capabilities.len().saturating_sub(1);
    for (i, capability) in capabilities.iter().enumerate() {
        let separator = if i == last { ' ' } else { '-' };
        let _ = write!(reply, "250{separator}{capability}\r\n");
    }
    reply.into_bytes()
}

pub struct MockSmtpServer {
    addr: SocketAddr,
    commands: Arc<Mutex<Vec<SmtpCommand>>>,
}

impl MockSmtpServer {
    pub fn builder() -> MockSmtpServerBuilder {
        MockSmtpServerBuilder {
            script: Script::default(),
        }
    }

    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn commands(&self) -> Vec<SmtpCommand> {
        self.commands.lock().await.clone()
    }

    async fn handle_client(
        mut stream: TcpStream,
        script: Arc<Script>,
        commands: Arc<Mutex<Vec<SmtpCommand>>>,
    ) -> std::io::Result<()> {
        let (reader, mut writer) = stream.split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        writer.write_all(&script.greeting.to_bytes()).await?;

        if script.hang_after_greeting {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            return Ok(());
        }

        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                return Ok(());
            }

            let input = line.trim_end().to_string();
            let (verb, rest) = input.split_once(' ').unwrap_or((input.as_str(), ""));

            let (reply, command) = match verb.to_ascii_uppercase().as_str() {
                "EHLO" => (
                    ehlo_reply(&script.capabilities),
                    SmtpCommand::Ehlo(rest.to_string()),
                ),
                "AUTH" => (script.auth.to_bytes(), SmtpCommand::Auth(rest.to_string())),
                "MAIL" => (
                    script.mail_from.to_bytes(),
                    SmtpCommand::MailFrom(rest.to_string()),
                ),
                "RCPT" => (
                    script.rcpt_to.to_bytes(),
                    SmtpCommand::RcptTo(rest.to_string()),
                ),
                "DATA" => (script.data.to_bytes(), SmtpCommand::Data),
                "QUIT" => {
                    commands.lock().await.push(SmtpCommand::Quit);
                    writer.write_all(&Reply::new(221, "Bye").to_bytes()).await?;
                    return Ok(());
                }
                _ => (
                    Reply::new(502, "Command not implemented").to_bytes(),
                    SmtpCommand::Other(input.clone()),
                ),
            };

            let is_data = command == SmtpCommand::Data;
            commands.lock().await.push(command);
            writer.write_all(&reply).await?;

            if is_data && script.data.code == 354 {
                let mut content = String::new();
                loop {
                    line.clear();
                    if reader.read_line(&mut line).await? == 0 {
                        return Ok(());
                    }
                    if line == ".\r\n" {
                        break;
                    }
                    content.push_str(&line);
                }

                commands
                    .lock()
                    .await
                    .push(SmtpCommand::MessageContent(content));
                writer.write_all(&script.data_end.to_bytes()).await?;
            }
        }
    }
}

pub struct MockSmtpServerBuilder {
    script: Script,
}

impl MockSmtpServerBuilder {
    pub fn with_greeting(mut self, code: u16, message: &str) -> Self {
        self.script.greeting = Reply::new(code, message);
        self
    }

    pub fn with_capabilities(mut self, capabilities: &[&str]) -> Self {
        self.script.capabilities = capabilities.iter().map(ToString::to_string).collect();
        self
    }

    pub fn with_auth_response(mut self, code: u16, message: &str) -> Self {
        self.script.auth = Reply::new(code, message);
        self
    }

    pub fn with_rcpt_to_response(mut self, code: u16, message: &str) -> Self {
        self.script.rcpt_to = Reply::new(code, message);
        self
    }

    pub fn with_data_end_response(mut self, code: u16, message: &str) -> Self {
        self.script.data_end = Reply::new(code, message);
        self
    }

    pub const fn hang_after_greeting(mut self) -> Self {
        self.script.hang_after_greeting = true;
        self
    }

    pub async fn build(self) -> std::io::Result<MockSmtpServer> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let script = Arc::new(self.script);
        let commands = Arc::new(Mutex::new(Vec::new()));

        let server_commands = Arc::clone(&commands);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let script = Arc::clone(&script);
                let commands = Arc::clone(&server_commands);
                tokio::spawn(async move {
                    let _ = MockSmtpServer::handle_client(stream, script, commands).await;
                });
            }
        });

        Ok(MockSmtpServer { addr, commands })
    }
}
