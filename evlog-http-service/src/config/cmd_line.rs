use std::env;

use super::AppConfig;

/// Параметры коммандной строки
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CmdLineParams {
    /// `-host` _ip/dns_ - Переопределить хост
    pub web_server_host: Option<String>,

    /// `-port` _u16_ - Переопределить порт
    pub web_server_port: Option<u16>,

    /// `-wd` _dir_ - Переопределить текущий каталог
    pub work_dir: Option<String>,

    /// `-file` _path_ - Переопределить файл потока
    pub file: Option<String>,
}

impl CmdLineParams {
    /// Парсинг коммандной строки
    pub fn from_cmd_line() -> Self {
        Self::parse(env::args())
    }

    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Self {
        let cmdl = CmdLineParams::default();
        args.into_iter()
            .fold((cmdl, "state"), |(cmdl, state), arg| match state {
                "state" => match arg.as_str() {
                    "-host" => (cmdl, "-host"),
                    "-port" => (cmdl, "-port"),
                    "-work.dir" | "-wd" => (cmdl, "-wd"),
                    "-file" => (cmdl, "-file"),
                    _ => (cmdl, state),
                },
                "-host" => (CmdLineParams { web_server_host: Some(arg), ..cmdl }, "state"),
                "-port" => match arg.parse::<u16>() {
                    Ok(port) => (CmdLineParams { web_server_port: Some(port), ..cmdl }, "state"),
                    Err(err) => {
                        log::warn!("ignore -port {arg}: {err}");
                        (cmdl, "state")
                    }
                },
                "-wd" => (CmdLineParams { work_dir: Some(arg), ..cmdl }, "state"),
                "-file" => (CmdLineParams { file: Some(arg), ..cmdl }, "state"),
                _ => (cmdl, state),
            })
            .0
    }

    /// Переопределить параметры
    pub fn apply(&self, conf: AppConfig) -> AppConfig {
        AppConfig {
            work_dir: self.work_dir.clone().unwrap_or(conf.work_dir),
            web_server: super::WebServer {
                host: self.web_server_host.clone().unwrap_or(conf.web_server.host),
                port: self.web_server_port.unwrap_or(conf.web_server.port),
            },
            stream: super::StreamConfig {
                file: self.file.clone().unwrap_or(conf.stream.file),
                ..conf.stream
            },
        }
    }
}

#[test]
fn test_parse() {
    let args = ["evlog-http-service", "-port", "9090", "-wd", "/tmp", "-file", "a.bin", "-host"];
    let params = CmdLineParams::parse(args.iter().map(|s| s.to_string()));
    assert_eq!(
        params,
        CmdLineParams {
            web_server_host: None,
            web_server_port: Some(9090),
            work_dir: Some("/tmp".to_string()),
            file: Some("a.bin".to_string()),
        }
    );

    let conf = params.apply(AppConfig::default());
    assert_eq!(conf.web_server.port, 9090);
    assert_eq!(conf.web_server.host, "127.0.0.1");
    assert_eq!(conf.stream.file, "a.bin");
}

#[test]
fn test_bad_port_ignored() {
    let params = CmdLineParams::parse(["-port", "http"].iter().map(|s| s.to_string()));
    assert_eq!(params.web_server_port, None);
}
