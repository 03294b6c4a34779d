//! Integration tests for carimbo-proxy

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    /// Command isolated from the user's config and the ambient PORT
    fn proxy(temp: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("carimbo-proxy");
        cmd.env("CARIMBO_PROXY_CONFIG", temp.path().join("config.toml"))
            .env_remove("PORT")
            .env_remove("CARIMBO_PROXY_HOST")
            .env_remove("RUST_LOG");
        cmd
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        proxy(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("caching proxy"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        proxy(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("carimbo-proxy"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        proxy(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        proxy(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[upstream]"))
            .stdout(predicate::str::contains("carimbo.wasm"));
    }

    #[test]
    fn config_show_json() {
        let temp = TempDir::new().unwrap();
        let output = proxy(&temp)
            .args(["config", "show", "--json"])
            .output()
            .unwrap();

        assert!(output.status.success());
        let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(value["runtime"]["script_entry"], "carimbo.js");
    }

    #[test]
    fn config_init_writes_file() {
        let temp = TempDir::new().unwrap();
        proxy(&temp)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration initialized"));

        assert!(temp.path().join("config.toml").exists());
    }

    #[test]
    fn invalid_config_fails_with_hint() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("config.toml"), "[server]\nport = \"x\"\n").unwrap();

        proxy(&temp)
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"))
            .stderr(predicate::str::contains("config init --force"));
    }

    #[test]
    fn completions_bash() {
        let temp = TempDir::new().unwrap();
        proxy(&temp)
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("carimbo-proxy"));
    }

    #[test]
    fn port_in_use_is_fatal() {
        let temp = TempDir::new().unwrap();
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        proxy(&temp)
            .env("PORT", port.to_string())
            .args(["serve", "--host", "127.0.0.1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to bind"));
    }

    #[test]
    fn invalid_host_is_rejected() {
        let temp = TempDir::new().unwrap();
        proxy(&temp)
            .args(["serve", "--host", "not-an-ip", "--port", "0"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid listen address"));
    }
}

mod serve_tests {
    use std::io::{Cursor, Read, Write};
    use std::net::TcpListener;
    use std::process::{Child, Command, Stdio};
    use std::time::{Duration, Instant};
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use zip::write::SimpleFileOptions;
    use zip::{ZipArchive, ZipWriter};

    /// Kills the server when the test ends, pass or fail
    struct Server(Child);

    impl Drop for Server {
        fn drop(&mut self) {
            let _ = self.0.kill();
            let _ = self.0.wait();
        }
    }

    fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(content).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn free_port() -> u16 {
        TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    fn start(upstream: &str, temp: &TempDir) -> (Server, String) {
        let config = temp.path().join("config.toml");
        std::fs::write(
            &config,
            format!(
                "[upstream]\nruntime_url = \"{0}/runtime/v{{version}}/WebAssembly.zip\"\n\
                 bundle_url = \"{0}/{{org}}/{{repo}}/archive/refs/tags/v{{release}}.zip\"\n",
                upstream
            ),
        )
        .unwrap();

        let port = free_port();
        let child = Command::new(env!("CARGO_BIN_EXE_carimbo-proxy"))
            .env("CARIMBO_PROXY_CONFIG", &config)
            .env("PORT", port.to_string())
            .env("CARIMBO_PROXY_HOST", "127.0.0.1")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();
        let server = Server(child);
        let base = format!("http://127.0.0.1:{}", port);

        let deadline = Instant::now() + Duration::from_secs(20);
        while std::net::TcpStream::connect(("127.0.0.1", port)).is_err() {
            assert!(Instant::now() < deadline, "server did not start");
            std::thread::sleep(Duration::from_millis(50));
        }
        (server, base)
    }

    fn get(url: &str) -> (u16, Option<String>, Vec<u8>) {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();
        let mut response = agent.get(url).call().unwrap();
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .map(|v| v.to_str().unwrap().to_string());
        let body = response.body_mut().read_to_vec().unwrap();
        (status, content_type, body)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn serves_runtime_and_bundle_end_to_end() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/runtime/v1.0.0/WebAssembly.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(zip_of(&[
                ("carimbo.js", b"console.log('carimbo')"),
                ("carimbo.wasm", b"\0asm"),
            ])))
            .expect(1)
            .mount(&upstream)
            .await;
        Mock::given(method("GET"))
            .and(path("/acme/widget/archive/refs/tags/v2.3.1.zip"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(zip_of(&[("widget-2.3.1/main.lua", b"return 42")])),
            )
            .mount(&upstream)
            .await;

        let temp = TempDir::new().unwrap();
        let uri = upstream.uri();
        let results = tokio::task::spawn_blocking(move || {
            let (_server, base) = start(&uri, &temp);
            vec![
                get(&format!("{}/1.0.0/carimbo.js", base)),
                get(&format!("{}/1.0.0/carimbo.wasm", base)),
                get(&format!("{}/1.0.0/acme/widget/2.3.1/bundle.zip", base)),
                get(&format!("{}/9.9.9/carimbo.js", base)),
            ]
        })
        .await
        .unwrap();

        let (status, content_type, body) = &results[0];
        assert_eq!(*status, 200);
        assert_eq!(content_type.as_deref(), Some("application/javascript"));
        assert_eq!(body, b"console.log('carimbo')");

        let (status, content_type, body) = &results[1];
        assert_eq!(*status, 200);
        assert_eq!(content_type.as_deref(), Some("application/wasm"));
        assert_eq!(body, b"\0asm");

        let (status, _, body) = &results[2];
        assert_eq!(*status, 200);
        let mut archive = ZipArchive::new(Cursor::new(body.clone())).unwrap();
        let mut main = String::new();
        archive
            .by_name("main.lua")
            .unwrap()
            .read_to_string(&mut main)
            .unwrap();
        assert_eq!(main, "return 42");

        // Unknown release: upstream 404 becomes a 500 with the error text
        let (status, _, body) = &results[3];
        assert_eq!(*status, 500);
        assert!(String::from_utf8_lossy(body).contains("9.9.9"));
    }
}
