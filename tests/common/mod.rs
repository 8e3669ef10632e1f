// Shared fixtures: bootstrap payloads, equity files, and a loopback HTTP responder.
#![allow(dead_code)]
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

pub const SESSION_ID: &str = "4F2E0A9C1B";

pub fn unit(doc: &Value) -> String {
    let text = serde_json::to_string(doc).expect("encode");
    format!("{};{text}", text.chars().count())
}

pub fn chart(columns: &[(&str, &str, Value)]) -> Value {
    let definitions = columns
        .iter()
        .map(|(name, tag, _)| json!({"fieldCaption": name, "dataType": tag}))
        .collect::<Vec<_>>();
    let storage = columns
        .iter()
        .map(|(_, _, refs)| json!({"valueIndices": refs}))
        .collect::<Vec<_>>();
    json!({"presModelHolder": {"genVizDataPresModel": {"paneColumnsData": {
        "vizDataColumns": definitions,
        "paneColumnsList": [{"vizPaneColumns": storage}]
    }}}})
}

/// A two-document bootstrap body with the state charts and two counties.
pub fn bootstrap_payload() -> String {
    let data = json!({"secondaryInfo": {"presModelMap": {
        "dataDictionary": {"presModelHolder": {"genDataDictionaryPresModel": {"dataSegments": {"0": {
            "dataColumns": [
                {"dataType": "integer", "dataValues": [365, 756, 7000000, 50000, 4000000, 9000000, 200000]},
                {"dataType": "real", "dataValues": [123456.5]},
                {"dataType": "cstring", "dataValues": ["Alpine", "Sierra"]}
            ]
        }}}}},
        "vizData": {"presModelHolder": {"genPresModelMapPresModel": {"presModelMap": {
            "County Admin Bar": chart(&[
                ("County", "cstring", json!([0, 1])),
                ("SUM(Dose Administered)", "integer", json!([0, 1])),
            ]),
            "Administered": chart(&[
                ("SUM(Dose Administered)", "integer", json!([2])),
                ("SUM(Daily Avg)", "real", json!([0])),
                ("SUM(Fully Vaccinated)", "integer", json!([3])),
                ("SUM(Partially Vaccinated)", "integer", json!([4])),
            ]),
            "Delivered": chart(&[("SUM(Doses Delivered)", "integer", json!([5]))]),
            "Delivered CDC": chart(&[("SUM(Doses Delivered)", "integer", json!([6]))])
        }}}}
    }}});
    format!("{}{}", unit(&json!({"sheetName": "Vaccine"})), unit(&data))
}

pub fn equity_file(latest: &str, rows: &[(&str, f64)]) -> String {
    let data = rows
        .iter()
        .map(|(category, value)| json!({"CATEGORY": category, "METRIC_VALUE": value}))
        .collect::<Vec<_>>();
    json!({"meta": {"LATEST_ADMIN_DATE": latest}, "data": data}).to_string()
}

/// Equity routes for each region under `/data/`.
pub fn equity_routes(regions: &[&str]) -> BTreeMap<String, String> {
    let mut routes = BTreeMap::new();
    for region in regions {
        routes.insert(
            format!("/data/race-ethnicity/vaccines_by_race_ethnicity_{region}.json"),
            equity_file("2021-02-13", &[("Latino", 0.18), ("White", 0.42)]),
        );
        routes.insert(
            format!("/data/age/vaccines_by_age_{region}.json"),
            equity_file("2021-02-13", &[("18-49", 0.3), ("65+", 0.5)]),
        );
        routes.insert(
            format!("/data/gender/vaccines_by_gender_{region}.json"),
            equity_file("2021-02-13", &[("Female", 0.55)]),
        );
    }
    routes
}

#[derive(Clone, Debug)]
pub struct Request {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Request {
    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or("")
    }
}

pub struct Reply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: 404,
            headers: Vec::new(),
            body: "not found".to_string(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

type Handler = dyn Fn(&Request) -> Reply + Send + Sync;

/// Serves each connection on its own thread and records every request.
pub struct Responder {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl Responder {
    pub fn start(handler: impl Fn(&Request) -> Reply + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler: Arc<Handler> = Arc::new(handler);
        let recorded = Arc::clone(&requests);
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let handler = Arc::clone(&handler);
                let recorded = Arc::clone(&recorded);
                std::thread::spawn(move || serve_one(stream, handler.as_ref(), &recorded));
            }
        });
        Self { addr, requests }
    }

    /// Dashboard session routes plus the given equity routes.
    pub fn tableau(view: &str, subview: &str, equity: BTreeMap<String, String>) -> Self {
        let view_path = format!("/interactive/views/{view}/{subview}");
        let bootstrap_path =
            format!("/vizql/w/{view}/v/{subview}/bootstrapSession/sessions/{SESSION_ID}");
        Self::start(move |request| {
            let path = request.path();
            if request.method == "GET" && path == view_path {
                Reply::ok("<html></html>").with_header("X-Session-Id", SESSION_ID)
            } else if request.method == "POST" && path == bootstrap_path {
                Reply::ok(bootstrap_payload())
            } else if let Some(body) = equity.get(path) {
                Reply::ok(body.clone())
            } else {
                Reply::not_found()
            }
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().expect("lock").clone()
    }
}

fn serve_one(stream: TcpStream, handler: &Handler, recorded: &Mutex<Vec<Request>>) {
    let Ok(request) = read_request(&stream) else {
        return;
    };
    let reply = handler(&request);
    recorded.lock().expect("lock").push(request);

    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        reply.status,
        if reply.status == 200 { "OK" } else { "Not Found" },
        reply.body.len()
    );
    for (name, value) in &reply.headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    head.push_str("\r\n");
    let mut stream = stream;
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(reply.body.as_bytes());
    let _ = stream.flush();
}

fn read_request(stream: &TcpStream) -> std::io::Result<Request> {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line)?;
    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let target = parts.next().unwrap_or("").to_string();

    let mut headers = Vec::new();
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header)? == 0 {
            break;
        }
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(name, _)| name == "content-length")
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0; length];
    reader.read_exact(&mut body)?;
    Ok(Request {
        method,
        target,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}
