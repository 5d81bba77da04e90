use serde_json::Value;

use crate::error::{HydroError, SoilQueryError};
use crate::geometry::wkt::polygon_to_wkt;

use super::query::{build_query, SDA_RESPONSE_FORMAT};
use super::response::resolve_hsg;

/// Environment variable holding the soil database endpoint URL.
pub const SDA_ENDPOINT_VAR: &str = "SDA_ENDPOINT";

/// Runs a SQL query against the soil database and returns the raw JSON response.
pub trait SoilDataSource {
    fn fetch_table(&self, sql: &str) -> Result<Value, SoilQueryError>;
}

/// Soil Data Access client: form-encoded POST, one request per query, no retries.
pub struct SdaClient {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl SdaClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, SoilQueryError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("hydrocad-gis/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SoilQueryError::Client)?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

impl SoilDataSource for SdaClient {
    fn fetch_table(&self, sql: &str) -> Result<Value, SoilQueryError> {
        log::info!("Querying soil database at {}", self.endpoint);
        let unreachable = |source| SoilQueryError::Unreachable {
            endpoint: self.endpoint.clone(),
            source,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("format", SDA_RESPONSE_FORMAT), ("query", sql)])
            .send()
            .map_err(unreachable)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SoilQueryError::HttpStatus {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }
        let body = response.text().map_err(unreachable)?;
        serde_json::from_str(&body).map_err(|err| {
            SoilQueryError::MalformedResponse(format!("response is not JSON: {}", err))
        })
    }
}

/// Hydrologic soil group values of the map units under a polygon, in response row order.
pub fn resolve_polygon_hsg(
    source: &impl SoilDataSource,
    geometry: &geojson::Geometry,
) -> Result<Vec<String>, HydroError> {
    let wkt = polygon_to_wkt(geometry)?;
    let sql = build_query(&wkt);
    log::debug!("Soil query: {}", sql);

    let response = source.fetch_table(&sql)?;
    let groups = resolve_hsg(&response)?;
    if groups.is_empty() {
        log::info!("No soil data found for the given polygon");
    } else {
        log::info!("Resolved {} hydrologic soil group value(s)", groups.len());
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread::{self, JoinHandle};

    use serde_json::json;

    use super::*;

    /// Replays a canned response and records the SQL it was asked to run.
    struct CannedSource {
        response: Result<Value, ()>,
        queries: RefCell<Vec<String>>,
    }

    impl CannedSource {
        fn new(response: Result<Value, ()>) -> Self {
            Self {
                response,
                queries: RefCell::new(Vec::new()),
            }
        }
    }

    impl SoilDataSource for CannedSource {
        fn fetch_table(&self, sql: &str) -> Result<Value, SoilQueryError> {
            self.queries.borrow_mut().push(sql.to_string());
            self.response.clone().map_err(|_| SoilQueryError::HttpStatus {
                endpoint: "https://sda.test/post.rest".to_string(),
                status: 503,
            })
        }
    }

    fn triangle() -> geojson::Geometry {
        geojson::Geometry::new(geojson::Value::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![4.0, 0.0],
            vec![4.0, 3.0],
        ]]))
    }

    #[test]
    fn test_resolve_polygon_hsg() {
        let source = CannedSource::new(Ok(json!({
            "Table": [["mukey", "muname", "hydgrp"], ["123", "Soil A", "B"], ["124", "Soil B", null]]
        })));
        let groups = resolve_polygon_hsg(&source, &triangle()).unwrap();

        assert_eq!(vec!["B".to_string()], groups);
        let queries = source.queries.borrow();
        assert_eq!(1, queries.len());
        assert!(queries[0].contains("'POLYGON((0 0, 4 0, 4 3, 0 0))'"));
    }

    #[test]
    fn test_resolve_polygon_hsg_invalid_geometry_sends_nothing() {
        let source = CannedSource::new(Ok(json!({"Table": []})));
        let point = geojson::Geometry::new(geojson::Value::Point(vec![0.0, 0.0]));
        let err = resolve_polygon_hsg(&source, &point).unwrap_err();

        assert_eq!("InvalidGeometry", err.kind());
        assert!(source.queries.borrow().is_empty());
    }

    #[test]
    fn test_resolve_polygon_hsg_upstream_failure() {
        let source = CannedSource::new(Err(()));
        let err = resolve_polygon_hsg(&source, &triangle()).unwrap_err();
        assert_eq!("HttpStatus", err.kind());
        assert_eq!(502, err.status_code());
    }

    #[test]
    fn test_resolve_polygon_hsg_missing_column() {
        let source = CannedSource::new(Ok(json!({"Table": [["mukey"], ["1"]]})));
        let err = resolve_polygon_hsg(&source, &triangle()).unwrap_err();
        assert_eq!("MissingColumn", err.kind());
    }

    /// Raw request line, headers and body as received by the local server.
    fn read_request(stream: &TcpStream) -> String {
        let mut reader = BufReader::new(stream);
        let mut request = String::new();
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if line.is_empty() || line == "\r\n" {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap();
                }
            }
            request.push_str(&line);
        }
        let mut body = vec![0; content_length];
        reader.read_exact(&mut body).unwrap();
        request.push_str("\r\n");
        request.push_str(&String::from_utf8(body).unwrap());
        request
    }

    /// Answer a single request on a local port with a canned response. The handle yields the
    /// request that was received.
    fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!(
            "http://{}/tabular/post.rest",
            listener.local_addr().unwrap()
        );
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&stream);
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            request
        });
        (endpoint, handle)
    }

    #[test]
    fn test_sda_client_posts_form() {
        let (endpoint, server) = serve_once("200 OK", r#"{"Table": [["hydgrp"], ["B"]]}"#);
        let client = SdaClient::new(endpoint).unwrap();
        let table = client.fetch_table("SELECT 1").unwrap();
        assert_eq!(json!({"Table": [["hydgrp"], ["B"]]}), table);

        let request = server.join().unwrap();
        let lowercase = request.to_lowercase();
        assert!(request.starts_with("POST /tabular/post.rest "));
        assert!(lowercase.contains("content-type: application/x-www-form-urlencoded"));
        assert!(request.ends_with("\r\n\r\nformat=JSON%2BCOLUMNHEADERS&query=SELECT+1"));
    }

    #[test]
    fn test_sda_client_http_status() {
        let (endpoint, server) = serve_once("503 Service Unavailable", "busy");
        let client = SdaClient::new(endpoint.clone()).unwrap();
        let err = client.fetch_table("SELECT 1").unwrap_err();
        server.join().unwrap();
        match err {
            SoilQueryError::HttpStatus {
                endpoint: reported,
                status,
            } => {
                assert_eq!(endpoint, reported);
                assert_eq!(503, status);
            }
            other => panic!("Expected an HTTP status error, got {:?}", other),
        }
    }

    #[test]
    fn test_sda_client_non_json_body() {
        let (endpoint, server) = serve_once("200 OK", "<html>maintenance</html>");
        let client = SdaClient::new(endpoint).unwrap();
        let err = client.fetch_table("SELECT 1").unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, SoilQueryError::MalformedResponse(_)));
    }

    #[test]
    fn test_sda_client_unreachable() {
        // Bind then release a port so nothing is listening on it.
        let address = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let client = SdaClient::new(format!("http://{}/tabular/post.rest", address)).unwrap();
        let err = client.fetch_table("SELECT 1").unwrap_err();
        assert!(matches!(err, SoilQueryError::Unreachable { .. }));
    }

    #[test]
    fn test_resolve_polygon_hsg_over_http() {
        let (endpoint, server) = serve_once(
            "200 OK",
            r#"{"Table": [["mukey", "muname", "hydgrp"], ["123", "Soil A", "B"], ["124", "Soil B", null]]}"#,
        );
        let client = SdaClient::new(endpoint).unwrap();
        let groups = resolve_polygon_hsg(&client, &triangle()).unwrap();
        assert_eq!(vec!["B".to_string()], groups);

        let request = server.join().unwrap();
        assert!(request.contains("SDA_Get_Mupolygon_From_Geometry"));
    }
}
