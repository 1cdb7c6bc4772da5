use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument};

use crate::feedback::tools::error::{RemoteError, Result};
use crate::feedback::tools::model::Params;
use crate::feedback::tools::transport::{Connection, Operation, Transport};
use crate::feedback::tools::xml::{self, XmlElement};

/// Namespace of the SOAP 1.1 envelope.
pub const ENVELOPE_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";
/// Default namespace of the survey service operations.
pub const DEFAULT_SERVICE_NAMESPACE: &str = "http://www.vovici.com/";

/// SOAP 1.1 transport over blocking HTTP.
///
/// The underlying client keeps cookies, so the session opened by `Login`
/// carries over to the calls that follow it.
#[derive(Debug, Clone)]
pub struct SoapTransport {
    client: Client,
    namespace: String,
}

impl SoapTransport {
    pub fn new(namespace: impl Into<String>) -> Result<Self> {
        let client = Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            namespace: namespace.into(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl Transport for SoapTransport {
    #[instrument(level = "debug", skip_all, fields(%operation, endpoint = %connection.endpoint))]
    fn call(
        &self,
        connection: &Connection,
        operation: Operation,
        params: &Params,
    ) -> std::result::Result<Option<XmlElement>, RemoteError> {
        let envelope = build_envelope(&self.namespace, operation, params)?;
        let response = self
            .client
            .post(&connection.endpoint)
            .timeout(connection.timeout)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", soap_action(&self.namespace, operation))
            .body(envelope)
            .send()
            .map_err(|err| RemoteError::Fault(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|err| RemoteError::Fault(err.to_string()))?;
        debug!(status = status.as_u16(), bytes = body.len(), "response received");

        parse_response(status, &body)
    }
}

/// Builds the request envelope with one element per parameter.
///
/// Parameter names become element names, so a name that is not a valid XML
/// element name is rejected with [`RemoteError::InvalidParameter`].
pub fn build_envelope(
    namespace: &str,
    operation: Operation,
    params: &Params,
) -> std::result::Result<String, RemoteError> {
    let mut body = String::new();
    for (name, value) in params.iter() {
        if !xml::is_element_name(name) {
            return Err(RemoteError::InvalidParameter(name.to_string()));
        }
        body.push_str(&format!(
            "<{name}>{}</{name}>",
            xml::escape(&value.to_string())
        ));
    }

    Ok(format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<soap:Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" "#,
            r#"xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:soap="{envelope}">"#,
            r#"<soap:Body><{operation} xmlns="{namespace}">{body}</{operation}></soap:Body>"#,
            r#"</soap:Envelope>"#
        ),
        envelope = ENVELOPE_NAMESPACE,
        operation = operation.name(),
        namespace = xml::escape(namespace),
        body = body,
    ))
}

fn soap_action(namespace: &str, operation: Operation) -> String {
    format!("\"{namespace}{}\"", operation.name())
}

/// Extracts the response element from a SOAP reply.
///
/// Faults are reported whatever the HTTP status. A non-success status
/// without a fault body is reported with its status line.
pub fn parse_response(
    status: StatusCode,
    body: &str,
) -> std::result::Result<Option<XmlElement>, RemoteError> {
    if body.trim().is_empty() {
        if status.is_success() {
            return Ok(None);
        }
        return Err(RemoteError::Fault(format!("HTTP {status}")));
    }

    let document = match xml::parse_document(body) {
        Ok(document) => document,
        Err(_) if !status.is_success() => {
            return Err(RemoteError::Fault(format!("HTTP {status}")));
        }
        Err(err) => return Err(RemoteError::Fault(format!("unreadable response: {err}"))),
    };

    let soap_body = match document.find("Body") {
        Some(soap_body) => soap_body,
        None if !status.is_success() => {
            return Err(RemoteError::Fault(format!("HTTP {status}")));
        }
        None => return Err(RemoteError::Fault("response has no SOAP body".to_string())),
    };

    if let Some(fault) = soap_body.child("Fault") {
        let reason = fault
            .child("faultstring")
            .map(|element| element.text.trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| "unknown fault".to_string());
        return Err(RemoteError::Fault(reason));
    }

    if !status.is_success() {
        return Err(RemoteError::Fault(format!("HTTP {status}")));
    }

    Ok(soap_body.children.first().cloned())
}
