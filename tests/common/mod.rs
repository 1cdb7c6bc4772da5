//! Scripted transport and payload builders shared by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use feedback_tools::config::ClientConfig;
use feedback_tools::error::RemoteError;
use feedback_tools::model::Params;
use feedback_tools::transport::{Connection, Operation, Transport};
use feedback_tools::xml::{XmlElement, parse_document};

pub type Reply = Result<Option<XmlElement>, RemoteError>;

/// Transport answering each operation from a queue of scripted replies.
/// Operations without a queued reply answer with an empty body.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: RefCell<HashMap<Operation, VecDeque<Reply>>>,
    calls: RefCell<Vec<(Operation, Params)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, operation: Operation, reply: Reply) {
        self.replies
            .borrow_mut()
            .entry(operation)
            .or_default()
            .push_back(reply);
    }

    pub fn calls(&self) -> Vec<(Operation, Params)> {
        self.calls.borrow().clone()
    }

    pub fn calls_to(&self, operation: Operation) -> Vec<Params> {
        self.calls
            .borrow()
            .iter()
            .filter(|(called, _)| *called == operation)
            .map(|(_, params)| params.clone())
            .collect()
    }
}

impl Transport for ScriptedTransport {
    fn call(&self, _connection: &Connection, operation: Operation, params: &Params) -> Reply {
        self.calls.borrow_mut().push((operation, params.clone()));
        self.replies
            .borrow_mut()
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Ok(None))
    }
}

pub fn config() -> ClientConfig {
    ClientConfig::new("http://surveys.example.com/ws/projectdata.asmx", "analyst", "s3cret")
}

/// A response whose `{Operation}Result` element holds `inner`.
pub fn result(operation: Operation, inner: &str) -> Reply {
    let name = operation.name();
    let document = format!(
        r#"<{name}Response xmlns="http://www.vovici.com/"><{name}Result>{inner}</{name}Result></{name}Response>"#
    );
    Ok(Some(parse_document(&document).expect("response parses")))
}

/// A response without a result element.
pub fn bare_response(operation: Operation) -> Reply {
    let document = format!(r#"<{}Response xmlns="http://www.vovici.com/"/>"#, operation.name());
    Ok(Some(parse_document(&document).expect("response parses")))
}

pub fn fault(reason: &str) -> Reply {
    Err(RemoteError::Fault(reason.to_string()))
}

/// A `NewDataSet` payload with one `Table1` row per entry.
pub fn table(rows: &[Vec<(&str, String)>]) -> String {
    let mut body = String::new();
    for row in rows {
        body.push_str("<Table1>");
        for (name, value) in row {
            body.push_str(&format!("<{name}>{value}</{name}>"));
        }
        body.push_str("</Table1>");
    }
    format!(
        r#"<diffgr:diffgram xmlns:diffgr="urn:schemas-microsoft-com:xml-diffgram-v1"><NewDataSet>{body}</NewDataSet></diffgr:diffgram>"#
    )
}

/// Survey data rows with consecutive record ids starting at `first`.
pub fn numbered_rows(first: u64, count: u64) -> Vec<Vec<(&'static str, String)>> {
    (first..first + count)
        .map(|id| vec![("recordid", id.to_string()), ("q1", format!("answer {id}"))])
        .collect()
}

pub fn param_text(params: &Params, name: &str) -> String {
    params
        .get(name)
        .map(ToString::to_string)
        .unwrap_or_else(|| panic!("parameter {name} missing"))
}
